//! Unified path management for PSP configuration and session data.
//!
//! Platform directories are resolved via the `dirs` crate so the layout is
//! consistent across Linux, macOS and Windows.

use psp_core::PspError;
use std::path::PathBuf;

const APP_DIR: &str = "psp";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for PspError {
    fn from(err: PathError) -> Self {
        PspError::config(err.to_string())
    }
}

/// Unified path management for PSP.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/psp/               # Config directory
/// └── config.toml              # Storage provider configuration
///
/// ~/.local/share/psp/          # Data directory
/// └── sessions/                # LocalStorageProvider default base
///     ├── ab/
///     │   └── abc123.json
///     └── f0/
///         └── f0e1d2.json
/// ```
pub struct PspPaths;

impl PspPaths {
    /// Returns the PSP configuration directory (e.g., `~/.config/psp/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the PSP data directory (e.g., `~/.local/share/psp/`).
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to the storage configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the default base directory of the local session store.
    pub fn sessions_dir() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("sessions"))
    }
}
