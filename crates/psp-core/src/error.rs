//! Error types for PSP session storage.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The shared error type returned by every storage provider.
///
/// Variants map onto the failure classes callers are expected to handle:
/// missing sessions, rejected input, unreachable backends and unreadable
/// stored records. Conversions from common library errors are provided via
/// `From`.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PspError {
    /// No session with the given id exists
    #[error("Session not found: '{id}'")]
    NotFound { id: String },

    /// Input rejected before any I/O (bad id, malformed filter, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Backend could not be reached or refused the connection
    #[error("Connection error: {0}")]
    Connection(String),

    /// A stored record could not be read or parsed
    #[error("Corrupt record at {location}: {message}")]
    CorruptRecord { location: String, message: String },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backend reported a failure that is not a connection problem
    #[error("Data access error: {0}")]
    DataAccess(String),
}

impl PspError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a Connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Creates a CorruptRecord error
    pub fn corrupt(location: impl Into<String>, message: impl ToString) -> Self {
        Self::CorruptRecord {
            location: location.into(),
            message: message.to_string(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a DataAccess error
    pub fn data_access(message: impl Into<String>) -> Self {
        Self::DataAccess(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a Validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a Connection error
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Check if this is a CorruptRecord error
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::CorruptRecord { .. })
    }

    /// Check if this is an IO error
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for PspError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for PspError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for PspError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, PspError>`.
pub type Result<T> = std::result::Result<T, PspError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates() {
        assert!(PspError::not_found("abc").is_not_found());
        assert!(PspError::validation("empty id").is_validation());
        assert!(PspError::connection("refused").is_connection());
        assert!(PspError::corrupt("a/abc.json", "eof").is_corrupt());
        assert!(!PspError::config("bad").is_not_found());
    }

    #[test]
    fn test_io_conversion_keeps_kind() {
        let err: PspError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert!(err.is_io());
        assert!(err.to_string().contains("PermissionDenied"));
    }

    #[test]
    fn test_display() {
        let err = PspError::not_found("abc");
        assert_eq!(err.to_string(), "Session not found: 'abc'");
    }
}
