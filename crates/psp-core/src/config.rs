//! Storage provider configuration.
//!
//! Configuration is read from a TOML file and can be overridden through
//! environment variables:
//!
//! ```toml
//! provider = "redis"
//! redis_url = "redis://cache.internal:6379"
//! namespace = "psp:sessions"
//! ```

use crate::error::{PspError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default Redis connection URL.
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Default Redis key namespace.
pub const DEFAULT_REDIS_NAMESPACE: &str = "psp:sessions";

pub const ENV_PROVIDER: &str = "PSP_STORAGE_PROVIDER";
pub const ENV_STORAGE_DIR: &str = "PSP_STORAGE_DIR";
pub const ENV_REDIS_URL: &str = "PSP_REDIS_URL";
pub const ENV_REDIS_PASSWORD: &str = "PSP_REDIS_PASSWORD";
pub const ENV_REDIS_NAMESPACE: &str = "PSP_REDIS_NAMESPACE";

/// Options for the local filesystem provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalProviderOptions {
    /// Base directory; defaults to the per-user PSP sessions directory
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

/// Options for the Redis provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedisProviderOptions {
    #[serde(default, alias = "redisUrl")]
    pub redis_url: Option<String>,
    #[serde(default, alias = "redisPassword")]
    pub redis_password: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
}

impl RedisProviderOptions {
    pub fn url(&self) -> &str {
        self.redis_url.as_deref().unwrap_or(DEFAULT_REDIS_URL)
    }

    pub fn namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or(DEFAULT_REDIS_NAMESPACE)
    }
}

/// Selects and configures the active storage provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum StorageConfig {
    Local(LocalProviderOptions),
    Redis(RedisProviderOptions),
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Local(LocalProviderOptions::default())
    }
}

impl StorageConfig {
    /// Short name of the configured provider (`"local"` or `"redis"`).
    pub fn provider_name(&self) -> &'static str {
        match self {
            Self::Local(_) => "local",
            Self::Redis(_) => "redis",
        }
    }

    /// Parses a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Loads a configuration file; a missing file yields the default config.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Applies `PSP_*` environment overrides.
    pub fn apply_env_overrides(self) -> Result<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary variable source.
    ///
    /// `PSP_STORAGE_PROVIDER` switches the provider first; the remaining
    /// variables then override fields of the selected provider only.
    pub fn apply_overrides<F>(self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let mut config = match lookup(ENV_PROVIDER) {
            None => self,
            Some(name) => match name.trim().to_lowercase().as_str() {
                "local" => match self {
                    Self::Local(options) => Self::Local(options),
                    Self::Redis(_) => Self::Local(LocalProviderOptions::default()),
                },
                "redis" => match self {
                    Self::Redis(options) => Self::Redis(options),
                    Self::Local(_) => Self::Redis(RedisProviderOptions::default()),
                },
                other => {
                    return Err(PspError::config(format!(
                        "unknown storage provider '{}' (expected 'local' or 'redis')",
                        other
                    )));
                }
            },
        };

        match &mut config {
            Self::Local(options) => {
                if let Some(dir) = lookup(ENV_STORAGE_DIR) {
                    options.directory = Some(PathBuf::from(dir));
                }
            }
            Self::Redis(options) => {
                if let Some(url) = lookup(ENV_REDIS_URL) {
                    options.redis_url = Some(url);
                }
                if let Some(password) = lookup(ENV_REDIS_PASSWORD) {
                    options.redis_password = Some(password);
                }
                if let Some(namespace) = lookup(ENV_REDIS_NAMESPACE) {
                    options.namespace = Some(namespace);
                }
            }
        }

        Ok(config)
    }
}
