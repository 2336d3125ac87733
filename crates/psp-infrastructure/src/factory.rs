//! Builds the configured storage provider.

use crate::local_storage_provider::LocalStorageProvider;
use crate::redis_storage_provider::RedisStorageProvider;
use psp_core::{Result, StorageConfig, StorageProvider};
use std::sync::Arc;

/// Creates the provider selected by `config`.
///
/// The Redis provider is connected before it is returned, so an unreachable
/// server surfaces here as `PspError::Connection`.
pub async fn create_provider(config: &StorageConfig) -> Result<Arc<dyn StorageProvider>> {
    tracing::info!(provider = config.provider_name(), "Creating storage provider");

    match config {
        StorageConfig::Local(options) => {
            let provider = LocalStorageProvider::from_options(options).await?;
            Ok(Arc::new(provider))
        }
        StorageConfig::Redis(options) => {
            let provider = RedisStorageProvider::connect_with(options).await?;
            Ok(Arc::new(provider))
        }
    }
}

/// Loads `config.toml` from the PSP config directory, applies `PSP_*`
/// environment overrides and creates the provider.
pub async fn create_default_provider() -> Result<Arc<dyn StorageProvider>> {
    let config = StorageConfig::load(crate::paths::PspPaths::config_file()?)?
        .apply_env_overrides()?;
    create_provider(&config).await
}
