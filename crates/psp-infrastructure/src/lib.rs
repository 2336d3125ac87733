//! Storage backends for PSP sessions.
//!
//! - [`LocalStorageProvider`]: one JSON file per session under a sharded
//!   directory tree
//! - [`RedisStorageProvider`]: session bodies in Redis plus secondary indexes
//!   for metadata, name ordering and tags
//!
//! Use [`create_provider`] to build whichever backend a [`StorageConfig`]
//! selects.
//!
//! [`StorageConfig`]: psp_core::StorageConfig

pub mod factory;
pub mod local_storage_provider;
pub mod logging;
pub mod paths;
pub mod redis_storage_provider;
pub mod storage;

pub use crate::factory::{create_default_provider, create_provider};
pub use crate::local_storage_provider::LocalStorageProvider;
pub use crate::paths::PspPaths;
pub use crate::redis_storage_provider::{RedisKeys, RedisStorageProvider};
