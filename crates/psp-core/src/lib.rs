//! Core types for PSP browser session persistence.
//!
//! - [`session`]: the captured session model (`StoredSession`, `SessionMetadata`,
//!   `BrowserSessionState`, `StorageMap`)
//! - [`codec`]: the JSON codec every backend uses
//! - [`filter`]: listing filters shared across backends
//! - [`provider`]: the `StorageProvider` contract
//! - [`config`]: provider selection and options

pub mod codec;
pub mod config;
pub mod error;
pub mod filter;
pub mod provider;
pub mod session;

pub use config::{LocalProviderOptions, RedisProviderOptions, StorageConfig};
pub use error::{PspError, Result};
pub use filter::{SessionFilter, TimeRange};
pub use provider::{
    RESERVED_SESSION_ID, RESERVED_SESSION_ID_PREFIXES, StorageProvider, prepare_for_save,
    validate_session_id,
};
pub use session::{
    BrowserSessionState, Cookie, RawPayload, SameSite, SessionMetadata, StorageMap,
    StorageSnapshot, StoredSession,
};
