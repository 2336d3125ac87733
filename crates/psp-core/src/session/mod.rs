//! Session domain module.
//!
//! # Module Structure
//!
//! - `metadata`: identity and discovery fields (`SessionMetadata`)
//! - `state`: captured browser content (`BrowserSessionState`, `Cookie`)
//! - `payload`: opaque JSON carried verbatim (`RawPayload`)
//! - `storage_map`: the origin → key → value structure (`StorageMap`)
//! - `stored`: the persisted pair (`StoredSession`)

mod metadata;
mod payload;
mod state;
mod storage_map;
mod stored;

pub use metadata::{SessionMetadata, now_millis};
pub use payload::RawPayload;
pub use state::{BrowserSessionState, Cookie, STATE_SCHEMA_VERSION, SameSite, StorageSnapshot};
pub use storage_map::{EmptyKey, OriginEntries, StorageMap};
pub use stored::StoredSession;
