//! The unit of storage: metadata plus captured state.

use super::metadata::SessionMetadata;
use super::state::BrowserSessionState;
use serde::{Deserialize, Serialize};

/// A session as persisted by a storage provider.
///
/// Metadata and state are always written and read together as one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub metadata: SessionMetadata,
    pub state: BrowserSessionState,
}

impl StoredSession {
    pub fn new(metadata: SessionMetadata, state: BrowserSessionState) -> Self {
        Self { metadata, state }
    }

    pub fn id(&self) -> &str {
        &self.metadata.id
    }
}
