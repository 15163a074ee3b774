//! Synchronization: reconciling individual libraries against the upstream
//! sources and coordinating full runs over the whole library list.

pub mod coordinator;
pub mod reconciler;

use serde::Serialize;
use thiserror::Error;

use crate::source::SourceError;
use crate::store::StoreError;

pub use coordinator::Coordinator;
pub use reconciler::Reconciler;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to persist '{library}': {source}")]
    Persistence {
        library: String,
        #[source]
        source: StoreError,
    },

    #[error("a sync run is already in progress")]
    AlreadyRunning,

    #[error("failed to enumerate libraries: {0}")]
    Enumeration(#[from] SourceError),
}

/// Outcome of reconciling one library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
    Updated { artifacts_discovered: usize },
    Skipped { reason: String },
}

/// Aggregate counters for one sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRunStats {
    pub total: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub retried: usize,
    pub artifacts_discovered: usize,
}
