//! Remote → local visit synchronization.
//!
//! ```text
//!   RemoteVisitSource ──fetch──▶ VisitSyncEngine ──upsert by UUID──▶ LocalVisitStore
//!                                      │
//!                          CompletionListener / ErrorSignal
//! ```
//!
//! Every operation is an `async fn` returning a [`SyncResult`]. The `spawn_*`
//! variants run the operation on the tokio runtime and report to an optional
//! [`CompletionListener`] instead, so the caller never blocks.

mod engine;
mod locks;
mod notify;
mod remote;
mod start;
mod store;

pub use engine::*;
pub use locks::*;
pub use notify::*;
pub use remote::*;
pub use start::*;
pub use store::*;

use thiserror::Error;

use crate::db::DbError;

/// Sync errors.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("Local store error: {0}")]
    Store(#[from] DbError),

    #[error("Server returned no visit types")]
    EmptyVisitTypes,

    #[error("Unknown location: {0}")]
    LocationNotFound(String),

    #[error("Patient {0} has no local id")]
    UnsavedPatient(String),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type SyncResult<T> = Result<T, SyncError>;

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Remote visits with no local match, inserted
    pub inserted: usize,
    /// Remote visits matched by UUID, overwritten in place
    pub updated: usize,
    /// Remote visits without a UUID, not reconcilable
    pub skipped: usize,
}

impl SyncReport {
    /// Total records written.
    pub fn written(&self) -> usize {
        self.inserted + self.updated
    }
}
