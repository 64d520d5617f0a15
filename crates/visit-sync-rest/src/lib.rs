//! OpenMRS REST client for visit synchronization.
//!
//! Implements [`visit_sync_core::RemoteVisitSource`] over the `/ws/rest/v1`
//! resource API.

mod client;
mod types;

pub use client::*;
pub use types::*;
