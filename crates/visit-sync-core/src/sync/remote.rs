//! Contract for the remote clinical-records server.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Encounter, Visit, VisitType};

/// Failure talking to the remote server.
///
/// Callers treat every variant the same way: the operation failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Non-2xx response
    #[error("Server error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Request never completed (timeout, connectivity, request building)
    #[error("Transport error: {0}")]
    Transport(String),

    /// 2xx response whose body could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Create an API error from status and message.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// HTTP status if this is an API error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Sort direction for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Query for a patient's most recent encounter of one type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastVitalsQuery {
    pub patient_uuid: String,
    pub encounter_type_uuid: String,
    /// Representation, e.g. `full`
    pub representation: String,
    pub limit: u32,
    pub order: SortOrder,
}

impl LastVitalsQuery {
    /// Newest single encounter of the given type, fully expanded.
    pub fn latest(patient_uuid: impl Into<String>, encounter_type_uuid: impl Into<String>) -> Self {
        Self {
            patient_uuid: patient_uuid.into(),
            encounter_type_uuid: encounter_type_uuid.into(),
            representation: "full".to_string(),
            limit: 1,
            order: SortOrder::Desc,
        }
    }
}

/// Typed request/response contract with the remote server.
///
/// Implementations own transport concerns, including timeouts.
#[async_trait]
pub trait RemoteVisitSource: Send + Sync {
    /// All visits of a patient, expanded per `expansion`.
    async fn find_visits(&self, patient_uuid: &str, expansion: &str) -> RemoteResult<Vec<Visit>>;

    /// Encounters matching a last-vitals query.
    async fn get_last_vitals(&self, query: &LastVitalsQuery) -> RemoteResult<Vec<Encounter>>;

    /// Server-defined visit types.
    async fn get_visit_types(&self) -> RemoteResult<Vec<VisitType>>;

    /// Create a visit; returns the server's canonical copy.
    async fn create_visit(&self, visit: &Visit) -> RemoteResult<Visit>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_query() {
        let query = LastVitalsQuery::latest("patient-1", "vitals-type");
        assert_eq!(query.limit, 1);
        assert_eq!(query.order.as_str(), "desc");
        assert_eq!(query.representation, "full");
    }

    #[test]
    fn test_status_code() {
        assert_eq!(RemoteError::api(404, "Not Found").status_code(), Some(404));
        assert_eq!(RemoteError::Transport("timed out".into()).status_code(), None);
        assert_eq!(
            RemoteError::api(500, "Internal Server Error").to_string(),
            "Server error (500): Internal Server Error"
        );
    }
}
