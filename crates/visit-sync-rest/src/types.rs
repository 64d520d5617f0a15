//! Wire envelopes returned by the REST API.

use serde::Deserialize;

/// List envelope: `{"results": [...]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Results<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// Error body: `{"error": {"message": "..."}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
}
