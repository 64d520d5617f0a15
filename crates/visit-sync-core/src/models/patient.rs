//! Patient models.

use serde::{Deserialize, Serialize};

/// A patient with dual identity: local row id plus server UUID.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Local row id - null until stored locally
    #[serde(skip)]
    pub id: Option<i64>,
    /// Server UUID
    pub uuid: String,
    /// Display name as reported by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Patient {
    /// Create a patient known only by its server UUID.
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            id: None,
            uuid: uuid.into(),
            display: None,
        }
    }

    /// Check if this patient has a local row.
    pub fn is_stored(&self) -> bool {
        self.id.is_some_and(|id| id > 0)
    }
}

impl super::Referenced for Patient {
    fn uuid(&self) -> &str {
        &self.uuid
    }
}

impl From<String> for Patient {
    fn from(uuid: String) -> Self {
        Patient::new(uuid)
    }
}
