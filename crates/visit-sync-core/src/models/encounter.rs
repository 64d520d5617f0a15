//! Encounter models.

use serde::{Deserialize, Serialize};

use super::reference::EncounterType;

/// A sub-record of a visit, e.g. a vitals capture.
///
/// Observations are carried as raw JSON; nothing in this crate interprets them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Encounter {
    /// Local row id
    #[serde(skip)]
    pub id: Option<i64>,
    /// Server UUID
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub display: Option<String>,
    #[serde(default)]
    pub encounter_datetime: Option<String>,
    #[serde(default)]
    pub encounter_type: Option<EncounterType>,
    #[serde(default, rename = "obs")]
    pub observations: Vec<serde_json::Value>,
    /// Owning local visit, if bound to one
    #[serde(skip)]
    pub visit_id: Option<i64>,
    /// Owning patient for encounters not bound to a visit (last vitals)
    #[serde(skip)]
    pub patient_uuid: Option<String>,
}

impl Encounter {
    /// Check whether this encounter has the given type.
    pub fn is_of_type(&self, encounter_type_uuid: &str) -> bool {
        self.encounter_type
            .as_ref()
            .is_some_and(|t| t.uuid == encounter_type_uuid)
    }
}
