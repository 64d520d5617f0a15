//! Reference data shared by visits and encounters.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A lightweight server reference (`ref` representation).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resource {
    /// Server UUID
    pub uuid: String,
    /// Human-readable label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Resource {
    /// Reference by UUID only.
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            display: None,
        }
    }

    /// Reference with a display label.
    pub fn with_display(uuid: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            display: Some(display.into()),
        }
    }
}

/// Facility location.
pub type Location = Resource;

/// Encounter type (e.g. vitals).
pub type EncounterType = Resource;

/// Server-defined visit type. Read-only reference data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VisitType {
    pub uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl VisitType {
    /// Visit type known only by its UUID.
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            display: None,
        }
    }

    /// Name shown to users, falling back to the UUID.
    pub fn name(&self) -> &str {
        self.display.as_deref().unwrap_or(&self.uuid)
    }
}

/// Anything addressable by a server UUID.
pub trait Referenced {
    fn uuid(&self) -> &str;
}

impl Referenced for Resource {
    fn uuid(&self) -> &str {
        &self.uuid
    }
}

impl Referenced for VisitType {
    fn uuid(&self) -> &str {
        &self.uuid
    }
}

/// Serde adapter for reference fields on write requests.
///
/// Serializes as the bare UUID string the server expects on POST, and
/// deserializes either a bare UUID or an expanded object.
pub mod as_uuid {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr<T> {
        Uuid(String),
        Full(T),
    }

    pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Referenced,
        S: Serializer,
    {
        match value {
            Some(v) => serializer.serialize_str(v.uuid()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: Deserialize<'de> + From<String>,
        D: Deserializer<'de>,
    {
        let repr: Option<Repr<T>> = Option::deserialize(deserializer)?;
        Ok(repr.map(|r| match r {
            Repr::Uuid(uuid) => T::from(uuid),
            Repr::Full(full) => full,
        }))
    }
}

impl From<String> for Resource {
    fn from(uuid: String) -> Self {
        Resource::new(uuid)
    }
}

impl From<String> for VisitType {
    fn from(uuid: String) -> Self {
        VisitType::new(uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    struct Holder {
        #[serde(default, with = "as_uuid", skip_serializing_if = "Option::is_none")]
        location: Option<Resource>,
    }

    #[test]
    fn test_serializes_bare_uuid() {
        let holder = Holder {
            location: Some(Resource::with_display("loc-1", "Outpatient Clinic")),
        };
        let json = serde_json::to_string(&holder).unwrap();
        assert_eq!(json, r#"{"location":"loc-1"}"#);
    }

    #[test]
    fn test_deserializes_expanded_object() {
        let holder: Holder = serde_json::from_str(
            r#"{"location":{"uuid":"loc-1","display":"Outpatient Clinic","links":[]}}"#,
        )
        .unwrap();
        let location = holder.location.unwrap();
        assert_eq!(location.uuid, "loc-1");
        assert_eq!(location.display.as_deref(), Some("Outpatient Clinic"));
    }

    #[test]
    fn test_deserializes_bare_uuid_and_missing() {
        let holder: Holder = serde_json::from_str(r#"{"location":"loc-2"}"#).unwrap();
        assert_eq!(holder.location, Some(Resource::new("loc-2")));

        let holder: Holder = serde_json::from_str("{}").unwrap();
        assert!(holder.location.is_none());
    }

    #[test]
    fn test_visit_type_name_fallback() {
        assert_eq!(VisitType::new("vt-1").name(), "vt-1");
        let named = VisitType {
            uuid: "vt-1".into(),
            display: Some("Facility Visit".into()),
        };
        assert_eq!(named.name(), "Facility Visit");
    }
}
