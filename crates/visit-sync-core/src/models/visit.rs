//! Visit models.

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use super::encounter::Encounter;
use super::patient::Patient;
use super::reference::{as_uuid, Location, VisitType};

/// Timestamp layout the server expects on write requests
/// (`yyyy-MM-dd'T'HH:mm:ss.SSSZ`).
pub const REQUEST_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// Render a timestamp in the server's request format.
pub fn format_request_datetime<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(REQUEST_DATETIME_FORMAT).to_string()
}

/// One clinical visit episode.
///
/// The wire shape doubles as the create-visit request body: reference
/// fields serialize as bare UUIDs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    /// Local row id - null until persisted
    #[serde(skip)]
    pub id: Option<i64>,
    /// Owning patient's local id
    #[serde(skip)]
    pub patient_id: Option<i64>,
    /// Server UUID - the join key between server and local copies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, with = "as_uuid", skip_serializing_if = "Option::is_none")]
    pub patient: Option<Patient>,
    #[serde(default, with = "as_uuid", skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, with = "as_uuid", skip_serializing_if = "Option::is_none")]
    pub visit_type: Option<VisitType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_datetime: Option<String>,
    /// Null while the visit is still open
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_datetime: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub encounters: Vec<Encounter>,
}

impl Visit {
    /// Check if the visit is still open.
    pub fn is_active(&self) -> bool {
        self.stop_datetime.is_none()
    }

    /// Check if this visit has a local row.
    pub fn is_stored(&self) -> bool {
        self.id.is_some_and(|id| id > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Resource;
    use chrono::Utc;

    #[test]
    fn test_format_request_datetime() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 5).unwrap();
        assert_eq!(format_request_datetime(&at), "2024-01-15T10:30:05.000+0000");
    }

    #[test]
    fn test_deserialize_expanded_visit() {
        let json = r#"{
            "uuid": "visit-1",
            "location": {"uuid": "loc-1", "display": "Outpatient Clinic"},
            "visitType": {"uuid": "vt-1", "display": "Facility Visit"},
            "startDatetime": "2024-01-15T10:00:00.000+0000",
            "stopDatetime": null,
            "encounters": [{"uuid": "enc-1", "obs": []}]
        }"#;

        let visit: Visit = serde_json::from_str(json).unwrap();
        assert_eq!(visit.uuid.as_deref(), Some("visit-1"));
        assert_eq!(visit.location.as_ref().unwrap().display.as_deref(), Some("Outpatient Clinic"));
        assert_eq!(visit.visit_type.as_ref().unwrap().uuid, "vt-1");
        assert!(visit.is_active());
        assert!(!visit.is_stored());
        assert_eq!(visit.encounters.len(), 1);
    }

    #[test]
    fn test_request_body_uses_uuid_references() {
        let visit = Visit {
            patient: Some(Patient::new("patient-1")),
            location: Some(Resource::with_display("loc-1", "Outpatient Clinic")),
            visit_type: Some(VisitType::new("vt-1")),
            start_datetime: Some("2024-01-15T10:00:00.000+0000".into()),
            ..Default::default()
        };

        let value = serde_json::to_value(&visit).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "patient": "patient-1",
                "location": "loc-1",
                "visitType": "vt-1",
                "startDatetime": "2024-01-15T10:00:00.000+0000"
            })
        );
    }
}
