//! Encounter database operations.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::{Encounter, EncounterType};

const ENCOUNTER_COLUMNS: &str = r#"
    id, uuid, visit_id, patient_uuid, display, encounter_datetime,
    encounter_type_uuid, encounter_type_display, observations
"#;

/// Raw row before the observations JSON is decoded.
struct EncounterRow {
    id: i64,
    uuid: Option<String>,
    visit_id: Option<i64>,
    patient_uuid: Option<String>,
    display: Option<String>,
    encounter_datetime: Option<String>,
    encounter_type_uuid: Option<String>,
    encounter_type_display: Option<String>,
    observations: String,
}

impl EncounterRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            uuid: row.get(1)?,
            visit_id: row.get(2)?,
            patient_uuid: row.get(3)?,
            display: row.get(4)?,
            encounter_datetime: row.get(5)?,
            encounter_type_uuid: row.get(6)?,
            encounter_type_display: row.get(7)?,
            observations: row.get(8)?,
        })
    }
}

impl TryFrom<EncounterRow> for Encounter {
    type Error = super::DbError;

    fn try_from(row: EncounterRow) -> DbResult<Self> {
        Ok(Encounter {
            id: Some(row.id),
            uuid: row.uuid,
            display: row.display,
            encounter_datetime: row.encounter_datetime,
            encounter_type: row.encounter_type_uuid.map(|uuid| EncounterType {
                uuid,
                display: row.encounter_type_display,
            }),
            observations: serde_json::from_str(&row.observations)?,
            visit_id: row.visit_id,
            patient_uuid: row.patient_uuid,
        })
    }
}

/// Insert one encounter on an existing connection or transaction.
pub(super) fn insert_encounter(
    conn: &Connection,
    encounter: &Encounter,
    visit_id: Option<i64>,
    patient_uuid: Option<&str>,
) -> DbResult<i64> {
    let observations = serde_json::to_string(&encounter.observations)?;
    let (type_uuid, type_display) = match &encounter.encounter_type {
        Some(t) => (Some(t.uuid.as_str()), t.display.as_deref()),
        None => (None, None),
    };

    conn.execute(
        r#"
        INSERT INTO encounters (
            uuid, visit_id, patient_uuid, display, encounter_datetime,
            encounter_type_uuid, encounter_type_display, observations
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
        params![
            encounter.uuid,
            visit_id,
            patient_uuid,
            encounter.display,
            encounter.encounter_datetime,
            type_uuid,
            type_display,
            observations,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Load the encounters of one visit, in insertion order.
pub(super) fn load_visit_encounters(conn: &Connection, visit_id: i64) -> DbResult<Vec<Encounter>> {
    let sql = format!(
        "SELECT {} FROM encounters WHERE visit_id = ? ORDER BY id",
        ENCOUNTER_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([visit_id], EncounterRow::from_row)?;

    let mut encounters = Vec::new();
    for row in rows {
        encounters.push(row?.try_into()?);
    }
    Ok(encounters)
}

impl Database {
    /// List the encounters recorded under a visit.
    pub fn list_encounters_for_visit(&self, visit_id: i64) -> DbResult<Vec<Encounter>> {
        load_visit_encounters(&self.conn, visit_id)
    }

    /// Store the patient's most recent vitals, replacing any previous one.
    pub fn save_last_vitals(&self, encounter: &Encounter, patient_uuid: &str) -> DbResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM encounters WHERE visit_id IS NULL AND patient_uuid = ?",
            [patient_uuid],
        )?;
        insert_encounter(&tx, encounter, None, Some(patient_uuid))?;
        tx.commit()?;
        Ok(())
    }

    /// Get the patient's stored last vitals, if any.
    pub fn get_last_vitals(&self, patient_uuid: &str) -> DbResult<Option<Encounter>> {
        let sql = format!(
            "SELECT {} FROM encounters WHERE visit_id IS NULL AND patient_uuid = ?",
            ENCOUNTER_COLUMNS
        );
        self.conn
            .query_row(&sql, [patient_uuid], EncounterRow::from_row)
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vitals(uuid: &str, pulse: i64) -> Encounter {
        Encounter {
            uuid: Some(uuid.into()),
            display: Some("Vitals".into()),
            encounter_datetime: Some("2024-01-15T10:00:00.000+0000".into()),
            encounter_type: Some(EncounterType::with_display("vitals-type", "Vitals")),
            observations: vec![json!({"display": format!("Pulse: {}", pulse)})],
            ..Default::default()
        }
    }

    #[test]
    fn test_save_and_get_last_vitals() {
        let db = Database::open_in_memory().unwrap();
        db.save_last_vitals(&vitals("enc-1", 72), "patient-1").unwrap();

        let stored = db.get_last_vitals("patient-1").unwrap().unwrap();
        assert_eq!(stored.uuid.as_deref(), Some("enc-1"));
        assert_eq!(stored.patient_uuid.as_deref(), Some("patient-1"));
        assert!(stored.visit_id.is_none());
        assert_eq!(stored.observations, vec![json!({"display": "Pulse: 72"})]);
        assert_eq!(
            stored.encounter_type.unwrap().display.as_deref(),
            Some("Vitals")
        );
    }

    #[test]
    fn test_last_vitals_overwrites() {
        let db = Database::open_in_memory().unwrap();
        db.save_last_vitals(&vitals("enc-1", 72), "patient-1").unwrap();
        db.save_last_vitals(&vitals("enc-2", 80), "patient-1").unwrap();
        db.save_last_vitals(&vitals("enc-3", 64), "patient-2").unwrap();

        let stored = db.get_last_vitals("patient-1").unwrap().unwrap();
        assert_eq!(stored.uuid.as_deref(), Some("enc-2"));

        let count: i64 = db
            .conn()
            .query_row(
                "SELECT COUNT(*) FROM encounters WHERE patient_uuid = 'patient-1'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
        assert!(db.get_last_vitals("patient-2").unwrap().is_some());
    }

    #[test]
    fn test_no_last_vitals() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_last_vitals("patient-1").unwrap().is_none());
    }
}
