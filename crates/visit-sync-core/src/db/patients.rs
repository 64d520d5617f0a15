//! Patient database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::Patient;

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        uuid: row.get(1)?,
        display: row.get(2)?,
    })
}

impl Database {
    /// Register a patient, returning its local id.
    ///
    /// A patient already known by UUID keeps its existing id.
    pub fn insert_patient(&self, patient: &Patient) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO patients (uuid, display) VALUES (?1, ?2)
            ON CONFLICT(uuid) DO UPDATE SET display = excluded.display
            "#,
            params![patient.uuid, patient.display],
        )?;
        let id = self.conn.query_row(
            "SELECT id FROM patients WHERE uuid = ?",
            [&patient.uuid],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Get a patient by local id.
    pub fn get_patient(&self, id: i64) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                "SELECT id, uuid, display FROM patients WHERE id = ?",
                [id],
                patient_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get a patient by server UUID.
    pub fn get_patient_by_uuid(&self, uuid: &str) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                "SELECT id, uuid, display FROM patients WHERE uuid = ?",
                [uuid],
                patient_from_row,
            )
            .optional()
            .map_err(Into::into)
    }
}
