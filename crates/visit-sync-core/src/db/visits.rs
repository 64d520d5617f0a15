//! Visit database operations.
//!
//! A visit row owns its encounters: writes replace the whole set.

use rusqlite::{params, OptionalExtension, Row};

use super::encounters::{insert_encounter, load_visit_encounters};
use super::{constraint_error, Database, DbError, DbResult};
use crate::models::{Location, Visit, VisitType};

const VISIT_COLUMNS: &str = r#"
    id, uuid, patient_id, visit_type_uuid, visit_type_display,
    location_uuid, location_display, start_datetime, stop_datetime
"#;

fn visit_from_row(row: &Row<'_>) -> rusqlite::Result<Visit> {
    let visit_type_uuid: Option<String> = row.get(3)?;
    let visit_type_display: Option<String> = row.get(4)?;
    let location_uuid: Option<String> = row.get(5)?;
    let location_display: Option<String> = row.get(6)?;
    Ok(Visit {
        id: row.get(0)?,
        uuid: row.get(1)?,
        patient_id: row.get(2)?,
        patient: None,
        visit_type: visit_type_uuid.map(|uuid| VisitType {
            uuid,
            display: visit_type_display,
        }),
        location: location_uuid.map(|uuid| Location {
            uuid,
            display: location_display,
        }),
        start_datetime: row.get(7)?,
        stop_datetime: row.get(8)?,
        encounters: Vec::new(),
    })
}

fn reference_columns(visit: &Visit) -> [Option<&str>; 4] {
    [
        visit.visit_type.as_ref().map(|t| t.uuid.as_str()),
        visit.visit_type.as_ref().and_then(|t| t.display.as_deref()),
        visit.location.as_ref().map(|l| l.uuid.as_str()),
        visit.location.as_ref().and_then(|l| l.display.as_deref()),
    ]
}

impl Database {
    /// Insert a visit and its encounters under the owning patient.
    ///
    /// Returns the new local id.
    pub fn insert_visit(&self, visit: &Visit, patient_id: i64) -> DbResult<i64> {
        let [type_uuid, type_display, location_uuid, location_display] = reference_columns(visit);

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            r#"
            INSERT INTO visits (
                uuid, patient_id, visit_type_uuid, visit_type_display,
                location_uuid, location_display, start_datetime, stop_datetime
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                visit.uuid,
                patient_id,
                type_uuid,
                type_display,
                location_uuid,
                location_display,
                visit.start_datetime,
                visit.stop_datetime,
            ],
        )
        .map_err(constraint_error)?;
        let visit_id = tx.last_insert_rowid();

        for encounter in &visit.encounters {
            insert_encounter(&tx, encounter, Some(visit_id), None)?;
        }
        tx.commit()?;
        Ok(visit_id)
    }

    /// Overwrite an existing visit row and replace its encounters.
    pub fn update_visit(&self, visit: &Visit, visit_id: i64, patient_id: i64) -> DbResult<()> {
        let [type_uuid, type_display, location_uuid, location_display] = reference_columns(visit);

        let tx = self.conn.unchecked_transaction()?;
        let rows_affected = tx.execute(
            r#"
            UPDATE visits SET
                uuid = ?2,
                patient_id = ?3,
                visit_type_uuid = ?4,
                visit_type_display = ?5,
                location_uuid = ?6,
                location_display = ?7,
                start_datetime = ?8,
                stop_datetime = ?9,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![
                visit_id,
                visit.uuid,
                patient_id,
                type_uuid,
                type_display,
                location_uuid,
                location_display,
                visit.start_datetime,
                visit.stop_datetime,
            ],
        )?;
        if rows_affected == 0 {
            return Err(DbError::NotFound(format!("visit {}", visit_id)));
        }

        tx.execute("DELETE FROM encounters WHERE visit_id = ?", [visit_id])?;
        for encounter in &visit.encounters {
            insert_encounter(&tx, encounter, Some(visit_id), None)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Get a visit with its encounters by local id.
    pub fn get_visit(&self, visit_id: i64) -> DbResult<Option<Visit>> {
        let sql = format!("SELECT {} FROM visits WHERE id = ?", VISIT_COLUMNS);
        let visit = self
            .conn
            .query_row(&sql, [visit_id], visit_from_row)
            .optional()?;

        match visit {
            Some(mut visit) => {
                visit.encounters = load_visit_encounters(&self.conn, visit_id)?;
                Ok(Some(visit))
            }
            None => Ok(None),
        }
    }

    /// Look up the local id of a visit by server UUID.
    pub fn find_visit_id_by_uuid(&self, uuid: &str) -> DbResult<Option<i64>> {
        self.conn
            .query_row("SELECT id FROM visits WHERE uuid = ?", [uuid], |row| {
                row.get(0)
            })
            .optional()
            .map_err(Into::into)
    }

    /// Count local rows carrying a server UUID (at most one when healthy).
    pub fn count_visits_with_uuid(&self, uuid: &str) -> DbResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM visits WHERE uuid = ?", [uuid], |row| {
                row.get(0)
            })
            .map_err(Into::into)
    }

    /// List a patient's visits, most recent first, with encounters.
    pub fn list_visits_for_patient(&self, patient_id: i64) -> DbResult<Vec<Visit>> {
        let sql = format!(
            "SELECT {} FROM visits WHERE patient_id = ? ORDER BY start_datetime DESC, id DESC",
            VISIT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut visits = stmt
            .query_map([patient_id], visit_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        for visit in &mut visits {
            if let Some(id) = visit.id {
                visit.encounters = load_visit_encounters(&self.conn, id)?;
            }
        }
        Ok(visits)
    }

    /// Get the patient's open visit, if any.
    pub fn get_active_visit_for_patient(&self, patient_id: i64) -> DbResult<Option<Visit>> {
        let visit_id: Option<i64> = self
            .conn
            .query_row(
                r#"
                SELECT id FROM visits
                WHERE patient_id = ? AND stop_datetime IS NULL
                ORDER BY start_datetime DESC, id DESC
                LIMIT 1
                "#,
                [patient_id],
                |row| row.get(0),
            )
            .optional()?;

        match visit_id {
            Some(id) => self.get_visit(id),
            None => Ok(None),
        }
    }
}
