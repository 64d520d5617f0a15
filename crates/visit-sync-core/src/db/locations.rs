//! Location reference data.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult};
use crate::models::Location;

impl Database {
    /// Add or update a location.
    pub fn upsert_location(&self, location: &Location) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO locations (uuid, display) VALUES (?1, ?2)
            ON CONFLICT(uuid) DO UPDATE SET display = excluded.display
            "#,
            params![location.uuid, location.display],
        )?;
        Ok(())
    }

    /// Find a location by its display name (case-insensitive).
    pub fn find_location_by_name(&self, name: &str) -> DbResult<Option<Location>> {
        self.conn
            .query_row(
                r#"
                SELECT uuid, display FROM locations
                WHERE display = ?1 COLLATE NOCASE
                ORDER BY id
                LIMIT 1
                "#,
                [name],
                |row| {
                    Ok(Location {
                        uuid: row.get(0)?,
                        display: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all known locations.
    pub fn list_locations(&self) -> DbResult<Vec<Location>> {
        let mut stmt = self
            .conn
            .prepare("SELECT uuid, display FROM locations ORDER BY display")?;

        let rows = stmt.query_map([], |row| {
            Ok(Location {
                uuid: row.get(0)?,
                display: row.get(1)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_by_name_case_insensitive() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_location(&Location::with_display("loc-1", "Outpatient Clinic"))
            .unwrap();
        db.upsert_location(&Location::with_display("loc-2", "Pharmacy"))
            .unwrap();

        let found = db.find_location_by_name("outpatient clinic").unwrap().unwrap();
        assert_eq!(found.uuid, "loc-1");
        assert!(db.find_location_by_name("Laboratory").unwrap().is_none());
    }

    #[test]
    fn test_upsert_renames() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_location(&Location::with_display("loc-1", "Old Name"))
            .unwrap();
        db.upsert_location(&Location::with_display("loc-1", "New Name"))
            .unwrap();

        let all = db.list_locations().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].display.as_deref(), Some("New Name"));
    }
}
