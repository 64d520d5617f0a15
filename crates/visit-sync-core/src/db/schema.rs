//! SQLite schema definition.

/// Complete database schema for the local visit store.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid TEXT NOT NULL UNIQUE,
    display TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Locations (reference data)
-- ============================================================================

CREATE TABLE IF NOT EXISTS locations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid TEXT NOT NULL UNIQUE,
    display TEXT
);

CREATE INDEX IF NOT EXISTS idx_locations_display ON locations(display COLLATE NOCASE);

-- ============================================================================
-- Visits
-- ============================================================================

CREATE TABLE IF NOT EXISTS visits (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid TEXT UNIQUE,                            -- server UUID, one row per UUID
    patient_id INTEGER NOT NULL REFERENCES patients(id),
    visit_type_uuid TEXT,
    visit_type_display TEXT,
    location_uuid TEXT,
    location_display TEXT,
    start_datetime TEXT,
    stop_datetime TEXT,                          -- NULL while the visit is open
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_visits_patient ON visits(patient_id);

-- ============================================================================
-- Encounters
-- ============================================================================

-- Either bound to a visit, or (last vitals) bound to a patient UUID only
CREATE TABLE IF NOT EXISTS encounters (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid TEXT,
    visit_id INTEGER REFERENCES visits(id) ON DELETE CASCADE,
    patient_uuid TEXT,
    display TEXT,
    encounter_datetime TEXT,
    encounter_type_uuid TEXT,
    encounter_type_display TEXT,
    observations TEXT NOT NULL DEFAULT '[]',     -- JSON array, opaque
    CHECK (visit_id IS NOT NULL OR patient_uuid IS NOT NULL)
);

CREATE INDEX IF NOT EXISTS idx_encounters_visit ON encounters(visit_id);
CREATE INDEX IF NOT EXISTS idx_encounters_patient ON encounters(patient_uuid);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_visit_uuid_unique() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        conn.execute("INSERT INTO patients (uuid) VALUES ('p1')", [])
            .unwrap();
        conn.execute(
            "INSERT INTO visits (uuid, patient_id) VALUES ('v1', 1)",
            [],
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO visits (uuid, patient_id) VALUES ('v1', 1)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_orphan_encounter_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let result = conn.execute("INSERT INTO encounters (uuid) VALUES ('e1')", []);
        assert!(result.is_err());
    }
}
