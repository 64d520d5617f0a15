//! Visit Sync Core Library
//!
//! Keeps an on-device copy of a patient's clinical visits in step with the
//! remote records server.
//!
//! # Architecture
//!
//! ```text
//!      Records server (REST)
//!              │
//!     RemoteVisitSource ◀── visit-sync-rest
//!              │
//!   ┌──────────▼───────────┐        ┌────────────────────┐
//!   │   VisitSyncEngine    │        │ VisitStartWorkflow │
//!   │  fetch → reconcile   │        │ build → create →   │
//!   │  upsert by UUID      │        │ persist server copy│
//!   └──────────┬───────────┘        └─────────┬──────────┘
//!              │                              │
//!              └──────────┬───────────────────┘
//!                         ▼
//!                  LocalVisitStore (SQLite)
//!                         │
//!                         ▼
//!             VisitDashboardController ──▶ display layer
//! ```
//!
//! # Core Principle
//!
//! **At most one local visit per server UUID.** Sync is forward-only
//! (server → device) and safe to repeat.
//!
//! # Modules
//!
//! - [`db`]: SQLite store for patients, locations, visits and encounters
//! - [`models`]: Domain types (Visit, Encounter, VisitType, ...)
//! - [`sync`]: Sync engine, start-visit workflow, remote/store contracts
//! - [`dashboard`]: Presentation-facing controller
//! - [`config`]: Explicit sync configuration

pub mod config;
pub mod dashboard;
pub mod db;
pub mod models;
pub mod sync;

// Re-export commonly used types
pub use config::SyncConfig;
pub use db::{Database, SharedDatabase};
pub use models::{Encounter, Location, Patient, Resource, Visit, VisitType};
pub use sync::{
    CompletionListener, ErrorSignal, LocalVisitStore, RemoteError, RemoteVisitSource, SyncError,
    SyncReport, VisitStartWorkflow, VisitSyncEngine,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::Arc;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum VisitSyncError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<db::DbError> for VisitSyncError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => VisitSyncError::NotFound(what),
            other => VisitSyncError::DatabaseError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for VisitSyncError {
    fn from(e: serde_json::Error) -> Self {
        VisitSyncError::SerializationError(e.to_string())
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<VisitSyncCore>, VisitSyncError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(VisitSyncCore {
        db: SharedDatabase::new(db),
    }))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<VisitSyncCore>, VisitSyncError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(VisitSyncCore {
        db: SharedDatabase::new(db),
    }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe read access to the local visit store for the display layer.
#[derive(uniffi::Object)]
pub struct VisitSyncCore {
    db: SharedDatabase,
}

impl VisitSyncCore {
    /// Store handle for wiring a sync engine to the same database.
    pub fn store(&self) -> SharedDatabase {
        self.db.clone()
    }
}

#[uniffi::export]
impl VisitSyncCore {
    // =========================================================================
    // Reference Data
    // =========================================================================

    /// Register a patient, returning its local id.
    pub fn register_patient(
        &self,
        uuid: String,
        display: Option<String>,
    ) -> Result<FfiPatient, VisitSyncError> {
        if uuid.trim().is_empty() {
            return Err(VisitSyncError::InvalidInput("patient uuid is empty".into()));
        }
        let db = self.db.lock()?;
        let patient = Patient {
            id: None,
            uuid,
            display,
        };
        let id = db.insert_patient(&patient)?;
        Ok(FfiPatient {
            id,
            uuid: patient.uuid,
            display: patient.display,
        })
    }

    /// Add or update a facility location.
    pub fn upsert_location(&self, uuid: String, display: String) -> Result<(), VisitSyncError> {
        let db = self.db.lock()?;
        db.upsert_location(&Location::with_display(uuid, display))?;
        Ok(())
    }

    // =========================================================================
    // Visit Queries
    // =========================================================================

    /// Get a visit by local id.
    pub fn get_visit(&self, visit_id: i64) -> Result<Option<FfiVisit>, VisitSyncError> {
        let db = self.db.lock()?;
        let visit = db.get_visit(visit_id)?;
        Ok(visit.map(|v| v.into()))
    }

    /// List a patient's visits, most recent first.
    pub fn list_visits_for_patient(&self, patient_id: i64) -> Result<Vec<FfiVisit>, VisitSyncError> {
        let db = self.db.lock()?;
        let visits = db.list_visits_for_patient(patient_id)?;
        Ok(visits.into_iter().map(|v| v.into()).collect())
    }

    /// Get the patient's open visit, if any.
    pub fn get_active_visit(&self, patient_id: i64) -> Result<Option<FfiVisit>, VisitSyncError> {
        let db = self.db.lock()?;
        let visit = db.get_active_visit_for_patient(patient_id)?;
        Ok(visit.map(|v| v.into()))
    }

    /// Encounters persisted for a visit.
    pub fn get_visit_encounters(&self, visit_id: i64) -> Result<Vec<FfiEncounter>, VisitSyncError> {
        let db = self.db.lock()?;
        let encounters = db.list_encounters_for_visit(visit_id)?;
        encounters.into_iter().map(FfiEncounter::try_from).collect()
    }

    /// The patient's last known vitals.
    pub fn get_last_vitals(&self, patient_uuid: String) -> Result<Option<FfiEncounter>, VisitSyncError> {
        let db = self.db.lock()?;
        db.get_last_vitals(&patient_uuid)?
            .map(FfiEncounter::try_from)
            .transpose()
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: i64,
    pub uuid: String,
    pub display: Option<String>,
}

/// FFI-safe visit.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiVisit {
    pub id: i64,
    pub uuid: Option<String>,
    pub patient_id: i64,
    pub visit_type_uuid: Option<String>,
    pub visit_type_name: Option<String>,
    pub location_uuid: Option<String>,
    pub location_name: Option<String>,
    pub start_datetime: Option<String>,
    pub stop_datetime: Option<String>,
    pub encounter_count: u32,
}

impl From<Visit> for FfiVisit {
    fn from(visit: Visit) -> Self {
        let (visit_type_uuid, visit_type_name) = match visit.visit_type {
            Some(t) => (Some(t.uuid), t.display),
            None => (None, None),
        };
        let (location_uuid, location_name) = match visit.location {
            Some(l) => (Some(l.uuid), l.display),
            None => (None, None),
        };
        Self {
            id: visit.id.unwrap_or_default(),
            uuid: visit.uuid,
            patient_id: visit.patient_id.unwrap_or_default(),
            visit_type_uuid,
            visit_type_name,
            location_uuid,
            location_name,
            start_datetime: visit.start_datetime,
            stop_datetime: visit.stop_datetime,
            encounter_count: visit.encounters.len() as u32,
        }
    }
}

/// FFI-safe encounter. Observations travel as a JSON array string.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiEncounter {
    pub id: i64,
    pub uuid: Option<String>,
    pub display: Option<String>,
    pub encounter_datetime: Option<String>,
    pub encounter_type_uuid: Option<String>,
    pub encounter_type_name: Option<String>,
    pub observations_json: String,
}

impl TryFrom<Encounter> for FfiEncounter {
    type Error = VisitSyncError;

    fn try_from(encounter: Encounter) -> Result<Self, Self::Error> {
        let (encounter_type_uuid, encounter_type_name) = match encounter.encounter_type {
            Some(t) => (Some(t.uuid), t.display),
            None => (None, None),
        };
        Ok(Self {
            id: encounter.id.unwrap_or_default(),
            uuid: encounter.uuid,
            display: encounter.display,
            encounter_datetime: encounter.encounter_datetime,
            encounter_type_uuid,
            encounter_type_name,
            observations_json: serde_json::to_string(&encounter.observations)?,
        })
    }
}
