//! Contract for the local visit store, and its SQLite implementation.

use crate::db::{DbResult, SharedDatabase};
use crate::models::{Encounter, Location, Visit};

/// Identity-keyed CRUD over locally persisted visits.
///
/// No merge logic lives here; reconciliation decides insert versus update.
pub trait LocalVisitStore: Send + Sync {
    /// Local id of the visit carrying this server UUID.
    fn find_visit_id_by_uuid(&self, uuid: &str) -> DbResult<Option<i64>>;

    /// Insert a visit owned by a patient; returns the new local id.
    fn insert_visit(&self, visit: &Visit, patient_id: i64) -> DbResult<i64>;

    /// Overwrite every field of an existing visit.
    fn update_visit(&self, visit: &Visit, visit_id: i64, patient_id: i64) -> DbResult<()>;

    /// Replace the patient's last known vitals.
    fn save_last_vitals(&self, encounter: &Encounter, patient_uuid: &str) -> DbResult<()>;

    /// Facility location by display name.
    fn find_location_by_name(&self, name: &str) -> DbResult<Option<Location>>;

    /// Encounters already persisted for a visit.
    fn encounters_for_visit(&self, visit_id: i64) -> DbResult<Vec<Encounter>>;
}

impl LocalVisitStore for SharedDatabase {
    fn find_visit_id_by_uuid(&self, uuid: &str) -> DbResult<Option<i64>> {
        self.lock()?.find_visit_id_by_uuid(uuid)
    }

    fn insert_visit(&self, visit: &Visit, patient_id: i64) -> DbResult<i64> {
        self.lock()?.insert_visit(visit, patient_id)
    }

    fn update_visit(&self, visit: &Visit, visit_id: i64, patient_id: i64) -> DbResult<()> {
        self.lock()?.update_visit(visit, visit_id, patient_id)
    }

    fn save_last_vitals(&self, encounter: &Encounter, patient_uuid: &str) -> DbResult<()> {
        self.lock()?.save_last_vitals(encounter, patient_uuid)
    }

    fn find_location_by_name(&self, name: &str) -> DbResult<Option<Location>> {
        self.lock()?.find_location_by_name(name)
    }

    fn encounters_for_visit(&self, visit_id: i64) -> DbResult<Vec<Encounter>> {
        self.lock()?.list_encounters_for_visit(visit_id)
    }
}
