//! Starting a new visit on the server and keeping its canonical copy.

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone};
use log::{info, warn};
use tokio::task::JoinHandle;

use super::notify::spawn_with_listener;
use super::{
    CompletionListener, ErrorSignal, LocalVisitStore, PatientLocks, RemoteVisitSource, SyncError,
    SyncResult,
};
use crate::config::SyncConfig;
use crate::models::{format_request_datetime, Patient, Visit, VisitType};

/// Builds, submits and persists new visits.
pub struct VisitStartWorkflow {
    remote: Arc<dyn RemoteVisitSource>,
    store: Arc<dyn LocalVisitStore>,
    signal: Arc<dyn ErrorSignal>,
    config: SyncConfig,
    locks: Arc<PatientLocks>,
}

impl VisitStartWorkflow {
    pub fn new(
        remote: Arc<dyn RemoteVisitSource>,
        store: Arc<dyn LocalVisitStore>,
        signal: Arc<dyn ErrorSignal>,
        config: SyncConfig,
    ) -> Self {
        Self {
            remote,
            store,
            signal,
            config,
            locks: Arc::new(PatientLocks::new()),
        }
    }

    /// Serialize writes with another component, usually
    /// [`super::VisitSyncEngine::patient_locks`].
    pub fn with_patient_locks(mut self, locks: Arc<PatientLocks>) -> Self {
        self.locks = locks;
        self
    }

    /// Build the create-visit request for a patient, started at `at`.
    ///
    /// The configured location must already be in local reference data.
    pub fn build_visit_request<Tz: TimeZone>(
        &self,
        patient: &Patient,
        at: &DateTime<Tz>,
    ) -> SyncResult<Visit>
    where
        Tz::Offset: std::fmt::Display,
    {
        let location = self
            .store
            .find_location_by_name(&self.config.location_name)?
            .ok_or_else(|| SyncError::LocationNotFound(self.config.location_name.clone()))?;

        Ok(Visit {
            patient: Some(Patient::new(patient.uuid.clone())),
            location: Some(location),
            visit_type: Some(VisitType::new(self.config.visit_type_uuid.clone())),
            start_datetime: Some(format_request_datetime(at)),
            ..Default::default()
        })
    }

    /// Start a visit now; returns the local id of the server's copy.
    pub async fn start_visit(&self, patient: &Patient) -> SyncResult<i64> {
        let result = self.start_visit_inner(patient).await;
        if let Err(err) = &result {
            warn!("Failed to start visit for patient {}: {}", patient.uuid, err);
            self.signal.raise(&err.to_string());
        }
        result
    }

    async fn start_visit_inner(&self, patient: &Patient) -> SyncResult<i64> {
        let owner = patient
            .id
            .filter(|id| *id > 0)
            .ok_or_else(|| SyncError::UnsavedPatient(patient.uuid.clone()))?;

        let request = self.build_visit_request(patient, &Local::now())?;
        let created = self.remote.create_visit(&request).await?;

        // A sync may already have pulled the new visit; keep one row per UUID.
        let _guard = self.locks.lock(&patient.uuid).await?;
        let existing = match created.uuid.as_deref() {
            Some(uuid) => self.store.find_visit_id_by_uuid(uuid)?,
            None => None,
        };
        let visit_id = match existing {
            Some(visit_id) if visit_id > 0 => {
                self.store.update_visit(&created, visit_id, owner)?;
                visit_id
            }
            _ => self.store.insert_visit(&created, owner)?,
        };

        info!(
            "Started visit {} for patient {} (local id {})",
            created.uuid.as_deref().unwrap_or("<no uuid>"),
            patient.uuid,
            visit_id
        );
        Ok(visit_id)
    }

    /// Run [`Self::start_visit`] in the background.
    pub fn spawn_start_visit(
        self: &Arc<Self>,
        patient: Patient,
        listener: Option<Arc<dyn CompletionListener<i64>>>,
    ) -> JoinHandle<()> {
        let workflow = Arc::clone(self);
        spawn_with_listener(async move { workflow.start_visit(&patient).await }, listener)
    }
}
