//! Fetch → reconcile → persist for one patient at a time.

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::task::JoinHandle;

use super::notify::spawn_with_listener;
use super::{
    CompletionListener, ErrorSignal, LastVitalsQuery, LocalVisitStore, PatientLocks,
    RemoteVisitSource, SyncError, SyncReport, SyncResult,
};
use crate::config::SyncConfig;
use crate::models::{Patient, Visit, VisitType};

/// Orchestrates remote → local synchronization of visits and vitals.
///
/// Syncs of one patient are serialized from fetch through commit, so two
/// overlapping syncs never both miss on the UUID lookup, and they commit in
/// the order they fetched. Share [`Self::patient_locks`] with a
/// [`super::VisitStartWorkflow`] to serialize its writes as well.
pub struct VisitSyncEngine {
    remote: Arc<dyn RemoteVisitSource>,
    store: Arc<dyn LocalVisitStore>,
    signal: Arc<dyn ErrorSignal>,
    config: SyncConfig,
    locks: Arc<PatientLocks>,
}

impl VisitSyncEngine {
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

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Per-patient locks guarding this engine's writes.
    pub fn patient_locks(&self) -> Arc<PatientLocks> {
        Arc::clone(&self.locks)
    }

    /// Fetch all visits of a patient and upsert them by UUID.
    ///
    /// Safe to repeat: an unchanged remote set only produces updates.
    pub async fn sync_visits(&self, patient: &Patient) -> SyncResult<SyncReport> {
        let result = self.sync_visits_inner(patient).await;
        self.surface(result)
    }

    async fn sync_visits_inner(&self, patient: &Patient) -> SyncResult<SyncReport> {
        let owner = patient
            .id
            .filter(|id| *id > 0)
            .ok_or_else(|| SyncError::UnsavedPatient(patient.uuid.clone()))?;

        let _guard = self.locks.lock(&patient.uuid).await?;
        let visits = self
            .remote
            .find_visits(&patient.uuid, &self.config.visit_expansion)
            .await?;

        // SQLite calls block; keep them off the async workers.
        let store = Arc::clone(&self.store);
        let report =
            tokio::task::spawn_blocking(move || reconcile(store.as_ref(), &visits, owner))
                .await??;

        info!(
            "Synced visits for patient {}: {} inserted, {} updated, {} skipped",
            patient.uuid, report.inserted, report.updated, report.skipped
        );
        Ok(report)
    }

    /// Fetch the newest vitals encounter and store it as the patient's last vitals.
    ///
    /// Returns whether anything was stored; an empty result is still a success.
    pub async fn sync_last_vitals(&self, patient_uuid: &str) -> SyncResult<bool> {
        let result = self.sync_last_vitals_inner(patient_uuid).await;
        self.surface(result)
    }

    async fn sync_last_vitals_inner(&self, patient_uuid: &str) -> SyncResult<bool> {
        let query = LastVitalsQuery::latest(patient_uuid, &self.config.vitals_encounter_type_uuid);
        let encounters = self.remote.get_last_vitals(&query).await?;

        match encounters.first() {
            Some(encounter) => {
                self.store.save_last_vitals(encounter, patient_uuid)?;
                debug!("Stored last vitals for patient {}", patient_uuid);
                Ok(true)
            }
            None => {
                debug!("No vitals on server for patient {}", patient_uuid);
                Ok(false)
            }
        }
    }

    /// Fetch visit types and return the first as the default.
    pub async fn fetch_visit_type(&self) -> SyncResult<VisitType> {
        let result = async {
            let mut types = self.remote.get_visit_types().await?;
            if types.is_empty() {
                return Err(SyncError::EmptyVisitTypes);
            }
            Ok(types.swap_remove(0))
        }
        .await;
        self.surface(result)
    }

    /// Run [`Self::sync_visits`] in the background.
    pub fn spawn_sync_visits(
        self: &Arc<Self>,
        patient: Patient,
        listener: Option<Arc<dyn CompletionListener<SyncReport>>>,
    ) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        spawn_with_listener(async move { engine.sync_visits(&patient).await }, listener)
    }

    /// Run [`Self::sync_last_vitals`] in the background.
    pub fn spawn_sync_last_vitals(
        self: &Arc<Self>,
        patient_uuid: String,
        listener: Option<Arc<dyn CompletionListener<bool>>>,
    ) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        spawn_with_listener(
            async move { engine.sync_last_vitals(&patient_uuid).await },
            listener,
        )
    }

    /// Run [`Self::fetch_visit_type`] in the background.
    pub fn spawn_fetch_visit_type(
        self: &Arc<Self>,
        listener: Arc<dyn CompletionListener<VisitType>>,
    ) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        spawn_with_listener(async move { engine.fetch_visit_type().await }, Some(listener))
    }

    /// Raise failures on the error signal before handing them back.
    fn surface<T>(&self, result: SyncResult<T>) -> SyncResult<T> {
        if let Err(err) = &result {
            warn!("Sync operation failed: {}", err);
            self.signal.raise(&err.to_string());
        }
        result
    }
}

/// Upsert a batch of remote visits in the order received.
///
/// Records written before a store failure stay committed.
fn reconcile(
    store: &dyn LocalVisitStore,
    visits: &[Visit],
    owner: i64,
) -> SyncResult<SyncReport> {
    let mut report = SyncReport::default();

    for visit in visits {
        let Some(uuid) = visit.uuid.as_deref() else {
            warn!("Skipping remote visit without a UUID");
            report.skipped += 1;
            continue;
        };

        match store.find_visit_id_by_uuid(uuid)? {
            Some(visit_id) if visit_id > 0 => {
                debug!("Updating visit {} (local id {})", uuid, visit_id);
                store.update_visit(visit, visit_id, owner)?;
                report.updated += 1;
            }
            _ => {
                let visit_id = store.insert_visit(visit, owner)?;
                debug!("Inserted visit {} as local id {}", uuid, visit_id);
                report.inserted += 1;
            }
        }
    }

    Ok(report)
}
