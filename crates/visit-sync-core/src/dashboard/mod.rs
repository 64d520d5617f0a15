//! Visit dashboard: presents already-persisted encounters of one visit.
//!
//! The controller never talks to the network. It reads the local store and
//! drives a [`VisitDashboardView`] supplied by the display layer.

use std::sync::Arc;

use log::{debug, warn};
use thiserror::Error;

use crate::db::DbResult;
use crate::models::Encounter;
use crate::sync::{LocalVisitStore, SyncReport, SyncResult};

/// Message shown when the vitals form cannot be opened.
pub const FAILED_TO_OPEN_VITALS_FORM: &str = "Failed to open vitals form";

/// The display layer failed to navigate.
#[derive(Error, Debug)]
#[error("Navigation failed: {0}")]
pub struct NavigationError(pub String);

/// Capabilities the display layer exposes to the controller.
pub trait VisitDashboardView: Send + Sync {
    /// True only while attached to a live display surface.
    fn is_active(&self) -> bool;

    /// Replace the displayed encounter list.
    fn update_list(&self, encounters: Vec<Encounter>);

    /// Toggle the empty-state placeholder.
    fn set_empty_list_visibility(&self, visible: bool);

    /// Open the vitals-capture flow for a patient.
    fn start_capture_vitals(&self, patient_id: i64) -> Result<(), NavigationError>;

    /// Report completion to the host and close.
    fn move_to_patient_dashboard(&self);

    /// Show a user-facing error.
    fn show_error(&self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardState {
    Inactive,
    Active,
}

/// Coordinates one visit's dashboard.
pub struct VisitDashboardController {
    view: Arc<dyn VisitDashboardView>,
    store: Arc<dyn LocalVisitStore>,
    patient_id: i64,
    visit_id: i64,
    state: DashboardState,
}

impl VisitDashboardController {
    pub fn new(
        view: Arc<dyn VisitDashboardView>,
        store: Arc<dyn LocalVisitStore>,
        patient_id: i64,
        visit_id: i64,
    ) -> Self {
        Self {
            view,
            store,
            patient_id,
            visit_id,
            state: DashboardState::Inactive,
        }
    }

    pub fn state(&self) -> DashboardState {
        self.state
    }

    /// Become active (on resume) and present current encounters.
    pub fn start(&mut self) -> DbResult<()> {
        self.state = DashboardState::Active;
        self.present()
    }

    /// Become inactive (on teardown).
    pub fn stop(&mut self) {
        self.state = DashboardState::Inactive;
    }

    /// Push the visit's persisted encounters to the view.
    ///
    /// No-op unless both the controller and the view are live.
    pub fn present(&self) -> DbResult<()> {
        if !self.can_update_view() {
            debug!("Dashboard for visit {} not active, skipping update", self.visit_id);
            return Ok(());
        }

        let encounters = self.store.encounters_for_visit(self.visit_id)?;
        let empty = encounters.is_empty();
        self.view.update_list(encounters);
        self.view.set_empty_list_visibility(empty);
        Ok(())
    }

    /// Completion hook for a background sync: refresh if still displayed.
    pub fn on_sync_finished(&self, result: &SyncResult<SyncReport>) -> DbResult<()> {
        match result {
            Ok(_) => self.present(),
            Err(err) => {
                debug!("Sync failed, keeping current list: {}", err);
                Ok(())
            }
        }
    }

    /// Navigate to vitals capture; failures are shown, never escalated.
    pub fn capture_vitals(&self) {
        if let Err(err) = self.view.start_capture_vitals(self.patient_id) {
            warn!("{}", err);
            if self.can_update_view() {
                self.view.show_error(FAILED_TO_OPEN_VITALS_FORM);
            }
        }
    }

    /// Hand control back to the patient dashboard.
    pub fn finish(&mut self) {
        if self.view.is_active() {
            self.view.move_to_patient_dashboard();
        }
        self.state = DashboardState::Inactive;
    }

    fn can_update_view(&self) -> bool {
        self.state == DashboardState::Active && self.view.is_active()
    }
}
