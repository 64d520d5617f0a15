//! Sync configuration, passed explicitly to the engine and remote client.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Field expansion that yields everything reconciliation needs in one round trip.
pub const VISIT_EXPANSION: &str =
    "custom:(uuid,location:ref,visitType:ref,startDatetime,stopDatetime,encounters:full)";

/// Encounter type UUID for vitals in the reference application.
pub const VITALS_ENCOUNTER_TYPE_UUID: &str = "67a71486-1a54-468f-ac3e-7091a9a79584";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing config value: {0}")]
    Missing(&'static str),
}

fn default_visit_expansion() -> String {
    VISIT_EXPANSION.to_string()
}

fn default_vitals_encounter_type() -> String {
    VITALS_ENCOUNTER_TYPE_UUID.to_string()
}

/// Settings for the sync engine and start-visit workflow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    /// Server base URL, e.g. `https://demo.openmrs.org/openmrs`
    pub server_url: String,
    /// Facility location name used when starting visits
    pub location_name: String,
    /// Visit type UUID used when starting visits
    pub visit_type_uuid: String,
    #[serde(default = "default_vitals_encounter_type")]
    pub vitals_encounter_type_uuid: String,
    #[serde(default = "default_visit_expansion")]
    pub visit_expansion: String,
}

impl SyncConfig {
    /// Create a config with default expansion and vitals type.
    pub fn new(
        server_url: impl Into<String>,
        location_name: impl Into<String>,
        visit_type_uuid: impl Into<String>,
    ) -> Self {
        Self {
            server_url: server_url.into(),
            location_name: location_name.into(),
            visit_type_uuid: visit_type_uuid.into(),
            vitals_encounter_type_uuid: default_vitals_encounter_type(),
            visit_expansion: default_visit_expansion(),
        }
    }

    /// Parse a JSON config document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server_url.trim().is_empty() {
            return Err(ConfigError::Missing("serverUrl"));
        }
        if self.location_name.trim().is_empty() {
            return Err(ConfigError::Missing("locationName"));
        }
        if self.visit_type_uuid.trim().is_empty() {
            return Err(ConfigError::Missing("visitTypeUuid"));
        }
        Ok(())
    }
}
