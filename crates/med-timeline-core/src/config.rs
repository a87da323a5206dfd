//! Engine configuration.
//!
//! Every field has a default matching the dashboard's behaviour, so an empty
//! JSON object is a valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::KeyNormalization;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid value: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Longest accepted lookback window (100 years).
pub const MAX_LOOKBACK_DAYS: i64 = 36_500;

/// How a repeated journey medication updates the interval end.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum IntervalMergePolicy {
    /// The last-processed record's end replaces the current end, even if earlier
    #[default]
    LastWriteWins,
    /// The later of the two ends is kept
    Widen,
}

/// Timeline engine settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Minimum axis span before "now", in days
    pub lookback_days: i64,
    /// Dose used when a journey string has no digits
    pub journey_fallback_dose: u32,
    /// Dose used when a medical-history dosage has no digits
    pub medical_fallback_dose: u32,
    /// Dose recorded for the inferred vitamin D supplement
    pub supplement_dose: u32,
    pub supplement_name: String,
    pub default_journey_note: String,
    pub medical_note: String,
    pub supplement_note: String,
    pub merge_policy: IntervalMergePolicy,
    pub key_normalization: KeyNormalization,
    /// Name similarity at which two entries are flagged as possible duplicates
    pub duplicate_similarity_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lookback_days: 365,
            journey_fallback_dose: 10,
            medical_fallback_dose: 500,
            supplement_dose: 60_000,
            supplement_name: "Vitamin D3 (Cholecalciferol)".into(),
            default_journey_note: "Maintenance dose".into(),
            medical_note: "Chronic condition management".into(),
            supplement_note: "Corrective supplementation".into(),
            merge_policy: IntervalMergePolicy::default(),
            key_normalization: KeyNormalization::default(),
            duplicate_similarity_threshold: 0.92,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !(1..=MAX_LOOKBACK_DAYS).contains(&self.lookback_days) {
            return Err(ConfigError::Invalid(format!(
                "lookbackDays must be within 1..={}, got {}",
                MAX_LOOKBACK_DAYS, self.lookback_days
            )));
        }
        if !(0.0..=1.0).contains(&self.duplicate_similarity_threshold) {
            return Err(ConfigError::Invalid(format!(
                "duplicateSimilarityThreshold must be within 0..=1, got {}",
                self.duplicate_similarity_threshold
            )));
        }
        Ok(())
    }

    /// Lookback window. Out-of-range values saturate rather than panic.
    pub fn lookback(&self) -> chrono::Duration {
        chrono::Duration::try_days(self.lookback_days).unwrap_or(if self.lookback_days < 0 {
            chrono::Duration::MIN
        } else {
            chrono::Duration::MAX
        })
    }
}
