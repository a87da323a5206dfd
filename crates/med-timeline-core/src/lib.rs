//! Med-Timeline Core Library
//!
//! Medication exposure timeline reconciliation for a psychiatric patient view.
//!
//! # Architecture
//!
//! ```text
//! Patient snapshot ──┬── Clinical journey ──► merge by MedicationKey ─┐
//!                    ├── Medical history ───► one entry per sub-record ├──► sort by start
//!                    └── Vitamin D series ──► inferred supplement ─────┘        │
//!                                                                               ▼
//!                                              ┌──────────────── entries (full list)
//!                                              │                                │
//!                                         TimeRange                        FilterState
//!                                     [min(starts, now-1y), now]           category AND class
//!                                              │                                │
//! Assessments ──► OverlaySeries ───────────────┴──────────► TimelineView ◄──────┘
//! ```
//!
//! # Core Principle
//!
//! **Derivation never fails.** Missing or malformed source values fall back to
//! fixed defaults or are left out; they never produce a bogus timestamp.
//!
//! # Modules
//!
//! - [`models`]: Source records, exposure entries, filter state
//! - [`classify`]: Pluggable category/class inference for free-text names
//! - [`timeline`]: Extraction, merge, range, overlay, change points, summary
//! - [`cache`]: Fingerprint-based memoization of views
//! - [`config`]: Engine configuration

pub mod cache;
pub mod classify;
pub mod config;
pub mod models;
pub mod parse;
pub mod timeline;

// Re-export commonly used types
pub use cache::ViewCache;
pub use classify::{ClassificationStrategy, SubstringClassifier};
pub use config::{EngineConfig, IntervalMergePolicy};
pub use models::{
    Assessment, Category, ClassKey, DrugClass, DrugExposureEntry, FilterState, Instrument,
    KeyNormalization, MedicationKey, PatientRecord,
};
pub use timeline::{TimelineEngine, TimelineInputs, TimelineView};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum MedTimelineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl From<serde_json::Error> for MedTimelineError {
    fn from(e: serde_json::Error) -> Self {
        MedTimelineError::SerializationError(e.to_string())
    }
}

impl From<config::ConfigError> for MedTimelineError {
    fn from(e: config::ConfigError) -> Self {
        MedTimelineError::ConfigError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for MedTimelineError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        MedTimelineError::LockPoisoned(e.to_string())
    }
}

fn instant_from_millis(millis: i64) -> Result<DateTime<Utc>, MedTimelineError> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| MedTimelineError::InvalidInput(format!("timestamp out of range: {}", millis)))
}

fn parse_overlay(overlay: Option<String>) -> Result<Option<Instrument>, MedTimelineError> {
    overlay
        .map(|tag| {
            Instrument::from_tag(&tag)
                .ok_or_else(|| MedTimelineError::InvalidInput(format!("unknown instrument: {}", tag)))
        })
        .transpose()
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Derive a timeline view in one call, without session state.
#[uniffi::export]
pub fn derive_timeline(
    patient_json: String,
    assessments_json: String,
    filters: FfiFilterState,
    overlay: Option<String>,
    now_millis: i64,
) -> Result<FfiTimelineView, MedTimelineError> {
    let patient = PatientRecord::from_json(&patient_json)?;
    let assessments = Assessment::list_from_json(&assessments_json)?;
    let filters: FilterState = filters.into();
    let inputs = TimelineInputs {
        patient: &patient,
        assessments: &assessments,
        filters: &filters,
        overlay: parse_overlay(overlay)?,
    };

    let engine = TimelineEngine::default();
    let view = engine.derive(&inputs, instant_from_millis(now_millis)?);
    Ok(view.into())
}

/// Open a timeline session. `config_json` overrides the default configuration.
#[uniffi::export]
pub fn open_session(config_json: Option<String>) -> Result<Arc<TimelineSession>, MedTimelineError> {
    let config = match config_json {
        Some(json) => EngineConfig::from_json_str(&json)?,
        None => EngineConfig::default(),
    };
    Ok(Arc::new(TimelineSession {
        engine: TimelineEngine::new(config),
        state: Arc::new(Mutex::new(SessionState::default())),
    }))
}

// =========================================================================
// Main API Object
// =========================================================================

#[derive(Default)]
struct SessionState {
    filters: FilterState,
    cache: ViewCache,
}

/// Filter state and memoized view for one open patient timeline.
#[derive(uniffi::Object)]
pub struct TimelineSession {
    engine: TimelineEngine,
    state: Arc<Mutex<SessionState>>,
}

#[uniffi::export]
impl TimelineSession {
    // =========================================================================
    // Filter Operations
    // =========================================================================

    /// Set a category toggle by its dashboard key (e.g., "medical").
    pub fn set_category(&self, key: String, enabled: bool) -> Result<(), MedTimelineError> {
        let category = Category::from_key(&key)
            .ok_or_else(|| MedTimelineError::InvalidInput(format!("unknown category: {}", key)))?;
        let mut state = self.state.lock()?;
        state.filters.set_category(category, enabled);
        Ok(())
    }

    /// Set a class toggle by its dashboard key (e.g., "moodStabilizer").
    pub fn set_class(&self, key: String, enabled: bool) -> Result<(), MedTimelineError> {
        let class = ClassKey::from_label(&key)
            .ok_or_else(|| MedTimelineError::InvalidInput(format!("unknown class: {}", key)))?;
        let mut state = self.state.lock()?;
        state.filters.set_class(class, enabled);
        Ok(())
    }

    /// Restore default toggles.
    pub fn reset_filters(&self) -> Result<(), MedTimelineError> {
        let mut state = self.state.lock()?;
        state.filters.reset();
        Ok(())
    }

    /// Current toggles.
    pub fn filters(&self) -> Result<FfiFilterState, MedTimelineError> {
        let state = self.state.lock()?;
        Ok(state.filters.into())
    }

    // =========================================================================
    // View Operations
    // =========================================================================

    /// Derive (or reuse) the view for a patient snapshot.
    pub fn view(
        &self,
        patient_json: String,
        assessments_json: String,
        overlay: Option<String>,
        now_millis: i64,
    ) -> Result<FfiTimelineView, MedTimelineError> {
        let patient = PatientRecord::from_json(&patient_json)?;
        let assessments = Assessment::list_from_json(&assessments_json)?;
        let overlay = parse_overlay(overlay)?;
        let now = instant_from_millis(now_millis)?;

        let mut state = self.state.lock()?;
        let SessionState { filters, cache } = &mut *state;
        let inputs = TimelineInputs {
            patient: &patient,
            assessments: &assessments,
            filters: &*filters,
            overlay,
        };
        let view = cache.get_or_derive(&self.engine, &inputs, now)?;
        Ok(view.clone().into())
    }

    /// Number of views served from the cache.
    pub fn cache_hits(&self) -> Result<u64, MedTimelineError> {
        let state = self.state.lock()?;
        Ok(state.cache.hits())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe filter state.
#[derive(Debug, Clone, Copy, uniffi::Record)]
pub struct FfiFilterState {
    pub psychiatric: bool,
    pub medical: bool,
    pub supplements: bool,
    pub prn: bool,
    pub ssri: bool,
    pub benzodiazepine: bool,
    pub antipsychotic: bool,
    pub mood_stabilizer: bool,
    pub antidiabetic: bool,
    pub vitamins: bool,
}

impl From<FilterState> for FfiFilterState {
    fn from(f: FilterState) -> Self {
        Self {
            psychiatric: f.categories.psychiatric,
            medical: f.categories.medical,
            supplements: f.categories.supplements,
            prn: f.categories.prn,
            ssri: f.classes.ssri,
            benzodiazepine: f.classes.benzodiazepine,
            antipsychotic: f.classes.antipsychotic,
            mood_stabilizer: f.classes.mood_stabilizer,
            antidiabetic: f.classes.antidiabetic,
            vitamins: f.classes.vitamins,
        }
    }
}

impl From<FfiFilterState> for FilterState {
    fn from(f: FfiFilterState) -> Self {
        FilterState {
            categories: models::CategoryFilter {
                psychiatric: f.psychiatric,
                medical: f.medical,
                supplements: f.supplements,
                prn: f.prn,
            },
            classes: models::ClassFilter {
                ssri: f.ssri,
                benzodiazepine: f.benzodiazepine,
                antipsychotic: f.antipsychotic,
                mood_stabilizer: f.mood_stabilizer,
                antidiabetic: f.antidiabetic,
                vitamins: f.vitamins,
            },
        }
    }
}

/// FFI-safe dose sample.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDoseSample {
    pub date_millis: Option<i64>,
    pub value: u32,
}

/// FFI-safe exposure entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiExposureEntry {
    pub key: String,
    pub name: String,
    pub category: String,
    pub drug_class: String,
    pub start_millis: i64,
    pub end_millis: i64,
    pub ongoing: bool,
    pub dosage_history: Vec<FfiDoseSample>,
    pub notes: String,
}

impl From<DrugExposureEntry> for FfiExposureEntry {
    fn from(entry: DrugExposureEntry) -> Self {
        Self {
            key: entry.key.to_string(),
            name: entry.name,
            category: entry.category.key().to_string(),
            drug_class: entry.drug_class.label().to_string(),
            start_millis: entry.start.timestamp_millis(),
            end_millis: entry.end.timestamp_millis(),
            ongoing: entry.ongoing,
            dosage_history: entry
                .dosage_history
                .into_iter()
                .map(|s| FfiDoseSample {
                    date_millis: s.date.map(|d| d.timestamp_millis()),
                    value: s.value,
                })
                .collect(),
            notes: entry.notes,
        }
    }
}

/// FFI-safe visible entry with layout.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiVisibleEntry {
    pub entry: FfiExposureEntry,
    pub left_pct: Option<f64>,
    pub width_pct: Option<f64>,
    pub exposure_months: i64,
    pub start_year: i32,
}

impl From<timeline::VisibleEntry> for FfiVisibleEntry {
    fn from(v: timeline::VisibleEntry) -> Self {
        Self {
            left_pct: v.placement.map(|p| p.left_pct),
            width_pct: v.placement.map(|p| p.width_pct),
            exposure_months: v.exposure_months,
            start_year: v.start_year,
            entry: v.entry.into(),
        }
    }
}

/// FFI-safe overlay point.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiOverlayPoint {
    pub time_millis: i64,
    pub score: u32,
}

/// FFI-safe overlay series.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiOverlaySeries {
    pub instrument: String,
    pub max_score: u32,
    pub points: Vec<FfiOverlayPoint>,
}

impl From<timeline::OverlaySeries> for FfiOverlaySeries {
    fn from(series: timeline::OverlaySeries) -> Self {
        Self {
            instrument: series.instrument.tag().to_string(),
            max_score: series.max_score,
            points: series
                .points
                .into_iter()
                .map(|p| FfiOverlayPoint {
                    time_millis: p.time.timestamp_millis(),
                    score: p.score,
                })
                .collect(),
        }
    }
}

/// FFI-safe summary statistics.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiExposureSummary {
    pub total: u32,
    pub psychiatric: u32,
    pub medical: u32,
    pub supplements: u32,
    pub prn: u32,
    pub ongoing: u32,
    pub dose_samples: u32,
    pub treatment_years: Option<f64>,
    pub medication_switches: u32,
}

/// Counts saturate at `u32::MAX` across the FFI boundary.
fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

impl From<timeline::ExposureSummary> for FfiExposureSummary {
    fn from(s: timeline::ExposureSummary) -> Self {
        Self {
            total: saturating_u32(s.total),
            psychiatric: saturating_u32(s.psychiatric),
            medical: saturating_u32(s.medical),
            supplements: saturating_u32(s.supplements),
            prn: saturating_u32(s.prn),
            ongoing: saturating_u32(s.ongoing),
            dose_samples: saturating_u32(s.dose_samples),
            treatment_years: s.treatment_years,
            medication_switches: saturating_u32(s.medication_switches),
        }
    }
}

/// FFI-safe medication change marker.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiChangePoint {
    pub time_millis: i64,
    pub label: String,
}

/// FFI-safe possible duplicate pair.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPossibleDuplicate {
    pub first: String,
    pub second: String,
    pub similarity: f64,
}

/// FFI-safe timeline view.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTimelineView {
    pub entries: Vec<FfiExposureEntry>,
    pub visible: Vec<FfiVisibleEntry>,
    pub range_min_millis: i64,
    pub range_max_millis: i64,
    pub overlay: Option<FfiOverlaySeries>,
    pub change_points: Vec<FfiChangePoint>,
    pub summary: FfiExposureSummary,
    pub possible_duplicates: Vec<FfiPossibleDuplicate>,
}

impl From<TimelineView> for FfiTimelineView {
    fn from(view: TimelineView) -> Self {
        Self {
            entries: view.entries.into_iter().map(|e| e.into()).collect(),
            visible: view.visible.into_iter().map(|v| v.into()).collect(),
            range_min_millis: view.range.min.timestamp_millis(),
            range_max_millis: view.range.max.timestamp_millis(),
            overlay: view.overlay.map(|o| o.into()),
            change_points: view
                .change_points
                .into_iter()
                .map(|c| FfiChangePoint {
                    time_millis: c.time.timestamp_millis(),
                    label: c.label,
                })
                .collect(),
            summary: view.summary.into(),
            possible_duplicates: view
                .possible_duplicates
                .into_iter()
                .map(|d| FfiPossibleDuplicate {
                    first: d.first.to_string(),
                    second: d.second.to_string(),
                    similarity: d.similarity,
                })
                .collect(),
        }
    }
}
