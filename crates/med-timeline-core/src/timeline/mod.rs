//! Medication exposure timeline.
//!
//! Pipeline: Extraction → Merge → Sort → Range → Filter → Overlay
//!
//! The whole view is a pure function of the patient snapshot, assessment
//! history, filter state, overlay choice and `now`. Nothing is retained
//! between calls; see [`crate::cache`] for memoization.

mod changes;
mod duplicates;
mod extract;
mod overlay;
mod range;
mod summary;

pub use changes::*;
pub use duplicates::*;
pub use extract::*;
pub use overlay::*;
pub use range::*;
pub use summary::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classify::{ClassificationStrategy, SubstringClassifier};
use crate::config::EngineConfig;
use crate::models::{Assessment, DrugExposureEntry, FilterState, Instrument, PatientRecord};

/// Everything a view derivation reads.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineInputs<'a> {
    pub patient: &'a PatientRecord,
    pub assessments: &'a [Assessment],
    pub filters: &'a FilterState,
    /// Instrument to overlay, if the overlay is switched on
    pub overlay: Option<Instrument>,
}

/// A visible entry with its layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VisibleEntry {
    pub entry: DrugExposureEntry,
    /// `None` only for an empty axis
    pub placement: Option<BarPlacement>,
    pub exposure_months: i64,
    pub start_year: i32,
}

/// Complete output handed to the rendering layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimelineView {
    /// Full merged list, ascending by start
    pub entries: Vec<DrugExposureEntry>,
    /// Filtered subset, same order
    pub visible: Vec<VisibleEntry>,
    pub range: TimeRange,
    pub overlay: Option<OverlaySeries>,
    /// Medication change markers on the same axis
    pub change_points: Vec<ChangePoint>,
    pub summary: ExposureSummary,
    pub possible_duplicates: Vec<PossibleDuplicate>,
}

impl TimelineView {
    pub fn visible_names(&self) -> Vec<&str> {
        self.visible.iter().map(|v| v.entry.name.as_str()).collect()
    }
}

/// Derives timeline views.
pub struct TimelineEngine {
    config: EngineConfig,
    classifier: Box<dyn ClassificationStrategy>,
}

impl Default for TimelineEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl TimelineEngine {
    /// Create an engine with the default substring classifier.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            classifier: Box::new(SubstringClassifier::new()),
        }
    }

    /// Replace the classification strategy.
    pub fn with_classifier(mut self, classifier: impl ClassificationStrategy + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Merged, sorted, unfiltered entries.
    pub fn exposures(&self, patient: &PatientRecord, now: DateTime<Utc>) -> Vec<DrugExposureEntry> {
        Extractor::new(&self.config, self.classifier.as_ref(), now).extract(patient)
    }

    /// Derive the full view at `now`.
    pub fn derive(&self, inputs: &TimelineInputs<'_>, now: DateTime<Utc>) -> TimelineView {
        let entries = self.exposures(inputs.patient, now);
        let range = TimeRange::compute(&entries, now, self.config.lookback());

        let visible: Vec<VisibleEntry> = inputs
            .filters
            .apply(&entries)
            .into_iter()
            .map(|entry| VisibleEntry {
                placement: range.place(entry),
                exposure_months: entry.exposure_months(),
                start_year: TimeRange::start_year(entry),
                entry: entry.clone(),
            })
            .collect();

        let overlay = inputs
            .overlay
            .map(|instrument| OverlaySeries::build(inputs.assessments, instrument));

        let change_points = medication_change_points(&inputs.patient.clinical_journey);
        let summary = ExposureSummary::for_patient(inputs.patient, &entries, now);
        let possible_duplicates =
            find_possible_duplicates(&entries, self.config.duplicate_similarity_threshold);

        debug!(
            total = entries.len(),
            visible = visible.len(),
            duplicates = possible_duplicates.len(),
            "derived timeline view"
        );

        TimelineView {
            entries,
            visible,
            range,
            overlay,
            change_points,
            summary,
            possible_duplicates,
        }
    }

    /// Derive the view against the wall clock.
    pub fn derive_at_now(&self, inputs: &TimelineInputs<'_>) -> TimelineView {
        self.derive(inputs, Utc::now())
    }
}
