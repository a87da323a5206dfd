//! Summary statistics over the full, unfiltered entry list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{Category, DrugExposureEntry, PatientRecord};
use crate::parse::parse_date;

const MILLIS_PER_YEAR: f64 = 365.25 * 24.0 * 60.0 * 60.0 * 1000.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExposureSummary {
    pub total: usize,
    pub psychiatric: usize,
    pub medical: usize,
    pub supplements: usize,
    pub prn: usize,
    /// Entries with no recorded end
    pub ongoing: usize,
    pub dose_samples: usize,
    /// Years since treatment start, to one decimal. `None` without a usable start
    pub treatment_years: Option<f64>,
    /// Logged medication changes across the clinical journey
    pub medication_switches: usize,
}

impl ExposureSummary {
    /// Entry counts plus the patient's treatment history at `now`.
    pub fn for_patient(
        patient: &PatientRecord,
        entries: &[DrugExposureEntry],
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            treatment_years: treatment_years(patient, now),
            medication_switches: patient.medication_switch_count(),
            ..Self::from_entries(entries)
        }
    }

    pub fn from_entries(entries: &[DrugExposureEntry]) -> Self {
        let mut summary = Self {
            total: entries.len(),
            ..Default::default()
        };
        for entry in entries {
            match entry.category {
                Category::Psychiatric => summary.psychiatric += 1,
                Category::Medical => summary.medical += 1,
                Category::Supplements => summary.supplements += 1,
                Category::Prn => summary.prn += 1,
            }
            if entry.ongoing {
                summary.ongoing += 1;
            }
            summary.dose_samples += entry.dosage_history.len();
        }
        summary
    }

    pub fn count(&self, category: Category) -> usize {
        match category {
            Category::Psychiatric => self.psychiatric,
            Category::Medical => self.medical,
            Category::Supplements => self.supplements,
            Category::Prn => self.prn,
        }
    }
}

/// Years between treatment start and `now`, rounded to 0.1 over 365.25-day years.
pub fn treatment_years(patient: &PatientRecord, now: DateTime<Utc>) -> Option<f64> {
    let raw = patient.treatment_start()?;
    let Some(start) = parse_date(raw) else {
        warn!(patient_id = %patient.id, date = %raw, "unparseable treatment start date");
        return None;
    };
    let years = (now - start).num_milliseconds() as f64 / MILLIS_PER_YEAR;
    Some((years * 10.0).round() / 10.0)
}
