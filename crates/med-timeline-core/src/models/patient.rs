//! Patient record snapshot models.
//!
//! These mirror the JSON the backend hands the dashboard. The engine only
//! reads them; fields it has no use for (demographics, ABHA, intake notes)
//! are ignored during deserialization.

use serde::{Deserialize, Serialize};

/// A patient record snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    /// Backend patient ID
    #[serde(default)]
    pub id: String,
    /// Patient display name
    #[serde(default)]
    pub name: String,
    /// Date of the first psychiatric diagnosis, if known
    #[serde(default)]
    pub first_diagnosis_date: Option<String>,
    /// Facility visits, in the order the backend returned them
    #[serde(default)]
    pub clinical_journey: Vec<ClinicalJourneyRecord>,
    /// Chronic conditions with structured medication sub-records
    #[serde(default)]
    pub medical_history: Vec<MedicalIllness>,
    /// Lab/vital series
    #[serde(default)]
    pub biomarkers: Option<BiomarkerSet>,
}

/// A single facility visit in the patient's clinical journey.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalJourneyRecord {
    /// Visit date
    pub date: String,
    /// End of the prescribed course, if recorded
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub facility: String,
    #[serde(default)]
    pub clinician: String,
    #[serde(default)]
    pub reason_for_visit: String,
    /// Visit outcome (used as the exposure note)
    #[serde(default)]
    pub outcome: Option<String>,
    /// Free-text "Name dose" strings
    #[serde(default)]
    pub prescribed_medications: Vec<String>,
    /// Free-text change log ("Switched X to Y")
    #[serde(default)]
    pub medication_changes: Vec<String>,
}

/// A chronic medical condition.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MedicalIllness {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub is_medicated: bool,
    #[serde(default)]
    pub medications: Vec<Medication>,
}

/// A structured medication attached to a medical illness.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub name: String,
    /// Free-text dose (e.g., "500mg")
    #[serde(default)]
    pub dosage: String,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    /// Free-text class label (e.g., "Anti-diabetic")
    #[serde(default)]
    pub drug_class: Option<String>,
}

/// A dated biomarker measurement.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BiomarkerRecord {
    pub date: String,
    pub value: f64,
}

/// Named biomarker series. Missing series deserialize as empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BiomarkerSet {
    pub weight: Vec<BiomarkerRecord>,
    #[serde(rename = "systolicBP")]
    pub systolic_bp: Vec<BiomarkerRecord>,
    #[serde(rename = "diastolicBP")]
    pub diastolic_bp: Vec<BiomarkerRecord>,
    pub sleep_hours: Vec<BiomarkerRecord>,
    pub vitamin_d: Vec<BiomarkerRecord>,
    #[serde(rename = "vitaminB12")]
    pub vitamin_b12: Vec<BiomarkerRecord>,
    #[serde(rename = "hbA1c")]
    pub hb_a1c: Vec<BiomarkerRecord>,
}

impl PatientRecord {
    /// Decode a snapshot from the backend's JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Number of medication strings/sub-records across all sources.
    pub fn medication_mention_count(&self) -> usize {
        let journey: usize = self
            .clinical_journey
            .iter()
            .map(|r| r.prescribed_medications.len())
            .sum();
        let history: usize = self.medical_history.iter().map(|i| i.medications.len()).sum();
        journey + history
    }

    /// Medication changes logged across the whole clinical journey.
    pub fn medication_switch_count(&self) -> usize {
        self.clinical_journey
            .iter()
            .map(|r| r.medication_changes.len())
            .sum()
    }

    /// Raw treatment start: the first diagnosis date, else the first visit's date.
    pub fn treatment_start(&self) -> Option<&str> {
        self.first_diagnosis_date
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .or_else(|| self.clinical_journey.first().map(|r| r.date.as_str()))
    }

    /// The vitamin D series, if any samples were recorded.
    pub fn vitamin_d(&self) -> Option<&[BiomarkerRecord]> {
        self.biomarkers
            .as_ref()
            .map(|b| b.vitamin_d.as_slice())
            .filter(|s| !s.is_empty())
    }
}
