//! Derived drug-exposure models.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provenance-based medication category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Psychiatric,
    Medical,
    Supplements,
    Prn,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Psychiatric,
        Category::Medical,
        Category::Supplements,
        Category::Prn,
    ];

    /// Filter key used by the dashboard.
    pub fn key(&self) -> &'static str {
        match self {
            Category::Psychiatric => "psychiatric",
            Category::Medical => "medical",
            Category::Supplements => "supplements",
            Category::Prn => "prn",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Category::ALL
            .into_iter()
            .find(|c| c.key().eq_ignore_ascii_case(key.trim()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Therapeutic classes that have a filter toggle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ClassKey {
    Ssri,
    Benzodiazepine,
    Antipsychotic,
    MoodStabilizer,
    Antidiabetic,
    Vitamins,
}

impl ClassKey {
    pub const ALL: [ClassKey; 6] = [
        ClassKey::Ssri,
        ClassKey::Benzodiazepine,
        ClassKey::Antipsychotic,
        ClassKey::MoodStabilizer,
        ClassKey::Antidiabetic,
        ClassKey::Vitamins,
    ];

    /// Filter key used by the dashboard.
    pub fn key(&self) -> &'static str {
        match self {
            ClassKey::Ssri => "ssri",
            ClassKey::Benzodiazepine => "benzodiazepine",
            ClassKey::Antipsychotic => "antipsychotic",
            ClassKey::MoodStabilizer => "moodStabilizer",
            ClassKey::Antidiabetic => "antidiabetic",
            ClassKey::Vitamins => "vitamins",
        }
    }

    /// Match a label by its compact form (lowercase, alphanumerics only).
    pub fn from_label(label: &str) -> Option<Self> {
        let compact = compact_label(label);
        ClassKey::ALL
            .into_iter()
            .find(|k| compact_label(k.key()) == compact)
    }
}

/// Coarse pharmacological class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum DrugClass {
    Ssri,
    Benzodiazepine,
    Antipsychotic,
    MoodStabilizer,
    Antidiabetic,
    Vitamins,
    Other,
    /// A class label with no filter toggle, carried verbatim
    Unlisted(String),
}

impl DrugClass {
    /// Map a free-text class label onto a known class.
    pub fn parse(label: &str) -> Self {
        if let Some(key) = ClassKey::from_label(label) {
            return DrugClass::from(key);
        }
        let trimmed = label.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("other") {
            DrugClass::Other
        } else {
            DrugClass::Unlisted(trimmed.to_string())
        }
    }

    /// Display label.
    pub fn label(&self) -> &str {
        match self {
            DrugClass::Ssri => "SSRI",
            DrugClass::Benzodiazepine => "Benzodiazepine",
            DrugClass::Antipsychotic => "Antipsychotic",
            DrugClass::MoodStabilizer => "Mood Stabilizer",
            DrugClass::Antidiabetic => "Anti-diabetic",
            DrugClass::Vitamins => "Vitamins",
            DrugClass::Other => "Other",
            DrugClass::Unlisted(label) => label,
        }
    }

    /// The filter toggle gating this class, if it has one.
    pub fn filter_key(&self) -> Option<ClassKey> {
        match self {
            DrugClass::Ssri => Some(ClassKey::Ssri),
            DrugClass::Benzodiazepine => Some(ClassKey::Benzodiazepine),
            DrugClass::Antipsychotic => Some(ClassKey::Antipsychotic),
            DrugClass::MoodStabilizer => Some(ClassKey::MoodStabilizer),
            DrugClass::Antidiabetic => Some(ClassKey::Antidiabetic),
            DrugClass::Vitamins => Some(ClassKey::Vitamins),
            DrugClass::Other | DrugClass::Unlisted(_) => None,
        }
    }
}

impl From<ClassKey> for DrugClass {
    fn from(key: ClassKey) -> Self {
        match key {
            ClassKey::Ssri => DrugClass::Ssri,
            ClassKey::Benzodiazepine => DrugClass::Benzodiazepine,
            ClassKey::Antipsychotic => DrugClass::Antipsychotic,
            ClassKey::MoodStabilizer => DrugClass::MoodStabilizer,
            ClassKey::Antidiabetic => DrugClass::Antidiabetic,
            ClassKey::Vitamins => DrugClass::Vitamins,
        }
    }
}

impl From<String> for DrugClass {
    fn from(label: String) -> Self {
        DrugClass::parse(&label)
    }
}

impl From<DrugClass> for String {
    fn from(class: DrugClass) -> Self {
        class.label().to_string()
    }
}

impl fmt::Display for DrugClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn compact_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// How medication names are compared when merging journey records.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum KeyNormalization {
    /// Byte-for-byte equality
    #[default]
    Exact,
    /// Lowercased, trimmed, inner whitespace runs collapsed to one space
    CaseAndWhitespace,
}

/// Merge identity of a medication.
///
/// Two names produce equal keys only if they are equal under the chosen
/// [`KeyNormalization`]. "Sertraline 50mg" and "Sertraline 50 mg" stay
/// distinct under both modes; see `timeline::find_possible_duplicates`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MedicationKey(String);

impl MedicationKey {
    pub fn new(name: &str, normalization: KeyNormalization) -> Self {
        match normalization {
            KeyNormalization::Exact => Self(name.to_string()),
            KeyNormalization::CaseAndWhitespace => Self(
                name.split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
                    .to_lowercase(),
            ),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MedicationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One dose observation contributed by a source record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoseSample {
    /// Source record date (absent for undated medical sub-records)
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub date: Option<DateTime<Utc>>,
    pub value: u32,
}

/// A reconciled drug-exposure interval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DrugExposureEntry {
    /// Merge identity
    pub key: MedicationKey,
    /// Display name (first spelling seen)
    pub name: String,
    pub category: Category,
    pub drug_class: DrugClass,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub end: DateTime<Utc>,
    /// True when `end` was defaulted to "now"
    pub ongoing: bool,
    /// Dose samples in processing order
    pub dosage_history: Vec<DoseSample>,
    pub notes: String,
}

impl DrugExposureEntry {
    /// Exposure length; zero if the interval was shrunk below its start.
    pub fn duration(&self) -> chrono::Duration {
        (self.end - self.start).max(chrono::Duration::zero())
    }

    /// Exposure length in 30-day months, rounded to nearest.
    pub fn exposure_months(&self) -> i64 {
        let days = self.duration().num_milliseconds() as f64 / MILLIS_PER_DAY;
        (days / 30.0).round() as i64
    }

    /// Most recent dose sample value.
    pub fn latest_dose(&self) -> Option<u32> {
        self.dosage_history.last().map(|s| s.value)
    }
}

const MILLIS_PER_DAY: f64 = 24.0 * 60.0 * 60.0 * 1000.0;
