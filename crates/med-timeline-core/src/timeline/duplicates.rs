//! Near-duplicate medication names.
//!
//! Merging is keyed on [`MedicationKey`](crate::models::MedicationKey) only.
//! Names such as "Sertraline 50mg" and "Sertraline 50 mg" land in separate
//! entries; this module reports such pairs so a clinician can reconcile them.

use serde::{Deserialize, Serialize};
use strsim::{jaro_winkler, normalized_levenshtein};

use crate::models::{DrugExposureEntry, MedicationKey};

/// Two distinct entries whose names look alike.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PossibleDuplicate {
    pub first: MedicationKey,
    pub second: MedicationKey,
    pub similarity: f64,
}

/// Pairs of distinct keys whose names score at or above `threshold`.
///
/// Each unordered pair is reported once, highest similarity first.
pub fn find_possible_duplicates(
    entries: &[DrugExposureEntry],
    threshold: f64,
) -> Vec<PossibleDuplicate> {
    let mut names: Vec<(&MedicationKey, String)> = Vec::new();
    for entry in entries {
        if !names.iter().any(|(key, _)| *key == &entry.key) {
            names.push((&entry.key, entry.name.to_lowercase()));
        }
    }

    let mut pairs = Vec::new();
    for (i, (first, a)) in names.iter().enumerate() {
        for (second, b) in names.iter().skip(i + 1) {
            let similarity = name_similarity(a, b);
            if similarity >= threshold {
                pairs.push(PossibleDuplicate {
                    first: (*first).clone(),
                    second: (*second).clone(),
                    similarity,
                });
            }
        }
    }

    pairs.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    pairs
}

/// Combined Jaro-Winkler / normalized Levenshtein similarity.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    jaro_winkler(a, b) * 0.6 + normalized_levenshtein(a, b) * 0.4
}
