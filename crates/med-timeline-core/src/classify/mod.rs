//! Category and class inference for free-text medication strings.
//!
//! Journey records only carry "Name dose" strings, so category and class are
//! guessed from the text. The guess sits behind [`ClassificationStrategy`]
//! so a lookup table or drug database can replace it without touching the
//! merge logic.

mod heuristic;

pub use heuristic::*;

use crate::models::{Category, DrugClass};

/// Classifies free-text medication strings from clinical journey records.
pub trait ClassificationStrategy: Send + Sync {
    /// Category of a journey medication string.
    fn categorize(&self, name: &str) -> Category;

    /// Pharmacological class of a journey medication string.
    fn classify(&self, name: &str) -> DrugClass;
}
