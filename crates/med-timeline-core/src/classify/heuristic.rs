//! Substring heuristics.
//!
//! Handles:
//! - PRN/SOS detection (case-insensitive)
//! - Class inference by ordered substring rules (case-sensitive, first match wins)

use crate::models::{Category, DrugClass};

use super::ClassificationStrategy;

/// Keyword-based classifier.
pub struct SubstringClassifier {
    /// Ordered (pattern, class) rules
    rules: Vec<(String, DrugClass)>,
    /// Lowercase markers meaning "as needed"
    prn_markers: Vec<String>,
}

impl Default for SubstringClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SubstringClassifier {
    /// Create a classifier with the default rules.
    pub fn new() -> Self {
        Self {
            rules: Self::default_rules(),
            prn_markers: vec!["prn".into(), "sos".into()],
        }
    }

    /// Append a rule. Earlier rules take precedence.
    pub fn add_rule(&mut self, pattern: &str, class: DrugClass) {
        self.rules.push((pattern.to_string(), class));
    }

    /// Add an "as needed" marker.
    pub fn add_prn_marker(&mut self, marker: &str) {
        self.prn_markers.push(marker.to_lowercase());
    }

    /// Whether the string is an as-needed prescription.
    pub fn is_prn(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.prn_markers.iter().any(|m| lower.contains(m.as_str()))
    }

    fn default_rules() -> Vec<(String, DrugClass)> {
        vec![
            ("Fluox".into(), DrugClass::Ssri),
            ("Sertra".into(), DrugClass::Ssri),
            ("Escital".into(), DrugClass::Ssri),
            ("Clona".into(), DrugClass::Benzodiazepine),
        ]
    }
}

impl ClassificationStrategy for SubstringClassifier {
    fn categorize(&self, name: &str) -> Category {
        if self.is_prn(name) {
            Category::Prn
        } else {
            Category::Psychiatric
        }
    }

    fn classify(&self, name: &str) -> DrugClass {
        self.rules
            .iter()
            .find(|(pattern, _)| name.contains(pattern.as_str()))
            .map(|(_, class)| class.clone())
            .unwrap_or(DrugClass::Other)
    }
}
