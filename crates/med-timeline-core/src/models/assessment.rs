//! Scored instrument administrations.

use serde::{Deserialize, Serialize};

/// A psychometric instrument.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Instrument {
    #[serde(rename = "PHQ-9")]
    Phq9,
    #[serde(rename = "GAD-7")]
    Gad7,
}

impl Instrument {
    /// Highest attainable total score.
    pub fn max_score(&self) -> u32 {
        match self {
            Instrument::Phq9 => 27,
            Instrument::Gad7 => 21,
        }
    }

    /// Dashboard tag (e.g., "PHQ-9").
    pub fn tag(&self) -> &'static str {
        match self {
            Instrument::Phq9 => "PHQ-9",
            Instrument::Gad7 => "GAD-7",
        }
    }

    /// Parse a dashboard tag, ignoring case.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_uppercase().as_str() {
            "PHQ-9" | "PHQ9" => Some(Instrument::Phq9),
            "GAD-7" | "GAD7" => Some(Instrument::Gad7),
            _ => None,
        }
    }
}

/// A single administration of an instrument.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    #[serde(rename = "type")]
    pub instrument: Instrument,
    pub score: u32,
    pub date: String,
    #[serde(default)]
    pub severity: Option<String>,
}

impl Assessment {
    pub fn new(instrument: Instrument, score: u32, date: impl Into<String>) -> Self {
        Self {
            instrument,
            score,
            date: date.into(),
            severity: None,
        }
    }

    /// Decode an assessment history from JSON.
    pub fn list_from_json(json: &str) -> Result<Vec<Self>, serde_json::Error> {
        serde_json::from_str(json)
    }
}
