//! Symptom-score overlay series.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{Assessment, Instrument};
use crate::parse::parse_date;

/// One point of the overlay.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct OverlayPoint {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub time: DateTime<Utc>,
    pub score: u32,
}

/// Score series for one instrument, ascending by time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OverlaySeries {
    pub instrument: Instrument,
    /// Upper bound of the y-axis
    pub max_score: u32,
    pub points: Vec<OverlayPoint>,
}

impl OverlaySeries {
    /// Select `instrument`'s administrations and sort them by date.
    ///
    /// Administrations with unparseable dates are left out.
    pub fn build(assessments: &[Assessment], instrument: Instrument) -> Self {
        let mut points: Vec<OverlayPoint> = assessments
            .iter()
            .filter(|a| a.instrument == instrument)
            .filter_map(|a| match parse_date(&a.date) {
                Some(time) => Some(OverlayPoint {
                    time,
                    score: a.score,
                }),
                None => {
                    warn!(instrument = instrument.tag(), date = %a.date, "dropping assessment with unparseable date");
                    None
                }
            })
            .collect();
        points.sort_by_key(|p| p.time);

        Self {
            instrument,
            max_score: instrument.max_score(),
            points,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Most recent score.
    pub fn latest(&self) -> Option<&OverlayPoint> {
        self.points.last()
    }
}
