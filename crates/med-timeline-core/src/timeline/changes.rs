//! Medication change markers for the overlay axis.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::ClinicalJourneyRecord;
use crate::parse::parse_date;

/// A dated medication change, labelled with the visit's first logged change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangePoint {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub time: DateTime<Utc>,
    pub label: String,
}

/// One point per journey record that logs a change, ascending by time.
///
/// Records with unparseable dates are left out.
pub fn medication_change_points(records: &[ClinicalJourneyRecord]) -> Vec<ChangePoint> {
    let mut points: Vec<ChangePoint> = records
        .iter()
        .filter_map(|r| {
            let label = r.medication_changes.first()?;
            match parse_date(&r.date) {
                Some(time) => Some(ChangePoint {
                    time,
                    label: label.clone(),
                }),
                None => {
                    warn!(date = %r.date, change = %label, "dropping change point with unparseable date");
                    None
                }
            }
        })
        .collect();
    points.sort_by_key(|p| p.time);
    points
}
