//! Visible time range and proportional bar placement.

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::DrugExposureEntry;

/// Shared time axis for bars and the symptom overlay.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub min: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub max: DateTime<Utc>,
}

/// Horizontal placement of a bar, in percent of the axis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BarPlacement {
    pub left_pct: f64,
    pub width_pct: f64,
}

impl TimeRange {
    /// `[min(starts, now - lookback), now]`.
    ///
    /// Open intervals are not projected past `now`. A floor before the
    /// representable range saturates at [`DateTime::<Utc>::MIN_UTC`].
    pub fn compute(entries: &[DrugExposureEntry], now: DateTime<Utc>, lookback: Duration) -> Self {
        let floor = now
            .checked_sub_signed(lookback)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let min = entries
            .iter()
            .map(|e| e.start)
            .min()
            .map_or(floor, |earliest| earliest.min(floor));
        Self { min, max: now }
    }

    pub fn span(&self) -> Duration {
        self.max - self.min
    }

    pub fn span_millis(&self) -> i64 {
        self.span().num_milliseconds()
    }

    /// Fraction of the axis at `t`, in percent. `None` for an empty axis.
    pub fn percent_at(&self, t: DateTime<Utc>) -> Option<f64> {
        let span = self.span_millis();
        if span <= 0 {
            return None;
        }
        Some((t - self.min).num_milliseconds() as f64 / span as f64 * 100.0)
    }

    /// Bar position for an entry. Shrunk intervals get zero width.
    pub fn place(&self, entry: &DrugExposureEntry) -> Option<BarPlacement> {
        let span = self.span_millis();
        if span <= 0 {
            return None;
        }
        let left_pct = (entry.start - self.min).num_milliseconds() as f64 / span as f64 * 100.0;
        let width_pct = entry.duration().num_milliseconds() as f64 / span as f64 * 100.0;
        Some(BarPlacement {
            left_pct,
            width_pct,
        })
    }

    /// Calendar year shown above a bar.
    pub fn start_year(entry: &DrugExposureEntry) -> i32 {
        entry.start.year()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, DrugClass, KeyNormalization, MedicationKey};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 14, 0, 0, 0).unwrap()
    }

    fn entry(start: DateTime<Utc>, end: DateTime<Utc>) -> DrugExposureEntry {
        DrugExposureEntry {
            key: MedicationKey::new("Sertraline 50mg", KeyNormalization::Exact),
            name: "Sertraline 50mg".into(),
            category: Category::Psychiatric,
            drug_class: DrugClass::Ssri,
            start,
            end,
            ongoing: false,
            dosage_history: vec![],
            notes: String::new(),
        }
    }

    #[test]
    fn test_empty_uses_lookback_floor() {
        let range = TimeRange::compute(&[], now(), Duration::days(365));
        assert_eq!(range.min, now() - Duration::days(365));
        assert_eq!(range.max, now());
    }

    #[test]
    fn test_recent_entry_keeps_floor() {
        let recent = entry(now() - Duration::days(30), now());
        let range = TimeRange::compute(&[recent], now(), Duration::days(365));
        assert_eq!(range.min, now() - Duration::days(365));
    }

    #[test]
    fn test_old_entry_extends_axis() {
        let start = Utc.with_ymd_and_hms(2016, 2, 1, 0, 0, 0).unwrap();
        let range = TimeRange::compute(&[entry(start, now())], now(), Duration::days(365));
        assert_eq!(range.min, start);
        assert_eq!(range.max, now());
    }

    #[test]
    fn test_placement() {
        let range = TimeRange {
            min: now() - Duration::days(100),
            max: now(),
        };
        let e = entry(now() - Duration::days(75), now() - Duration::days(25));
        let bar = range.place(&e).unwrap();
        assert!((bar.left_pct - 25.0).abs() < 1e-9);
        assert!((bar.width_pct - 50.0).abs() < 1e-9);
        assert_eq!(range.percent_at(now()), Some(100.0));
    }

    #[test]
    fn test_shrunk_interval_has_zero_width() {
        let range = TimeRange {
            min: now() - Duration::days(100),
            max: now(),
        };
        let e = entry(now() - Duration::days(10), now() - Duration::days(50));
        assert_eq!(range.place(&e).unwrap().width_pct, 0.0);
    }

    #[test]
    fn test_zero_span_has_no_placement() {
        let range = TimeRange { min: now(), max: now() };
        assert_eq!(range.place(&entry(now(), now())), None);
        assert_eq!(range.percent_at(now()), None);
    }

    #[test]
    fn test_floor_saturates_instead_of_overflowing() {
        let range = TimeRange::compute(&[], now(), Duration::MAX);
        assert_eq!(range.min, DateTime::<Utc>::MIN_UTC);
        assert_eq!(range.max, now());

        let early = DateTime::<Utc>::MIN_UTC + Duration::days(10);
        let range = TimeRange::compute(&[], early, Duration::days(365));
        assert_eq!(range.min, DateTime::<Utc>::MIN_UTC);
        assert!(range.percent_at(early).is_some());
    }

    #[test]
    fn test_start_year() {
        let e = entry(Utc.with_ymd_and_hms(2018, 11, 12, 0, 0, 0).unwrap(), now());
        assert_eq!(TimeRange::start_year(&e), 2018);
    }
}
