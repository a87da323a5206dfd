//! Property tests for extraction, classification and filtering.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;

use med_timeline_core::models::{
    BiomarkerRecord, BiomarkerSet, Category, ClinicalJourneyRecord, DrugClass, FilterState,
    PatientRecord,
};
use med_timeline_core::{ClassificationStrategy, SubstringClassifier, TimelineEngine, TimelineInputs};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 14, 0, 0, 0).unwrap()
}

fn day(offset: i64) -> String {
    let base = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
    (base + Duration::days(offset)).format("%Y-%m-%d").to_string()
}

fn journey(date: String, end_date: Option<String>, meds: Vec<String>) -> ClinicalJourneyRecord {
    ClinicalJourneyRecord {
        date,
        end_date,
        prescribed_medications: meds,
        ..Default::default()
    }
}

fn derive(patient: &PatientRecord, filters: &FilterState) -> med_timeline_core::TimelineView {
    let inputs = TimelineInputs {
        patient,
        assessments: &[],
        filters,
        overlay: None,
    };
    TimelineEngine::default().derive(&inputs, now())
}

proptest! {
    #[test]
    fn repeated_name_merges_into_one_entry(
        visits in prop::collection::vec((0i64..9000, prop::option::of(0i64..400)), 1..8),
        dose in 1u32..1000,
    ) {
        let name = format!("Fluoxetine {}mg", dose);
        let records: Vec<_> = visits
            .iter()
            .map(|(start, len)| journey(day(*start), len.map(|l| day(start + l)), vec![name.clone()]))
            .collect();
        let patient = PatientRecord { clinical_journey: records, ..Default::default() };

        let view = derive(&patient, &FilterState::default());
        prop_assert_eq!(view.entries.len(), 1);

        let entry = &view.entries[0];
        prop_assert_eq!(entry.dosage_history.len(), visits.len());
        prop_assert!(entry.dosage_history.iter().all(|s| s.value == dose));

        let (first_start, _) = visits[0];
        prop_assert_eq!(entry.start.date_naive().to_string(), day(first_start));

        let (last_start, last_len) = visits[visits.len() - 1];
        match last_len {
            Some(l) => {
                prop_assert_eq!(entry.end.date_naive().to_string(), day(last_start + l));
                prop_assert!(!entry.ongoing);
            }
            None => {
                prop_assert_eq!(entry.end, now());
                prop_assert!(entry.ongoing);
            }
        }
    }

    #[test]
    fn prn_marker_sets_category(
        prefix in "[A-Z][a-z]{3,10}",
        marker in prop::sample::select(vec!["PRN", "prn", "SOS", "sos", "Prn"]),
    ) {
        let classifier = SubstringClassifier::new();
        let name = format!("{} 1mg {}", prefix, marker);
        prop_assert_eq!(classifier.categorize(&name), Category::Prn);
    }

    #[test]
    fn class_rules_match_substrings(
        before in "[a-z ]{0,6}",
        after in "[a-z0-9 ]{0,8}",
    ) {
        let classifier = SubstringClassifier::new();
        for (stem, class) in [
            ("Fluox", DrugClass::Ssri),
            ("Sertra", DrugClass::Ssri),
            ("Escital", DrugClass::Ssri),
            ("Clona", DrugClass::Benzodiazepine),
        ] {
            let name = format!("{}{}{}", before, stem, after);
            prop_assert_eq!(classifier.classify(&name), class);
        }
    }

    #[test]
    fn names_without_stems_are_other(name in "[a-z0-9 ]{0,20}") {
        // Lowercase input can never contain a capitalized stem
        let classifier = SubstringClassifier::new();
        prop_assert_eq!(classifier.classify(&name), DrugClass::Other);
    }

    #[test]
    fn default_filters_show_only_psychiatric(
        names in prop::collection::vec("[A-Z][a-z]{2,8}( PRN)?", 1..6),
    ) {
        let records = vec![journey(day(100), None, names)];
        let patient = PatientRecord { clinical_journey: records, ..Default::default() };

        let view = derive(&patient, &FilterState::default());
        for visible in &view.visible {
            prop_assert_eq!(visible.entry.category, Category::Psychiatric);
        }
        let psychiatric = view
            .entries
            .iter()
            .filter(|e| e.category == Category::Psychiatric)
            .count();
        prop_assert_eq!(view.visible.len(), psychiatric);
    }

    #[test]
    fn vitamin_d_series_yields_one_supplement(
        offsets in prop::collection::vec(0i64..9000, 1..10),
    ) {
        let series: Vec<_> = offsets
            .iter()
            .map(|o| BiomarkerRecord { date: day(*o), value: 20.0 })
            .collect();
        let patient = PatientRecord {
            biomarkers: Some(BiomarkerSet { vitamin_d: series, ..Default::default() }),
            ..Default::default()
        };

        let view = derive(&patient, &FilterState::default());
        prop_assert_eq!(view.entries.len(), 1);
        prop_assert_eq!(view.entries[0].category, Category::Supplements);
        prop_assert_eq!(view.entries[0].start.date_naive().to_string(), day(offsets[0]));
    }

    #[test]
    fn entries_sorted_and_range_covers_starts(
        starts in prop::collection::vec(0i64..9000, 0..8),
    ) {
        let records: Vec<_> = starts
            .iter()
            .enumerate()
            .map(|(i, s)| journey(day(*s), None, vec![format!("Drug{} 5mg", i)]))
            .collect();
        let patient = PatientRecord { clinical_journey: records, ..Default::default() };

        let view = derive(&patient, &FilterState::default());
        prop_assert!(view.entries.windows(2).all(|w| w[0].start <= w[1].start));
        prop_assert_eq!(view.range.max, now());
        prop_assert!(view.range.min <= now() - Duration::days(365));
        for entry in &view.entries {
            prop_assert!(view.range.min <= entry.start);
        }
        if starts.is_empty() {
            prop_assert_eq!(view.range.min, now() - Duration::days(365));
        }
        for visible in &view.visible {
            let bar = visible.placement.unwrap();
            prop_assert!(bar.left_pct >= 0.0);
            prop_assert!(bar.left_pct + bar.width_pct <= 100.0 + 1e-6);
        }
    }
}
