//! Exposure extraction and merge.
//!
//! Sources are processed in a fixed order: clinical journey (merged by
//! [`MedicationKey`]), medical history (never merged), then the inferred
//! vitamin D supplement. The result is sorted by start.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::classify::ClassificationStrategy;
use crate::config::{EngineConfig, IntervalMergePolicy};
use crate::models::{
    BiomarkerRecord, Category, ClinicalJourneyRecord, DoseSample, DrugClass, DrugExposureEntry,
    MedicalIllness, MedicationKey, PatientRecord,
};
use crate::parse::{parse_date, parse_dose, parse_optional_date};

/// Builds exposure entries from a patient snapshot.
pub struct Extractor<'a> {
    config: &'a EngineConfig,
    classifier: &'a dyn ClassificationStrategy,
    now: DateTime<Utc>,
}

impl<'a> Extractor<'a> {
    pub fn new(
        config: &'a EngineConfig,
        classifier: &'a dyn ClassificationStrategy,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            config,
            classifier,
            now,
        }
    }

    /// Extract, merge and sort all exposure entries for a patient.
    pub fn extract(&self, patient: &PatientRecord) -> Vec<DrugExposureEntry> {
        let mut entries = Vec::with_capacity(patient.medication_mention_count() + 1);

        self.extract_journey(&patient.clinical_journey, &mut entries);
        for illness in &patient.medical_history {
            self.extract_illness(illness, &mut entries);
        }
        if let Some(series) = patient.vitamin_d() {
            entries.extend(self.supplement_entry(series));
        }

        entries.sort_by_key(|e| e.start);

        debug!(
            patient_id = %patient.id,
            entries = entries.len(),
            "extracted exposure entries"
        );
        entries
    }

    fn extract_journey(
        &self,
        records: &[ClinicalJourneyRecord],
        entries: &mut Vec<DrugExposureEntry>,
    ) {
        let mut index: HashMap<MedicationKey, usize> = HashMap::new();

        for record in records {
            if record.prescribed_medications.is_empty() {
                continue;
            }
            let date = parse_date(&record.date);
            if date.is_none() {
                warn!(
                    date = %record.date,
                    facility = %record.facility,
                    "journey record has unparseable date; only existing entries are updated"
                );
            }
            let recorded_end = parse_optional_date(record.end_date.as_deref());
            let end = recorded_end.unwrap_or(self.now);
            let ongoing = recorded_end.is_none();

            for name in &record.prescribed_medications {
                let key = MedicationKey::new(name, self.config.key_normalization);
                let sample = DoseSample {
                    date,
                    value: parse_dose(name).unwrap_or(self.config.journey_fallback_dose),
                };

                match (index.get(&key), date) {
                    (Some(&i), _) => {
                        let entry = &mut entries[i];
                        self.merge_end(entry, end, ongoing);
                        entry.dosage_history.push(sample);
                    }
                    (None, None) => {
                        warn!(medication = %name, "skipping undated first mention");
                    }
                    (None, Some(date)) => {
                        index.insert(key.clone(), entries.len());
                        entries.push(DrugExposureEntry {
                            key,
                            name: name.clone(),
                            category: self.classifier.categorize(name),
                            drug_class: self.classifier.classify(name),
                            start: date,
                            end,
                            ongoing,
                            dosage_history: vec![sample],
                            notes: record
                                .outcome
                                .clone()
                                .unwrap_or_else(|| self.config.default_journey_note.clone()),
                        });
                    }
                }
            }
        }
    }

    fn merge_end(&self, entry: &mut DrugExposureEntry, end: DateTime<Utc>, ongoing: bool) {
        match self.config.merge_policy {
            IntervalMergePolicy::LastWriteWins => {
                entry.end = end;
                entry.ongoing = ongoing;
            }
            IntervalMergePolicy::Widen => {
                if end > entry.end {
                    entry.end = end;
                    entry.ongoing = ongoing;
                } else if end == entry.end {
                    entry.ongoing |= ongoing;
                }
            }
        }
    }

    fn extract_illness(&self, illness: &MedicalIllness, entries: &mut Vec<DrugExposureEntry>) {
        for medication in &illness.medications {
            let start = match medication.start_date.as_deref().map(str::trim) {
                None | Some("") => None,
                Some(raw) => match parse_date(raw) {
                    Some(date) => Some(date),
                    None => {
                        warn!(
                            illness = %illness.name,
                            medication = %medication.name,
                            start_date = %raw,
                            "skipping medication with unparseable start date"
                        );
                        continue;
                    }
                },
            };
            let recorded_end = parse_optional_date(medication.end_date.as_deref());

            entries.push(DrugExposureEntry {
                key: MedicationKey::new(&medication.name, self.config.key_normalization),
                name: medication.name.clone(),
                category: Category::Medical,
                drug_class: medication
                    .drug_class
                    .as_deref()
                    .map(DrugClass::parse)
                    .unwrap_or(DrugClass::Other),
                start: start.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
                end: recorded_end.unwrap_or(self.now),
                ongoing: recorded_end.is_none(),
                dosage_history: vec![DoseSample {
                    date: start,
                    value: parse_dose(&medication.dosage)
                        .unwrap_or(self.config.medical_fallback_dose),
                }],
                notes: self.config.medical_note.clone(),
            });
        }
    }

    fn supplement_entry(&self, series: &[BiomarkerRecord]) -> Option<DrugExposureEntry> {
        let first = series.first()?;
        let Some(start) = parse_date(&first.date) else {
            warn!(date = %first.date, "skipping supplement inference: unparseable vitamin D date");
            return None;
        };

        Some(DrugExposureEntry {
            key: MedicationKey::new(&self.config.supplement_name, self.config.key_normalization),
            name: self.config.supplement_name.clone(),
            category: Category::Supplements,
            drug_class: DrugClass::Vitamins,
            start,
            end: self.now,
            ongoing: true,
            dosage_history: vec![DoseSample {
                date: Some(start),
                value: self.config.supplement_dose,
            }],
            notes: self.config.supplement_note.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::SubstringClassifier;
    use crate::models::{BiomarkerSet, KeyNormalization, Medication};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn visit(date: &str, end: Option<&str>, meds: &[&str]) -> ClinicalJourneyRecord {
        ClinicalJourneyRecord {
            date: date.into(),
            end_date: end.map(|s| s.into()),
            facility: "Wellness Mind Clinic".into(),
            prescribed_medications: meds.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn extract_with(config: &EngineConfig, patient: &PatientRecord) -> Vec<DrugExposureEntry> {
        let classifier = SubstringClassifier::new();
        Extractor::new(config, &classifier, now()).extract(patient)
    }

    fn extract(patient: &PatientRecord) -> Vec<DrugExposureEntry> {
        extract_with(&EngineConfig::default(), patient)
    }

    #[test]
    fn test_empty_patient() {
        assert!(extract(&PatientRecord::default()).is_empty());
    }

    #[test]
    fn test_single_journey_medication() {
        let patient = PatientRecord {
            clinical_journey: vec![visit("2020-01-01", None, &["Sertraline 50mg"])],
            ..Default::default()
        };

        let entries = extract(&patient);
        assert_eq!(entries.len(), 1);
        let e = &entries[0];
        assert_eq!(e.name, "Sertraline 50mg");
        assert_eq!(e.category, Category::Psychiatric);
        assert_eq!(e.drug_class, DrugClass::Ssri);
        assert_eq!(e.start, ymd(2020, 1, 1));
        assert_eq!(e.end, now());
        assert!(e.ongoing);
        assert_eq!(
            e.dosage_history,
            vec![DoseSample { date: Some(ymd(2020, 1, 1)), value: 50 }]
        );
        assert_eq!(e.notes, "Maintenance dose");
    }

    #[test]
    fn test_repeat_shrinks_interval_under_last_write_wins() {
        let patient = PatientRecord {
            clinical_journey: vec![
                visit("2020-01-01", None, &["Sertraline 50mg"]),
                visit("2021-01-01", Some("2021-06-01"), &["Sertraline 50mg"]),
            ],
            ..Default::default()
        };

        let entries = extract(&patient);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].end, ymd(2021, 6, 1));
        assert!(!entries[0].ongoing);
        assert_eq!(entries[0].dosage_history.len(), 2);
    }

    #[test]
    fn test_repeat_keeps_later_end_under_widen() {
        let config = EngineConfig {
            merge_policy: IntervalMergePolicy::Widen,
            ..Default::default()
        };
        let patient = PatientRecord {
            clinical_journey: vec![
                visit("2020-01-01", None, &["Sertraline 50mg"]),
                visit("2021-01-01", Some("2021-06-01"), &["Sertraline 50mg"]),
            ],
            ..Default::default()
        };

        let entries = extract_with(&config, &patient);
        assert_eq!(entries[0].end, now());
        assert!(entries[0].ongoing);
    }

    #[test]
    fn test_first_record_keeps_notes_and_class() {
        let mut first = visit("2018-11-12", Some("2019-01-01"), &["Escitalopram 10mg"]);
        first.outcome = Some("CBT recommended".into());
        let mut second = visit("2019-01-01", None, &["Escitalopram 10mg"]);
        second.outcome = Some("Dose held".into());

        let patient = PatientRecord {
            clinical_journey: vec![first, second],
            ..Default::default()
        };
        let entries = extract(&patient);
        assert_eq!(entries[0].notes, "CBT recommended");
        assert_eq!(entries[0].start, ymd(2018, 11, 12));
    }

    #[test]
    fn test_distinct_spellings_do_not_merge() {
        let patient = PatientRecord {
            clinical_journey: vec![
                visit("2020-01-01", None, &["Sertraline 50mg"]),
                visit("2020-02-01", None, &["Sertraline 50 mg", "sertraline 50mg"]),
            ],
            ..Default::default()
        };
        assert_eq!(extract(&patient).len(), 3);
    }

    #[test]
    fn test_case_and_whitespace_key_merges() {
        let config = EngineConfig {
            key_normalization: KeyNormalization::CaseAndWhitespace,
            ..Default::default()
        };
        let patient = PatientRecord {
            clinical_journey: vec![
                visit("2020-01-01", None, &["Sertraline 50mg"]),
                visit("2020-02-01", None, &["sertraline  50mg"]),
            ],
            ..Default::default()
        };
        let entries = extract_with(&config, &patient);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Sertraline 50mg");
        assert_eq!(entries[0].dosage_history.len(), 2);
    }

    #[test]
    fn test_prn_and_fallback_dose() {
        let patient = PatientRecord {
            clinical_journey: vec![visit("2020-01-01", None, &["Clonazepam PRN", "Melatonin"])],
            ..Default::default()
        };
        let entries = extract(&patient);
        assert_eq!(entries[0].category, Category::Prn);
        assert_eq!(entries[0].drug_class, DrugClass::Benzodiazepine);
        assert_eq!(entries[0].latest_dose(), Some(10));
        assert_eq!(entries[1].category, Category::Psychiatric);
        assert_eq!(entries[1].latest_dose(), Some(10));
    }

    #[test]
    fn test_medical_history_never_merges() {
        let metformin = Medication {
            name: "Metformin".into(),
            dosage: "500mg".into(),
            start_date: Some("2018-04-10".into()),
            drug_class: Some("Anti-diabetic".into()),
            ..Default::default()
        };
        let patient = PatientRecord {
            medical_history: vec![
                MedicalIllness {
                    name: "Type 2 Diabetes".into(),
                    medications: vec![metformin.clone()],
                    ..Default::default()
                },
                MedicalIllness {
                    name: "PCOS".into(),
                    medications: vec![metformin],
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        let entries = extract(&patient);
        assert_eq!(entries.len(), 2);
        for e in &entries {
            assert_eq!(e.category, Category::Medical);
            assert_eq!(e.drug_class, DrugClass::Antidiabetic);
            assert_eq!(e.start, ymd(2018, 4, 10));
            assert_eq!(e.notes, "Chronic condition management");
            assert_eq!(e.latest_dose(), Some(500));
        }
    }

    #[test]
    fn test_medical_defaults() {
        let patient = PatientRecord {
            medical_history: vec![MedicalIllness {
                name: "Hypothyroidism".into(),
                medications: vec![Medication {
                    name: "Levothyroxine".into(),
                    dosage: "one tablet".into(),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        };

        let entries = extract(&patient);
        assert_eq!(entries[0].start, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(entries[0].end, now());
        assert_eq!(entries[0].drug_class, DrugClass::Other);
        assert_eq!(entries[0].dosage_history, vec![DoseSample { date: None, value: 500 }]);
    }

    #[test]
    fn test_vitamin_d_supplement() {
        let patient = PatientRecord {
            biomarkers: Some(BiomarkerSet {
                vitamin_d: vec![
                    BiomarkerRecord { date: "2023-11-01".into(), value: 12.0 },
                    BiomarkerRecord { date: "2024-01-20".into(), value: 24.0 },
                ],
                ..Default::default()
            }),
            ..Default::default()
        };

        let entries = extract(&patient);
        assert_eq!(entries.len(), 1);
        let e = &entries[0];
        assert_eq!(e.name, "Vitamin D3 (Cholecalciferol)");
        assert_eq!(e.category, Category::Supplements);
        assert_eq!(e.drug_class, DrugClass::Vitamins);
        assert_eq!(e.start, ymd(2023, 11, 1));
        assert_eq!(e.latest_dose(), Some(60_000));
        assert_eq!(e.notes, "Corrective supplementation");
    }

    #[test]
    fn test_unparseable_dates_are_excluded() {
        let patient = PatientRecord {
            clinical_journey: vec![
                visit("sometime in 2019", None, &["Fluoxetine 20mg"]),
                visit("2020-01-01", Some("unknown"), &["Sertraline 50mg"]),
            ],
            medical_history: vec![MedicalIllness {
                name: "Asthma".into(),
                medications: vec![Medication {
                    name: "Salbutamol".into(),
                    dosage: "100mcg".into(),
                    start_date: Some("childhood".into()),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            biomarkers: Some(BiomarkerSet {
                vitamin_d: vec![BiomarkerRecord { date: "n/a".into(), value: 12.0 }],
                ..Default::default()
            }),
            ..Default::default()
        };

        let entries = extract(&patient);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Sertraline 50mg");
        // Garbage end date reads as "still taking it"
        assert_eq!(entries[0].end, now());
        assert!(entries[0].ongoing);
    }

    #[test]
    fn test_undated_repeat_updates_existing_entry() {
        let patient = PatientRecord {
            clinical_journey: vec![
                visit("2020-01-01", Some("2020-06-01"), &["Sertraline 50mg"]),
                visit("??", Some("2021-03-01"), &["Sertraline 50mg", "Fluoxetine 20mg"]),
            ],
            ..Default::default()
        };

        let entries = extract(&patient);
        assert_eq!(entries.len(), 1);
        let e = &entries[0];
        assert_eq!(e.start, ymd(2020, 1, 1));
        assert_eq!(e.end, ymd(2021, 3, 1));
        assert_eq!(
            e.dosage_history,
            vec![
                DoseSample { date: Some(ymd(2020, 1, 1)), value: 50 },
                DoseSample { date: None, value: 50 },
            ]
        );
    }

    #[test]
    fn test_sorted_by_start_across_sources() {
        let patient = PatientRecord {
            clinical_journey: vec![
                visit("2021-04-05", None, &["Escitalopram 10mg"]),
                visit("2016-02-01", Some("2018-11-12"), &["Fluoxetine 20mg"]),
            ],
            medical_history: vec![MedicalIllness {
                name: "Type 2 Diabetes".into(),
                medications: vec![Medication {
                    name: "Metformin".into(),
                    dosage: "500mg".into(),
                    start_date: Some("2018-04-10".into()),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        };

        let names: Vec<_> = extract(&patient).into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["Fluoxetine 20mg", "Metformin", "Escitalopram 10mg"]);
    }
}
