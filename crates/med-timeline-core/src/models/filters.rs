//! Timeline filter state.

use serde::{Deserialize, Serialize};

use super::exposure::{Category, ClassKey, DrugExposureEntry};

/// Category toggles.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CategoryFilter {
    pub psychiatric: bool,
    pub medical: bool,
    pub supplements: bool,
    pub prn: bool,
}

impl Default for CategoryFilter {
    fn default() -> Self {
        Self {
            psychiatric: true,
            medical: false,
            supplements: false,
            prn: false,
        }
    }
}

impl CategoryFilter {
    pub fn get(&self, category: Category) -> bool {
        match category {
            Category::Psychiatric => self.psychiatric,
            Category::Medical => self.medical,
            Category::Supplements => self.supplements,
            Category::Prn => self.prn,
        }
    }

    pub fn set(&mut self, category: Category, enabled: bool) {
        let slot = match category {
            Category::Psychiatric => &mut self.psychiatric,
            Category::Medical => &mut self.medical,
            Category::Supplements => &mut self.supplements,
            Category::Prn => &mut self.prn,
        };
        *slot = enabled;
    }
}

/// Therapeutic-class toggles.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct ClassFilter {
    pub ssri: bool,
    pub benzodiazepine: bool,
    pub antipsychotic: bool,
    pub mood_stabilizer: bool,
    pub antidiabetic: bool,
    pub vitamins: bool,
}

impl Default for ClassFilter {
    fn default() -> Self {
        Self {
            ssri: true,
            benzodiazepine: true,
            antipsychotic: true,
            mood_stabilizer: true,
            antidiabetic: true,
            vitamins: true,
        }
    }
}

impl ClassFilter {
    pub fn get(&self, key: ClassKey) -> bool {
        match key {
            ClassKey::Ssri => self.ssri,
            ClassKey::Benzodiazepine => self.benzodiazepine,
            ClassKey::Antipsychotic => self.antipsychotic,
            ClassKey::MoodStabilizer => self.mood_stabilizer,
            ClassKey::Antidiabetic => self.antidiabetic,
            ClassKey::Vitamins => self.vitamins,
        }
    }

    pub fn set(&mut self, key: ClassKey, enabled: bool) {
        let slot = match key {
            ClassKey::Ssri => &mut self.ssri,
            ClassKey::Benzodiazepine => &mut self.benzodiazepine,
            ClassKey::Antipsychotic => &mut self.antipsychotic,
            ClassKey::MoodStabilizer => &mut self.mood_stabilizer,
            ClassKey::Antidiabetic => &mut self.antidiabetic,
            ClassKey::Vitamins => &mut self.vitamins,
        };
        *slot = enabled;
    }
}

/// Combined filter state. Only psychiatric entries are visible by default.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct FilterState {
    #[serde(default)]
    pub categories: CategoryFilter,
    #[serde(default)]
    pub classes: ClassFilter,
}

impl FilterState {
    /// Restore the default toggles.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn set_category(&mut self, category: Category, enabled: bool) {
        self.categories.set(category, enabled);
    }

    pub fn set_class(&mut self, key: ClassKey, enabled: bool) {
        self.classes.set(key, enabled);
    }

    pub fn toggle_category(&mut self, category: Category) {
        let current = self.categories.get(category);
        self.categories.set(category, !current);
    }

    pub fn toggle_class(&mut self, key: ClassKey) {
        let current = self.classes.get(key);
        self.classes.set(key, !current);
    }

    /// Category must be enabled; a tracked class must also be enabled.
    pub fn is_visible(&self, entry: &DrugExposureEntry) -> bool {
        if !self.categories.get(entry.category) {
            return false;
        }
        match entry.drug_class.filter_key() {
            Some(key) => self.classes.get(key),
            None => true,
        }
    }

    /// Visible subset, order preserved.
    pub fn apply<'a>(&self, entries: &'a [DrugExposureEntry]) -> Vec<&'a DrugExposureEntry> {
        entries.iter().filter(|e| self.is_visible(e)).collect()
    }
}
