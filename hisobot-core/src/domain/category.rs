//! Bilingual category dictionary
//!
//! Loaded from the settings sheet at startup and rebuilt on demand.
//! Each row carries an expense triple `(id, labelRu, labelUz)` in the first
//! three columns and an income triple in the next three; either may be empty.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Per-owner interface language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    Ru,
    Uz,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Income,
    Expense,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub id: String,
    pub label_ru: String,
    pub label_uz: String,
    pub kind: CategoryKind,
}

impl CategoryEntry {
    pub fn label(&self, lang: Lang) -> &str {
        match lang {
            Lang::Ru => &self.label_ru,
            Lang::Uz => {
                if self.label_uz.is_empty() {
                    &self.label_ru
                } else {
                    &self.label_uz
                }
            }
        }
    }
}

/// The in-memory dictionary, constructed explicitly from the store
#[derive(Debug, Clone, Default)]
pub struct CategoryDict {
    entries: Vec<CategoryEntry>,
    by_id: HashMap<String, usize>,
    by_label: HashMap<String, usize>,
}

impl CategoryDict {
    pub fn new(entries: Vec<CategoryEntry>) -> Self {
        let mut by_id = HashMap::new();
        let mut by_label = HashMap::new();
        for (i, entry) in entries.iter().enumerate() {
            by_id.insert(entry.id.clone(), i);
            by_label.insert(entry.label_ru.clone(), i);
            if !entry.label_uz.is_empty() {
                by_label.insert(entry.label_uz.clone(), i);
            }
        }
        Self {
            entries,
            by_id,
            by_label,
        }
    }

    pub fn get(&self, id: &str) -> Option<&CategoryEntry> {
        self.by_id.get(id).map(|&i| &self.entries[i])
    }

    /// Exact-match label lookup in either locale
    pub fn id_for_label(&self, label: &str) -> Option<&str> {
        self.by_label
            .get(label.trim())
            .map(|&i| self.entries[i].id.as_str())
    }

    pub fn label(&self, id: &str, lang: Lang) -> String {
        self.get(id)
            .map(|e| e.label(lang).to_string())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn of_kind(&self, kind: CategoryKind) -> Vec<&CategoryEntry> {
        self.entries.iter().filter(|e| e.kind == kind).collect()
    }

    pub fn labels_of_kind(&self, kind: CategoryKind, lang: Lang) -> Vec<String> {
        self.of_kind(kind)
            .iter()
            .map(|e| e.label(lang).to_string())
            .collect()
    }

    pub fn kind_of(&self, id: &str) -> Option<CategoryKind> {
        self.get(id).map(|e| e.kind)
    }

    /// Id of the named expense category, else the dictionary's expense default
    pub fn expense_id_for(&self, label_ru: &str) -> String {
        self.of_kind(CategoryKind::Expense)
            .iter()
            .find(|e| e.label_ru == label_ru)
            .map(|e| e.id.clone())
            .unwrap_or_else(|| self.fallback_expense_id())
    }

    /// Id of the named income category, else the first income entry,
    /// else the expense default
    pub fn income_id_for(&self, label_ru: &str) -> String {
        let incomes = self.of_kind(CategoryKind::Income);
        incomes
            .iter()
            .find(|e| e.label_ru == label_ru)
            .or_else(|| incomes.first())
            .map(|e| e.id.clone())
            .unwrap_or_else(|| self.fallback_expense_id())
    }

    /// The unconditional default: the "Другое" expense entry, else the
    /// first expense entry. Classification relies on this never failing.
    pub fn fallback_expense_id(&self) -> String {
        let expenses = self.of_kind(CategoryKind::Expense);
        expenses
            .iter()
            .find(|e| e.label_ru == "Другое")
            .or_else(|| expenses.first())
            .map(|e| e.id.clone())
            .unwrap_or_else(|| "7".to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CategoryEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict() -> CategoryDict {
        CategoryDict::new(vec![
            CategoryEntry {
                id: "1".into(),
                label_ru: "Питание".into(),
                label_uz: "Ovqatlanish".into(),
                kind: CategoryKind::Expense,
            },
            CategoryEntry {
                id: "7".into(),
                label_ru: "Другое".into(),
                label_uz: "Boshqa".into(),
                kind: CategoryKind::Expense,
            },
            CategoryEntry {
                id: "101".into(),
                label_ru: "Зарплата".into(),
                label_uz: "Maosh".into(),
                kind: CategoryKind::Income,
            },
        ])
    }

    #[test]
    fn test_label_lookup_both_locales() {
        let d = dict();
        assert_eq!(d.id_for_label("Питание"), Some("1"));
        assert_eq!(d.id_for_label("Ovqatlanish"), Some("1"));
        assert_eq!(d.id_for_label("питание"), None); // exact match only
    }

    #[test]
    fn test_fallback_prefers_other() {
        assert_eq!(dict().fallback_expense_id(), "7");
    }

    #[test]
    fn test_uz_label_falls_back_to_ru_when_missing() {
        let d = CategoryDict::new(vec![CategoryEntry {
            id: "5".into(),
            label_ru: "Топливо".into(),
            label_uz: String::new(),
            kind: CategoryKind::Expense,
        }]);
        assert_eq!(d.label("5", Lang::Uz), "Топливо");
    }
}
