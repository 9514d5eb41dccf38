//! Category service - the dictionary cache
//!
//! Built once from the store at startup and rebuilt on demand; no lazy
//! process-wide global.

use std::sync::{Arc, RwLock};

use crate::domain::result::Result;
use crate::domain::{CategoryDict, CategoryEntry, CategoryKind};
use crate::ports::LedgerStore;

#[derive(Clone)]
pub struct CategoryService {
    store: Arc<dyn LedgerStore>,
    cache: Arc<RwLock<CategoryDict>>,
}

impl CategoryService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Result<Self> {
        let dict = CategoryDict::new(store.categories()?);
        Ok(Self {
            store,
            cache: Arc::new(RwLock::new(dict)),
        })
    }

    pub fn dict(&self) -> CategoryDict {
        self.cache.read().expect("category cache poisoned").clone()
    }

    pub fn rebuild(&self) -> Result<()> {
        let dict = CategoryDict::new(self.store.categories()?);
        *self.cache.write().expect("category cache poisoned") = dict;
        Ok(())
    }

    /// Append a new expense category and rebuild the dictionary.
    /// The id continues the expense id sequence.
    pub fn add_expense_category(&self, label: &str) -> Result<CategoryEntry> {
        let label = label.trim();
        if label.is_empty() {
            return Err(crate::domain::result::Error::validation(
                "category name must not be empty",
            ));
        }
        let dict = self.dict();
        let next_id = dict
            .of_kind(CategoryKind::Expense)
            .iter()
            .filter_map(|e| e.id.parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        let entry = CategoryEntry {
            id: next_id.to_string(),
            label_ru: label.to_string(),
            label_uz: String::new(),
            kind: CategoryKind::Expense,
        };
        self.store.append_category(&entry)?;
        self.rebuild()?;
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;

    #[test]
    fn test_add_category_rebuilds_cache() {
        let svc = CategoryService::new(Arc::new(InMemoryStore::with_seed_categories())).unwrap();
        let before = svc.dict().of_kind(CategoryKind::Expense).len();

        let entry = svc.add_expense_category("Подписки").unwrap();
        assert_eq!(entry.id, "8");

        let dict = svc.dict();
        assert_eq!(dict.of_kind(CategoryKind::Expense).len(), before + 1);
        assert_eq!(dict.id_for_label("Подписки"), Some("8"));
    }

    #[test]
    fn test_empty_name_rejected() {
        let svc = CategoryService::new(Arc::new(InMemoryStore::with_seed_categories())).unwrap();
        assert!(svc.add_expense_category("   ").is_err());
    }
}
