//! In-memory store, used by the test suite and the throwaway demo mode

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::result::{Error, Result};
use crate::domain::{
    CategoryEntry, CurrencyRate, DebtRecord, FamilyMember, SavingsGoal, TransactionRecord, TxKind,
};
use crate::ports::LedgerStore;

use super::seed_categories;

#[derive(Default)]
struct Inner {
    // deleted rows become None so later indices stay valid
    income: Vec<Option<TransactionRecord>>,
    expense: Vec<Option<TransactionRecord>>,
    debts: Vec<DebtRecord>,
    categories: Vec<CategoryEntry>,
    rates: Vec<CurrencyRate>,
    budgets: HashMap<(String, String), Decimal>,
    goals: Vec<SavingsGoal>,
    families: Vec<FamilyMember>,
    reminders: HashMap<String, NaiveDate>,
}

#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty store preloaded with the standard category dictionary
    pub fn with_seed_categories() -> Self {
        let store = Self::default();
        store.inner.lock().expect("store lock poisoned").categories = seed_categories();
        store
    }
}

impl InMemoryStore {
    fn with_inner<T>(&self, f: impl FnOnce(&mut Inner) -> T) -> T {
        f(&mut self.inner.lock().expect("store lock poisoned"))
    }
}

impl LedgerStore for InMemoryStore {
    fn append_transaction(&self, kind: TxKind, record: &TransactionRecord) -> Result<usize> {
        self.with_inner(|inner| {
            let table = match kind {
                TxKind::Income => &mut inner.income,
                TxKind::Expense => &mut inner.expense,
            };
            table.push(Some(record.clone()));
            Ok(table.len() - 1)
        })
    }

    fn transactions(&self, kind: TxKind, owner_ids: &[String]) -> Result<Vec<TransactionRecord>> {
        self.with_inner(|inner| {
            let table = match kind {
                TxKind::Income => &inner.income,
                TxKind::Expense => &inner.expense,
            };
            Ok(table
                .iter()
                .flatten()
                .filter(|tx| owner_ids.contains(&tx.owner_id))
                .cloned()
                .collect())
        })
    }

    fn delete_transaction(&self, kind: TxKind, row_index: usize) -> Result<()> {
        self.with_inner(|inner| {
            let table = match kind {
                TxKind::Income => &mut inner.income,
                TxKind::Expense => &mut inner.expense,
            };
            match table.get_mut(row_index) {
                Some(slot @ Some(_)) => {
                    *slot = None;
                    Ok(())
                }
                _ => Err(Error::not_found("transaction row not found")),
            }
        })
    }

    fn append_debt(&self, record: &DebtRecord) -> Result<()> {
        self.with_inner(|inner| {
            inner.debts.push(record.clone());
            Ok(())
        })
    }

    fn debts(&self, owner_ids: &[String]) -> Result<Vec<DebtRecord>> {
        self.with_inner(|inner| {
            Ok(inner
                .debts
                .iter()
                .filter(|d| owner_ids.contains(&d.owner_id))
                .cloned()
                .collect())
        })
    }

    fn update_debt(&self, record: &DebtRecord) -> Result<()> {
        self.with_inner(|inner| {
            let row = inner
                .debts
                .iter_mut()
                .find(|d| d.id == record.id)
                .ok_or_else(|| Error::not_found("debt row not found"))?;
            *row = record.clone();
            Ok(())
        })
    }

    fn categories(&self) -> Result<Vec<CategoryEntry>> {
        self.with_inner(|inner| Ok(inner.categories.clone()))
    }

    fn append_category(&self, entry: &CategoryEntry) -> Result<()> {
        self.with_inner(|inner| {
            inner.categories.push(entry.clone());
            Ok(())
        })
    }

    fn rates_for(&self, owner_id: &str) -> Result<Vec<CurrencyRate>> {
        self.with_inner(|inner| {
            Ok(inner
                .rates
                .iter()
                .filter(|r| r.owner_id == owner_id)
                .cloned()
                .collect())
        })
    }

    fn upsert_rate(&self, rate: &CurrencyRate) -> Result<()> {
        self.with_inner(|inner| {
            match inner
                .rates
                .iter_mut()
                .find(|r| r.owner_id == rate.owner_id && r.currency == rate.currency)
            {
                Some(row) => *row = rate.clone(),
                None => inner.rates.push(rate.clone()),
            }
            Ok(())
        })
    }

    fn budgets_for(&self, owner_id: &str) -> Result<HashMap<String, Decimal>> {
        self.with_inner(|inner| {
            Ok(inner
                .budgets
                .iter()
                .filter(|((owner, _), _)| owner == owner_id)
                .map(|((_, category), limit)| (category.clone(), *limit))
                .collect())
        })
    }

    fn set_budget(&self, owner_id: &str, category_id: &str, limit: Decimal) -> Result<()> {
        self.with_inner(|inner| {
            let key = (owner_id.to_string(), category_id.to_string());
            if limit <= Decimal::ZERO {
                inner.budgets.remove(&key);
            } else {
                inner.budgets.insert(key, limit);
            }
            Ok(())
        })
    }

    fn goals_for(&self, owner_id: &str) -> Result<Vec<SavingsGoal>> {
        self.with_inner(|inner| {
            Ok(inner
                .goals
                .iter()
                .filter(|g| g.owner_id == owner_id)
                .cloned()
                .collect())
        })
    }

    fn append_goal(&self, goal: &SavingsGoal) -> Result<()> {
        self.with_inner(|inner| {
            inner.goals.push(goal.clone());
            Ok(())
        })
    }

    fn add_goal_deposit(
        &self,
        owner_id: &str,
        goal_id: &str,
        amount: Decimal,
    ) -> Result<SavingsGoal> {
        self.with_inner(|inner| {
            let goal = inner
                .goals
                .iter_mut()
                .find(|g| g.owner_id == owner_id && g.id == goal_id)
                .ok_or_else(|| Error::not_found("goal not found"))?;
            goal.saved_amount += amount;
            Ok(goal.clone())
        })
    }

    fn families(&self) -> Result<Vec<FamilyMember>> {
        self.with_inner(|inner| Ok(inner.families.clone()))
    }

    fn append_family_member(&self, member: &FamilyMember) -> Result<()> {
        self.with_inner(|inner| {
            inner.families.push(member.clone());
            Ok(())
        })
    }

    fn remove_family_member(&self, member_id: &str) -> Result<()> {
        self.with_inner(|inner| {
            inner.families.retain(|m| m.member_id != member_id);
            Ok(())
        })
    }

    fn last_reminder_date(&self, owner_id: &str) -> Result<Option<NaiveDate>> {
        self.with_inner(|inner| Ok(inner.reminders.get(owner_id).copied()))
    }

    fn set_last_reminder_date(&self, owner_id: &str, date: NaiveDate) -> Result<()> {
        self.with_inner(|inner| {
            inner.reminders.insert(owner_id.to_string(), date);
            Ok(())
        })
    }

    fn known_owner_ids(&self) -> Result<Vec<String>> {
        self.with_inner(|inner| {
            let mut ids: Vec<String> = inner
                .income
                .iter()
                .chain(inner.expense.iter())
                .flatten()
                .map(|tx| tx.owner_id.clone())
                .chain(inner.debts.iter().map(|d| d.owner_id.clone()))
                .collect();
            ids.sort();
            ids.dedup();
            Ok(ids)
        })
    }

    fn clear_owner_data(&self, owner_id: &str) -> Result<()> {
        self.with_inner(|inner| {
            for slot in inner.income.iter_mut().chain(inner.expense.iter_mut()) {
                if slot.as_ref().is_some_and(|tx| tx.owner_id == owner_id) {
                    *slot = None;
                }
            }
            inner.debts.retain(|d| d.owner_id != owner_id);
            inner.goals.retain(|g| g.owner_id != owner_id);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::domain::Currency;

    fn tx(owner: &str) -> TransactionRecord {
        TransactionRecord {
            timestamp: Utc::now(),
            category_id: "1".to_string(),
            amount: Decimal::from(1000),
            comment: String::new(),
            owner_id: owner.to_string(),
            currency: Currency::Uzs,
            base_amount: Decimal::from(1000),
        }
    }

    #[test]
    fn test_row_indices_survive_deletion() {
        let store = InMemoryStore::new();
        let first = store.append_transaction(TxKind::Expense, &tx("1")).unwrap();
        let second = store.append_transaction(TxKind::Expense, &tx("1")).unwrap();
        assert_eq!((first, second), (0, 1));

        store.delete_transaction(TxKind::Expense, first).unwrap();
        // the remaining row keeps its index; deleting twice fails
        assert!(store.delete_transaction(TxKind::Expense, first).is_err());
        let third = store.append_transaction(TxKind::Expense, &tx("1")).unwrap();
        assert_eq!(third, 2);
        assert_eq!(
            store
                .transactions(TxKind::Expense, &["1".to_string()])
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn test_clear_owner_keeps_rates_and_family() {
        let store = InMemoryStore::with_seed_categories();
        store.append_transaction(TxKind::Income, &tx("1")).unwrap();
        store
            .upsert_rate(&CurrencyRate::default_for("1", Currency::Usd))
            .unwrap();
        store
            .append_family_member(&FamilyMember {
                family_id: "F1".into(),
                invite_code: "ABC123".into(),
                member_id: "1".into(),
                member_name: "1".into(),
                family_name: "Семья".into(),
            })
            .unwrap();

        store.clear_owner_data("1").unwrap();
        assert!(store
            .transactions(TxKind::Income, &["1".to_string()])
            .unwrap()
            .is_empty());
        assert_eq!(store.rates_for("1").unwrap().len(), 1);
        assert_eq!(store.families().unwrap().len(), 1);
    }

    #[test]
    fn test_known_owner_ids_dedup() {
        let store = InMemoryStore::new();
        store.append_transaction(TxKind::Income, &tx("1")).unwrap();
        store.append_transaction(TxKind::Expense, &tx("1")).unwrap();
        store.append_transaction(TxKind::Expense, &tx("2")).unwrap();
        assert_eq!(
            store.known_owner_ids().unwrap(),
            vec!["1".to_string(), "2".to_string()]
        );
    }
}
