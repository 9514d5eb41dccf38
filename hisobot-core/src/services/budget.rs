//! Budget service - monthly per-category limits

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::result::Result;
use crate::domain::TxKind;
use crate::ports::LedgerStore;

/// Threshold warning raised by an expense write
#[derive(Debug, Clone, Serialize)]
pub struct BudgetAlert {
    pub category_id: String,
    /// Whole percent of the monthly limit spent
    pub percent: u32,
    pub exceeded: bool,
}

#[derive(Clone)]
pub struct BudgetService {
    store: Arc<dyn LedgerStore>,
}

impl BudgetService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub fn limits(&self, owner_id: &str) -> Result<HashMap<String, Decimal>> {
        self.store.budgets_for(owner_id)
    }

    /// A limit of zero or less removes the budget row
    pub fn set_limit(&self, owner_id: &str, category_id: &str, limit: Decimal) -> Result<()> {
        self.store.set_budget(owner_id, category_id, limit)
    }

    /// Base-currency expense sums per category for the calendar month of `now`
    pub fn month_expenses(
        &self,
        owner_ids: &[String],
        now: DateTime<Utc>,
    ) -> Result<HashMap<String, Decimal>> {
        let mut sums: HashMap<String, Decimal> = HashMap::new();
        for tx in self.store.transactions(TxKind::Expense, owner_ids)? {
            if tx.timestamp.year() == now.year() && tx.timestamp.month() == now.month() {
                *sums.entry(tx.category_id).or_default() += tx.base_amount;
            }
        }
        Ok(sums)
    }

    /// Threshold check after an expense write: warning at >= 90%,
    /// exceeded at >= 100% of the category's monthly limit.
    pub fn check(
        &self,
        owner_id: &str,
        category_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<BudgetAlert>> {
        let limits = self.store.budgets_for(owner_id)?;
        let Some(&limit) = limits.get(category_id) else {
            return Ok(None);
        };
        if limit <= Decimal::ZERO {
            return Ok(None);
        }

        let owners = [owner_id.to_string()];
        let spent = self
            .month_expenses(&owners, now)?
            .get(category_id)
            .copied()
            .unwrap_or_default();

        let percent = (spent / limit * Decimal::from(100))
            .round_dp(0)
            .to_u32()
            .unwrap_or(u32::MAX);

        if percent >= 100 {
            Ok(Some(BudgetAlert {
                category_id: category_id.to_string(),
                percent,
                exceeded: true,
            }))
        } else if percent >= 90 {
            Ok(Some(BudgetAlert {
                category_id: category_id.to_string(),
                percent,
                exceeded: false,
            }))
        } else {
            Ok(None)
        }
    }

    /// Average monthly expense per category over the trailing `months`
    /// calendar months, used to suggest budget limits.
    pub fn average_monthly(
        &self,
        owner_ids: &[String],
        months: u32,
        now: DateTime<Utc>,
    ) -> Result<HashMap<String, Decimal>> {
        if months == 0 {
            return Ok(HashMap::new());
        }
        let cutoff = now - chrono::Duration::days(30 * months as i64);
        let mut sums: HashMap<String, Decimal> = HashMap::new();
        for tx in self.store.transactions(TxKind::Expense, owner_ids)? {
            if tx.timestamp >= cutoff {
                *sums.entry(tx.category_id).or_default() += tx.base_amount;
            }
        }
        let divisor = Decimal::from(months);
        Ok(sums
            .into_iter()
            .map(|(k, v)| (k, (v / divisor).round_dp(0)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::{Currency, TransactionRecord};

    fn expense(owner: &str, category: &str, base: i64, at: DateTime<Utc>) -> TransactionRecord {
        TransactionRecord {
            timestamp: at,
            category_id: category.to_string(),
            amount: Decimal::from(base),
            comment: String::new(),
            owner_id: owner.to_string(),
            currency: Currency::Uzs,
            base_amount: Decimal::from(base),
        }
    }

    #[test]
    fn test_thresholds_fire_at_90_and_100() {
        let store = Arc::new(InMemoryStore::with_seed_categories());
        let svc = BudgetService::new(Arc::clone(&store) as Arc<dyn LedgerStore>);
        let now = Utc::now();

        svc.set_limit("1", "1", Decimal::from(100000)).unwrap();

        store
            .append_transaction(TxKind::Expense, &expense("1", "1", 80000, now))
            .unwrap();
        assert!(svc.check("1", "1", now).unwrap().is_none());

        store
            .append_transaction(TxKind::Expense, &expense("1", "1", 10000, now))
            .unwrap();
        let alert = svc.check("1", "1", now).unwrap().unwrap();
        assert_eq!(alert.percent, 90);
        assert!(!alert.exceeded);

        store
            .append_transaction(TxKind::Expense, &expense("1", "1", 20000, now))
            .unwrap();
        let alert = svc.check("1", "1", now).unwrap().unwrap();
        assert_eq!(alert.percent, 110);
        assert!(alert.exceeded);
    }

    #[test]
    fn test_only_current_month_counts() {
        let store = Arc::new(InMemoryStore::with_seed_categories());
        let svc = BudgetService::new(Arc::clone(&store) as Arc<dyn LedgerStore>);
        let now = Utc::now();
        let long_ago = now - chrono::Duration::days(90);

        svc.set_limit("1", "1", Decimal::from(100000)).unwrap();
        store
            .append_transaction(TxKind::Expense, &expense("1", "1", 95000, long_ago))
            .unwrap();
        assert!(svc.check("1", "1", now).unwrap().is_none());
    }

    #[test]
    fn test_zero_limit_removes_budget() {
        let store = Arc::new(InMemoryStore::with_seed_categories());
        let svc = BudgetService::new(Arc::clone(&store) as Arc<dyn LedgerStore>);
        svc.set_limit("1", "1", Decimal::from(50000)).unwrap();
        svc.set_limit("1", "1", Decimal::ZERO).unwrap();
        assert!(svc.limits("1").unwrap().is_empty());
    }
}
