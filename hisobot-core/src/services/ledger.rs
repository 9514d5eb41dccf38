//! Transaction ledger - record and single-level undo

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use rust_decimal::Decimal;

use crate::domain::result::{Error, Result};
use crate::domain::{Currency, LastTransaction, TransactionRecord, TxKind};
use crate::ports::LedgerStore;

use super::budget::{BudgetAlert, BudgetService};
use super::currency::CurrencyService;

#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
    currency: CurrencyService,
    budget: BudgetService,
    // one undo pointer per owner, overwritten on every write
    last: Arc<Mutex<HashMap<String, LastTransaction>>>,
}

impl LedgerService {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        currency: CurrencyService,
        budget: BudgetService,
    ) -> Self {
        Self {
            store,
            currency,
            budget,
            last: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Convert to base currency, append one row, update the owner's undo
    /// pointer. Expense writes also run the budget threshold check.
    pub fn record(
        &self,
        owner_id: &str,
        kind: TxKind,
        category_id: &str,
        amount: Decimal,
        currency: Currency,
        comment: &str,
    ) -> Result<(TransactionRecord, Option<BudgetAlert>)> {
        if amount <= Decimal::ZERO {
            return Err(Error::validation("amount must be positive"));
        }

        let now = Utc::now();
        let base_amount = self.currency.to_base(amount, currency, owner_id)?;
        let record = TransactionRecord {
            timestamp: now,
            category_id: category_id.to_string(),
            amount,
            comment: comment.to_string(),
            owner_id: owner_id.to_string(),
            currency,
            base_amount,
        };

        let row_index = self.store.append_transaction(kind, &record)?;

        self.last
            .lock()
            .expect("last-transaction lock poisoned")
            .insert(
                owner_id.to_string(),
                LastTransaction {
                    kind,
                    row_index,
                    record: record.clone(),
                },
            );

        let alert = if kind == TxKind::Expense {
            self.budget.check(owner_id, category_id, now)?
        } else {
            None
        };

        Ok((record, alert))
    }

    /// Delete the owner's most recent record and clear the pointer.
    /// There is no redo and no deeper history.
    pub fn undo_last(&self, owner_id: &str) -> Result<TransactionRecord> {
        let mut last = self.last.lock().expect("last-transaction lock poisoned");
        let pointer = last
            .get(owner_id)
            .ok_or_else(|| Error::not_found("nothing to undo"))?;
        if pointer.record.owner_id != owner_id {
            return Err(Error::not_found("nothing to undo"));
        }
        self.store
            .delete_transaction(pointer.kind, pointer.row_index)?;
        let removed = last.remove(owner_id).map(|p| p.record);
        removed.ok_or_else(|| Error::not_found("nothing to undo"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;

    fn service() -> (Arc<InMemoryStore>, LedgerService) {
        let store = Arc::new(InMemoryStore::with_seed_categories());
        let as_port: Arc<dyn LedgerStore> = Arc::clone(&store) as Arc<dyn LedgerStore>;
        let currency = CurrencyService::new(Arc::clone(&as_port));
        let budget = BudgetService::new(Arc::clone(&as_port));
        (store, LedgerService::new(as_port, currency, budget))
    }

    #[test]
    fn test_record_converts_to_base() {
        let (store, svc) = service();
        let (record, _) = svc
            .record("1", TxKind::Expense, "2", Decimal::from(100), Currency::Usd, "такси")
            .unwrap();
        assert_eq!(record.base_amount, Decimal::from(1250000));
        let rows = store
            .transactions(TxKind::Expense, &["1".to_string()])
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_undo_removes_exactly_one_then_fails() {
        let (store, svc) = service();
        svc.record("1", TxKind::Expense, "1", Decimal::from(5000), Currency::Uzs, "обед")
            .unwrap();
        svc.record("1", TxKind::Expense, "2", Decimal::from(25000), Currency::Uzs, "такси")
            .unwrap();

        let removed = svc.undo_last("1").unwrap();
        assert_eq!(removed.category_id, "2");

        let rows = store
            .transactions(TxKind::Expense, &["1".to_string()])
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].category_id, "1");

        // pointer cleared, no deeper history
        assert!(matches!(svc.undo_last("1"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_undo_is_owner_scoped() {
        let (_, svc) = service();
        svc.record("1", TxKind::Income, "101", Decimal::from(100), Currency::Uzs, "")
            .unwrap();
        assert!(matches!(svc.undo_last("2"), Err(Error::NotFound(_))));
        assert!(svc.undo_last("1").is_ok());
    }
}
