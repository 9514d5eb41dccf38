//! Debt ledger - creation, settlement, extension and due-date queries

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{
    Currency, DebtDraft, DebtKind, DebtRecord, DebtStatus, OverdueDebt, UpcomingDebt,
};
use crate::ports::LedgerStore;

use super::currency::CurrencyService;

/// Result of a settlement payment
#[derive(Debug, Clone)]
pub struct PaymentOutcome {
    pub counterparty: String,
    pub fully_paid: bool,
    pub remaining: Decimal,
}

/// Outstanding base-currency totals across active records
#[derive(Debug, Clone, Default)]
pub struct DebtTotals {
    /// What the owner owes (Дебет)
    pub debit: Decimal,
    /// What is owed to the owner (Кредит)
    pub credit: Decimal,
}

#[derive(Clone)]
pub struct DebtService {
    store: Arc<dyn LedgerStore>,
    currency: CurrencyService,
}

impl DebtService {
    pub fn new(store: Arc<dyn LedgerStore>, currency: CurrencyService) -> Self {
        Self { store, currency }
    }

    /// Finish the two-step wizard: the draft plus a validated due date.
    /// The due date must not be before today (today is allowed).
    pub fn create(
        &self,
        owner_id: &str,
        draft: &DebtDraft,
        due_date: NaiveDate,
        today: NaiveDate,
    ) -> Result<DebtRecord> {
        if due_date < today {
            return Err(Error::validation("due date must not be in the past"));
        }
        let record = DebtRecord {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            owner_id: owner_id.to_string(),
            kind: draft.kind,
            counterparty: draft.counterparty.clone(),
            amount: draft.amount,
            currency: draft.currency,
            base_amount: draft.base_amount,
            description: draft.description.clone(),
            due_date,
            status: DebtStatus::Active,
            settled_at: None,
            paid_amount: Decimal::ZERO,
        };
        self.store.append_debt(&record)?;
        Ok(record)
    }

    /// Active records with a positive remaining amount
    pub fn active_for(&self, owner_ids: &[String]) -> Result<Vec<DebtRecord>> {
        Ok(self
            .store
            .debts(owner_ids)?
            .into_iter()
            .filter(|d| d.status == DebtStatus::Active && d.remaining() > Decimal::ZERO)
            .collect())
    }

    fn find_active(&self, owner_id: &str, debt_id: Uuid) -> Result<DebtRecord> {
        self.active_for(&[owner_id.to_string()])?
            .into_iter()
            .find(|d| d.id == debt_id)
            .ok_or_else(|| Error::not_found("debt not found"))
    }

    /// Active records with `due_date < today`, annotated with whole days
    /// overdue. Disjoint from `upcoming` by construction.
    pub fn overdue(&self, owner_id: &str, today: NaiveDate) -> Result<Vec<OverdueDebt>> {
        Ok(self
            .active_for(&[owner_id.to_string()])?
            .into_iter()
            .filter(|d| d.due_date < today)
            .map(|debt| {
                let days_overdue = (today - debt.due_date).num_days();
                OverdueDebt { debt, days_overdue }
            })
            .collect())
    }

    /// Active records with `today <= due_date <= today + days_ahead`.
    /// A record due today reports zero days until due.
    pub fn upcoming(
        &self,
        owner_id: &str,
        today: NaiveDate,
        days_ahead: i64,
    ) -> Result<Vec<UpcomingDebt>> {
        let horizon = today + chrono::Duration::days(days_ahead);
        Ok(self
            .active_for(&[owner_id.to_string()])?
            .into_iter()
            .filter(|d| d.due_date >= today && d.due_date <= horizon)
            .map(|debt| {
                let days_until_due = (debt.due_date - today).num_days();
                UpcomingDebt {
                    debt,
                    days_until_due,
                }
            })
            .collect())
    }

    /// Apply a payment against a Дебет row. Converts to base currency,
    /// rejects overpayment with the exact remaining amount, and settles
    /// the record exactly when paid reaches the base amount.
    ///
    /// Кредит rows are not payable through this path.
    pub fn apply_payment(
        &self,
        owner_id: &str,
        debt_id: Uuid,
        amount: Decimal,
        currency: Currency,
    ) -> Result<PaymentOutcome> {
        if amount <= Decimal::ZERO {
            return Err(Error::validation("payment must be positive"));
        }
        let mut debt = self.find_active(owner_id, debt_id)?;
        if debt.kind != DebtKind::Debit {
            return Err(Error::not_found("this debt cannot be paid off"));
        }

        let base_payment = self.currency.to_base(amount, currency, owner_id)?;
        let fully_paid = debt.apply_payment(base_payment, Utc::now())?;
        self.store.update_debt(&debt)?;

        Ok(PaymentOutcome {
            counterparty: debt.counterparty.clone(),
            fully_paid,
            remaining: debt.remaining(),
        })
    }

    /// Overwrite the due date of an active record. The previous date is
    /// not retained.
    pub fn extend(
        &self,
        owner_id: &str,
        debt_id: Uuid,
        new_due_date: NaiveDate,
        today: NaiveDate,
    ) -> Result<DebtRecord> {
        if new_due_date < today {
            return Err(Error::validation("due date must not be in the past"));
        }
        let mut debt = self.find_active(owner_id, debt_id)?;
        debt.due_date = new_due_date;
        self.store.update_debt(&debt)?;
        Ok(debt)
    }

    /// Remaining base-currency totals split by direction
    pub fn outstanding_totals(&self, owner_ids: &[String]) -> Result<DebtTotals> {
        let mut totals = DebtTotals::default();
        for debt in self.active_for(owner_ids)? {
            match debt.kind {
                DebtKind::Debit => totals.debit += debt.remaining(),
                DebtKind::Credit => totals.credit += debt.remaining(),
            }
        }
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;

    fn service() -> DebtService {
        let store: Arc<dyn LedgerStore> = Arc::new(InMemoryStore::with_seed_categories());
        let currency = CurrencyService::new(Arc::clone(&store));
        DebtService::new(store, currency)
    }

    fn draft(kind: DebtKind, base: i64) -> DebtDraft {
        DebtDraft {
            kind,
            counterparty: "Жасур".into(),
            amount: Decimal::from(base),
            currency: Currency::Uzs,
            base_amount: Decimal::from(base),
            description: "ремонт".into(),
        }
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    #[test]
    fn test_create_rejects_past_due_date() {
        let svc = service();
        let yesterday = today() - chrono::Duration::days(1);
        assert!(matches!(
            svc.create("1", &draft(DebtKind::Debit, 50000), yesterday, today()),
            Err(Error::Validation(_))
        ));
        // today is allowed
        assert!(svc
            .create("1", &draft(DebtKind::Debit, 50000), today(), today())
            .is_ok());
    }

    #[test]
    fn test_partial_then_overpayment() {
        let svc = service();
        let due = today() + chrono::Duration::days(30);
        let debt = svc
            .create("1", &draft(DebtKind::Debit, 50000), due, today())
            .unwrap();

        let outcome = svc
            .apply_payment("1", debt.id, Decimal::from(30000), Currency::Uzs)
            .unwrap();
        assert!(!outcome.fully_paid);
        assert_eq!(outcome.remaining, Decimal::from(20000));

        let err = svc
            .apply_payment("1", debt.id, Decimal::from(25000), Currency::Uzs)
            .unwrap_err();
        match err {
            Error::Overpayment { remaining } => assert_eq!(remaining, Decimal::from(20000)),
            other => panic!("unexpected: {other}"),
        }

        // exact remainder settles the debt
        let outcome = svc
            .apply_payment("1", debt.id, Decimal::from(20000), Currency::Uzs)
            .unwrap();
        assert!(outcome.fully_paid);
        assert!(svc.active_for(&["1".to_string()]).unwrap().is_empty());
    }

    #[test]
    fn test_credit_rows_are_not_payable() {
        let svc = service();
        let due = today() + chrono::Duration::days(10);
        let debt = svc
            .create("1", &draft(DebtKind::Credit, 10000), due, today())
            .unwrap();
        assert!(matches!(
            svc.apply_payment("1", debt.id, Decimal::from(1000), Currency::Uzs),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_overdue_and_upcoming_are_disjoint() {
        let svc = service();
        let t = today();
        // create with a valid date, then backdate through extend's store
        let overdue = svc
            .create("1", &draft(DebtKind::Debit, 1000), t, t)
            .unwrap();
        // simulate three days passing
        let later = t + chrono::Duration::days(3);

        let overdue_list = svc.overdue("1", later).unwrap();
        assert_eq!(overdue_list.len(), 1);
        assert_eq!(overdue_list[0].days_overdue, 3);
        assert_eq!(overdue_list[0].debt.id, overdue.id);

        let upcoming_list = svc.upcoming("1", later, 7).unwrap();
        assert!(upcoming_list.iter().all(|u| u.debt.id != overdue.id));
    }

    #[test]
    fn test_due_today_counts_as_upcoming() {
        let svc = service();
        let t = today();
        let debt = svc.create("1", &draft(DebtKind::Debit, 1000), t, t).unwrap();

        assert!(svc.overdue("1", t).unwrap().is_empty());
        let upcoming = svc.upcoming("1", t, 7).unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].days_until_due, 0);
        assert_eq!(upcoming[0].debt.id, debt.id);
    }

    #[test]
    fn test_extend_only_active_and_not_past() {
        let svc = service();
        let t = today();
        let due = t + chrono::Duration::days(5);
        let debt = svc
            .create("1", &draft(DebtKind::Debit, 1000), due, t)
            .unwrap();

        assert!(svc
            .extend("1", debt.id, t - chrono::Duration::days(1), t)
            .is_err());

        let extended = svc
            .extend("1", debt.id, t + chrono::Duration::days(20), t)
            .unwrap();
        assert_eq!(extended.due_date, t + chrono::Duration::days(20));

        // settle, then extension is denied
        svc.apply_payment("1", debt.id, Decimal::from(1000), Currency::Uzs)
            .unwrap();
        assert!(matches!(
            svc.extend("1", debt.id, t + chrono::Duration::days(40), t),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_outstanding_totals_split_directions() {
        let svc = service();
        let t = today();
        let due = t + chrono::Duration::days(10);
        svc.create("1", &draft(DebtKind::Debit, 50000), due, t).unwrap();
        svc.create("1", &draft(DebtKind::Credit, 30000), due, t).unwrap();

        let totals = svc.outstanding_totals(&["1".to_string()]).unwrap();
        assert_eq!(totals.debit, Decimal::from(50000));
        assert_eq!(totals.credit, Decimal::from(30000));
    }
}
