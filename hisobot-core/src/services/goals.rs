//! Savings goal service

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::domain::result::{Error, Result};
use crate::domain::SavingsGoal;
use crate::ports::LedgerStore;

#[derive(Clone)]
pub struct GoalService {
    store: Arc<dyn LedgerStore>,
}

impl GoalService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub fn list(&self, owner_id: &str) -> Result<Vec<SavingsGoal>> {
        self.store.goals_for(owner_id)
    }

    pub fn create(
        &self,
        owner_id: &str,
        name: &str,
        target_amount: Decimal,
        deadline: NaiveDate,
    ) -> Result<SavingsGoal> {
        if name.trim().is_empty() {
            return Err(Error::validation("goal name must not be empty"));
        }
        if target_amount <= Decimal::ZERO {
            return Err(Error::validation("target amount must be positive"));
        }
        let goal = SavingsGoal {
            id: format!("G{}", Utc::now().timestamp_millis()),
            owner_id: owner_id.to_string(),
            name: name.trim().to_string(),
            target_amount,
            saved_amount: Decimal::ZERO,
            deadline,
        };
        self.store.append_goal(&goal)?;
        Ok(goal)
    }

    pub fn deposit(&self, owner_id: &str, goal_id: &str, amount: Decimal) -> Result<SavingsGoal> {
        if amount <= Decimal::ZERO {
            return Err(Error::validation("deposit must be positive"));
        }
        self.store.add_goal_deposit(owner_id, goal_id, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;

    fn service() -> GoalService {
        GoalService::new(Arc::new(InMemoryStore::with_seed_categories()))
    }

    fn deadline() -> NaiveDate {
        NaiveDate::from_ymd_opt(2027, 6, 1).unwrap()
    }

    #[test]
    fn test_create_and_deposit() {
        let svc = service();
        let goal = svc
            .create("1", "Машина", Decimal::from(10000000), deadline())
            .unwrap();
        assert!(goal.id.starts_with('G'));

        let updated = svc.deposit("1", &goal.id, Decimal::from(500000)).unwrap();
        assert_eq!(updated.saved_amount, Decimal::from(500000));
        assert_eq!(svc.list("1").unwrap().len(), 1);
    }

    #[test]
    fn test_deposit_into_unknown_goal() {
        let svc = service();
        assert!(matches!(
            svc.deposit("1", "G404", Decimal::from(100)),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_validation() {
        let svc = service();
        assert!(svc.create("1", "  ", Decimal::from(100), deadline()).is_err());
        assert!(svc.create("1", "x", Decimal::ZERO, deadline()).is_err());
    }
}
