//! Savings goal entity

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsGoal {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub target_amount: Decimal,
    pub saved_amount: Decimal,
    pub deadline: NaiveDate,
}

impl SavingsGoal {
    pub fn progress_percent(&self) -> Decimal {
        if self.target_amount <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.saved_amount / self.target_amount * Decimal::from(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress() {
        let goal = SavingsGoal {
            id: "G1".into(),
            owner_id: "1".into(),
            name: "Машина".into(),
            target_amount: Decimal::from(1000),
            saved_amount: Decimal::from(250),
            deadline: NaiveDate::from_ymd_opt(2027, 1, 1).unwrap(),
        };
        assert_eq!(goal.progress_percent(), Decimal::from(25));
    }

    #[test]
    fn test_zero_target_does_not_divide() {
        let goal = SavingsGoal {
            id: "G2".into(),
            owner_id: "1".into(),
            name: "x".into(),
            target_amount: Decimal::ZERO,
            saved_amount: Decimal::from(10),
            deadline: NaiveDate::from_ymd_opt(2027, 1, 1).unwrap(),
        };
        assert_eq!(goal.progress_percent(), Decimal::ZERO);
    }
}
