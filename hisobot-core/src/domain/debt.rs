//! Debt ledger entities
//!
//! Row schema: `createdAt, ownerId, kind, counterparty, amount,
//! currencyCode, baseAmount, description, dueDate, status, settledAt,
//! paidAmount`. Kind and status use the Russian wire literals of the
//! underlying sheet.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::currency::Currency;
use super::result::{Error, Result};

/// Дебет = money the owner owes; Кредит = money owed to the owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DebtKind {
    Debit,
    Credit,
}

impl DebtKind {
    pub fn wire_label(&self) -> &'static str {
        match self {
            DebtKind::Debit => "Дебет",
            DebtKind::Credit => "Кредит",
        }
    }
}

impl fmt::Display for DebtKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_label())
    }
}

impl FromStr for DebtKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Дебет" => Ok(DebtKind::Debit),
            "Кредит" => Ok(DebtKind::Credit),
            other => Err(Error::validation(format!("unknown debt kind: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DebtStatus {
    Active,
    Settled,
}

impl DebtStatus {
    pub fn wire_label(&self) -> &'static str {
        match self {
            DebtStatus::Active => "Активен",
            DebtStatus::Settled => "Погашен",
        }
    }
}

impl fmt::Display for DebtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_label())
    }
}

impl FromStr for DebtStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Активен" => Ok(DebtStatus::Active),
            "Погашен" => Ok(DebtStatus::Settled),
            other => Err(Error::validation(format!("unknown debt status: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub owner_id: String,
    pub kind: DebtKind,
    pub counterparty: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub base_amount: Decimal,
    pub description: String,
    pub due_date: NaiveDate,
    pub status: DebtStatus,
    pub settled_at: Option<DateTime<Utc>>,
    pub paid_amount: Decimal,
}

impl DebtRecord {
    pub fn remaining(&self) -> Decimal {
        (self.base_amount - self.paid_amount).max(Decimal::ZERO)
    }

    /// Apply a base-currency payment.
    ///
    /// Invariant: `0 <= paid_amount <= base_amount`. Overpayment is
    /// rejected with the exact remaining amount and no mutation. The
    /// Active -> Settled transition is one-way and stamps `settled_at`.
    pub fn apply_payment(&mut self, base_payment: Decimal, now: DateTime<Utc>) -> Result<bool> {
        if self.status != DebtStatus::Active {
            return Err(Error::not_found("debt is not active"));
        }
        let new_paid = self.paid_amount + base_payment;
        if new_paid > self.base_amount {
            return Err(Error::Overpayment {
                remaining: self.remaining(),
            });
        }
        self.paid_amount = new_paid;
        let fully_paid = self.paid_amount >= self.base_amount;
        if fully_paid {
            self.status = DebtStatus::Settled;
            self.settled_at = Some(now);
        }
        Ok(fully_paid)
    }
}

/// Active debt past its due date
#[derive(Debug, Clone)]
pub struct OverdueDebt {
    pub debt: DebtRecord,
    pub days_overdue: i64,
}

/// Active debt due within the queried window
#[derive(Debug, Clone)]
pub struct UpcomingDebt {
    pub debt: DebtRecord,
    pub days_until_due: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debt(base: i64, paid: i64) -> DebtRecord {
        DebtRecord {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            owner_id: "1".into(),
            kind: DebtKind::Debit,
            counterparty: "Жасур".into(),
            amount: Decimal::from(base),
            currency: Currency::Uzs,
            base_amount: Decimal::from(base),
            description: "ремонт".into(),
            due_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            status: DebtStatus::Active,
            settled_at: None,
            paid_amount: Decimal::from(paid),
        }
    }

    #[test]
    fn test_partial_payment_stays_active() {
        let mut d = debt(50000, 0);
        let done = d.apply_payment(Decimal::from(30000), Utc::now()).unwrap();
        assert!(!done);
        assert_eq!(d.status, DebtStatus::Active);
        assert_eq!(d.remaining(), Decimal::from(20000));
        assert!(d.settled_at.is_none());
    }

    #[test]
    fn test_overpayment_rejected_without_mutation() {
        let mut d = debt(50000, 30000);
        let err = d.apply_payment(Decimal::from(25000), Utc::now()).unwrap_err();
        match err {
            Error::Overpayment { remaining } => assert_eq!(remaining, Decimal::from(20000)),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(d.paid_amount, Decimal::from(30000));
        assert_eq!(d.status, DebtStatus::Active);
    }

    #[test]
    fn test_exact_payment_settles() {
        let mut d = debt(50000, 30000);
        let done = d.apply_payment(Decimal::from(20000), Utc::now()).unwrap();
        assert!(done);
        assert_eq!(d.status, DebtStatus::Settled);
        assert!(d.settled_at.is_some());
    }

    #[test]
    fn test_settled_debt_rejects_payment() {
        let mut d = debt(100, 100);
        d.status = DebtStatus::Settled;
        assert!(d.apply_payment(Decimal::ONE, Utc::now()).is_err());
    }

    #[test]
    fn test_wire_labels_round_trip() {
        assert_eq!("Дебет".parse::<DebtKind>().unwrap(), DebtKind::Debit);
        assert_eq!(DebtKind::Credit.to_string(), "Кредит");
        assert_eq!("Погашен".parse::<DebtStatus>().unwrap(), DebtStatus::Settled);
        assert_eq!(DebtStatus::Active.to_string(), "Активен");
    }
}
