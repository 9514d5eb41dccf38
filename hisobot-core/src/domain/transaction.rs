//! Transaction ledger entities
//!
//! One row per record, normalized to the base currency at write time.
//! The stored base amount is never recomputed when rates change later.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::currency::Currency;

/// Which ledger table the record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    Income,
    Expense,
}

/// One ledger row: `timestamp, categoryId, amount, comment, ownerId,
/// currencyCode, baseAmount`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub timestamp: DateTime<Utc>,
    pub category_id: String,
    pub amount: Decimal,
    pub comment: String,
    pub owner_id: String,
    pub currency: Currency,
    pub base_amount: Decimal,
}

/// Single-level undo pointer, overwritten by every new write.
/// Only the most recent record per owner can be reversed.
#[derive(Debug, Clone)]
pub struct LastTransaction {
    pub kind: TxKind,
    pub row_index: usize,
    pub record: TransactionRecord,
}
