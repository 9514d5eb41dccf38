//! Storage port
//!
//! The underlying persistence is an ordered, append-only table per sheet.
//! Row indices returned by appends are stable for the lifetime of the
//! sheet; deletions leave holes rather than renumbering.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::result::Result;
use crate::domain::{
    CategoryEntry, CurrencyRate, DebtRecord, FamilyMember, SavingsGoal, TransactionRecord, TxKind,
};

pub trait LedgerStore: Send + Sync {
    // transactions (one table for income, one for expense)
    fn append_transaction(&self, kind: TxKind, record: &TransactionRecord) -> Result<usize>;
    fn transactions(&self, kind: TxKind, owner_ids: &[String]) -> Result<Vec<TransactionRecord>>;
    fn delete_transaction(&self, kind: TxKind, row_index: usize) -> Result<()>;

    // debts
    fn append_debt(&self, record: &DebtRecord) -> Result<()>;
    fn debts(&self, owner_ids: &[String]) -> Result<Vec<DebtRecord>>;
    /// Overwrite the row identified by `record.id`
    fn update_debt(&self, record: &DebtRecord) -> Result<()>;

    // category dictionary
    fn categories(&self) -> Result<Vec<CategoryEntry>>;
    fn append_category(&self, entry: &CategoryEntry) -> Result<()>;

    // currency rates
    fn rates_for(&self, owner_id: &str) -> Result<Vec<CurrencyRate>>;
    fn upsert_rate(&self, rate: &CurrencyRate) -> Result<()>;

    // budgets: category id -> monthly limit in base currency
    fn budgets_for(&self, owner_id: &str) -> Result<HashMap<String, Decimal>>;
    /// A limit of zero or less removes the row
    fn set_budget(&self, owner_id: &str, category_id: &str, limit: Decimal) -> Result<()>;

    // savings goals
    fn goals_for(&self, owner_id: &str) -> Result<Vec<SavingsGoal>>;
    fn append_goal(&self, goal: &SavingsGoal) -> Result<()>;
    fn add_goal_deposit(&self, owner_id: &str, goal_id: &str, amount: Decimal)
        -> Result<SavingsGoal>;

    // family sharing
    fn families(&self) -> Result<Vec<FamilyMember>>;
    fn append_family_member(&self, member: &FamilyMember) -> Result<()>;
    fn remove_family_member(&self, member_id: &str) -> Result<()>;

    // reminder sweep bookkeeping
    fn last_reminder_date(&self, owner_id: &str) -> Result<Option<NaiveDate>>;
    fn set_last_reminder_date(&self, owner_id: &str, date: NaiveDate) -> Result<()>;

    /// Every owner id that has at least one transaction or debt row
    fn known_owner_ids(&self) -> Result<Vec<String>>;

    /// Remove the owner's transactions, debts and goals. Rates and
    /// family membership stay.
    fn clear_owner_data(&self, owner_id: &str) -> Result<()>;
}
