//! Per-chat session state
//!
//! Exactly one pending state per chat; a new pending state always
//! replaces the old one. Every wizard is terminal back to idle on
//! success; malformed input never advances the state.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::category::Lang;
use super::currency::Currency;
use super::debt::DebtKind;
use super::transaction::TxKind;

/// Collected debt-wizard fields, parked while the due date is pending
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtDraft {
    pub kind: DebtKind,
    pub counterparty: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub base_amount: Decimal,
    pub description: String,
}

/// Whose records a report reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportScope {
    Personal,
    Family,
}

/// The single outstanding multi-step input a chat is waiting on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PendingState {
    /// A category button was pressed; next message is `amount comment`
    CategoryAmount { kind: TxKind, category_id: String },
    NewCategoryName,
    AiQuestion,
    GoalName,
    GoalAmount { name: String },
    GoalDeadline { name: String, amount: Decimal },
    GoalDeposit { goal_id: String },
    BudgetLimit { category_id: String },
    Rate { currency: Currency },
    DebtInfo { kind: DebtKind },
    DueDate { draft: DebtDraft },
    NewDueDate { debt_id: Uuid },
    Payment { debt_id: Uuid },
    ReportStartDate { scope: ReportScope },
    ReportEndDate { scope: ReportScope, start: NaiveDate },
    FamilyName,
    InviteCode,
    ClearConfirm,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub owner_id: String,
    pub lang: Lang,
    pub pending: Option<PendingState>,
}

impl ChatSession {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            lang: Lang::default(),
            pending: None,
        }
    }
}
