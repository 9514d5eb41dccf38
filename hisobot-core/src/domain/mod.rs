//! Core domain entities
//!
//! Pure data structures and parsers - no I/O or external dependencies.

mod category;
pub mod currency;
mod debt;
mod family;
mod goal;
pub mod parse;
pub mod result;
mod session;
mod transaction;

pub use category::{CategoryDict, CategoryEntry, CategoryKind, Lang};
pub use currency::{Currency, CurrencyRate, BASE_CURRENCY};
pub use debt::{DebtKind, DebtRecord, DebtStatus, OverdueDebt, UpcomingDebt};
pub use family::FamilyMember;
pub use goal::SavingsGoal;
pub use session::{ChatSession, DebtDraft, PendingState, ReportScope};
pub use transaction::{LastTransaction, TransactionRecord, TxKind};
