//! Application services wired over the store and transport ports

pub mod budget;
pub mod categories;
pub mod classify;
pub mod currency;
pub mod debt;
pub mod family;
pub mod goals;
pub mod ledger;
pub mod logging;
pub mod reminders;
pub mod report;
pub mod router;
pub mod session;

pub use budget::{BudgetAlert, BudgetService};
pub use categories::CategoryService;
pub use classify::ClassificationService;
pub use currency::CurrencyService;
pub use debt::{DebtService, DebtTotals, PaymentOutcome};
pub use family::FamilyService;
pub use goals::GoalService;
pub use ledger::LedgerService;
pub use logging::{EventLog, LogEntry, LogEvent};
pub use reminders::{ReminderService, SweepReport};
pub use report::{BalanceSummary, ReportPayload, ReportService, WeeklyDigest};
pub use router::{Command, MessageRouter};
pub use session::SessionService;
