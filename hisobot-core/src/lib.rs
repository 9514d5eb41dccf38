//! Hisobot Core - Business logic for the chat-driven family finance tracker
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (TransactionRecord, DebtRecord, etc.)
//! - **ports**: Trait definitions for external dependencies (LedgerStore, Messenger, LabelClassifier)
//! - **services**: Business logic orchestration and the per-chat message router
//! - **adapters**: Concrete implementations (CSV store, Gemini, in-memory)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

use std::sync::Arc;

use config::Config;
use ports::{Analyst, LabelClassifier, LedgerStore, Messenger};
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::{Error, Result};
pub use domain::{
    CategoryDict, CategoryEntry, CategoryKind, Currency, DebtKind, DebtRecord, DebtStatus,
    FamilyMember, Lang, SavingsGoal, TransactionRecord, TxKind,
};

/// Main context for Hisobot operations
///
/// This is the primary entry point for all business logic. It holds the
/// store, configuration, and all services, with the router on top.
pub struct HisobotContext {
    pub config: Config,
    pub store: Arc<dyn LedgerStore>,
    pub session_service: SessionService,
    pub category_service: CategoryService,
    pub currency_service: CurrencyService,
    pub classification_service: ClassificationService,
    pub ledger_service: LedgerService,
    pub budget_service: BudgetService,
    pub debt_service: DebtService,
    pub goal_service: GoalService,
    pub family_service: FamilyService,
    pub report_service: ReportService,
    pub reminder_service: ReminderService,
    pub router: MessageRouter,
}

impl HisobotContext {
    /// Create a new Hisobot context
    pub fn new(
        store: Arc<dyn LedgerStore>,
        classifier: Arc<dyn LabelClassifier>,
        analyst: Arc<dyn Analyst>,
        messenger: Arc<dyn Messenger>,
        config: Config,
    ) -> Result<Self> {
        let session_service = SessionService::new();
        let category_service = CategoryService::new(Arc::clone(&store))?;
        let currency_service = CurrencyService::new(Arc::clone(&store));
        let classification_service = ClassificationService::new(classifier);
        let budget_service = BudgetService::new(Arc::clone(&store));
        let ledger_service = LedgerService::new(
            Arc::clone(&store),
            currency_service.clone(),
            budget_service.clone(),
        );
        let debt_service = DebtService::new(Arc::clone(&store), currency_service.clone());
        let goal_service = GoalService::new(Arc::clone(&store));
        let family_service =
            FamilyService::new(Arc::clone(&store), config.owner_chat_id.clone());
        let report_service = ReportService::new(Arc::clone(&store), debt_service.clone());
        let reminder_service = ReminderService::new(
            Arc::clone(&store),
            debt_service.clone(),
            report_service.clone(),
            Arc::clone(&messenger),
            config.near_due_days,
        );

        let router = MessageRouter::new(
            Arc::clone(&store),
            session_service.clone(),
            category_service.clone(),
            currency_service.clone(),
            classification_service.clone(),
            ledger_service.clone(),
            budget_service.clone(),
            debt_service.clone(),
            goal_service.clone(),
            family_service.clone(),
            report_service.clone(),
            analyst,
            messenger,
        );

        Ok(Self {
            config,
            store,
            session_service,
            category_service,
            currency_service,
            classification_service,
            ledger_service,
            budget_service,
            debt_service,
            goal_service,
            family_service,
            report_service,
            reminder_service,
            router,
        })
    }
}
