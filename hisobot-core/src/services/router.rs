//! Message router - the per-chat state machine and command dispatch
//!
//! Entry points: `handle_message` for plain text and `handle_callback`
//! for button presses. On each inbound message the chat's pending state
//! is looked up first; if present, the exact handler for that state
//! consumes the text. Otherwise recognized menu commands dispatch, and
//! anything else falls through to free-text classification.
//!
//! Malformed input re-prompts without advancing the state; successful
//! wizard completion always returns the chat to idle.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::currency::{detect_currency, format_amount, format_money, format_multi, Currency, BASE_CURRENCY};
use crate::domain::parse::{self, format_date};
use crate::domain::result::{Error, Result};
use crate::domain::{
    CategoryKind, DebtDraft, DebtKind, Lang, PendingState, ReportScope, TxKind,
};
use crate::ports::{Analyst, LedgerStore, Messenger};

use super::budget::{BudgetAlert, BudgetService};
use super::categories::CategoryService;
use super::classify::ClassificationService;
use super::currency::CurrencyService;
use super::debt::DebtService;
use super::family::FamilyService;
use super::goals::GoalService;
use super::ledger::LedgerService;
use super::report::ReportService;
use super::session::SessionService;

/// Recognized menu commands; labels are looked up per locale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    AddExpense,
    AddIncome,
    ViewReport,
    AskAnalyst,
    Settings,
    FamilyMode,
    MyBudget,
    MyGoals,
    AddNewCategory,
    UpdateRates,
    ClearBase,
    ChangeLang,
    Back,
    BackToSettings,
    NewGoal,
    ListMyGoals,
    SuggestBudget,
    SetupManually,
    ViewBudget,
    DetailedReport,
    ViewBalance,
    CreateFamily,
    JoinFamily,
    MyFamily,
    LeaveFamily,
    SetUsdRate,
    SetEurRate,
    SetRubRate,
    ViewCurrentRates,
    DebtsMenu,
    GiveCredit,
    TakeDebt,
    PayDebt,
    ViewDebts,
    ExtendDebt,
    CheckOverdue,
}

/// `(ru label, uz label, command)` - one row per menu button
const COMMAND_LABELS: &[(&str, &str, Command)] = &[
    ("✚ Добавить расход", "➕ Xarajat", Command::AddExpense),
    ("💰 Добавить доход", "➕ Daromad", Command::AddIncome),
    ("📊 Посмотреть отчёт", "📊 Hisobotlar", Command::ViewReport),
    ("🤖 Спросить Аналитика", "🤖 Tahlilchi", Command::AskAnalyst),
    ("⚙️ Настройки", "⚙️ Sozlamalar", Command::Settings),
    ("👨‍👩‍👧‍👦 Семейный режим", "👨‍👩‍👧‍👦 Oila rejimi", Command::FamilyMode),
    ("💰 Мой Бюджет", "💰 Mening byudjetim", Command::MyBudget),
    ("🎯 Мои цели", "🎯 Maqsadlarim", Command::MyGoals),
    (
        "🛠️ Добавить новую категорию расходов",
        "🛠️ Yangi xarajat kategoriyasini qo'shish",
        Command::AddNewCategory,
    ),
    (
        "💱 Настройка курсов валют",
        "💱 Valyuta kurslarini sozlash",
        Command::UpdateRates,
    ),
    ("🧹 Очистить базу", "🧹 Bazani tozalash", Command::ClearBase),
    ("🌐 Сменить язык", "🌐 Tilni o'zgartirish", Command::ChangeLang),
    ("⬅️ Назад", "⬅️ Orqaga", Command::Back),
    (
        "⬅️ Назад в Настройки",
        "⬅️ Sozlamalarga qaytish",
        Command::BackToSettings,
    ),
    ("➕ Новая цель", "➕ Yangi maqsad", Command::NewGoal),
    ("📋 Список моих целей", "📋 Maqsadlar ro'yxati", Command::ListMyGoals),
    (
        "💡 Предложить бюджет",
        "💡 Byudjet taklif qilish",
        Command::SuggestBudget,
    ),
    ("✏️ Настроить вручную", "✏️ Qo'lda sozlash", Command::SetupManually),
    (
        "👁️ Посмотреть бюджет",
        "👁️ Byudjetni ko'rish",
        Command::ViewBudget,
    ),
    ("📋 Детальный отчёт", "📋 Batafsil hisobot", Command::DetailedReport),
    ("💰 Баланс", "💰 Balans", Command::ViewBalance),
    ("🏠 Создать семью", "🏠 Oila yaratish", Command::CreateFamily),
    (
        "👥 Присоединиться к семье",
        "👥 Oilaga qo'shilish",
        Command::JoinFamily,
    ),
    ("👨‍👩‍👧‍👦 Моя семья", "👨‍👩‍👧‍👦 Mening oilam", Command::MyFamily),
    ("🚪 Покинуть семью", "🚪 Oiladan chiqish", Command::LeaveFamily),
    (
        "💵 Установить курс USD",
        "💵 USD kursini o'rnatish",
        Command::SetUsdRate,
    ),
    (
        "💶 Установить курс EUR",
        "💶 EUR kursini o'rnatish",
        Command::SetEurRate,
    ),
    (
        "💷 Установить курс RUB",
        "💷 RUB kursini o'rnatish",
        Command::SetRubRate,
    ),
    (
        "👁️ Посмотреть текущие курсы",
        "👁️ Joriy kurslarni ko'rish",
        Command::ViewCurrentRates,
    ),
    (
        "💳 Управление долгами",
        "💳 Qarzlarni boshqarish",
        Command::DebtsMenu,
    ),
    ("📤 Дать в долг", "📤 Qarz berish", Command::GiveCredit),
    ("📥 Взять в долг", "📥 Qarz olish", Command::TakeDebt),
    ("💰 Погасить долг", "💰 Qarzni to'lash", Command::PayDebt),
    ("📊 Мои долги", "📊 Qarzlarim", Command::ViewDebts),
    ("📅 Продлить срок", "📅 Muddatni uzaytirish", Command::ExtendDebt),
    ("🚨 Просроченные", "🚨 Kechiktirilganlar", Command::CheckOverdue),
];

/// Label -> command lookup across both locales
pub fn command_for(text: &str) -> Option<Command> {
    COMMAND_LABELS
        .iter()
        .find(|(ru, uz, _)| *ru == text || *uz == text)
        .map(|(_, _, cmd)| *cmd)
}

#[derive(Clone)]
pub struct MessageRouter {
    store: Arc<dyn LedgerStore>,
    sessions: SessionService,
    categories: CategoryService,
    currency: CurrencyService,
    classify: ClassificationService,
    ledger: LedgerService,
    budget: BudgetService,
    debt: DebtService,
    goals: GoalService,
    family: FamilyService,
    report: ReportService,
    analyst: Arc<dyn Analyst>,
    messenger: Arc<dyn Messenger>,
}

impl MessageRouter {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn LedgerStore>,
        sessions: SessionService,
        categories: CategoryService,
        currency: CurrencyService,
        classify: ClassificationService,
        ledger: LedgerService,
        budget: BudgetService,
        debt: DebtService,
        goals: GoalService,
        family: FamilyService,
        report: ReportService,
        analyst: Arc<dyn Analyst>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            store,
            sessions,
            categories,
            currency,
            classify,
            ledger,
            budget,
            debt,
            goals,
            family,
            report,
            analyst,
            messenger,
        }
    }

    fn send(&self, chat_id: &str, text: &str) -> Result<()> {
        self.messenger.send_text(chat_id, text)
    }

    /// Plain-text entry point
    pub fn handle_message(&self, chat_id: &str, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }

        if text == "/start" {
            self.sessions.clear_pending(chat_id);
            self.currency.ensure_seeded(chat_id)?;
            return self.send(
                chat_id,
                "👋 Добро пожаловать в Hisobot!\n\
                 Выберите язык: [set_lang_ru] Русский / [set_lang_uz] O'zbek\n\n\
                 Просто напишите сумму и комментарий, например: 25000 такси",
            );
        }

        let authorized = self.check_authorized(chat_id)?;

        if let Some(command) = command_for(text) {
            // a menu command always interrupts a pending wizard
            self.sessions.clear_pending(chat_id);
            if !authorized && !matches!(command, Command::CreateFamily | Command::JoinFamily) {
                return self.send_unauthorized(chat_id);
            }
            return self.handle_command(chat_id, command);
        }

        if let Some(pending) = self.sessions.session(chat_id).pending {
            let onboarding = matches!(pending, PendingState::FamilyName | PendingState::InviteCode);
            if !authorized && !onboarding {
                self.sessions.clear_pending(chat_id);
                return self.send_unauthorized(chat_id);
            }
            return self.handle_pending(chat_id, pending, text);
        }

        if !authorized {
            return self.send_unauthorized(chat_id);
        }

        self.handle_free_text(chat_id, text)
    }

    /// Gate flag for the routing paths; the `Unauthorized` error itself
    /// is raised by the family service and mapped to the denial text
    /// here at the boundary.
    fn check_authorized(&self, chat_id: &str) -> Result<bool> {
        match self.family.authorize(chat_id) {
            Ok(()) => Ok(true),
            Err(Error::Unauthorized) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn send_unauthorized(&self, chat_id: &str) -> Result<()> {
        self.send(
            chat_id,
            "⛔ У вас нет доступа. Создайте семью или присоединитесь по коду приглашения.",
        )
    }

    // ------------------------------------------------------------------
    // free text -> classification -> ledger
    // ------------------------------------------------------------------

    fn handle_free_text(&self, chat_id: &str, text: &str) -> Result<()> {
        let Ok((amount, comment)) = parse::parse_amount_comment(text) else {
            return self.send(
                chat_id,
                &format!(
                    "Я не распознал команду: \"{text}\".\n\
                     Напишите сумму и комментарий, например: 25000 такси"
                ),
            );
        };

        let dict = self.categories.dict();
        let source = if comment.is_empty() { text } else { comment.as_str() };
        let category_id = self.classify.classify(source, &dict);
        let kind = match dict.kind_of(&category_id) {
            Some(CategoryKind::Income) => TxKind::Income,
            _ => TxKind::Expense,
        };
        let currency = detect_currency(source);
        let comment = if comment.is_empty() {
            text.to_string()
        } else {
            comment
        };

        self.record_and_confirm(chat_id, kind, &category_id, amount, currency, &comment)
    }

    fn record_and_confirm(
        &self,
        chat_id: &str,
        kind: TxKind,
        category_id: &str,
        amount: Decimal,
        currency: Currency,
        comment: &str,
    ) -> Result<()> {
        let (record, alert) =
            self.ledger
                .record(chat_id, kind, category_id, amount, currency, comment)?;

        let lang = self.sessions.lang(chat_id);
        let dict = self.categories.dict();
        let label = dict.label(category_id, lang);
        let kind_word = match kind {
            TxKind::Income => "Доход",
            TxKind::Expense => "Расход",
        };
        self.send(
            chat_id,
            &format!(
                "✅ {} на {} добавлен в категорию \"{}\".\n\
                 [delete_last_transaction] 🗑️ Удалить эту транзакцию",
                kind_word,
                format_multi(record.amount, record.currency, record.base_amount),
                label,
            ),
        )?;

        if let Some(alert) = alert {
            self.send_budget_alert(chat_id, &alert)?;
        }
        Ok(())
    }

    fn send_budget_alert(&self, chat_id: &str, alert: &BudgetAlert) -> Result<()> {
        let lang = self.sessions.lang(chat_id);
        let label = self.categories.dict().label(&alert.category_id, lang);
        let text = if alert.exceeded {
            format!(
                "⛔ Превышен лимит! Вы потратили {}% бюджета по категории \"{}\".",
                alert.percent, label
            )
        } else {
            format!(
                "⚠️ Внимание! Вы потратили уже {}% бюджета по категории \"{}\".",
                alert.percent, label
            )
        };
        self.send(chat_id, &text)
    }

    // ------------------------------------------------------------------
    // pending-state handlers
    // ------------------------------------------------------------------

    fn handle_pending(&self, chat_id: &str, pending: PendingState, text: &str) -> Result<()> {
        match pending {
            PendingState::CategoryAmount { kind, category_id } => {
                let (amount, comment) = match parse::parse_amount_comment(text) {
                    Ok(parsed) => parsed,
                    Err(_) => {
                        return self.send(chat_id, "❌ Неверный формат. Сумма Комментарий");
                    }
                };
                let source = if comment.is_empty() { text } else { comment.as_str() };
                let currency = detect_currency(source);
                // the write comes first: a failed write keeps the wizard
                // in place for a retry
                match self.record_and_confirm(chat_id, kind, &category_id, amount, currency, &comment)
                {
                    Ok(()) => {
                        self.sessions.clear_pending(chat_id);
                        Ok(())
                    }
                    Err(Error::Validation(_)) => {
                        self.send(chat_id, "❌ Сумма должна быть числом больше нуля.")
                    }
                    Err(e) => Err(e),
                }
            }

            PendingState::NewCategoryName => {
                let entry = match self.categories.add_expense_category(text) {
                    Ok(entry) => entry,
                    Err(Error::Validation(_)) => {
                        return self.send(chat_id, "❌ Название не может быть пустым.");
                    }
                    Err(e) => return Err(e),
                };
                self.sessions.clear_pending(chat_id);
                self.send(
                    chat_id,
                    &format!("✅ Новая категория \"{}\" добавлена.", entry.label_ru),
                )
            }

            PendingState::AiQuestion => {
                // state is cleared whatever the analyst does
                self.sessions.clear_pending(chat_id);
                let scope = self.family.scope_ids(chat_id)?;
                let summary = self.report.balance_summary(&scope)?;
                let context = format!(
                    "Доходы: {}. Расходы: {}. Я должен: {}. Мне должны: {}.",
                    summary.income, summary.expense, summary.total_debt, summary.total_credit
                );
                match self.analyst.answer(text, &context) {
                    Ok(answer) => self.send(chat_id, &answer),
                    Err(_) => self.send(
                        chat_id,
                        "❌ Аналитик сейчас недоступен, попробуйте позже.",
                    ),
                }
            }

            PendingState::GoalName => {
                if text.is_empty() {
                    return self.send(chat_id, "❌ Название не может быть пустым.");
                }
                self.sessions.set_pending(
                    chat_id,
                    PendingState::GoalAmount {
                        name: text.to_string(),
                    },
                );
                self.send(chat_id, "Введите целевую сумму (только цифры):")
            }

            PendingState::GoalAmount { name } => {
                let amount: Decimal = match text.replace(',', ".").parse() {
                    Ok(a) if a > Decimal::ZERO => a,
                    _ => {
                        return self.send(chat_id, "❌ Сумма должна быть числом больше нуля.");
                    }
                };
                self.sessions
                    .set_pending(chat_id, PendingState::GoalDeadline { name, amount });
                self.send(chat_id, "Напишите дедлайн (ДД.ММ.ГГГГ):")
            }

            PendingState::GoalDeadline { name, amount } => {
                let deadline = match parse::parse_date(text) {
                    Ok(d) => d,
                    Err(_) => {
                        return self.send(
                            chat_id,
                            "❌ Неверный формат даты. Введите в формате ДД.ММ.ГГГГ:",
                        );
                    }
                };
                let goal = self.goals.create(chat_id, &name, amount, deadline)?;
                self.sessions.clear_pending(chat_id);
                self.send(chat_id, &format!("✅ Новая цель \"{}\" создана!", goal.name))
            }

            PendingState::GoalDeposit { goal_id } => {
                let amount: Decimal = match text.replace(',', ".").parse() {
                    Ok(a) if a > Decimal::ZERO => a,
                    _ => {
                        return self.send(chat_id, "❌ Сумма должна быть числом больше нуля.");
                    }
                };
                match self.goals.deposit(chat_id, &goal_id, amount) {
                    Ok(goal) => {
                        self.sessions.clear_pending(chat_id);
                        self.send(
                            chat_id,
                            &format!(
                                "✅ Цель \"{}\" пополнена. Собрано: {} из {} сум ({:.1}%)",
                                goal.name,
                                format_amount(goal.saved_amount),
                                format_amount(goal.target_amount),
                                goal.progress_percent()
                            ),
                        )
                    }
                    Err(Error::NotFound(_)) => {
                        self.sessions.clear_pending(chat_id);
                        self.send(chat_id, "❌ Цель не найдена.")
                    }
                    Err(e) => Err(e),
                }
            }

            PendingState::BudgetLimit { category_id } => {
                let limit: Decimal = match text.replace(',', ".").parse() {
                    Ok(a) => a,
                    Err(_) => {
                        return self.send(chat_id, "❌ Введите число (0 удаляет лимит).");
                    }
                };
                self.budget.set_limit(chat_id, &category_id, limit)?;
                self.sessions.clear_pending(chat_id);
                let lang = self.sessions.lang(chat_id);
                let label = self.categories.dict().label(&category_id, lang);
                if limit <= Decimal::ZERO {
                    self.send(chat_id, &format!("✅ Лимит по категории \"{label}\" удален."))
                } else {
                    self.send(
                        chat_id,
                        &format!(
                            "✅ Лимит {} сум в месяц установлен для категории \"{}\".",
                            format_amount(limit),
                            label
                        ),
                    )
                }
            }

            PendingState::Rate { currency } => {
                let rate: Decimal = match text.replace(',', ".").parse() {
                    Ok(r) => r,
                    Err(_) => return self.send(chat_id, "❌ Введите число, например: 12650"),
                };
                match self.currency.set_rate(chat_id, currency, rate) {
                    Ok(()) => {
                        self.sessions.clear_pending(chat_id);
                        self.send(
                            chat_id,
                            &format!(
                                "✅ Курс установлен: 1 {} = {} сум",
                                currency.code(),
                                format_amount(rate)
                            ),
                        )
                    }
                    Err(Error::Validation(_)) => {
                        self.send(chat_id, "❌ Курс должен быть положительным числом.")
                    }
                    Err(e) => Err(e),
                }
            }

            PendingState::DebtInfo { kind } => {
                let info = match parse::parse_debt_info(text) {
                    Ok(info) => info,
                    Err(_) => {
                        return self.send(
                            chat_id,
                            "❌ Неверный формат. Введите: Сумма Имя Описание\n\n\
                             Примеры:\n• 50000 Алексей за ремонт\n• 5000$ Жасур ака ремонт\n\
                             • €500 Мария за машину",
                        );
                    }
                };
                let base_amount = self.currency.to_base(info.amount, info.currency, chat_id)?;
                let draft = DebtDraft {
                    kind,
                    counterparty: info.counterparty,
                    amount: info.amount,
                    currency: info.currency,
                    base_amount,
                    description: info.description,
                };
                self.sessions
                    .set_pending(chat_id, PendingState::DueDate { draft });
                self.send(
                    chat_id,
                    "📅 Введите дату погашения в формате ДД.ММ.ГГГГ (например: 15.02.2027):",
                )
            }

            PendingState::DueDate { draft } => {
                let due_date = match parse::parse_date(text) {
                    Ok(d) => d,
                    Err(_) => {
                        return self.send(
                            chat_id,
                            "❌ Неверный формат даты. Введите в формате ДД.ММ.ГГГГ:",
                        );
                    }
                };
                let today = Utc::now().date_naive();
                match self.debt.create(chat_id, &draft, due_date, today) {
                    Ok(record) => {
                        self.sessions.clear_pending(chat_id);
                        let kind_word = match record.kind {
                            DebtKind::Debit => "Долг",
                            DebtKind::Credit => "Кредит",
                        };
                        self.send(
                            chat_id,
                            &format!(
                                "✅ {} добавлен!\n👤 Контрагент: {}\n💰 Сумма: {}\n\
                                 📅 Срок погашения: {}\n📝 {}",
                                kind_word,
                                record.counterparty,
                                format_multi(record.amount, record.currency, record.base_amount),
                                format_date(record.due_date),
                                record.description,
                            ),
                        )
                    }
                    Err(Error::Validation(_)) => self.send(
                        chat_id,
                        "❌ Дата не может быть в прошлом. Введите будущую дату:",
                    ),
                    Err(e) => Err(e),
                }
            }

            PendingState::NewDueDate { debt_id } => {
                let new_date = match parse::parse_date(text) {
                    Ok(d) => d,
                    Err(_) => {
                        return self.send(
                            chat_id,
                            "❌ Неверный формат даты. Введите в формате ДД.ММ.ГГГГ:",
                        );
                    }
                };
                let today = Utc::now().date_naive();
                match self.debt.extend(chat_id, debt_id, new_date, today) {
                    Ok(record) => {
                        self.sessions.clear_pending(chat_id);
                        self.send(
                            chat_id,
                            &format!(
                                "✅ Срок изменен!\n👤 Контрагент: {}\n📅 Новый срок: {}",
                                record.counterparty,
                                format_date(record.due_date)
                            ),
                        )
                    }
                    Err(Error::Validation(_)) => self.send(
                        chat_id,
                        "❌ Дата не может быть в прошлом. Введите будущую дату:",
                    ),
                    Err(Error::NotFound(_)) => {
                        self.sessions.clear_pending(chat_id);
                        self.send(chat_id, "❌ Долг не найден.")
                    }
                    Err(e) => Err(e),
                }
            }

            PendingState::Payment { debt_id } => {
                let (amount, currency) = match parse::parse_payment(text) {
                    Ok(parsed) => parsed,
                    Err(_) => {
                        return self.send(
                            chat_id,
                            "❌ Неверный формат суммы. Введите число, например: 10000, 100$, €50",
                        );
                    }
                };
                match self.debt.apply_payment(chat_id, debt_id, amount, currency) {
                    Ok(outcome) => {
                        self.sessions.clear_pending(chat_id);
                        let mut message = format!(
                            "✅ Платеж принят!\n👤 Кредитор: {}\n",
                            outcome.counterparty
                        );
                        if outcome.fully_paid {
                            message.push_str("🎉 Долг полностью погашен!");
                        } else {
                            message.push_str(&format!(
                                "💳 Осталось доплатить: {}",
                                format_money(outcome.remaining, BASE_CURRENCY)
                            ));
                        }
                        self.send(chat_id, &message)
                    }
                    Err(Error::Overpayment { remaining }) => {
                        self.sessions.clear_pending(chat_id);
                        self.send(
                            chat_id,
                            &format!(
                                "❌ Сумма платежа превышает остаток долга. Осталось доплатить: {}",
                                format_money(remaining, BASE_CURRENCY)
                            ),
                        )
                    }
                    Err(Error::NotFound(_)) => {
                        self.sessions.clear_pending(chat_id);
                        self.send(chat_id, "❌ Этот долг нельзя погасить.")
                    }
                    Err(e) => Err(e),
                }
            }

            PendingState::ReportStartDate { scope } => {
                let start = match parse::parse_date(text) {
                    Ok(d) => d,
                    Err(_) => {
                        return self.send(
                            chat_id,
                            "❌ Неверный формат даты. Введите в формате ДД.ММ.ГГГГ:",
                        );
                    }
                };
                self.sessions
                    .set_pending(chat_id, PendingState::ReportEndDate { scope, start });
                self.send(chat_id, "Введите конечную дату (ДД.ММ.ГГГГ):")
            }

            PendingState::ReportEndDate { scope, start } => {
                let end = match parse::parse_date(text) {
                    Ok(d) => d,
                    Err(_) => {
                        return self.send(
                            chat_id,
                            "❌ Неверный формат даты. Введите в формате ДД.ММ.ГГГГ:",
                        );
                    }
                };
                if end < start {
                    return self.send(
                        chat_id,
                        "❌ Конечная дата должна быть позже начальной. Введите конечную дату:",
                    );
                }
                self.sessions.clear_pending(chat_id);
                self.send_period_report(chat_id, scope, start, end)
            }

            PendingState::FamilyName => {
                match self.family.create(chat_id, chat_id, text) {
                    Ok(member) => {
                        self.sessions.clear_pending(chat_id);
                        self.send(
                            chat_id,
                            &format!(
                                "✅ Семья \"{}\" создана!\n🔑 Код приглашения: {}",
                                member.family_name, member.invite_code
                            ),
                        )
                    }
                    Err(Error::Validation(msg)) => self.send(chat_id, &format!("❌ {msg}")),
                    Err(e) => Err(e),
                }
            }

            PendingState::InviteCode => {
                match self.family.join(chat_id, text, chat_id) {
                    Ok(member) => {
                        self.sessions.clear_pending(chat_id);
                        self.send(
                            chat_id,
                            &format!("✅ Вы присоединились к семье \"{}\"!", member.family_name),
                        )
                    }
                    Err(Error::NotFound(_)) => {
                        self.sessions.clear_pending(chat_id);
                        self.send(chat_id, "❌ Код приглашения не найден.")
                    }
                    Err(Error::Validation(msg)) => {
                        self.sessions.clear_pending(chat_id);
                        self.send(chat_id, &format!("❌ {msg}"))
                    }
                    Err(e) => Err(e),
                }
            }

            PendingState::ClearConfirm => {
                self.sessions.clear_pending(chat_id);
                if text.eq_ignore_ascii_case("ДА") || text == "Да" || text == "да" || text == "HA"
                {
                    self.store.clear_owner_data(chat_id)?;
                    self.send(chat_id, "🧹 Ваши данные удалены. Настройки и курсы сохранены.")
                } else {
                    self.send(chat_id, "Отменено.")
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // menu commands
    // ------------------------------------------------------------------

    fn handle_command(&self, chat_id: &str, command: Command) -> Result<()> {
        let lang = self.sessions.lang(chat_id);
        match command {
            Command::AddExpense => self.send_category_menu(chat_id, CategoryKind::Expense),
            Command::AddIncome => self.send_category_menu(chat_id, CategoryKind::Income),

            Command::ViewReport => self.send(
                chat_id,
                "📊 Меню отчетов:\n📋 Детальный отчёт\n💰 Баланс",
            ),

            Command::AskAnalyst => {
                self.sessions.set_pending(chat_id, PendingState::AiQuestion);
                let msg = match lang {
                    Lang::Uz => "💬 Savolingizni bering...",
                    Lang::Ru => "💬 Задайте свой вопрос...",
                };
                self.send(chat_id, msg)
            }

            Command::Settings => self.send(
                chat_id,
                "⚙️ Настройки:\n👨‍👩‍👧‍👦 Семейный режим\n💰 Мой Бюджет\n🎯 Мои цели\n\
                 🛠️ Добавить новую категорию расходов\n💱 Настройка курсов валют\n\
                 🌐 Сменить язык\n🧹 Очистить базу",
            ),

            Command::FamilyMode => self.send(
                chat_id,
                "👨‍👩‍👧‍👦 Семейный режим:\n🏠 Создать семью\n👥 Присоединиться к семье\n\
                 👨‍👩‍👧‍👦 Моя семья\n🚪 Покинуть семью",
            ),

            Command::MyBudget => self.send(
                chat_id,
                "💰 Мой Бюджет:\n💡 Предложить бюджет\n✏️ Настроить вручную\n👁️ Посмотреть бюджет",
            ),

            Command::SuggestBudget => {
                let scope = vec![chat_id.to_string()];
                let averages = self.budget.average_monthly(&scope, 3, Utc::now())?;
                if averages.is_empty() {
                    return self.send(chat_id, "Пока недостаточно данных для предложения.");
                }
                let dict = self.categories.dict();
                let mut lines = vec!["💡 Средние расходы за 3 месяца:".to_string()];
                let mut rows: Vec<_> = averages.into_iter().collect();
                rows.sort_by(|a, b| b.1.cmp(&a.1));
                for (category_id, amount) in rows {
                    lines.push(format!(
                        "• {}: {} сум/мес",
                        dict.label(&category_id, lang),
                        format_amount(amount)
                    ));
                }
                self.send(chat_id, &lines.join("\n"))
            }

            Command::SetupManually => {
                let dict = self.categories.dict();
                let mut lines = vec!["✏️ Выберите категорию для лимита:".to_string()];
                for entry in dict.of_kind(CategoryKind::Expense) {
                    lines.push(format!("[budget|{}] {}", entry.id, entry.label(lang)));
                }
                self.send(chat_id, &lines.join("\n"))
            }

            Command::ViewBudget => {
                let limits = self.budget.limits(chat_id)?;
                if limits.is_empty() {
                    return self.send(chat_id, "У вас пока нет лимитов.");
                }
                let spent = self
                    .budget
                    .month_expenses(&[chat_id.to_string()], Utc::now())?;
                let dict = self.categories.dict();
                let mut lines = vec!["👁️ Бюджет на текущий месяц:".to_string()];
                let mut rows: Vec<_> = limits.into_iter().collect();
                rows.sort_by(|a, b| a.0.cmp(&b.0));
                for (category_id, limit) in rows {
                    let used = spent.get(&category_id).copied().unwrap_or_default();
                    lines.push(format!(
                        "• {}: {} из {} сум",
                        dict.label(&category_id, lang),
                        format_amount(used),
                        format_amount(limit)
                    ));
                }
                self.send(chat_id, &lines.join("\n"))
            }

            Command::MyGoals => self.send(
                chat_id,
                "🎯 Управление финансовыми целями:\n➕ Новая цель\n📋 Список моих целей",
            ),

            Command::NewGoal => {
                self.sessions.set_pending(chat_id, PendingState::GoalName);
                self.send(chat_id, "Напишите название цели:")
            }

            Command::ListMyGoals => {
                let goals = self.goals.list(chat_id)?;
                if goals.is_empty() {
                    return self.send(chat_id, "У вас пока нет активных целей.");
                }
                let mut lines = vec!["📋 Ваши активные цели:".to_string()];
                for goal in goals {
                    lines.push(format!(
                        "🎯 {} - собрано {} из {} сум ({:.1}%), дедлайн {}\n[deposit|{}] Пополнить",
                        goal.name,
                        format_amount(goal.saved_amount),
                        format_amount(goal.target_amount),
                        goal.progress_percent(),
                        format_date(goal.deadline),
                        goal.id,
                    ));
                }
                self.send(chat_id, &lines.join("\n"))
            }

            Command::AddNewCategory => {
                self.sessions
                    .set_pending(chat_id, PendingState::NewCategoryName);
                self.send(chat_id, "Напишите название новой категории расходов:")
            }

            Command::UpdateRates => self.send(
                chat_id,
                "💱 Настройка курсов валют:\n💵 Установить курс USD\n💶 Установить курс EUR\n\
                 💷 Установить курс RUB\n👁️ Посмотреть текущие курсы",
            ),

            Command::SetUsdRate | Command::SetEurRate | Command::SetRubRate => {
                let currency = match command {
                    Command::SetUsdRate => Currency::Usd,
                    Command::SetEurRate => Currency::Eur,
                    _ => Currency::Rub,
                };
                self.sessions
                    .set_pending(chat_id, PendingState::Rate { currency });
                self.send(
                    chat_id,
                    &format!(
                        "Введите курс: сколько сум за 1 {} (например: {})",
                        currency.code(),
                        format_amount(currency.default_rate())
                    ),
                )
            }

            Command::ViewCurrentRates => {
                let rates = self.currency.rates_for(chat_id)?;
                let mut lines = vec!["👁️ Текущие курсы:".to_string()];
                for currency in Currency::foreign() {
                    if let Some(rate) = rates.get(&currency) {
                        lines.push(format!(
                            "1 {} = {} сум",
                            currency.code(),
                            format_amount(*rate)
                        ));
                    }
                }
                self.send(chat_id, &lines.join("\n"))
            }

            Command::ClearBase => {
                self.sessions
                    .set_pending(chat_id, PendingState::ClearConfirm);
                self.send(
                    chat_id,
                    "⚠️ Будут удалены ваши транзакции, долги и цели. Напишите ДА для подтверждения:",
                )
            }

            Command::ChangeLang => self.send(
                chat_id,
                "🌐 Выберите язык: [set_lang_ru] Русский / [set_lang_uz] O'zbek",
            ),

            Command::Back | Command::BackToSettings => {
                self.send(chat_id, "⬅️ Главное меню.")
            }

            Command::DetailedReport => self.send(
                chat_id,
                "Какой отчет показать?\n[report_scope|personal] 👤 Только мой\n\
                 [report_scope|family] 👨‍👩‍👧‍👦 Общий семейный",
            ),

            Command::ViewBalance => {
                let scope = self.family.scope_ids(chat_id)?;
                let summary = self.report.balance_summary(&scope)?;
                self.send(
                    chat_id,
                    &format!(
                        "💰 Баланс\n\n💵 Доходы: {}\n💸 Расходы: {}\n\
                         📥 Взято в долг: {}\n📤 Вам должны: {}\n\
                         🏦 На руках: {}\n🧮 Итог с учетом долгов: {}",
                        format_money(summary.income, BASE_CURRENCY),
                        format_money(summary.expense, BASE_CURRENCY),
                        format_money(summary.total_debt, BASE_CURRENCY),
                        format_money(summary.total_credit, BASE_CURRENCY),
                        format_money(summary.on_hand, BASE_CURRENCY),
                        format_money(summary.final_balance, BASE_CURRENCY),
                    ),
                )
            }

            Command::CreateFamily => {
                self.sessions.set_pending(chat_id, PendingState::FamilyName);
                self.send(chat_id, "🏠 Напишите название семьи:")
            }

            Command::JoinFamily => {
                self.sessions.set_pending(chat_id, PendingState::InviteCode);
                self.send(chat_id, "👥 Введите код приглашения:")
            }

            Command::MyFamily => {
                let Some(member) = self.family.membership(chat_id)? else {
                    return self.send(chat_id, "Вы пока не состоите в семье.");
                };
                let members = self.family.members_of_family(&member.family_id)?;
                let mut lines = vec![format!(
                    "👨‍👩‍👧‍👦 Семья \"{}\" (код: {}):",
                    member.family_name, member.invite_code
                )];
                for m in members {
                    lines.push(format!("• {}", m.member_name));
                }
                self.send(chat_id, &lines.join("\n"))
            }

            Command::LeaveFamily => match self.family.leave(chat_id) {
                Ok(()) => self.send(chat_id, "🚪 Вы покинули семью."),
                Err(Error::NotFound(_)) => self.send(chat_id, "Вы пока не состоите в семье."),
                Err(e) => Err(e),
            },

            Command::DebtsMenu => {
                let totals = self.debt.outstanding_totals(&[chat_id.to_string()])?;
                self.send(
                    chat_id,
                    &format!(
                        "💳 Управление долгами\n💸 Я должен: {}\n💚 Мне должны: {}\n\n\
                         📤 Дать в долг | 📥 Взять в долг | 💰 Погасить долг | 📅 Продлить срок",
                        format_money(totals.debit, BASE_CURRENCY),
                        format_money(totals.credit, BASE_CURRENCY),
                    ),
                )
            }

            Command::GiveCredit => {
                self.sessions.set_pending(
                    chat_id,
                    PendingState::DebtInfo {
                        kind: DebtKind::Credit,
                    },
                );
                self.send(
                    chat_id,
                    "📤 Кому и сколько вы дали в долг?\nВведите: Сумма Имя Описание\n\
                     Пример: 5000$ Жасур ака ремонт",
                )
            }

            Command::TakeDebt => {
                self.sessions.set_pending(
                    chat_id,
                    PendingState::DebtInfo {
                        kind: DebtKind::Debit,
                    },
                );
                self.send(
                    chat_id,
                    "📥 У кого и сколько вы взяли в долг?\nВведите: Сумма Имя Описание\n\
                     Пример: 100000 Мария за машину",
                )
            }

            Command::PayDebt => {
                let debts = self.debt.active_for(&[chat_id.to_string()])?;
                let payable: Vec<_> = debts
                    .into_iter()
                    .filter(|d| d.kind == DebtKind::Debit)
                    .collect();
                if payable.is_empty() {
                    return self.send(chat_id, "У вас нет долгов к погашению.");
                }
                let mut lines = vec!["💰 Какой долг погасить?".to_string()];
                for debt in payable {
                    lines.push(format!(
                        "[pay_debt|{}] {} - осталось {}",
                        debt.id,
                        debt.counterparty,
                        format_money(debt.remaining(), BASE_CURRENCY)
                    ));
                }
                self.send(chat_id, &lines.join("\n"))
            }

            Command::ExtendDebt => {
                let debts = self.debt.active_for(&[chat_id.to_string()])?;
                if debts.is_empty() {
                    return self.send(chat_id, "У вас нет активных долгов.");
                }
                let mut lines = vec!["📅 Какой срок продлить?".to_string()];
                for debt in debts {
                    lines.push(format!(
                        "[extend_debt|{}] {} {} - до {}",
                        debt.id,
                        debt.kind.wire_label(),
                        debt.counterparty,
                        format_date(debt.due_date)
                    ));
                }
                self.send(chat_id, &lines.join("\n"))
            }

            Command::ViewDebts => {
                let today = Utc::now().date_naive();
                let totals = self.debt.outstanding_totals(&[chat_id.to_string()])?;
                let overdue = self.debt.overdue(chat_id, today)?;
                let upcoming = self.debt.upcoming(chat_id, today, 7)?;

                if totals.debit == Decimal::ZERO && totals.credit == Decimal::ZERO {
                    return self.send(chat_id, "У вас нет активных долгов.");
                }

                let mut lines = vec!["📊 ДЕТАЛЬНЫЙ ОТЧЕТ ПО ДОЛГАМ:".to_string(), String::new()];
                if totals.credit > Decimal::ZERO {
                    lines.push(format!(
                        "💚 Мне должны: {}",
                        format_money(totals.credit, BASE_CURRENCY)
                    ));
                }
                if totals.debit > Decimal::ZERO {
                    lines.push(format!(
                        "💸 Я должен: {}",
                        format_money(totals.debit, BASE_CURRENCY)
                    ));
                }
                lines.push(format!(
                    "🏦 Чистый баланс: {}",
                    format_money(totals.credit - totals.debit, BASE_CURRENCY)
                ));
                for item in overdue {
                    lines.push(format!(
                        "🚨 {} {} - просрочено на {} дн.",
                        item.debt.counterparty,
                        format_money(item.debt.remaining(), BASE_CURRENCY),
                        item.days_overdue
                    ));
                }
                for item in upcoming {
                    lines.push(format!(
                        "⏰ {} {} - через {} дн.",
                        item.debt.counterparty,
                        format_money(item.debt.remaining(), BASE_CURRENCY),
                        item.days_until_due
                    ));
                }
                self.send(chat_id, &lines.join("\n"))
            }

            Command::CheckOverdue => {
                let today = Utc::now().date_naive();
                let overdue = self.debt.overdue(chat_id, today)?;
                if overdue.is_empty() {
                    return self.send(chat_id, "✅ Просроченных долгов нет.");
                }
                let mut lines = vec!["🚨 ПРОСРОЧЕННЫЕ ДОЛГИ:".to_string()];
                for item in overdue {
                    let direction = match item.debt.kind {
                        DebtKind::Debit => "Вы должны",
                        DebtKind::Credit => "Вам должны",
                    };
                    lines.push(format!(
                        "{} {} {} - просрочено на {} дн.",
                        direction,
                        item.debt.counterparty,
                        format_multi(item.debt.amount, item.debt.currency, item.debt.base_amount),
                        item.days_overdue
                    ));
                }
                self.send(chat_id, &lines.join("\n"))
            }
        }
    }

    fn send_category_menu(&self, chat_id: &str, kind: CategoryKind) -> Result<()> {
        let lang = self.sessions.lang(chat_id);
        let dict = self.categories.dict();
        let tag = match kind {
            CategoryKind::Income => "income",
            CategoryKind::Expense => "expense",
        };
        let header = match kind {
            CategoryKind::Income => "💰 Выберите категорию дохода:",
            CategoryKind::Expense => "✚ Выберите категорию расхода:",
        };
        let mut lines = vec![header.to_string()];
        for entry in dict.of_kind(kind) {
            lines.push(format!("[category|{}|{}] {}", tag, entry.id, entry.label(lang)));
        }
        self.send(chat_id, &lines.join("\n"))
    }

    fn send_period_report(
        &self,
        chat_id: &str,
        scope: ReportScope,
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    ) -> Result<()> {
        let lang = self.sessions.lang(chat_id);
        let dict = self.categories.dict();
        let owner_ids = match scope {
            ReportScope::Personal => vec![chat_id.to_string()],
            ReportScope::Family => self.family.scope_ids(chat_id)?,
        };
        let sums = self
            .report
            .expenses_for_period(&owner_ids, start, end, &dict, lang)?;

        let scope_word = match scope {
            ReportScope::Personal => "личный",
            ReportScope::Family => "семейный",
        };
        let mut lines = vec![format!(
            "📋 Отчет ({scope_word}) с {} до {}:",
            format_date(start),
            format_date(end)
        )];
        if sums.is_empty() {
            lines.push("Расходов за период нет.".to_string());
        } else {
            let total: Decimal = sums.values().copied().sum();
            let mut rows: Vec<_> = sums.into_iter().collect();
            rows.sort_by(|a, b| b.1.cmp(&a.1));
            for (label, amount) in rows {
                lines.push(format!("• {}: {}", label, format_money(amount, BASE_CURRENCY)));
            }
            lines.push(format!("Итого: {}", format_money(total, BASE_CURRENCY)));
        }
        self.send(chat_id, &lines.join("\n"))
    }

    // ------------------------------------------------------------------
    // callbacks
    // ------------------------------------------------------------------

    /// Button-press entry point. `data` is the opaque callback payload,
    /// fields separated by `|`.
    pub fn handle_callback(&self, chat_id: &str, data: &str) -> Result<()> {
        let mut parts = data.split('|');
        let action = parts.next().unwrap_or_default();

        // language switching is the one callback open to everyone
        match action {
            "set_lang_ru" => {
                self.sessions.set_lang(chat_id, Lang::Ru);
                return self.send(chat_id, "Язык установлен: Русский 🇷🇺");
            }
            "set_lang_uz" => {
                self.sessions.set_lang(chat_id, Lang::Uz);
                return self.send(chat_id, "Til o'rnatildi: O'zbek 🇺🇿");
            }
            _ => {}
        }

        if !self.check_authorized(chat_id)? {
            return self.send_unauthorized(chat_id);
        }

        match action {
            "category" => {
                let kind = match parts.next() {
                    Some("income") => TxKind::Income,
                    Some("expense") => TxKind::Expense,
                    _ => return Ok(()),
                };
                let Some(category_id) = parts.next() else {
                    return Ok(());
                };
                self.sessions.set_pending(
                    chat_id,
                    PendingState::CategoryAmount {
                        kind,
                        category_id: category_id.to_string(),
                    },
                );
                self.send(chat_id, "Введите: Сумма Комментарий")
            }

            "delete_last_transaction" => match self.ledger.undo_last(chat_id) {
                Ok(record) => self.send(
                    chat_id,
                    &format!(
                        "🗑️ Транзакция на {} удалена.",
                        format_multi(record.amount, record.currency, record.base_amount)
                    ),
                ),
                Err(Error::NotFound(_)) => {
                    self.send(chat_id, "❌ Нечего удалять.")
                }
                Err(e) => Err(e),
            },

            "pay_debt" => {
                let Some(debt_id) = parts.next().and_then(|s| Uuid::parse_str(s).ok()) else {
                    return self.send(chat_id, "❌ Долг не найден.");
                };
                self.sessions
                    .set_pending(chat_id, PendingState::Payment { debt_id });
                self.send(
                    chat_id,
                    "💰 Введите сумму платежа (например: 10000, 100$, €50):",
                )
            }

            "extend_debt" => {
                let Some(debt_id) = parts.next().and_then(|s| Uuid::parse_str(s).ok()) else {
                    return self.send(chat_id, "❌ Долг не найден.");
                };
                self.sessions
                    .set_pending(chat_id, PendingState::NewDueDate { debt_id });
                self.send(chat_id, "📅 Введите новую дату в формате ДД.ММ.ГГГГ:")
            }

            "deposit" => {
                let Some(goal_id) = parts.next() else {
                    return Ok(());
                };
                self.sessions.set_pending(
                    chat_id,
                    PendingState::GoalDeposit {
                        goal_id: goal_id.to_string(),
                    },
                );
                self.send(chat_id, "Введите сумму пополнения:")
            }

            "budget" => {
                let Some(category_id) = parts.next() else {
                    return Ok(());
                };
                self.sessions.set_pending(
                    chat_id,
                    PendingState::BudgetLimit {
                        category_id: category_id.to_string(),
                    },
                );
                self.send(chat_id, "Введите месячный лимит в сумах (0 удаляет лимит):")
            }

            "report_scope" => {
                let scope = match parts.next() {
                    Some("family") => ReportScope::Family,
                    _ => ReportScope::Personal,
                };
                self.sessions
                    .set_pending(chat_id, PendingState::ReportStartDate { scope });
                self.send(chat_id, "Введите начальную дату (ДД.ММ.ГГГГ):")
            }

            // unknown callbacks are ignored
            _ => Ok(()),
        }
    }
}
