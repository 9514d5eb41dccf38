//! End-to-end chat flows through the message router

use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use hisobot_core::adapters::{CsvStore, InMemoryStore, OfflineClassifier};
use hisobot_core::config::Config;
use hisobot_core::domain::parse::format_date;
use hisobot_core::ports::Messenger;
use hisobot_core::{DebtKind, HisobotContext, Result, TxKind};

#[derive(Default)]
struct RecordingMessenger {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMessenger {
    fn texts_for(&self, chat_id: &str) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(chat, _)| chat == chat_id)
            .map(|(_, text)| text.clone())
            .collect()
    }

    fn last_for(&self, chat_id: &str) -> String {
        self.texts_for(chat_id)
            .last()
            .cloned()
            .unwrap_or_default()
    }
}

impl Messenger for RecordingMessenger {
    fn send_text(&self, chat_id: &str, text: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((chat_id.to_string(), text.to_string()));
        Ok(())
    }
}

const OWNER: &str = "777";

fn context() -> (HisobotContext, Arc<RecordingMessenger>) {
    let messenger = Arc::new(RecordingMessenger::default());
    let mut config = Config::default();
    config.owner_chat_id = OWNER.to_string();
    let ctx = HisobotContext::new(
        Arc::new(InMemoryStore::with_seed_categories()),
        Arc::new(OfflineClassifier),
        Arc::new(OfflineClassifier),
        Arc::clone(&messenger) as Arc<dyn Messenger>,
        config,
    )
    .unwrap();
    (ctx, messenger)
}

#[test]
fn test_free_text_expense_is_classified_and_recorded() {
    let (ctx, messenger) = context();

    ctx.router.handle_message(OWNER, "25000 такси").unwrap();

    let reply = messenger.last_for(OWNER);
    assert!(reply.contains("Расход"), "unexpected reply: {reply}");
    assert!(reply.contains("Такси"), "unexpected reply: {reply}");
    assert!(reply.contains("25 000"), "unexpected reply: {reply}");

    let rows = ctx
        .store
        .transactions(TxKind::Expense, &[OWNER.to_string()])
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].category_id, "2");
    assert_eq!(rows[0].base_amount, Decimal::from(25000));
}

#[test]
fn test_unrecognized_text_gets_fallback() {
    let (ctx, messenger) = context();
    ctx.router.handle_message(OWNER, "привет как дела").unwrap();
    let reply = messenger.last_for(OWNER);
    assert!(reply.contains("не распознал"), "unexpected reply: {reply}");
    assert!(ctx
        .store
        .transactions(TxKind::Expense, &[OWNER.to_string()])
        .unwrap()
        .is_empty());
}

#[test]
fn test_unauthorized_chat_can_only_onboard() {
    let (ctx, messenger) = context();

    ctx.router.handle_message("999", "25000 такси").unwrap();
    assert!(messenger.last_for("999").contains("нет доступа"));

    // onboarding works: create a family, then the chat is authorized
    ctx.router.handle_message("999", "🏠 Создать семью").unwrap();
    ctx.router.handle_message("999", "Наша семья").unwrap();
    assert!(messenger.last_for("999").contains("создана"));

    ctx.router.handle_message("999", "10000 обед в кафе").unwrap();
    let rows = ctx
        .store
        .transactions(TxKind::Expense, &["999".to_string()])
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].category_id, "1");
}

#[test]
fn test_debt_wizard_rejects_past_date_and_keeps_state() {
    let (ctx, messenger) = context();

    ctx.router.handle_message(OWNER, "📤 Дать в долг").unwrap();
    assert!(messenger.last_for(OWNER).contains("дали в долг"));

    ctx.router
        .handle_message(OWNER, "5000$ Жасур ремонт")
        .unwrap();
    assert!(messenger.last_for(OWNER).contains("дату погашения"));

    // a past date re-prompts without dropping the wizard
    let yesterday = Utc::now().date_naive() - Duration::days(1);
    ctx.router
        .handle_message(OWNER, &format_date(yesterday))
        .unwrap();
    assert!(messenger.last_for(OWNER).contains("не может быть в прошлом"));

    let due = Utc::now().date_naive() + Duration::days(30);
    ctx.router.handle_message(OWNER, &format_date(due)).unwrap();
    let reply = messenger.last_for(OWNER);
    assert!(reply.contains("Жасур"), "unexpected reply: {reply}");
    assert!(reply.contains(&format_date(due)), "unexpected reply: {reply}");

    let debts = ctx.store.debts(&[OWNER.to_string()]).unwrap();
    assert_eq!(debts.len(), 1);
    assert_eq!(debts[0].kind, DebtKind::Credit);
    assert_eq!(debts[0].base_amount, Decimal::from(62_500_000));

    // wizard finished: the chat is idle again
    ctx.router.handle_message(OWNER, "когда срок").unwrap();
    assert!(messenger.last_for(OWNER).contains("не распознал"));
}

#[test]
fn test_payment_flow_with_overpayment() {
    let (ctx, messenger) = context();

    ctx.router.handle_message(OWNER, "📥 Взять в долг").unwrap();
    ctx.router
        .handle_message(OWNER, "50000 Мария за машину")
        .unwrap();
    let due = Utc::now().date_naive() + Duration::days(10);
    ctx.router.handle_message(OWNER, &format_date(due)).unwrap();

    let debt_id = ctx.store.debts(&[OWNER.to_string()]).unwrap()[0].id;

    ctx.router
        .handle_callback(OWNER, &format!("pay_debt|{debt_id}"))
        .unwrap();
    ctx.router.handle_message(OWNER, "60000").unwrap();
    let reply = messenger.last_for(OWNER);
    assert!(reply.contains("превышает остаток"), "unexpected reply: {reply}");
    assert!(reply.contains("50 000"), "unexpected reply: {reply}");

    // the rejected payment did not mutate the debt
    assert_eq!(
        ctx.store.debts(&[OWNER.to_string()]).unwrap()[0].paid_amount,
        Decimal::ZERO
    );

    ctx.router
        .handle_callback(OWNER, &format!("pay_debt|{debt_id}"))
        .unwrap();
    ctx.router.handle_message(OWNER, "30000").unwrap();
    assert!(messenger.last_for(OWNER).contains("Осталось доплатить"));

    ctx.router
        .handle_callback(OWNER, &format!("pay_debt|{debt_id}"))
        .unwrap();
    ctx.router.handle_message(OWNER, "20000").unwrap();
    assert!(messenger.last_for(OWNER).contains("полностью погашен"));
}

#[test]
fn test_category_button_then_undo() {
    let (ctx, messenger) = context();

    ctx.router.handle_callback(OWNER, "category|expense|1").unwrap();
    ctx.router.handle_message(OWNER, "30000 обед").unwrap();
    assert!(messenger.last_for(OWNER).contains("Питание"));

    ctx.router
        .handle_callback(OWNER, "delete_last_transaction")
        .unwrap();
    assert!(messenger.last_for(OWNER).contains("удалена"));
    assert!(ctx
        .store
        .transactions(TxKind::Expense, &[OWNER.to_string()])
        .unwrap()
        .is_empty());

    // single-level undo: a second press has nothing to remove
    ctx.router
        .handle_callback(OWNER, "delete_last_transaction")
        .unwrap();
    assert!(messenger.last_for(OWNER).contains("Нечего удалять"));
}

#[test]
fn test_failed_write_keeps_category_wizard_state() {
    let messenger = Arc::new(RecordingMessenger::default());
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.owner_chat_id = OWNER.to_string();
    let ctx = HisobotContext::new(
        Arc::new(CsvStore::open(dir.path()).unwrap()),
        Arc::new(OfflineClassifier),
        Arc::new(OfflineClassifier),
        Arc::clone(&messenger) as Arc<dyn Messenger>,
        config,
    )
    .unwrap();

    ctx.router.handle_callback(OWNER, "category|expense|1").unwrap();

    // storage goes away between the button press and the amount
    std::fs::remove_dir_all(dir.path()).unwrap();
    assert!(ctx.router.handle_message(OWNER, "30000 обед").is_err());
    assert!(
        ctx.session_service.session(OWNER).pending.is_some(),
        "a failed write must leave the wizard in place"
    );

    // a retry still lands in the chosen category
    std::fs::create_dir_all(dir.path()).unwrap();
    ctx.router.handle_message(OWNER, "30000 обед").unwrap();
    assert!(messenger.last_for(OWNER).contains("Питание"));
    assert!(ctx.session_service.session(OWNER).pending.is_none());

    let rows = ctx
        .store
        .transactions(TxKind::Expense, &[OWNER.to_string()])
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].category_id, "1");
}

#[test]
fn test_budget_alert_fires_after_threshold() {
    let (ctx, messenger) = context();

    ctx.router.handle_callback(OWNER, "budget|1").unwrap();
    ctx.router.handle_message(OWNER, "100000").unwrap();
    assert!(messenger.last_for(OWNER).contains("Лимит"));

    ctx.router.handle_message(OWNER, "95000 обед в кафе").unwrap();
    let replies = messenger.texts_for(OWNER);
    assert!(
        replies.iter().any(|r| r.contains("95%")),
        "no warning in: {replies:?}"
    );

    ctx.router.handle_message(OWNER, "10000 ужин в кафе").unwrap();
    let replies = messenger.texts_for(OWNER);
    assert!(
        replies.iter().any(|r| r.contains("Превышен лимит")),
        "no exceeded alert in: {replies:?}"
    );
}

#[test]
fn test_menu_command_interrupts_wizard() {
    let (ctx, messenger) = context();

    ctx.router.handle_message(OWNER, "➕ Новая цель").unwrap();
    // switching to another command drops the goal wizard
    ctx.router.handle_message(OWNER, "💰 Баланс").unwrap();
    assert!(messenger.last_for(OWNER).contains("Баланс"));

    ctx.router.handle_message(OWNER, "12000 такси").unwrap();
    let rows = ctx
        .store
        .transactions(TxKind::Expense, &[OWNER.to_string()])
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[test]
fn test_goal_wizard_three_steps() {
    let (ctx, messenger) = context();

    ctx.router.handle_message(OWNER, "➕ Новая цель").unwrap();
    ctx.router.handle_message(OWNER, "Машина").unwrap();
    // malformed amount re-prompts, the wizard stays on the same step
    ctx.router.handle_message(OWNER, "много").unwrap();
    assert!(messenger.last_for(OWNER).contains("числом"));
    ctx.router.handle_message(OWNER, "150000000").unwrap();
    ctx.router.handle_message(OWNER, "01.06.2027").unwrap();
    assert!(messenger.last_for(OWNER).contains("Машина"));

    let goals = ctx.store.goals_for(OWNER).unwrap();
    assert_eq!(goals.len(), 1);
    assert_eq!(goals[0].target_amount, Decimal::from(150_000_000));
}

#[test]
fn test_language_switch_changes_labels() {
    let (ctx, messenger) = context();

    ctx.router.handle_callback(OWNER, "set_lang_uz").unwrap();
    ctx.router.handle_message(OWNER, "➕ Xarajat").unwrap();
    let reply = messenger.last_for(OWNER);
    assert!(reply.contains("Taksi"), "unexpected reply: {reply}");
    assert!(reply.contains("Ovqatlanish"), "unexpected reply: {reply}");
}

#[test]
fn test_clear_base_requires_confirmation() {
    let (ctx, messenger) = context();
    ctx.router.handle_message(OWNER, "8000 такси").unwrap();

    ctx.router.handle_message(OWNER, "🧹 Очистить базу").unwrap();
    ctx.router.handle_message(OWNER, "нет").unwrap();
    assert!(messenger.last_for(OWNER).contains("Отменено"));
    assert_eq!(
        ctx.store
            .transactions(TxKind::Expense, &[OWNER.to_string()])
            .unwrap()
            .len(),
        1
    );

    ctx.router.handle_message(OWNER, "🧹 Очистить базу").unwrap();
    ctx.router.handle_message(OWNER, "ДА").unwrap();
    assert!(ctx
        .store
        .transactions(TxKind::Expense, &[OWNER.to_string()])
        .unwrap()
        .is_empty());
}

#[test]
fn test_report_period_validation() {
    let (ctx, messenger) = context();
    ctx.router.handle_message(OWNER, "15000 такси").unwrap();

    ctx.router
        .handle_callback(OWNER, "report_scope|personal")
        .unwrap();
    let today = Utc::now().date_naive();
    ctx.router.handle_message(OWNER, &format_date(today)).unwrap();
    // end before start re-prompts
    ctx.router
        .handle_message(OWNER, &format_date(today - Duration::days(5)))
        .unwrap();
    assert!(messenger.last_for(OWNER).contains("позже начальной"));

    ctx.router.handle_message(OWNER, &format_date(today)).unwrap();
    let reply = messenger.last_for(OWNER);
    assert!(reply.contains("Такси"), "unexpected reply: {reply}");
    assert!(reply.contains("15 000"), "unexpected reply: {reply}");
}
