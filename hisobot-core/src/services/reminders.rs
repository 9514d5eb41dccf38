//! Reminder sweeps - daily debt notifications and the weekly digest
//!
//! At most one dispatch per owner per calendar day, gated by a
//! last-notified-date marker. Failures for one owner never abort
//! processing of the rest.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::domain::parse::format_date;
use crate::domain::result::Result;
use crate::domain::{currency, CategoryDict, DebtKind, Lang};
use crate::ports::{LedgerStore, Messenger};

use super::debt::DebtService;
use super::report::ReportService;

/// Outcome of one sweep invocation
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    pub owners_checked: usize,
    pub owners_notified: usize,
    pub owners_skipped: usize,
    pub owners_failed: usize,
}

#[derive(Clone)]
pub struct ReminderService {
    store: Arc<dyn LedgerStore>,
    debt: DebtService,
    report: ReportService,
    messenger: Arc<dyn Messenger>,
    /// How far ahead the daily sweep looks for near-due debts
    near_due_days: i64,
}

impl ReminderService {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        debt: DebtService,
        report: ReportService,
        messenger: Arc<dyn Messenger>,
        near_due_days: i64,
    ) -> Self {
        Self {
            store,
            debt,
            report,
            messenger,
            near_due_days,
        }
    }

    /// Iterate all known owners and push one bundled debt reminder to
    /// each, at most once per calendar day.
    pub fn run_daily_sweep(&self, today: NaiveDate) -> Result<SweepReport> {
        let mut report = SweepReport::default();

        for owner_id in self.store.known_owner_ids()? {
            report.owners_checked += 1;
            match self.sweep_owner(&owner_id, today) {
                Ok(true) => report.owners_notified += 1,
                Ok(false) => report.owners_skipped += 1,
                // per-owner isolation: log-worthy, never fatal
                Err(_) => report.owners_failed += 1,
            }
        }

        Ok(report)
    }

    fn sweep_owner(&self, owner_id: &str, today: NaiveDate) -> Result<bool> {
        if self.store.last_reminder_date(owner_id)? == Some(today) {
            return Ok(false);
        }

        let overdue = self.debt.overdue(owner_id, today)?;
        let upcoming = self.debt.upcoming(owner_id, today, self.near_due_days)?;
        if overdue.is_empty() && upcoming.is_empty() {
            return Ok(false);
        }

        // one message per category: overdue, then near-due
        if !overdue.is_empty() {
            let mut text = String::from("🚨 ПРОСРОЧЕННЫЕ ДОЛГИ:\n\n");
            for item in &overdue {
                let direction = match item.debt.kind {
                    DebtKind::Debit => "💸 Вы должны",
                    DebtKind::Credit => "💚 Вам должны",
                };
                text.push_str(&format!(
                    "{} {}\n💰 {}\n📅 Просрочено на {} дн. (срок был {})\n\n",
                    direction,
                    item.debt.counterparty,
                    currency::format_multi(
                        item.debt.amount,
                        item.debt.currency,
                        item.debt.base_amount
                    ),
                    item.days_overdue,
                    format_date(item.debt.due_date),
                ));
            }
            self.messenger.send_text(owner_id, text.trim_end())?;
        }

        if !upcoming.is_empty() {
            let mut text = String::from("⏰ ДОЛГИ НА БЛИЖАЙШИЕ ДНИ:\n\n");
            for item in &upcoming {
                let direction = match item.debt.kind {
                    DebtKind::Debit => "💸 Вы должны",
                    DebtKind::Credit => "💚 Вам должны",
                };
                text.push_str(&format!(
                    "{} {}\n💰 {}\n📅 Через {} дн. ({})\n\n",
                    direction,
                    item.debt.counterparty,
                    currency::format_multi(
                        item.debt.amount,
                        item.debt.currency,
                        item.debt.base_amount
                    ),
                    item.days_until_due,
                    format_date(item.debt.due_date),
                ));
            }
            self.messenger.send_text(owner_id, text.trim_end())?;
        }

        self.store.set_last_reminder_date(owner_id, today)?;
        Ok(true)
    }

    /// Push a seven-day summary to every owner that has records in the
    /// window. Same per-owner isolation as the daily sweep.
    pub fn run_weekly_digest(&self, dict: &CategoryDict) -> Result<SweepReport> {
        let now = Utc::now();
        let mut report = SweepReport::default();

        for owner_id in self.store.known_owner_ids()? {
            report.owners_checked += 1;
            let digest = match self.report.weekly_digest(&owner_id, dict, Lang::Ru, now) {
                Ok(Some(d)) => d,
                Ok(None) => {
                    report.owners_skipped += 1;
                    continue;
                }
                Err(_) => {
                    report.owners_failed += 1;
                    continue;
                }
            };

            let mut text = format!(
                "📊 Итоги недели\n\n💰 Доходы: {}\n💸 Расходы: {}",
                currency::format_money(digest.income, currency::BASE_CURRENCY),
                currency::format_money(digest.expense, currency::BASE_CURRENCY),
            );
            if let Some(top) = &digest.top_expense_category {
                text.push_str(&format!("\n🏆 Больше всего потрачено: {top}"));
            }

            match self.messenger.send_text(&owner_id, &text) {
                Ok(()) => report.owners_notified += 1,
                Err(_) => report.owners_failed += 1,
            }
        }

        Ok(report)
    }
}
