//! Reports - the dashboard query payload, balance summary, period
//! breakdowns and the weekly digest data

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::result::Result;
use crate::domain::{CategoryDict, Lang, TransactionRecord, TxKind};
use crate::ports::LedgerStore;

use super::debt::{DebtService, DebtTotals};

/// Per-category slice of the report payload
#[derive(Debug, Clone, Serialize)]
pub struct CategoryShare {
    pub amount: Decimal,
    pub percentage: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportTotals {
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
}

/// The payload consumed by the companion dashboard
#[derive(Debug, Clone, Serialize)]
pub struct ReportPayload {
    /// All records, newest first
    pub transactions: Vec<ReportTransaction>,
    /// Expense share per category label
    pub categories: HashMap<String, CategoryShare>,
    pub totals: ReportTotals,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportTransaction {
    pub timestamp: DateTime<Utc>,
    pub kind: TxKind,
    pub category: String,
    pub amount: Decimal,
    pub currency: String,
    pub base_amount: Decimal,
    pub comment: String,
}

/// Income, debt taken, expenses, cash on hand and the final balance
#[derive(Debug, Clone, Serialize)]
pub struct BalanceSummary {
    pub income: Decimal,
    pub expense: Decimal,
    pub total_debt: Decimal,
    pub total_credit: Decimal,
    /// income + debt taken - expenses
    pub on_hand: Decimal,
    /// on hand minus what still has to be repaid
    pub final_balance: Decimal,
}

/// Seven-day digest data for one owner
#[derive(Debug, Clone, Serialize)]
pub struct WeeklyDigest {
    pub income: Decimal,
    pub expense: Decimal,
    pub top_expense_category: Option<String>,
}

#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn LedgerStore>,
    debt: DebtService,
}

impl ReportService {
    pub fn new(store: Arc<dyn LedgerStore>, debt: DebtService) -> Self {
        Self { store, debt }
    }

    fn all_transactions(
        &self,
        owner_ids: &[String],
    ) -> Result<Vec<(TxKind, TransactionRecord)>> {
        let mut rows = Vec::new();
        for tx in self.store.transactions(TxKind::Income, owner_ids)? {
            rows.push((TxKind::Income, tx));
        }
        for tx in self.store.transactions(TxKind::Expense, owner_ids)? {
            rows.push((TxKind::Expense, tx));
        }
        Ok(rows)
    }

    pub fn report_payload(
        &self,
        owner_ids: &[String],
        dict: &CategoryDict,
        lang: Lang,
    ) -> Result<ReportPayload> {
        let mut rows = self.all_transactions(owner_ids)?;
        rows.sort_by(|a, b| b.1.timestamp.cmp(&a.1.timestamp));

        let mut income = Decimal::ZERO;
        let mut expense = Decimal::ZERO;
        let mut per_category: HashMap<String, Decimal> = HashMap::new();

        let transactions = rows
            .into_iter()
            .map(|(kind, tx)| {
                match kind {
                    TxKind::Income => income += tx.base_amount,
                    TxKind::Expense => {
                        expense += tx.base_amount;
                        let label = dict.label(&tx.category_id, lang);
                        *per_category.entry(label).or_default() += tx.base_amount;
                    }
                }
                ReportTransaction {
                    timestamp: tx.timestamp,
                    kind,
                    category: dict.label(&tx.category_id, lang),
                    amount: tx.amount,
                    currency: tx.currency.code().to_string(),
                    base_amount: tx.base_amount,
                    comment: tx.comment,
                }
            })
            .collect();

        let categories = per_category
            .into_iter()
            .map(|(label, amount)| {
                let percentage = if expense > Decimal::ZERO {
                    (amount / expense * Decimal::from(100)).round_dp(1)
                } else {
                    Decimal::ZERO
                };
                (label, CategoryShare { amount, percentage })
            })
            .collect();

        Ok(ReportPayload {
            transactions,
            categories,
            totals: ReportTotals {
                income,
                expense,
                balance: income - expense,
            },
        })
    }

    pub fn balance_summary(&self, owner_ids: &[String]) -> Result<BalanceSummary> {
        let mut income = Decimal::ZERO;
        let mut expense = Decimal::ZERO;
        for (kind, tx) in self.all_transactions(owner_ids)? {
            match kind {
                TxKind::Income => income += tx.base_amount,
                TxKind::Expense => expense += tx.base_amount,
            }
        }
        let DebtTotals { debit, credit } = self.debt.outstanding_totals(owner_ids)?;
        let on_hand = income + debit - expense;
        Ok(BalanceSummary {
            income,
            expense,
            total_debt: debit,
            total_credit: credit,
            on_hand,
            final_balance: on_hand - debit,
        })
    }

    /// Base-currency expense sums per category label over an inclusive
    /// date range
    pub fn expenses_for_period(
        &self,
        owner_ids: &[String],
        start: NaiveDate,
        end: NaiveDate,
        dict: &CategoryDict,
        lang: Lang,
    ) -> Result<HashMap<String, Decimal>> {
        let mut sums: HashMap<String, Decimal> = HashMap::new();
        for tx in self.store.transactions(TxKind::Expense, owner_ids)? {
            let date = tx.timestamp.date_naive();
            if date >= start && date <= end {
                *sums.entry(dict.label(&tx.category_id, lang)).or_default() += tx.base_amount;
            }
        }
        Ok(sums)
    }

    /// Trailing seven-day totals. `None` when the owner wrote nothing in
    /// the window, so the digest sweep can skip them.
    pub fn weekly_digest(
        &self,
        owner_id: &str,
        dict: &CategoryDict,
        lang: Lang,
        now: DateTime<Utc>,
    ) -> Result<Option<WeeklyDigest>> {
        let cutoff = now - chrono::Duration::days(7);
        let owners = [owner_id.to_string()];

        let mut income = Decimal::ZERO;
        let mut expense = Decimal::ZERO;
        let mut per_category: HashMap<String, Decimal> = HashMap::new();
        let mut any = false;

        for (kind, tx) in self.all_transactions(&owners)? {
            if tx.timestamp < cutoff || tx.timestamp > now {
                continue;
            }
            any = true;
            match kind {
                TxKind::Income => income += tx.base_amount,
                TxKind::Expense => {
                    expense += tx.base_amount;
                    *per_category
                        .entry(dict.label(&tx.category_id, lang))
                        .or_default() += tx.base_amount;
                }
            }
        }

        if !any {
            return Ok(None);
        }

        let top_expense_category = per_category
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1))
            .map(|(label, _)| label);

        Ok(Some(WeeklyDigest {
            income,
            expense,
            top_expense_category,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::Currency;
    use crate::services::currency::CurrencyService;

    fn setup() -> (Arc<InMemoryStore>, ReportService, CategoryDict) {
        let store = Arc::new(InMemoryStore::with_seed_categories());
        let port: Arc<dyn LedgerStore> = Arc::clone(&store) as Arc<dyn LedgerStore>;
        let currency = CurrencyService::new(Arc::clone(&port));
        let debt = DebtService::new(Arc::clone(&port), currency);
        let dict = CategoryDict::new(store.categories().unwrap());
        (store.clone(), ReportService::new(port, debt), dict)
    }

    fn tx(owner: &str, category: &str, base: i64, at: DateTime<Utc>) -> TransactionRecord {
        TransactionRecord {
            timestamp: at,
            category_id: category.to_string(),
            amount: Decimal::from(base),
            comment: String::new(),
            owner_id: owner.to_string(),
            currency: Currency::Uzs,
            base_amount: Decimal::from(base),
        }
    }

    #[test]
    fn test_payload_sorted_and_percentages_sum() {
        let (store, svc, dict) = setup();
        let now = Utc::now();
        store
            .append_transaction(TxKind::Expense, &tx("1", "1", 30000, now - chrono::Duration::hours(2)))
            .unwrap();
        store
            .append_transaction(TxKind::Expense, &tx("1", "2", 70000, now))
            .unwrap();
        store
            .append_transaction(TxKind::Income, &tx("1", "101", 200000, now - chrono::Duration::hours(1)))
            .unwrap();

        let payload = svc
            .report_payload(&["1".to_string()], &dict, Lang::Ru)
            .unwrap();

        // newest first
        let times: Vec<_> = payload.transactions.iter().map(|t| t.timestamp).collect();
        assert!(times.windows(2).all(|w| w[0] >= w[1]));

        let pct_sum: Decimal = payload.categories.values().map(|c| c.percentage).sum();
        assert!((pct_sum - Decimal::from(100)).abs() <= Decimal::ONE);

        assert_eq!(payload.totals.income, Decimal::from(200000));
        assert_eq!(payload.totals.expense, Decimal::from(100000));
        assert_eq!(payload.totals.balance, Decimal::from(100000));
    }

    #[test]
    fn test_weekly_digest_skips_empty_window() {
        let (store, svc, dict) = setup();
        let now = Utc::now();
        assert!(svc
            .weekly_digest("1", &dict, Lang::Ru, now)
            .unwrap()
            .is_none());

        store
            .append_transaction(TxKind::Expense, &tx("1", "2", 25000, now - chrono::Duration::days(2)))
            .unwrap();
        let digest = svc
            .weekly_digest("1", &dict, Lang::Ru, now)
            .unwrap()
            .unwrap();
        assert_eq!(digest.expense, Decimal::from(25000));
        assert_eq!(digest.top_expense_category.as_deref(), Some("Такси"));
    }

    #[test]
    fn test_period_breakdown_bounds_inclusive() {
        let (store, svc, dict) = setup();
        let now = Utc::now();
        store
            .append_transaction(TxKind::Expense, &tx("1", "1", 10000, now))
            .unwrap();
        let today = now.date_naive();
        let sums = svc
            .expenses_for_period(&["1".to_string()], today, today, &dict, Lang::Ru)
            .unwrap();
        assert_eq!(sums.get("Питание"), Some(&Decimal::from(10000)));
    }
}
