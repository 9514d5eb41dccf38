//! CSV-backed store
//!
//! One file per sheet under the data directory. Sheets are ordered and
//! append-only; transaction deletions flip a tombstone column so row
//! indices stay stable. Mutations rewrite the affected file in full,
//! which is fine at personal-ledger volume.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::parse::{format_date, parse_date};
use crate::domain::result::{Error, Result};
use crate::domain::{
    CategoryEntry, CategoryKind, Currency, CurrencyRate, DebtKind, DebtRecord, DebtStatus,
    FamilyMember, SavingsGoal, TransactionRecord, TxKind,
};
use crate::ports::LedgerStore;

use super::seed_categories;

pub struct CsvStore {
    dir: PathBuf,
    // serializes whole-file rewrites
    lock: Mutex<()>,
}

#[derive(Serialize, Deserialize)]
struct TxRow {
    timestamp: DateTime<Utc>,
    category_id: String,
    amount: Decimal,
    comment: String,
    owner_id: String,
    currency: String,
    base_amount: Decimal,
    deleted: u8,
}

impl TxRow {
    fn from_record(record: &TransactionRecord) -> Self {
        Self {
            timestamp: record.timestamp,
            category_id: record.category_id.clone(),
            amount: record.amount,
            comment: record.comment.clone(),
            owner_id: record.owner_id.clone(),
            currency: record.currency.code().to_string(),
            base_amount: record.base_amount,
            deleted: 0,
        }
    }

    fn into_record(self) -> Result<TransactionRecord> {
        Ok(TransactionRecord {
            timestamp: self.timestamp,
            category_id: self.category_id,
            amount: self.amount,
            comment: self.comment,
            owner_id: self.owner_id,
            currency: Currency::from_code(&self.currency)
                .ok_or_else(|| Error::persistence(format!("unknown currency {}", self.currency)))?,
            base_amount: self.base_amount,
        })
    }
}

#[derive(Serialize, Deserialize)]
struct DebtRow {
    id: Uuid,
    created_at: DateTime<Utc>,
    owner_id: String,
    kind: String,
    counterparty: String,
    amount: Decimal,
    currency: String,
    base_amount: Decimal,
    description: String,
    due_date: String,
    status: String,
    settled_at: Option<DateTime<Utc>>,
    paid_amount: Decimal,
}

impl DebtRow {
    fn from_record(record: &DebtRecord) -> Self {
        Self {
            id: record.id,
            created_at: record.created_at,
            owner_id: record.owner_id.clone(),
            kind: record.kind.wire_label().to_string(),
            counterparty: record.counterparty.clone(),
            amount: record.amount,
            currency: record.currency.code().to_string(),
            base_amount: record.base_amount,
            description: record.description.clone(),
            due_date: format_date(record.due_date),
            status: record.status.wire_label().to_string(),
            settled_at: record.settled_at,
            paid_amount: record.paid_amount,
        }
    }

    fn into_record(self) -> Result<DebtRecord> {
        Ok(DebtRecord {
            id: self.id,
            created_at: self.created_at,
            owner_id: self.owner_id,
            kind: DebtKind::from_str(&self.kind)?,
            counterparty: self.counterparty,
            amount: self.amount,
            currency: Currency::from_code(&self.currency)
                .ok_or_else(|| Error::persistence(format!("unknown currency {}", self.currency)))?,
            base_amount: self.base_amount,
            description: self.description,
            due_date: parse_date(&self.due_date)?,
            status: DebtStatus::from_str(&self.status)?,
            settled_at: self.settled_at,
            paid_amount: self.paid_amount,
        })
    }
}

/// Category sheet row: expense triple in the first three columns,
/// income triple in the next three, either triple may be empty.
#[derive(Default, Serialize, Deserialize)]
struct CategoryRow {
    expense_id: String,
    expense_ru: String,
    expense_uz: String,
    income_id: String,
    income_ru: String,
    income_uz: String,
}

impl CategoryRow {
    fn from_entry(entry: &CategoryEntry) -> Self {
        let mut row = Self::default();
        row.put(entry);
        row
    }

    fn put(&mut self, entry: &CategoryEntry) {
        match entry.kind {
            CategoryKind::Expense => {
                self.expense_id = entry.id.clone();
                self.expense_ru = entry.label_ru.clone();
                self.expense_uz = entry.label_uz.clone();
            }
            CategoryKind::Income => {
                self.income_id = entry.id.clone();
                self.income_ru = entry.label_ru.clone();
                self.income_uz = entry.label_uz.clone();
            }
        }
    }

    fn entries(self) -> Vec<CategoryEntry> {
        let mut out = Vec::new();
        if !self.expense_id.is_empty() {
            out.push(CategoryEntry {
                id: self.expense_id,
                label_ru: self.expense_ru,
                label_uz: self.expense_uz,
                kind: CategoryKind::Expense,
            });
        }
        if !self.income_id.is_empty() {
            out.push(CategoryEntry {
                id: self.income_id,
                label_ru: self.income_ru,
                label_uz: self.income_uz,
                kind: CategoryKind::Income,
            });
        }
        out
    }
}

fn category_rows(entries: &[CategoryEntry]) -> Vec<CategoryRow> {
    let expenses: Vec<_> = entries
        .iter()
        .filter(|e| e.kind == CategoryKind::Expense)
        .collect();
    let incomes: Vec<_> = entries
        .iter()
        .filter(|e| e.kind == CategoryKind::Income)
        .collect();
    let mut rows = Vec::new();
    for i in 0..expenses.len().max(incomes.len()) {
        let mut row = CategoryRow::default();
        if let Some(entry) = expenses.get(i) {
            row.put(entry);
        }
        if let Some(entry) = incomes.get(i) {
            row.put(entry);
        }
        rows.push(row);
    }
    rows
}

#[derive(Serialize, Deserialize)]
struct RateRow {
    owner_id: String,
    currency: String,
    rate: Decimal,
    symbol: String,
}

#[derive(Serialize, Deserialize)]
struct BudgetRow {
    owner_id: String,
    category_id: String,
    limit: Decimal,
}

#[derive(Serialize, Deserialize)]
struct GoalRow {
    id: String,
    owner_id: String,
    name: String,
    target_amount: Decimal,
    saved_amount: Decimal,
    deadline: String,
}

#[derive(Serialize, Deserialize)]
struct ReminderRow {
    owner_id: String,
    date: NaiveDate,
}

impl CsvStore {
    /// Open the store rooted at `dir`, creating the directory and the
    /// seed category dictionary on first use.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        let store = Self {
            dir,
            lock: Mutex::new(()),
        };
        if !store.path("categories").exists() {
            store.write_rows("categories", &category_rows(&seed_categories()))?;
        }
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, sheet: &str) -> PathBuf {
        self.dir.join(format!("{sheet}.csv"))
    }

    fn read_rows<T: DeserializeOwned>(&self, sheet: &str) -> Result<Vec<T>> {
        let path = self.path(sheet);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&path)
            .map_err(|e| Error::persistence(format!("{sheet}: {e}")))?;
        let mut rows = Vec::new();
        for row in reader.deserialize() {
            rows.push(row.map_err(|e| Error::persistence(format!("{sheet}: {e}")))?);
        }
        Ok(rows)
    }

    fn write_rows<T: Serialize>(&self, sheet: &str, rows: &[T]) -> Result<()> {
        let mut writer = csv::Writer::from_path(self.path(sheet))
            .map_err(|e| Error::persistence(format!("{sheet}: {e}")))?;
        for row in rows {
            writer
                .serialize(row)
                .map_err(|e| Error::persistence(format!("{sheet}: {e}")))?;
        }
        writer
            .flush()
            .map_err(|e| Error::persistence(format!("{sheet}: {e}")))?;
        Ok(())
    }

    fn append_row<T: Serialize>(&self, sheet: &str, row: &T) -> Result<()> {
        let path = self.path(sheet);
        let fresh = !path.exists();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = csv::WriterBuilder::new().has_headers(fresh).from_writer(file);
        writer
            .serialize(row)
            .map_err(|e| Error::persistence(format!("{sheet}: {e}")))?;
        writer
            .flush()
            .map_err(|e| Error::persistence(format!("{sheet}: {e}")))?;
        Ok(())
    }

    fn tx_sheet(kind: TxKind) -> &'static str {
        match kind {
            TxKind::Income => "income",
            TxKind::Expense => "expense",
        }
    }
}

impl LedgerStore for CsvStore {
    fn append_transaction(&self, kind: TxKind, record: &TransactionRecord) -> Result<usize> {
        let _guard = self.lock.lock().expect("csv lock poisoned");
        let sheet = Self::tx_sheet(kind);
        let existing: Vec<TxRow> = self.read_rows(sheet)?;
        self.append_row(sheet, &TxRow::from_record(record))?;
        Ok(existing.len())
    }

    fn transactions(&self, kind: TxKind, owner_ids: &[String]) -> Result<Vec<TransactionRecord>> {
        let _guard = self.lock.lock().expect("csv lock poisoned");
        let rows: Vec<TxRow> = self.read_rows(Self::tx_sheet(kind))?;
        rows.into_iter()
            .filter(|row| row.deleted == 0 && owner_ids.contains(&row.owner_id))
            .map(TxRow::into_record)
            .collect()
    }

    fn delete_transaction(&self, kind: TxKind, row_index: usize) -> Result<()> {
        let _guard = self.lock.lock().expect("csv lock poisoned");
        let sheet = Self::tx_sheet(kind);
        let mut rows: Vec<TxRow> = self.read_rows(sheet)?;
        match rows.get_mut(row_index) {
            Some(row) if row.deleted == 0 => row.deleted = 1,
            _ => return Err(Error::not_found("transaction row not found")),
        }
        self.write_rows(sheet, &rows)
    }

    fn append_debt(&self, record: &DebtRecord) -> Result<()> {
        let _guard = self.lock.lock().expect("csv lock poisoned");
        self.append_row("debts", &DebtRow::from_record(record))
    }

    fn debts(&self, owner_ids: &[String]) -> Result<Vec<DebtRecord>> {
        let _guard = self.lock.lock().expect("csv lock poisoned");
        let rows: Vec<DebtRow> = self.read_rows("debts")?;
        rows.into_iter()
            .filter(|row| owner_ids.contains(&row.owner_id))
            .map(DebtRow::into_record)
            .collect()
    }

    fn update_debt(&self, record: &DebtRecord) -> Result<()> {
        let _guard = self.lock.lock().expect("csv lock poisoned");
        let mut rows: Vec<DebtRow> = self.read_rows("debts")?;
        let row = rows
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or_else(|| Error::not_found("debt row not found"))?;
        *row = DebtRow::from_record(record);
        self.write_rows("debts", &rows)
    }

    fn categories(&self) -> Result<Vec<CategoryEntry>> {
        let _guard = self.lock.lock().expect("csv lock poisoned");
        let rows: Vec<CategoryRow> = self.read_rows("categories")?;
        Ok(rows.into_iter().flat_map(CategoryRow::entries).collect())
    }

    fn append_category(&self, entry: &CategoryEntry) -> Result<()> {
        let _guard = self.lock.lock().expect("csv lock poisoned");
        self.append_row("categories", &CategoryRow::from_entry(entry))
    }

    fn rates_for(&self, owner_id: &str) -> Result<Vec<CurrencyRate>> {
        let _guard = self.lock.lock().expect("csv lock poisoned");
        let rows: Vec<RateRow> = self.read_rows("rates")?;
        rows.into_iter()
            .filter(|row| row.owner_id == owner_id)
            .map(|row| {
                Ok(CurrencyRate {
                    owner_id: row.owner_id,
                    currency: Currency::from_code(&row.currency).ok_or_else(|| {
                        Error::persistence(format!("unknown currency {}", row.currency))
                    })?,
                    rate: row.rate,
                    symbol: row.symbol,
                })
            })
            .collect()
    }

    fn upsert_rate(&self, rate: &CurrencyRate) -> Result<()> {
        let _guard = self.lock.lock().expect("csv lock poisoned");
        let mut rows: Vec<RateRow> = self.read_rows("rates")?;
        let new_row = RateRow {
            owner_id: rate.owner_id.clone(),
            currency: rate.currency.code().to_string(),
            rate: rate.rate,
            symbol: rate.symbol.clone(),
        };
        match rows
            .iter_mut()
            .find(|r| r.owner_id == new_row.owner_id && r.currency == new_row.currency)
        {
            Some(row) => *row = new_row,
            None => rows.push(new_row),
        }
        self.write_rows("rates", &rows)
    }

    fn budgets_for(&self, owner_id: &str) -> Result<std::collections::HashMap<String, Decimal>> {
        let _guard = self.lock.lock().expect("csv lock poisoned");
        let rows: Vec<BudgetRow> = self.read_rows("budgets")?;
        Ok(rows
            .into_iter()
            .filter(|row| row.owner_id == owner_id)
            .map(|row| (row.category_id, row.limit))
            .collect())
    }

    fn set_budget(&self, owner_id: &str, category_id: &str, limit: Decimal) -> Result<()> {
        let _guard = self.lock.lock().expect("csv lock poisoned");
        let mut rows: Vec<BudgetRow> = self.read_rows("budgets")?;
        rows.retain(|r| !(r.owner_id == owner_id && r.category_id == category_id));
        if limit > Decimal::ZERO {
            rows.push(BudgetRow {
                owner_id: owner_id.to_string(),
                category_id: category_id.to_string(),
                limit,
            });
        }
        self.write_rows("budgets", &rows)
    }

    fn goals_for(&self, owner_id: &str) -> Result<Vec<SavingsGoal>> {
        let _guard = self.lock.lock().expect("csv lock poisoned");
        let rows: Vec<GoalRow> = self.read_rows("goals")?;
        rows.into_iter()
            .filter(|row| row.owner_id == owner_id)
            .map(|row| {
                Ok(SavingsGoal {
                    id: row.id,
                    owner_id: row.owner_id,
                    name: row.name,
                    target_amount: row.target_amount,
                    saved_amount: row.saved_amount,
                    deadline: parse_date(&row.deadline)?,
                })
            })
            .collect()
    }

    fn append_goal(&self, goal: &SavingsGoal) -> Result<()> {
        let _guard = self.lock.lock().expect("csv lock poisoned");
        self.append_row(
            "goals",
            &GoalRow {
                id: goal.id.clone(),
                owner_id: goal.owner_id.clone(),
                name: goal.name.clone(),
                target_amount: goal.target_amount,
                saved_amount: goal.saved_amount,
                deadline: format_date(goal.deadline),
            },
        )
    }

    fn add_goal_deposit(
        &self,
        owner_id: &str,
        goal_id: &str,
        amount: Decimal,
    ) -> Result<SavingsGoal> {
        let _guard = self.lock.lock().expect("csv lock poisoned");
        let mut rows: Vec<GoalRow> = self.read_rows("goals")?;
        let row = rows
            .iter_mut()
            .find(|r| r.owner_id == owner_id && r.id == goal_id)
            .ok_or_else(|| Error::not_found("goal not found"))?;
        row.saved_amount += amount;
        let updated = SavingsGoal {
            id: row.id.clone(),
            owner_id: row.owner_id.clone(),
            name: row.name.clone(),
            target_amount: row.target_amount,
            saved_amount: row.saved_amount,
            deadline: parse_date(&row.deadline)?,
        };
        self.write_rows("goals", &rows)?;
        Ok(updated)
    }

    fn families(&self) -> Result<Vec<FamilyMember>> {
        let _guard = self.lock.lock().expect("csv lock poisoned");
        self.read_rows("families")
    }

    fn append_family_member(&self, member: &FamilyMember) -> Result<()> {
        let _guard = self.lock.lock().expect("csv lock poisoned");
        self.append_row("families", member)
    }

    fn remove_family_member(&self, member_id: &str) -> Result<()> {
        let _guard = self.lock.lock().expect("csv lock poisoned");
        let mut rows: Vec<FamilyMember> = self.read_rows("families")?;
        rows.retain(|m| m.member_id != member_id);
        self.write_rows("families", &rows)
    }

    fn last_reminder_date(&self, owner_id: &str) -> Result<Option<NaiveDate>> {
        let _guard = self.lock.lock().expect("csv lock poisoned");
        let rows: Vec<ReminderRow> = self.read_rows("reminders")?;
        Ok(rows
            .into_iter()
            .find(|row| row.owner_id == owner_id)
            .map(|row| row.date))
    }

    fn set_last_reminder_date(&self, owner_id: &str, date: NaiveDate) -> Result<()> {
        let _guard = self.lock.lock().expect("csv lock poisoned");
        let mut rows: Vec<ReminderRow> = self.read_rows("reminders")?;
        rows.retain(|r| r.owner_id != owner_id);
        rows.push(ReminderRow {
            owner_id: owner_id.to_string(),
            date,
        });
        self.write_rows("reminders", &rows)
    }

    fn known_owner_ids(&self) -> Result<Vec<String>> {
        let _guard = self.lock.lock().expect("csv lock poisoned");
        let mut ids = Vec::new();
        for sheet in ["income", "expense"] {
            let rows: Vec<TxRow> = self.read_rows(sheet)?;
            ids.extend(rows.into_iter().filter(|r| r.deleted == 0).map(|r| r.owner_id));
        }
        let debts: Vec<DebtRow> = self.read_rows("debts")?;
        ids.extend(debts.into_iter().map(|r| r.owner_id));
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    fn clear_owner_data(&self, owner_id: &str) -> Result<()> {
        let _guard = self.lock.lock().expect("csv lock poisoned");
        for sheet in ["income", "expense"] {
            let mut rows: Vec<TxRow> = self.read_rows(sheet)?;
            for row in rows.iter_mut().filter(|r| r.owner_id == owner_id) {
                row.deleted = 1;
            }
            self.write_rows(sheet, &rows)?;
        }
        let mut debts: Vec<DebtRow> = self.read_rows("debts")?;
        debts.retain(|d| d.owner_id != owner_id);
        self.write_rows("debts", &debts)?;
        let mut goals: Vec<GoalRow> = self.read_rows("goals")?;
        goals.retain(|g| g.owner_id != owner_id);
        self.write_rows("goals", &goals)
    }
}
