use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::period::DateRange;
use crate::model::record::{Expense, Record, Sale};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Sale,
    Expense,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntryKind::Sale => "Sale",
            EntryKind::Expense => "Expense",
        })
    }
}

/// A sale or an expense flattened for statement and recent-entry listings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub date: NaiveDate,
    pub kind: EntryKind,
    pub item_name: String,
    pub amount: f64,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn from_sale(sale: &Sale) -> Self {
        Self {
            id: sale.id,
            date: sale.date,
            kind: EntryKind::Sale,
            item_name: sale.item_name.clone(),
            amount: sale.amount,
            category: None,
            created_at: sale.created_at,
        }
    }

    pub fn from_expense(expense: &Expense) -> Self {
        Self {
            id: expense.id,
            date: expense.date,
            kind: EntryKind::Expense,
            item_name: expense.item_name.clone(),
            amount: expense.amount,
            category: expense.category.clone(),
            created_at: expense.created_at,
        }
    }

    /// Sales and expenses only; other records have no place in a money ledger.
    pub fn from_record(record: &Record) -> Option<Self> {
        match record {
            Record::Sale(s) => Some(Self::from_sale(s)),
            Record::Expense(e) => Some(Self::from_expense(e)),
            _ => None,
        }
    }

    /// Positive for sales, negative for expenses.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            EntryKind::Sale => self.amount,
            EntryKind::Expense => -self.amount,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Statement {
    pub range: DateRange,
    /// Newest first.
    pub entries: Vec<LedgerEntry>,
    /// Net of every sale and expense dated before `range.start`.
    pub opening_balance: f64,
    pub total_income: f64,
    pub total_expenses: f64,
    pub closing_balance: f64,
}

impl Statement {
    pub fn change(&self) -> f64 {
        self.closing_balance - self.opening_balance
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VolunteerTotal {
    pub volunteer: String,
    pub hours: f64,
    pub sessions: usize,
    pub last_session: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LendingFilter {
    #[default]
    All,
    Borrowed,
    Returned,
}

impl FromStr for LendingFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "all" => Ok(LendingFilter::All),
            "borrowed" | "out" | "on-loan" => Ok(LendingFilter::Borrowed),
            "returned" | "in" => Ok(LendingFilter::Returned),
            _ => Err(anyhow!("Unknown lending status: {}", s)),
        }
    }
}
