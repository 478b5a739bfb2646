use crate::model::period::DateRange;
use crate::model::record::Collection;
use crate::repository::RecordRepository;
use crate::service::dto::{EntryKind, LedgerEntry, Statement};
use anyhow::Result;
use chrono::NaiveDate;
use tracing::debug;

/// Money-ledger views over sales and expenses: the dated statement and the
/// most recently entered items.
pub struct HistoryUseCase<'a, R: RecordRepository> {
    repo: &'a R,
}

impl<'a, R: RecordRepository> HistoryUseCase<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    fn entries(&self, range: Option<DateRange>) -> Result<Vec<LedgerEntry>> {
        let mut entries: Vec<LedgerEntry> = Vec::new();
        for collection in [Collection::Sales, Collection::Expenses] {
            let records = self.repo.fetch(collection, range)?;
            entries.extend(records.iter().filter_map(LedgerEntry::from_record));
        }
        Ok(entries)
    }

    /// Sales and expenses dated within `range`, newest first, with balances.
    ///
    /// The opening balance is the net of everything dated before the range.
    /// With `category` set only expenses in that category are listed; the
    /// balances still cover every entry.
    pub fn statement(&self, range: DateRange, category: Option<&str>) -> Result<Statement> {
        let opening_balance: f64 = match range.start.pred_opt() {
            Some(day_before) => {
                let before = DateRange { start: NaiveDate::MIN, end: day_before };
                self.entries(Some(before))?
                    .iter()
                    .map(LedgerEntry::signed_amount)
                    .sum()
            }
            None => 0.0,
        };

        let mut entries = self.entries(Some(range))?;

        let total_income: f64 = entries
            .iter()
            .filter(|e| e.kind == EntryKind::Sale)
            .map(|e| e.amount)
            .sum();
        let total_expenses: f64 = entries
            .iter()
            .filter(|e| e.kind == EntryKind::Expense)
            .map(|e| e.amount)
            .sum();

        if let Some(category) = category {
            entries.retain(|e| {
                e.kind == EntryKind::Expense
                    && e.category
                        .as_deref()
                        .map_or(false, |c| c.eq_ignore_ascii_case(category))
            });
        }

        entries.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        debug!(start = %range.start, end = %range.end, entries = entries.len(), "built statement");

        Ok(Statement {
            range,
            entries,
            opening_balance,
            total_income,
            total_expenses,
            closing_balance: opening_balance + total_income - total_expenses,
        })
    }

    /// The `limit` most recently entered sales and expenses.
    pub fn recent(&self, limit: usize) -> Result<Vec<LedgerEntry>> {
        let mut entries = self.entries(None)?;
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(limit);
        Ok(entries)
    }

    /// Sales and expenses recorded for a single day.
    pub fn day(&self, date: NaiveDate) -> Result<Vec<LedgerEntry>> {
        let range = DateRange { start: date, end: date };
        let mut entries = self.entries(Some(range))?;
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(entries)
    }
}
