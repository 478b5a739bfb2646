use crate::model::period::{DateRange, Period};
use crate::model::record::{Collection, Record};
use crate::report::{assemble_report, periods_for, Datasets, Granularity, ReportViewModel};
use crate::repository::RecordRepository;
use anyhow::Result;
use chrono::NaiveDate;
use tracing::debug;

/// Fetches what a monthly report needs and hands it to the assembler.
pub struct ReportUseCase<'a, R: RecordRepository> {
    repo: &'a R,
}

impl<'a, R: RecordRepository> ReportUseCase<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    fn fetch_all(&self, range: Option<DateRange>) -> Result<Vec<Vec<Record>>> {
        Collection::ALL
            .iter()
            .map(|collection| self.repo.fetch(*collection, range))
            .collect()
    }

    /// Months covered by any record, most recent first.
    pub fn periods(&self, today: NaiveDate) -> Result<Vec<Period>> {
        let collections = self.fetch_all(None)?;
        let slices: Vec<&[Record]> = collections.iter().map(Vec::as_slice).collect();
        let periods = periods_for(&slices, today);
        debug!(count = periods.len(), "available periods");
        Ok(periods)
    }

    pub fn report(&self, period: Period, granularity: Granularity) -> Result<ReportViewModel> {
        let records = self.fetch_all(Some(period.range()))?;
        let datasets = Datasets::from_records(records.into_iter().flatten());
        Ok(assemble_report(period, granularity, &datasets))
    }
}
