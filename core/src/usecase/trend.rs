use std::collections::HashMap;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use chrono::{Datelike, NaiveDate};

use crate::model::period::DateRange;
use crate::model::record::{Collection, Record};
use crate::report::{aggregate, Bucket, Field, Granularity};
use crate::repository::RecordRepository;
use crate::service::dto::VolunteerTotal;
use crate::time::last_of_month;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendSubject {
    Volunteer,
    Trash,
}

impl TrendSubject {
    pub fn collection(&self) -> Collection {
        match self {
            TrendSubject::Volunteer => Collection::VolunteerSessions,
            TrendSubject::Trash => Collection::DisposedTrash,
        }
    }

    pub fn fields(&self) -> &'static [Field] {
        match self {
            TrendSubject::Volunteer => &[Field::Hours],
            TrendSubject::Trash => &[Field::BlueBags, Field::YellowBags, Field::TripsToLandfill],
        }
    }
}

impl FromStr for TrendSubject {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "volunteer" | "volunteers" | "hours" => Ok(TrendSubject::Volunteer),
            "trash" | "disposedtrash" => Ok(TrendSubject::Trash),
            _ => Err(anyhow!("Unknown trend subject: {}", s)),
        }
    }
}

/// `today` back to the same day `months` months earlier (clamped to month end).
pub fn trailing_range(today: NaiveDate, months: u32) -> Result<DateRange> {
    let out_of_range = || anyhow!("Trend window of {} months reaches past the calendar", months);
    let index = i32::try_from(months)
        .ok()
        .and_then(|months| (today.year() * 12 + today.month0() as i32).checked_sub(months))
        .ok_or_else(out_of_range)?;
    let month_start = NaiveDate::from_ymd_opt(index.div_euclid(12), index.rem_euclid(12) as u32 + 1, 1)
        .ok_or_else(out_of_range)?;
    let start = month_start
        .with_day(today.day())
        .unwrap_or_else(|| last_of_month(month_start));
    Ok(DateRange { start, end: today })
}

/// Activity charts over a trailing window, and per-volunteer totals.
pub struct TrendUseCase<'a, R: RecordRepository> {
    repo: &'a R,
}

impl<'a, R: RecordRepository> TrendUseCase<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    pub fn trend(
        &self,
        subject: TrendSubject,
        today: NaiveDate,
        months: u32,
        granularity: Granularity,
    ) -> Result<Vec<Bucket>> {
        let range = trailing_range(today, months)?;
        let records = self.repo.fetch(subject.collection(), Some(range))?;
        Ok(aggregate(&records, granularity, subject.fields()))
    }

    /// Hours per volunteer across all sessions, busiest first.
    pub fn volunteer_totals(&self) -> Result<Vec<VolunteerTotal>> {
        let sessions = self.repo.fetch(Collection::VolunteerSessions, None)?;
        let mut totals: Vec<VolunteerTotal> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for record in &sessions {
            if let Record::VolunteerSession(session) = record {
                let key = session.volunteer.trim().to_lowercase();
                let slot = *index.entry(key).or_insert_with(|| {
                    totals.push(VolunteerTotal {
                        volunteer: session.volunteer.trim().to_string(),
                        hours: 0.0,
                        sessions: 0,
                        last_session: session.date,
                    });
                    totals.len() - 1
                });
                let total = &mut totals[slot];
                total.hours += session.hours;
                total.sessions += 1;
                total.last_session = total.last_session.max(session.date);
            }
        }

        totals.sort_by(|a, b| {
            b.hours
                .partial_cmp(&a.hours)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.volunteer.cmp(&b.volunteer))
        });
        Ok(totals)
    }
}
