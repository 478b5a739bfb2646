use chrono::NaiveDate;

use crate::model::period::Period;
use crate::report::aggregator::Dated;

/// Every month from `latest` back to `earliest`, most recent first.
///
/// An inverted range (no data) yields just the month containing `today`, so
/// a period picker is never empty.
pub fn available_periods(earliest: NaiveDate, latest: NaiveDate, today: NaiveDate) -> Vec<Period> {
    if earliest > latest {
        return vec![Period::containing(today)];
    }

    let first = Period::containing(earliest);
    let mut current = Period::containing(latest);
    let mut periods = Vec::new();
    while current >= first {
        periods.push(current);
        current = current.previous();
    }
    periods
}

/// Earliest and latest date across the given records.
pub fn date_span<T: Dated>(records: &[T]) -> Option<(NaiveDate, NaiveDate)> {
    records.iter().map(|r| r.date()).fold(None, |span, date| match span {
        None => Some((date, date)),
        Some((lo, hi)) => Some((lo.min(date), hi.max(date))),
    })
}

/// Periods spanning all the given datasets, falling back to the current month.
pub fn periods_for<T: Dated>(datasets: &[&[T]], today: NaiveDate) -> Vec<Period> {
    let span = datasets
        .iter()
        .filter_map(|records| date_span(records))
        .reduce(|(lo_a, hi_a), (lo_b, hi_b)| (lo_a.min(lo_b), hi_a.max(hi_b)));

    match span {
        Some((earliest, latest)) => available_periods(earliest, latest, today),
        None => vec![Period::containing(today)],
    }
}
