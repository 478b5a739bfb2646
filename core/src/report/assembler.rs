use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::period::Period;
use crate::model::record::{Expense, GiftedItem, LendingItem, Record, Sale, TrashDisposal, VolunteerSession};
use crate::report::aggregator::{aggregate, Bucket, Dated, Field};
use crate::report::bucket::Granularity;

pub const UNCATEGORISED: &str = "Uncategorised";

/// Already-fetched records, one typed list per category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Datasets {
    pub income: Vec<Sale>,
    pub expenses: Vec<Expense>,
    pub volunteer_hours: Vec<VolunteerSession>,
    pub trash: Vec<TrashDisposal>,
    pub lending: Vec<LendingItem>,
    pub gifted: Vec<GiftedItem>,
}

impl Datasets {
    pub fn from_records<I: IntoIterator<Item = Record>>(records: I) -> Self {
        let mut datasets = Datasets::default();
        for record in records {
            match record {
                Record::Sale(r) => datasets.income.push(r),
                Record::Expense(r) => datasets.expenses.push(r),
                Record::VolunteerSession(r) => datasets.volunteer_hours.push(r),
                Record::TrashDisposal(r) => datasets.trash.push(r),
                Record::LendingItem(r) => datasets.lending.push(r),
                Record::GiftedItem(r) => datasets.gifted.push(r),
            }
        }
        datasets
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct FinancialTotals {
    pub total_income: f64,
    pub total_expenses: f64,
    pub net_balance: f64,
    pub sales: usize,
    pub expense_entries: usize,
    pub expenses_by_category: BTreeMap<String, f64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct VolunteerSummary {
    pub hours: f64,
    pub sessions: usize,
    pub volunteers: usize,
}

/// Totals are `u64` sums of per-record `u32` counts.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct TrashSummary {
    pub blue_bags: u64,
    pub yellow_bags: u64,
    pub trips_to_landfill: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct LendingSummary {
    pub borrowed: usize,
    pub on_loan: usize,
    pub returned: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct GiftedSummary {
    pub items: usize,
    pub organizations: usize,
}

/// Everything a renderer needs to show one month.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReportViewModel {
    pub period: Period,
    pub granularity: Granularity,
    pub totals: FinancialTotals,
    pub volunteers: VolunteerSummary,
    pub trash: TrashSummary,
    pub lending: LendingSummary,
    pub gifted: GiftedSummary,
    /// Income and expenses per bucket, chronological.
    pub trend: Vec<Bucket>,
    /// Cumulative `income - expenses`, aligned with `trend`.
    pub running_balance: Vec<f64>,
}

impl ReportViewModel {
    pub fn is_empty(&self) -> bool {
        self.totals.sales == 0
            && self.totals.expense_entries == 0
            && self.volunteers.sessions == 0
            && self.trash == TrashSummary::default()
            && self.lending.borrowed == 0
            && self.gifted.items == 0
    }
}

/// One day's money movement, the unit the trend chart is built from.
#[derive(Debug, Clone, Copy)]
struct Flow {
    date: NaiveDate,
    income: f64,
    expenses: f64,
}

impl Dated for Flow {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn value(&self, field: Field) -> Option<f64> {
        match field {
            Field::Income => Some(self.income),
            Field::Expenses => Some(self.expenses),
            Field::Amount => Some(self.income - self.expenses),
            _ => None,
        }
    }
}

fn in_period<'a, T: Dated>(records: &'a [T], period: &Period) -> Vec<&'a T> {
    records.iter().filter(|r| period.contains(r.date())).collect()
}

fn sum<T: Dated>(records: &[&T], field: Field) -> f64 {
    records.iter().filter_map(|r| r.value(field)).sum()
}

/// Builds the report for `period` from already-fetched datasets.
///
/// Records outside the month are ignored and empty datasets simply produce
/// zero totals; nothing here fails.
pub fn assemble_report(period: Period, granularity: Granularity, datasets: &Datasets) -> ReportViewModel {
    let income = in_period(&datasets.income, &period);
    let expenses = in_period(&datasets.expenses, &period);
    let sessions = in_period(&datasets.volunteer_hours, &period);
    let trash = in_period(&datasets.trash, &period);
    let lending = in_period(&datasets.lending, &period);
    let gifted = in_period(&datasets.gifted, &period);

    let total_income = sum(&income, Field::Amount);
    let total_expenses = sum(&expenses, Field::Amount);

    let mut expenses_by_category = BTreeMap::new();
    for expense in &expenses {
        let category = expense
            .category
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(UNCATEGORISED);
        *expenses_by_category.entry(category.to_string()).or_insert(0.0) += expense.amount;
    }

    let totals = FinancialTotals {
        total_income,
        total_expenses,
        net_balance: total_income - total_expenses,
        sales: income.len(),
        expense_entries: expenses.len(),
        expenses_by_category,
    };

    let volunteers = VolunteerSummary {
        hours: sum(&sessions, Field::Hours),
        sessions: sessions.len(),
        volunteers: sessions
            .iter()
            .map(|s| s.volunteer.trim().to_lowercase())
            .collect::<BTreeSet<_>>()
            .len(),
    };

    let trash = TrashSummary {
        blue_bags: trash.iter().map(|t| u64::from(t.blue_bags)).sum(),
        yellow_bags: trash.iter().map(|t| u64::from(t.yellow_bags)).sum(),
        trips_to_landfill: trash.iter().map(|t| u64::from(t.trips_to_landfill)).sum(),
    };

    let on_loan = lending.iter().filter(|l| l.is_on_loan()).count();
    let lending = LendingSummary {
        borrowed: lending.len(),
        on_loan,
        returned: lending.len() - on_loan,
    };

    let gifted = GiftedSummary {
        items: gifted.len(),
        organizations: gifted
            .iter()
            .map(|g| g.organization.trim().to_lowercase())
            .collect::<BTreeSet<_>>()
            .len(),
    };

    let mut flows: Vec<Flow> = income
        .iter()
        .map(|s| Flow { date: s.date, income: s.amount, expenses: 0.0 })
        .chain(expenses.iter().map(|e| Flow { date: e.date, income: 0.0, expenses: e.amount }))
        .collect();
    flows.sort_by_key(|f| f.date);

    let trend = aggregate(&flows, granularity, &[Field::Income, Field::Expenses]);
    let running_balance = trend
        .iter()
        .scan(0.0, |balance, bucket| {
            *balance += bucket.get(Field::Income) - bucket.get(Field::Expenses);
            Some(*balance)
        })
        .collect();

    debug!(%period, %granularity, buckets = trend.len(), "assembled report");

    ReportViewModel {
        period,
        granularity,
        totals,
        volunteers,
        trash,
        lending,
        gifted,
        trend,
        running_balance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn march() -> Period {
        Period::new(2024, 3).unwrap()
    }

    fn sale(date: NaiveDate, amount: f64) -> Sale {
        Sale { id: Uuid::new_v4(), date, item_name: "Book".to_string(), amount, created_at: Utc::now() }
    }

    fn expense(date: NaiveDate, amount: f64, category: Option<&str>) -> Expense {
        Expense {
            id: Uuid::new_v4(),
            date,
            item_name: "Supplies".to_string(),
            amount,
            category: category.map(str::to_string),
            created_at: Utc::now(),
        }
    }

    fn lend(date: NaiveDate, returned: Option<NaiveDate>) -> LendingItem {
        LendingItem {
            id: Uuid::new_v4(),
            item_name: "Crutches".to_string(),
            borrower: "Lee".to_string(),
            date_borrowed: date,
            date_returned: returned,
            notes: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_net_balance() {
        let datasets = Datasets {
            income: vec![sale(d(2024, 3, 2), 20.0), sale(d(2024, 3, 18), 30.0)],
            expenses: vec![expense(d(2024, 3, 9), 5.0, None)],
            ..Default::default()
        };
        let report = assemble_report(march(), Granularity::Monthly, &datasets);
        assert_eq!(report.totals.total_income, 50.0);
        assert_eq!(report.totals.total_expenses, 5.0);
        assert_eq!(report.totals.net_balance, 45.0);
        assert_eq!(report.trend.len(), 1);
        assert_eq!(report.running_balance, vec![45.0]);
    }

    #[test]
    fn test_empty_datasets_give_zero_report() {
        let report = assemble_report(march(), Granularity::Weekly, &Datasets::default());
        assert_eq!(report.totals.total_income, 0.0);
        assert_eq!(report.totals.total_expenses, 0.0);
        assert_eq!(report.totals.net_balance, 0.0);
        assert!(report.trend.is_empty());
        assert!(report.running_balance.is_empty());
        assert!(report.is_empty());
    }

    #[test]
    fn test_records_outside_period_are_ignored() {
        let datasets = Datasets {
            income: vec![sale(d(2024, 2, 29), 100.0), sale(d(2024, 3, 1), 10.0), sale(d(2024, 4, 1), 100.0)],
            expenses: vec![expense(d(2024, 3, 31), 4.0, Some("Rent"))],
            ..Default::default()
        };
        let report = assemble_report(march(), Granularity::Daily, &datasets);
        assert_eq!(report.totals.total_income, 10.0);
        assert_eq!(report.totals.total_expenses, 4.0);
        assert_eq!(report.totals.sales, 1);
        let labels: Vec<_> = report.trend.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["2024-03-01", "2024-03-31"]);
        assert_eq!(report.running_balance, vec![10.0, 6.0]);
    }

    #[test]
    fn test_trend_is_chronological_even_for_unsorted_input() {
        let datasets = Datasets {
            income: vec![sale(d(2024, 3, 20), 8.0), sale(d(2024, 3, 4), 2.0)],
            expenses: vec![expense(d(2024, 3, 12), 3.0, None)],
            ..Default::default()
        };
        let report = assemble_report(march(), Granularity::Weekly, &datasets);
        let starts: Vec<_> = report.trend.iter().map(|b| b.key.start()).collect();
        let mut sorted = starts.clone();
        sorted.sort();
        assert_eq!(starts, sorted);
        assert_eq!(Bucket::total(&report.trend, Field::Income), 10.0);
        assert_eq!(Bucket::total(&report.trend, Field::Expenses), 3.0);
        assert_eq!(report.running_balance.last().copied(), Some(7.0));
    }

    #[test]
    fn test_category_and_activity_summaries() {
        let datasets = Datasets {
            expenses: vec![
                expense(d(2024, 3, 1), 10.0, Some("Rent")),
                expense(d(2024, 3, 2), 2.5, Some("Rent")),
                expense(d(2024, 3, 3), 1.5, Some(" ")),
            ],
            volunteer_hours: vec![
                VolunteerSession { id: Uuid::new_v4(), date: d(2024, 3, 5), volunteer: "Ana".into(), hours: 3.0, created_at: Utc::now() },
                VolunteerSession { id: Uuid::new_v4(), date: d(2024, 3, 6), volunteer: "ana".into(), hours: 2.5, created_at: Utc::now() },
                VolunteerSession { id: Uuid::new_v4(), date: d(2024, 3, 6), volunteer: "Bo".into(), hours: 1.0, created_at: Utc::now() },
            ],
            trash: vec![TrashDisposal {
                id: Uuid::new_v4(),
                date: d(2024, 3, 7),
                blue_bags: 4,
                yellow_bags: 2,
                trips_to_landfill: 1,
                notes: String::new(),
                created_at: Utc::now(),
            }],
            lending: vec![lend(d(2024, 3, 1), None), lend(d(2024, 3, 2), Some(d(2024, 3, 9))), lend(d(2024, 2, 1), None)],
            gifted: vec![GiftedItem {
                id: Uuid::new_v4(),
                item_name: "Coats".into(),
                organization: "Night Shelter".into(),
                date_gifted: d(2024, 3, 15),
                notes: String::new(),
                created_at: Utc::now(),
            }],
            ..Default::default()
        };
        let report = assemble_report(march(), Granularity::Monthly, &datasets);
        assert_eq!(report.totals.expenses_by_category.get("Rent"), Some(&12.5));
        assert_eq!(report.totals.expenses_by_category.get(UNCATEGORISED), Some(&1.5));
        assert_eq!(report.volunteers, VolunteerSummary { hours: 6.5, sessions: 3, volunteers: 2 });
        assert_eq!(report.trash, TrashSummary { blue_bags: 4, yellow_bags: 2, trips_to_landfill: 1 });
        assert_eq!(report.lending, LendingSummary { borrowed: 2, on_loan: 1, returned: 1 });
        assert_eq!(report.gifted, GiftedSummary { items: 1, organizations: 1 });
        assert!(!report.is_empty());
    }

    #[test]
    fn test_trash_totals_do_not_overflow() {
        let bags = |blue_bags: u32| TrashDisposal {
            id: Uuid::new_v4(),
            date: d(2024, 3, 7),
            blue_bags,
            yellow_bags: u32::MAX,
            trips_to_landfill: 0,
            notes: String::new(),
            created_at: Utc::now(),
        };
        let datasets = Datasets {
            trash: vec![bags(u32::MAX), bags(1)],
            ..Default::default()
        };
        let report = assemble_report(march(), Granularity::Monthly, &datasets);
        assert_eq!(report.trash.blue_bags, u64::from(u32::MAX) + 1);
        assert_eq!(report.trash.yellow_bags, 2 * u64::from(u32::MAX));
    }

    #[test]
    fn test_datasets_from_records_splits_by_kind() {
        let records = vec![
            Record::Sale(sale(d(2024, 3, 1), 1.0)),
            Record::Expense(expense(d(2024, 3, 1), 1.0, None)),
            Record::LendingItem(lend(d(2024, 3, 1), None)),
        ];
        let datasets = Datasets::from_records(records);
        assert_eq!(datasets.income.len(), 1);
        assert_eq!(datasets.expenses.len(), 1);
        assert_eq!(datasets.lending.len(), 1);
        assert!(datasets.gifted.is_empty());
    }
}
