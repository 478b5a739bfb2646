use charity_core::model::period::Period;
use charity_core::report::{Bucket, Field, ReportViewModel};
use charity_core::service::dto::VolunteerTotal;
use charity_core::{Config, Record};
use tabled::settings::object::Rows;
use tabled::settings::{Color, Modify, Style};
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct TrendRow {
    #[tabled(rename = "Bucket")]
    label: String,
    #[tabled(rename = "Income")]
    income: String,
    #[tabled(rename = "Expenses")]
    expenses: String,
    #[tabled(rename = "Balance")]
    balance: String,
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "")]
    name: String,
    #[tabled(rename = "")]
    value: String,
}

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Details")]
    details: String,
}

#[derive(Tabled)]
struct VolunteerRow {
    #[tabled(rename = "Volunteer")]
    volunteer: String,
    #[tabled(rename = "Hours")]
    hours: String,
    #[tabled(rename = "Sessions")]
    sessions: usize,
    #[tabled(rename = "Last session")]
    last_session: String,
}

fn styled<T: Tabled>(rows: Vec<T>) -> Table {
    let mut table = Table::new(rows);
    table
        .with(Style::modern())
        .with(Modify::new(Rows::first()).with(Color::FG_CYAN));
    table
}

fn row(name: &str, value: String) -> SummaryRow {
    SummaryRow { name: name.to_string(), value }
}

pub fn show_report(report: &ReportViewModel, config: &Config) {
    println!(
        "\n\x1b[1;36m{}\x1b[0m ({} buckets)",
        report.period.label(),
        report.granularity
    );
    if report.is_empty() {
        println!("No activity recorded for this period.");
        return;
    }

    let totals = &report.totals;
    let mut summary = vec![
        row("Income", format!("{} ({} sales)", config.format_amount(totals.total_income), totals.sales)),
        row(
            "Expenses",
            format!("{} ({} entries)", config.format_amount(totals.total_expenses), totals.expense_entries),
        ),
        row("Net balance", config.format_amount(totals.net_balance)),
    ];
    for (category, amount) in &totals.expenses_by_category {
        summary.push(row(&format!("  {}", category), config.format_amount(*amount)));
    }
    summary.extend([
        row(
            "Volunteer hours",
            format!(
                "{:.1}h over {} sessions ({} volunteers)",
                report.volunteers.hours, report.volunteers.sessions, report.volunteers.volunteers
            ),
        ),
        row(
            "Trash",
            format!(
                "{} blue / {} yellow bags, {} landfill trips",
                report.trash.blue_bags, report.trash.yellow_bags, report.trash.trips_to_landfill
            ),
        ),
        row(
            "Lending",
            format!(
                "{} borrowed, {} on loan, {} returned",
                report.lending.borrowed, report.lending.on_loan, report.lending.returned
            ),
        ),
        row(
            "Gifted",
            format!("{} items to {} organizations", report.gifted.items, report.gifted.organizations),
        ),
    ]);
    println!("{}", styled(summary));

    if report.trend.is_empty() {
        return;
    }
    let rows: Vec<TrendRow> = report
        .trend
        .iter()
        .zip(&report.running_balance)
        .map(|(bucket, balance)| TrendRow {
            label: bucket.label.clone(),
            income: config.format_amount(bucket.get(Field::Income)),
            expenses: config.format_amount(bucket.get(Field::Expenses)),
            balance: config.format_amount(*balance),
        })
        .collect();
    println!("{}", styled(rows));
}

pub fn show_periods(periods: &[Period]) {
    for period in periods {
        println!("{}  {}", period, period.label());
    }
}

/// One column per field, one row per bucket.
pub fn show_trend(buckets: &[Bucket], fields: &[Field]) {
    if buckets.is_empty() {
        println!("No records in this window.");
        return;
    }

    let mut builder = tabled::builder::Builder::default();
    let mut header = vec!["Bucket".to_string()];
    header.extend(fields.iter().map(|f| f.to_string()));
    builder.push_record(header);
    for bucket in buckets {
        let mut record = vec![bucket.label.clone()];
        record.extend(fields.iter().map(|f| format!("{:.1}", bucket.get(*f))));
        builder.push_record(record);
    }
    let mut totals = vec!["Total".to_string()];
    totals.extend(fields.iter().map(|f| format!("{:.1}", Bucket::total(buckets, *f))));
    builder.push_record(totals);

    let mut table = builder.build();
    table
        .with(Style::modern())
        .with(Modify::new(Rows::first()).with(Color::FG_CYAN))
        .with(Modify::new(Rows::last()).with(Color::BOLD));
    println!("{}", table);
}

pub fn show_volunteers(totals: &[VolunteerTotal]) {
    if totals.is_empty() {
        println!("No volunteer sessions recorded.");
        return;
    }
    let rows: Vec<VolunteerRow> = totals
        .iter()
        .map(|t| VolunteerRow {
            volunteer: t.volunteer.clone(),
            hours: format!("{:.1}", t.hours),
            sessions: t.sessions,
            last_session: t.last_session.format("%Y-%m-%d").to_string(),
        })
        .collect();
    println!("{}", styled(rows));
}

pub fn show_records(records: &[Record]) {
    if records.is_empty() {
        println!("No records found.");
        return;
    }
    let rows: Vec<RecordRow> = records
        .iter()
        .map(|r| RecordRow {
            date: r.date().format("%Y-%m-%d").to_string(),
            id: r.id().to_string()[..8].to_string(),
            details: r.summary(),
        })
        .collect();
    println!("{}", styled(rows));
}
