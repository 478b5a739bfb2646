mod history;
mod report_view;
mod tables;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use charity_core::config::{self, Config};
use charity_core::model::period::{DateRange, Period};
use charity_core::service::dto::LendingFilter;
use charity_core::time::{first_of_month, today};
use charity_core::{
    build_record, parse_args, parse_human_date, Collection, FileRecordRepository, Granularity,
    HistoryUseCase, RecordService, ReportUseCase, TrendSubject, TrendUseCase,
};
use tracing::debug;

#[derive(Parser)]
#[command(name = "charity")]
#[command(about = "Charity shop ledger: sales, expenses, volunteering and monthly reports", long_about = None)]
struct Cli {
    /// Directory holding the collection files (overrides config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Record something (usage: add sale "Oak bookcase" amount:45 date:yesterday)
    Add {
        /// sale, expense, volunteer, trash, lend or gift
        kind: String,
        /// Free words plus key:value pairs; keys may be abbreviated
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// List one collection, most recent first
    List {
        collection: String,
        /// Lending items only: all, borrowed or returned
        #[arg(long)]
        status: Option<String>,
    },
    /// Most recently entered sales and expenses
    Recent {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Statement of sales and expenses over a date range
    History {
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Sales and expenses recorded on one day
    Day { date: Option<String> },
    /// Monthly report (tables, or the interactive browser with --tui)
    Report {
        /// YYYY-MM; defaults to the most recent month with data
        #[arg(long)]
        period: Option<String>,
        #[arg(long)]
        granularity: Option<String>,
        #[arg(long)]
        tui: bool,
    },
    /// Months that have data, most recent first
    Periods,
    /// Volunteer hours or trash disposal over the last few months
    Trend {
        subject: String,
        #[arg(long)]
        granularity: Option<String>,
        #[arg(long)]
        months: Option<u32>,
    },
    /// Total hours per volunteer
    Volunteers,
    /// Mark a lending item returned
    Return {
        id: String,
        #[arg(long)]
        date: Option<String>,
    },
    /// Undo a return
    Unreturn { id: String },
    /// Change fields of a saved record (usage: edit trash 3f2a yellow:2 "new notes")
    Edit {
        collection: String,
        id: String,
        /// Replacement words plus key:value pairs, as for add
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Remove a record
    Delete { collection: String, id: String },
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("charity_core=warn,charity_cli=warn"));

    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn granularity_or(raw: Option<String>, config: &Config) -> Result<Granularity> {
    match raw {
        Some(raw) => raw.parse(),
        None => Ok(config.default_granularity),
    }
}

fn main() -> ExitCode {
    init_tracing();
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let base_dir = config::base_dir()?;
    let config = Config::load(&base_dir)?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data_dir(&base_dir));
    debug!(data_dir = %data_dir.display(), "opening record store");

    let repo = FileRecordRepository::new(data_dir.clone())
        .with_context(|| format!("Could not open data directory {}", data_dir.display()))?;
    let today = today();

    match cli.command {
        Commands::Add { kind, args } => {
            let collection: Collection = kind.parse()?;
            let parsed = parse_args(&args);
            let record = build_record(collection, &parsed, today)?;
            let service = RecordService::new(repo);
            let created = service.add(record)?;
            println!(
                "Added to {}: {} on {} (ID: {})",
                created.collection(),
                created.summary(),
                created.date(),
                &created.id().to_string()[..8]
            );
        }
        Commands::List { collection, status } => {
            let collection: Collection = collection.parse()?;
            let service = RecordService::new(repo);
            let records = match (collection, status) {
                (Collection::LendingItems, Some(status)) => {
                    service.list_lending(status.parse::<LendingFilter>()?)?
                }
                (_, Some(_)) => return Err(anyhow!("--status only applies to lending items")),
                (_, None) => service.list(collection)?,
            };
            tables::show_records(&records);
        }
        Commands::Recent { limit } => {
            let limit = limit.unwrap_or(config.recent_limit);
            let entries = HistoryUseCase::new(&repo).recent(limit)?;
            history::show_recent(&entries, &config);
        }
        Commands::History { from, to, category } => {
            let start = match from {
                Some(raw) => parse_human_date(&raw, today)?,
                None => first_of_month(today),
            };
            let end = match to {
                Some(raw) => parse_human_date(&raw, today)?,
                None => today,
            };
            let range = DateRange::new(start, end)?;
            let statement = HistoryUseCase::new(&repo).statement(range, category.as_deref())?;
            history::show_statement(&statement, &config);
        }
        Commands::Day { date } => {
            let date = match date {
                Some(raw) => parse_human_date(&raw, today)?,
                None => today,
            };
            println!("\x1b[1;36m{}\x1b[0m", date.format("%A %Y-%m-%d"));
            let entries = HistoryUseCase::new(&repo).day(date)?;
            history::show_recent(&entries, &config);
        }
        Commands::Report { period, granularity, tui } => {
            let granularity = granularity_or(granularity, &config)?;
            let usecase = ReportUseCase::new(&repo);
            let periods = usecase.periods(today)?;
            let period = match period {
                Some(raw) => raw.parse::<Period>()?,
                None => periods.first().copied().unwrap_or_else(|| Period::containing(today)),
            };

            if tui {
                let mut app = report_view::ReportApp::new(&repo, periods, period, granularity)?;
                report_view::run(&mut app, &config)?;
            } else {
                let report = usecase.report(period, granularity)?;
                tables::show_report(&report, &config);
            }
        }
        Commands::Periods => {
            let periods = ReportUseCase::new(&repo).periods(today)?;
            tables::show_periods(&periods);
        }
        Commands::Trend { subject, granularity, months } => {
            let subject: TrendSubject = subject.parse()?;
            let granularity = granularity_or(granularity, &config)?;
            let months = months.unwrap_or(config.trend_months);
            let buckets = TrendUseCase::new(&repo).trend(subject, today, months, granularity)?;
            tables::show_trend(&buckets, subject.fields());
        }
        Commands::Volunteers => {
            let totals = TrendUseCase::new(&repo).volunteer_totals()?;
            tables::show_volunteers(&totals);
        }
        Commands::Return { id, date } => {
            let date = match date {
                Some(raw) => parse_human_date(&raw, today)?,
                None => today,
            };
            let service = RecordService::new(repo);
            let id = service.resolve_id(Collection::LendingItems, &id)?;
            service.mark_returned(&id, date)?;
            println!("Marked {} returned on {}", &id.to_string()[..8], date);
        }
        Commands::Unreturn { id } => {
            let service = RecordService::new(repo);
            let id = service.resolve_id(Collection::LendingItems, &id)?;
            service.unmark_returned(&id)?;
            println!("Marked {} as on loan again", &id.to_string()[..8]);
        }
        Commands::Edit { collection, id, args } => {
            if args.is_empty() {
                return Err(anyhow!("Nothing to change; pass words or key:value pairs"));
            }
            let collection: Collection = collection.parse()?;
            let service = RecordService::new(repo);
            let id = service.resolve_id(collection, &id)?;
            let edited = service.edit(collection, &id, &parse_args(&args), today)?;
            println!("Updated {}: {} on {}", &id.to_string()[..8], edited.summary(), edited.date());
        }
        Commands::Delete { collection, id } => {
            let collection: Collection = collection.parse()?;
            let service = RecordService::new(repo);
            let id = service.resolve_id(collection, &id)?;
            service.delete(collection, &id)?;
            println!("Deleted {} from {}", &id.to_string()[..8], collection);
        }
    }
    Ok(())
}
