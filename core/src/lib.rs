pub mod config;
pub mod error;
pub mod input;
pub mod model;
pub mod report;
pub mod repository;
pub mod service;
pub mod time;
pub mod usecase;

pub use config::Config;
pub use error::RecordError;
pub use input::{apply_edits, build_record, expand_key, parse_args, ParsedInput};
pub use model::period::{DateRange, Period};
pub use model::record::{Collection, Record};
pub use report::{assemble_report, available_periods, Granularity, ReportViewModel};
pub use repository::{FileRecordRepository, RecordRepository};
pub use service::record_service::RecordService;
pub use time::parse_human_date;
pub use usecase::history::HistoryUseCase;
pub use usecase::report::ReportUseCase;
pub use usecase::trend::{TrendSubject, TrendUseCase};
