//! Period aggregation and reporting: bucketing, aggregation, period
//! selection and report assembly. Everything here is pure; records arrive
//! already fetched.

pub mod aggregator;
pub mod assembler;
pub mod bucket;
pub mod period;

pub use aggregator::{aggregate, Bucket, Dated, Field};
pub use assembler::{assemble_report, Datasets, ReportViewModel};
pub use bucket::{bucket_key, BucketKey, Granularity};
pub use period::{available_periods, date_span, periods_for};
