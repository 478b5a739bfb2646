pub mod file;
pub mod traits;

pub use file::FileRecordRepository;
pub use traits::RecordRepository;
