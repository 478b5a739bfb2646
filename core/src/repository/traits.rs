use crate::model::period::DateRange;
use crate::model::record::{Collection, Record};
use anyhow::Result;
use uuid::Uuid;

/// Document store the reports read from.
///
/// `fetch` returns typed records ordered by date ascending (ties by creation
/// time), optionally limited to an inclusive date range on the collection's
/// date field.
pub trait RecordRepository {
    fn fetch(&self, collection: Collection, range: Option<DateRange>) -> Result<Vec<Record>>;
    fn get(&self, collection: Collection, id: &Uuid) -> Result<Record>;
    fn insert(&self, record: Record) -> Result<Record>;
    fn update(&self, record: &Record) -> Result<()>;
    fn delete(&self, collection: Collection, id: &Uuid) -> Result<()>;
}
