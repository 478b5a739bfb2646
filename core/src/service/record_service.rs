use crate::error::RecordError;
use crate::input::{apply_edits, ParsedInput};
use crate::model::record::{Collection, LendingItem, Record};
use crate::repository::RecordRepository;
use crate::service::dto::LendingFilter;
use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use uuid::Uuid;

/// Write side of the ledger: validated inserts, lending returns, removals.
pub struct RecordService<R: RecordRepository> {
    repo: R,
}

impl<R: RecordRepository> RecordService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn add(&self, record: Record) -> Result<Record> {
        validate(&record)?;
        self.repo.insert(record)
    }

    /// All records of a collection, most recent first.
    pub fn list(&self, collection: Collection) -> Result<Vec<Record>> {
        let mut records = self.repo.fetch(collection, None)?;
        records.reverse();
        Ok(records)
    }

    pub fn list_lending(&self, filter: LendingFilter) -> Result<Vec<Record>> {
        let records = self.list(Collection::LendingItems)?;
        Ok(records
            .into_iter()
            .filter(|r| match (r, filter) {
                (_, LendingFilter::All) => true,
                (Record::LendingItem(item), LendingFilter::Borrowed) => item.is_on_loan(),
                (Record::LendingItem(item), LendingFilter::Returned) => !item.is_on_loan(),
                _ => false,
            })
            .collect())
    }

    /// Resolves a full id or a unique id prefix (as shown in listings).
    pub fn resolve_id(&self, collection: Collection, prefix: &str) -> Result<Uuid> {
        if let Ok(id) = Uuid::parse_str(prefix) {
            return Ok(id);
        }
        let prefix = prefix.to_lowercase();
        let matches: Vec<Uuid> = self
            .repo
            .fetch(collection, None)?
            .iter()
            .map(|r| r.id())
            .filter(|id| id.to_string().starts_with(&prefix))
            .collect();

        match matches.len() {
            1 => Ok(matches[0]),
            0 => Err(anyhow!("No {} record matches id '{}'", collection, prefix)),
            _ => Err(anyhow!("Ambiguous id '{}' matches {} {} records", prefix, matches.len(), collection)),
        }
    }

    fn lending_item(&self, id: &Uuid) -> Result<LendingItem> {
        match self.repo.get(Collection::LendingItems, id)? {
            Record::LendingItem(item) => Ok(item),
            other => Err(RecordError::WrongCollection {
                expected: Collection::LendingItems,
                found: other.collection(),
            }
            .into()),
        }
    }

    pub fn mark_returned(&self, id: &Uuid, date: NaiveDate) -> Result<()> {
        let mut item = self.lending_item(id)?;
        if date < item.date_borrowed {
            return Err(RecordError::InvalidValue {
                field: "dateReturned".to_string(),
                reason: format!("{} is before the borrow date {}", date, item.date_borrowed),
            }
            .into());
        }
        item.date_returned = Some(date);
        self.repo.update(&Record::LendingItem(item))
    }

    pub fn unmark_returned(&self, id: &Uuid) -> Result<()> {
        let mut item = self.lending_item(id)?;
        item.date_returned = None;
        self.repo.update(&Record::LendingItem(item))
    }

    /// Rewrites fields of a stored record from `key:value` edit arguments.
    pub fn edit(&self, collection: Collection, id: &Uuid, input: &ParsedInput, today: NaiveDate) -> Result<Record> {
        let mut record = self.repo.get(collection, id)?;
        if record.collection() != collection {
            return Err(RecordError::WrongCollection {
                expected: collection,
                found: record.collection(),
            }
            .into());
        }
        apply_edits(&mut record, input, today)?;
        validate(&record)?;
        self.repo.update(&record)?;
        Ok(record)
    }

    pub fn delete(&self, collection: Collection, id: &Uuid) -> Result<()> {
        self.repo.delete(collection, id)
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> RecordError {
    RecordError::InvalidValue {
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn require_name(field: &str, value: &str) -> Result<(), RecordError> {
    if value.trim().is_empty() {
        return Err(invalid(field, "must not be empty"));
    }
    Ok(())
}

fn require_amount(field: &str, value: f64) -> Result<(), RecordError> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(field, format!("must be a non-negative number, got {}", value)));
    }
    Ok(())
}

/// Checks a record before it is written.
pub fn validate(record: &Record) -> Result<(), RecordError> {
    match record {
        Record::Sale(r) => {
            require_name("itemName", &r.item_name)?;
            require_amount("amount", r.amount)
        }
        Record::Expense(r) => {
            require_name("itemName", &r.item_name)?;
            require_amount("amount", r.amount)
        }
        Record::VolunteerSession(r) => {
            require_name("volunteer", &r.volunteer)?;
            require_amount("hours", r.hours)?;
            if r.hours == 0.0 || r.hours > 24.0 {
                return Err(invalid("hours", format!("must be between 0 and 24, got {}", r.hours)));
            }
            Ok(())
        }
        Record::TrashDisposal(r) => {
            if r.blue_bags == 0 && r.yellow_bags == 0 && r.trips_to_landfill == 0 {
                return Err(invalid("blueBags", "at least one bag or trip is required"));
            }
            Ok(())
        }
        Record::LendingItem(r) => {
            require_name("itemName", &r.item_name)?;
            require_name("borrower", &r.borrower)?;
            match r.date_returned {
                Some(returned) if returned < r.date_borrowed => {
                    Err(invalid("dateReturned", "must not be before dateBorrowed"))
                }
                _ => Ok(()),
            }
        }
        Record::GiftedItem(r) => {
            require_name("itemName", &r.item_name)?;
            require_name("organization", &r.organization)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::period::DateRange;
    use crate::model::record::{Sale, VolunteerSession};
    use chrono::Utc;
    use std::cell::RefCell;

    #[derive(Default)]
    struct MemoryRepo {
        records: RefCell<Vec<Record>>,
    }

    impl RecordRepository for MemoryRepo {
        fn fetch(&self, collection: Collection, range: Option<DateRange>) -> Result<Vec<Record>> {
            let mut records: Vec<Record> = self
                .records
                .borrow()
                .iter()
                .filter(|r| r.collection() == collection)
                .filter(|r| range.map_or(true, |range| range.contains(r.date())))
                .cloned()
                .collect();
            records.sort_by_key(|r| r.date());
            Ok(records)
        }

        fn get(&self, collection: Collection, id: &Uuid) -> Result<Record> {
            self.records
                .borrow()
                .iter()
                .find(|r| r.id() == *id)
                .cloned()
                .ok_or_else(|| RecordError::NotFound { collection, id: *id }.into())
        }

        fn insert(&self, record: Record) -> Result<Record> {
            self.records.borrow_mut().push(record.clone());
            Ok(record)
        }

        fn update(&self, record: &Record) -> Result<()> {
            let mut records = self.records.borrow_mut();
            let pos = records.iter().position(|r| r.id() == record.id()).unwrap();
            records[pos] = record.clone();
            Ok(())
        }

        fn delete(&self, _collection: Collection, id: &Uuid) -> Result<()> {
            self.records.borrow_mut().retain(|r| r.id() != *id);
            Ok(())
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn loan(date: NaiveDate) -> LendingItem {
        LendingItem {
            id: Uuid::new_v4(),
            item_name: "Wheelchair".to_string(),
            borrower: "Jo".to_string(),
            date_borrowed: date,
            date_returned: None,
            notes: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_add_rejects_invalid_records() {
        let service = RecordService::new(MemoryRepo::default());
        let negative = Record::Sale(Sale {
            id: Uuid::new_v4(),
            date: d(2024, 1, 1),
            item_name: "Chair".to_string(),
            amount: -4.0,
            created_at: Utc::now(),
        });
        assert!(service.add(negative).is_err());

        let marathon = Record::VolunteerSession(VolunteerSession {
            id: Uuid::new_v4(),
            date: d(2024, 1, 1),
            volunteer: "Kim".to_string(),
            hours: 30.0,
            created_at: Utc::now(),
        });
        let err = service.add(marathon).unwrap_err();
        assert!(matches!(err.downcast_ref::<RecordError>(), Some(RecordError::InvalidValue { .. })));
        assert!(service.list(Collection::Sales).unwrap().is_empty());
    }

    #[test]
    fn test_return_and_undo_return() {
        let service = RecordService::new(MemoryRepo::default());
        let item = loan(d(2024, 5, 1));
        service.add(Record::LendingItem(item.clone())).unwrap();

        assert!(service.mark_returned(&item.id, d(2024, 4, 30)).is_err());
        service.mark_returned(&item.id, d(2024, 5, 3)).unwrap();
        assert_eq!(service.list_lending(LendingFilter::Returned).unwrap().len(), 1);
        assert!(service.list_lending(LendingFilter::Borrowed).unwrap().is_empty());

        service.unmark_returned(&item.id).unwrap();
        assert_eq!(service.list_lending(LendingFilter::Borrowed).unwrap().len(), 1);
        assert_eq!(service.list_lending(LendingFilter::All).unwrap().len(), 1);
    }

    #[test]
    fn test_return_rejects_non_lending_record() {
        let service = RecordService::new(MemoryRepo::default());
        let sale = Sale {
            id: Uuid::new_v4(),
            date: d(2024, 1, 1),
            item_name: "Chair".to_string(),
            amount: 4.0,
            created_at: Utc::now(),
        };
        service.add(Record::Sale(sale.clone())).unwrap();
        let err = service.mark_returned(&sale.id, d(2024, 1, 2)).unwrap_err();
        assert_eq!(
            err.downcast_ref::<RecordError>(),
            Some(&RecordError::WrongCollection {
                expected: Collection::LendingItems,
                found: Collection::Sales,
            })
        );

        let input = ParsedInput { name: String::new(), metadata: Default::default() };
        let err = service.edit(Collection::LendingItems, &sale.id, &input, d(2024, 1, 2)).unwrap_err();
        assert!(matches!(err.downcast_ref::<RecordError>(), Some(RecordError::WrongCollection { .. })));
    }

    #[test]
    fn test_edit_updates_and_validates() {
        use crate::input::parse_args;

        let service = RecordService::new(MemoryRepo::default());
        let item = loan(d(2024, 5, 1));
        service.add(Record::LendingItem(item.clone())).unwrap();
        let today = d(2024, 5, 10);
        fn words(w: &[&str]) -> ParsedInput {
            parse_args(&w.iter().map(|s| s.to_string()).collect::<Vec<_>>())
        }

        let edited = service
            .edit(Collection::LendingItems, &item.id, &words(&["notes:left", "brake", "bor:Sam"]), today)
            .unwrap();
        match service.repo.get(Collection::LendingItems, &item.id).unwrap() {
            Record::LendingItem(stored) => {
                assert_eq!(stored.borrower, "Sam");
                assert_eq!(stored.notes, "left");
                assert_eq!(stored.item_name, "brake");
                assert_eq!(stored.created_at, item.created_at);
                assert_eq!(Record::LendingItem(stored), edited);
            }
            other => panic!("unexpected record {:?}", other),
        }

        assert!(service
            .edit(Collection::LendingItems, &item.id, &words(&["bor:  "]), today)
            .is_err());
        assert!(service
            .edit(Collection::LendingItems, &item.id, &words(&["hours:2"]), today)
            .is_err());
    }

    #[test]
    fn test_list_is_most_recent_first() {
        let service = RecordService::new(MemoryRepo::default());
        service.add(Record::LendingItem(loan(d(2024, 1, 1)))).unwrap();
        service.add(Record::LendingItem(loan(d(2024, 3, 1)))).unwrap();
        let dates: Vec<_> = service
            .list(Collection::LendingItems)
            .unwrap()
            .iter()
            .map(|r| r.date())
            .collect();
        assert_eq!(dates, vec![d(2024, 3, 1), d(2024, 1, 1)]);
    }

    #[test]
    fn test_resolve_id_by_prefix() {
        let service = RecordService::new(MemoryRepo::default());
        let item = loan(d(2024, 1, 1));
        service.add(Record::LendingItem(item.clone())).unwrap();
        let prefix = &item.id.to_string()[..8];
        assert_eq!(service.resolve_id(Collection::LendingItems, prefix).unwrap(), item.id);
        assert!(service.resolve_id(Collection::Sales, prefix).is_err());
    }
}
