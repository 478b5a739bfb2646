use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::RecordError;
use crate::time::parse_record_date;

/// Named collections in the record store.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum Collection {
    Sales,
    Expenses,
    VolunteerSessions,
    DisposedTrash,
    LendingItems,
    GiftedItems,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Sales,
        Collection::Expenses,
        Collection::VolunteerSessions,
        Collection::DisposedTrash,
        Collection::LendingItems,
        Collection::GiftedItems,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Collection::Sales => "sales",
            Collection::Expenses => "expenses",
            Collection::VolunteerSessions => "volunteerSessions",
            Collection::DisposedTrash => "disposedTrash",
            Collection::LendingItems => "lendingItems",
            Collection::GiftedItems => "giftedItems",
        }
    }

    /// Document field holding the record's calendar date.
    pub fn date_field(&self) -> &'static str {
        match self {
            Collection::LendingItems => "dateBorrowed",
            Collection::GiftedItems => "dateGifted",
            _ => "date",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Collection {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sales" | "sale" => Ok(Collection::Sales),
            "expenses" | "expense" => Ok(Collection::Expenses),
            "volunteersessions" | "volunteer" | "volunteers" => Ok(Collection::VolunteerSessions),
            "disposedtrash" | "trash" => Ok(Collection::DisposedTrash),
            "lendingitems" | "lending" | "lend" => Ok(Collection::LendingItems),
            "gifteditems" | "gifted" | "gift" => Ok(Collection::GiftedItems),
            _ => Err(RecordError::UnknownCollection(s.to_string())),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: Uuid,
    pub date: NaiveDate,
    pub item_name: String,
    pub amount: f64,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: Uuid,
    pub date: NaiveDate,
    pub item_name: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerSession {
    pub id: Uuid,
    pub date: NaiveDate,
    pub volunteer: String,
    pub hours: f64,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrashDisposal {
    pub id: Uuid,
    pub date: NaiveDate,
    #[serde(default)]
    pub blue_bags: u32,
    #[serde(default)]
    pub yellow_bags: u32,
    #[serde(default)]
    pub trips_to_landfill: u32,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LendingItem {
    pub id: Uuid,
    pub item_name: String,
    pub borrower: String,
    pub date_borrowed: NaiveDate,
    #[serde(default)]
    pub date_returned: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

impl LendingItem {
    pub fn is_on_loan(&self) -> bool {
        self.date_returned.is_none()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GiftedItem {
    pub id: Uuid,
    pub item_name: String,
    pub organization: String,
    pub date_gifted: NaiveDate,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

/// One typed record per collection.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Record {
    Sale(Sale),
    Expense(Expense),
    VolunteerSession(VolunteerSession),
    TrashDisposal(TrashDisposal),
    LendingItem(LendingItem),
    GiftedItem(GiftedItem),
}

impl Record {
    pub fn collection(&self) -> Collection {
        match self {
            Record::Sale(_) => Collection::Sales,
            Record::Expense(_) => Collection::Expenses,
            Record::VolunteerSession(_) => Collection::VolunteerSessions,
            Record::TrashDisposal(_) => Collection::DisposedTrash,
            Record::LendingItem(_) => Collection::LendingItems,
            Record::GiftedItem(_) => Collection::GiftedItems,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Record::Sale(r) => r.id,
            Record::Expense(r) => r.id,
            Record::VolunteerSession(r) => r.id,
            Record::TrashDisposal(r) => r.id,
            Record::LendingItem(r) => r.id,
            Record::GiftedItem(r) => r.id,
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            Record::Sale(r) => r.date,
            Record::Expense(r) => r.date,
            Record::VolunteerSession(r) => r.date,
            Record::TrashDisposal(r) => r.date,
            Record::LendingItem(r) => r.date_borrowed,
            Record::GiftedItem(r) => r.date_gifted,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Record::Sale(r) => r.created_at,
            Record::Expense(r) => r.created_at,
            Record::VolunteerSession(r) => r.created_at,
            Record::TrashDisposal(r) => r.created_at,
            Record::LendingItem(r) => r.created_at,
            Record::GiftedItem(r) => r.created_at,
        }
    }

    /// Short human label used by listings.
    pub fn summary(&self) -> String {
        match self {
            Record::Sale(r) => format!("{} ({:.2})", r.item_name, r.amount),
            Record::Expense(r) => match &r.category {
                Some(category) => format!("{} [{}] ({:.2})", r.item_name, category, r.amount),
                None => format!("{} ({:.2})", r.item_name, r.amount),
            },
            Record::VolunteerSession(r) => format!("{}: {:.1}h", r.volunteer, r.hours),
            Record::TrashDisposal(r) => format!(
                "blue {} / yellow {} / trips {}",
                r.blue_bags, r.yellow_bags, r.trips_to_landfill
            ),
            Record::LendingItem(r) => match r.date_returned {
                Some(returned) => format!("{} -> {} (returned {})", r.item_name, r.borrower, returned),
                None => format!("{} -> {} (on loan)", r.item_name, r.borrower),
            },
            Record::GiftedItem(r) => format!("{} -> {}", r.item_name, r.organization),
        }
    }

    /// Serializes the record as a stored document (camelCase fields, no tag).
    pub fn to_document(&self) -> serde_json::Result<Value> {
        match self {
            Record::Sale(r) => serde_json::to_value(r),
            Record::Expense(r) => serde_json::to_value(r),
            Record::VolunteerSession(r) => serde_json::to_value(r),
            Record::TrashDisposal(r) => serde_json::to_value(r),
            Record::LendingItem(r) => serde_json::to_value(r),
            Record::GiftedItem(r) => serde_json::to_value(r),
        }
    }

    /// Validates a stored document into a typed record.
    ///
    /// Dates are checked before the full decode so a bad date surfaces as
    /// [`RecordError::MalformedDate`] rather than a generic decode failure.
    pub fn from_document(collection: Collection, doc: Value) -> anyhow::Result<Record> {
        check_date_field(collection, &doc, collection.date_field(), true)?;
        if collection == Collection::LendingItems {
            check_date_field(collection, &doc, "dateReturned", false)?;
        }

        let record = match collection {
            Collection::Sales => Record::Sale(serde_json::from_value(doc)?),
            Collection::Expenses => Record::Expense(serde_json::from_value(doc)?),
            Collection::VolunteerSessions => Record::VolunteerSession(serde_json::from_value(doc)?),
            Collection::DisposedTrash => Record::TrashDisposal(serde_json::from_value(doc)?),
            Collection::LendingItems => Record::LendingItem(serde_json::from_value(doc)?),
            Collection::GiftedItems => Record::GiftedItem(serde_json::from_value(doc)?),
        };
        Ok(record)
    }
}

fn check_date_field(
    collection: Collection,
    doc: &Value,
    field: &str,
    required: bool,
) -> Result<(), RecordError> {
    match doc.get(field) {
        None | Some(Value::Null) if !required => Ok(()),
        None | Some(Value::Null) => Err(RecordError::MissingField {
            collection,
            field: field.to_string(),
        }),
        Some(Value::String(raw)) if parse_record_date(raw).is_some() => Ok(()),
        Some(other) => Err(RecordError::MalformedDate {
            collection,
            field: field.to_string(),
            value: match other {
                Value::String(raw) => raw.clone(),
                v => v.to_string(),
            },
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collection_parsing_accepts_aliases() {
        assert_eq!("sales".parse::<Collection>().unwrap(), Collection::Sales);
        assert_eq!("trash".parse::<Collection>().unwrap(), Collection::DisposedTrash);
        assert_eq!("lendingItems".parse::<Collection>().unwrap(), Collection::LendingItems);
        assert!(matches!(
            "receipts".parse::<Collection>(),
            Err(RecordError::UnknownCollection(_))
        ));
    }

    #[test]
    fn test_from_document_reads_camel_case_fields() {
        let doc = json!({
            "id": Uuid::new_v4(),
            "date": "2024-01-05",
            "blueBags": 3,
            "yellowBags": 1,
            "tripsToLandfill": 0,
        });
        let record = Record::from_document(Collection::DisposedTrash, doc).unwrap();
        match record {
            Record::TrashDisposal(t) => {
                assert_eq!(t.blue_bags, 3);
                assert_eq!(t.yellow_bags, 1);
                assert_eq!(t.notes, "");
            }
            other => panic!("unexpected record: {:?}", other),
        }
    }

    #[test]
    fn test_from_document_rejects_malformed_date() {
        let doc = json!({
            "id": Uuid::new_v4(),
            "date": "05/01/2024",
            "itemName": "Lamp",
            "amount": 4.5,
        });
        let err = Record::from_document(Collection::Sales, doc).unwrap_err();
        let err = err.downcast::<RecordError>().unwrap();
        assert_eq!(
            err,
            RecordError::MalformedDate {
                collection: Collection::Sales,
                field: "date".to_string(),
                value: "05/01/2024".to_string(),
            }
        );
    }

    #[test]
    fn test_from_document_uses_collection_date_field() {
        let doc = json!({
            "id": Uuid::new_v4(),
            "itemName": "Wheelchair",
            "borrower": "Ann",
            "dateBorrowed": "2024-02-01",
            "dateReturned": null,
        });
        let record = Record::from_document(Collection::LendingItems, doc).unwrap();
        assert_eq!(record.date(), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());

        let missing = json!({ "id": Uuid::new_v4(), "itemName": "Vase", "organization": "Shelter" });
        let err = Record::from_document(Collection::GiftedItems, missing).unwrap_err();
        assert!(matches!(
            err.downcast::<RecordError>().unwrap(),
            RecordError::MissingField { .. }
        ));
    }

    #[test]
    fn test_document_round_trip_keeps_optional_category_out() {
        let expense = Expense {
            id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            item_name: "Bin bags".to_string(),
            amount: 12.0,
            category: None,
            created_at: Utc::now(),
        };
        let doc = Record::Expense(expense.clone()).to_document().unwrap();
        assert!(doc.get("category").is_none());
        assert_eq!(doc["itemName"], "Bin bags");
        let back = Record::from_document(Collection::Expenses, doc).unwrap();
        assert_eq!(back, Record::Expense(expense));
    }
}
