use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::model::record::{
    Collection, Expense, GiftedItem, LendingItem, Record, Sale, TrashDisposal, VolunteerSession,
};
use crate::time::parse_human_date;

#[derive(Debug, PartialEq)]
pub struct ParsedInput {
    pub name: String,
    pub metadata: HashMap<String, String>,
}

pub fn parse_args(args: &[String]) -> ParsedInput {
    let mut name_parts = Vec::new();
    let mut metadata = HashMap::new();

    for arg in args {
        if let Some((key, value)) = arg.split_once(':') {
            if !key.is_empty() {
                metadata.insert(key.to_string(), value.to_string());
                continue;
            }
        }
        name_parts.push(arg.as_str());
    }

    ParsedInput {
        name: name_parts.join(" "),
        metadata,
    }
}

pub fn expand_key(key: &str, candidates: &[&str]) -> Result<String> {
    if candidates.contains(&key) {
        return Ok(key.to_string());
    }

    let matches: Vec<&str> = candidates
        .iter()
        .filter(|&&c| c.starts_with(key))
        .cloned()
        .collect();

    match matches.len() {
        1 => Ok(matches[0].to_string()),
        0 => Err(anyhow!("Unknown key: '{}'", key)),
        _ => Err(anyhow!("Ambiguous key: '{}' matches {:?}", key, matches)),
    }
}

/// Keys accepted by `add` for each collection.
pub fn keys_for(collection: Collection) -> &'static [&'static str] {
    match collection {
        Collection::Sales => &["amount", "date"],
        Collection::Expenses => &["amount", "date", "category"],
        Collection::VolunteerSessions => &["hours", "date"],
        Collection::DisposedTrash => &["blue", "yellow", "trips", "date"],
        Collection::LendingItems => &["borrower", "date", "notes"],
        Collection::GiftedItems => &["organization", "date", "notes"],
    }
}

/// Builds a new record from `add` arguments. The free words become the item
/// name, the volunteer name, or trash notes depending on the collection.
pub fn build_record(collection: Collection, input: &ParsedInput, today: NaiveDate) -> Result<Record> {
    let mut values: HashMap<String, String> = HashMap::new();
    for (key, value) in &input.metadata {
        let key = expand_key(key, keys_for(collection))?;
        values.insert(key, value.clone());
    }

    let date = match values.get("date") {
        Some(raw) => parse_human_date(raw, today)?,
        None => today,
    };
    let text = |key: &str| values.get(key).cloned().unwrap_or_default();
    let name = input.name.trim().to_string();
    let id = Uuid::new_v4();
    let created_at = Utc::now();

    let record = match collection {
        Collection::Sales => Record::Sale(Sale {
            id,
            date,
            item_name: name,
            amount: number(&values, "amount")?,
            created_at,
        }),
        Collection::Expenses => Record::Expense(Expense {
            id,
            date,
            item_name: name,
            amount: number(&values, "amount")?,
            category: values.get("category").filter(|c| !c.is_empty()).cloned(),
            created_at,
        }),
        Collection::VolunteerSessions => Record::VolunteerSession(VolunteerSession {
            id,
            date,
            volunteer: name,
            hours: number(&values, "hours")?,
            created_at,
        }),
        Collection::DisposedTrash => Record::TrashDisposal(TrashDisposal {
            id,
            date,
            blue_bags: count(&values, "blue")?,
            yellow_bags: count(&values, "yellow")?,
            trips_to_landfill: count(&values, "trips")?,
            notes: name,
            created_at,
        }),
        Collection::LendingItems => Record::LendingItem(LendingItem {
            id,
            item_name: name,
            borrower: text("borrower"),
            date_borrowed: date,
            date_returned: None,
            notes: text("notes"),
            created_at,
        }),
        Collection::GiftedItems => Record::GiftedItem(GiftedItem {
            id,
            item_name: name,
            organization: text("organization"),
            date_gifted: date,
            notes: text("notes"),
            created_at,
        }),
    };
    Ok(record)
}

fn number(values: &HashMap<String, String>, key: &str) -> Result<f64> {
    let raw = values.get(key).ok_or_else(|| anyhow!("Missing required '{}:<value>'", key))?;
    parse_number(key, raw)
}

fn count(values: &HashMap<String, String>, key: &str) -> Result<u32> {
    match values.get(key) {
        Some(raw) => parse_count(key, raw),
        None => Ok(0),
    }
}

fn parse_number(key: &str, raw: &str) -> Result<f64> {
    raw.trim()
        .trim_start_matches('$')
        .parse::<f64>()
        .with_context(|| format!("Invalid {}: '{}'", key, raw))
}

fn parse_count(key: &str, raw: &str) -> Result<u32> {
    raw.trim()
        .parse::<u32>()
        .with_context(|| format!("Invalid {}: '{}'", key, raw))
}

/// Applies `edit` arguments to an existing record. Free words, when given,
/// replace the item name, the volunteer name, or trash notes; each
/// `key:value` pair overwrites one field. Id and creation time are kept.
pub fn apply_edits(record: &mut Record, input: &ParsedInput, today: NaiveDate) -> Result<()> {
    let keys = keys_for(record.collection());
    let name = input.name.trim();
    if !name.is_empty() {
        match record {
            Record::Sale(r) => r.item_name = name.to_string(),
            Record::Expense(r) => r.item_name = name.to_string(),
            Record::VolunteerSession(r) => r.volunteer = name.to_string(),
            Record::TrashDisposal(r) => r.notes = name.to_string(),
            Record::LendingItem(r) => r.item_name = name.to_string(),
            Record::GiftedItem(r) => r.item_name = name.to_string(),
        }
    }

    for (key, raw) in &input.metadata {
        let key = expand_key(key, keys)?;
        match (&mut *record, key.as_str()) {
            (Record::Sale(r), "date") => r.date = parse_human_date(raw, today)?,
            (Record::Sale(r), "amount") => r.amount = parse_number(&key, raw)?,
            (Record::Expense(r), "date") => r.date = parse_human_date(raw, today)?,
            (Record::Expense(r), "amount") => r.amount = parse_number(&key, raw)?,
            (Record::Expense(r), "category") => {
                r.category = Some(raw.trim().to_string()).filter(|c| !c.is_empty())
            }
            (Record::VolunteerSession(r), "date") => r.date = parse_human_date(raw, today)?,
            (Record::VolunteerSession(r), "hours") => r.hours = parse_number(&key, raw)?,
            (Record::TrashDisposal(r), "date") => r.date = parse_human_date(raw, today)?,
            (Record::TrashDisposal(r), "blue") => r.blue_bags = parse_count(&key, raw)?,
            (Record::TrashDisposal(r), "yellow") => r.yellow_bags = parse_count(&key, raw)?,
            (Record::TrashDisposal(r), "trips") => r.trips_to_landfill = parse_count(&key, raw)?,
            (Record::LendingItem(r), "date") => r.date_borrowed = parse_human_date(raw, today)?,
            (Record::LendingItem(r), "borrower") => r.borrower = raw.clone(),
            (Record::LendingItem(r), "notes") => r.notes = raw.clone(),
            (Record::GiftedItem(r), "date") => r.date_gifted = parse_human_date(raw, today)?,
            (Record::GiftedItem(r), "organization") => r.organization = raw.clone(),
            (Record::GiftedItem(r), "notes") => r.notes = raw.clone(),
            (_, other) => return Err(anyhow!("Key '{}' cannot be edited here", other)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_parse_simple() {
        let parsed = parse_args(&args(&["Oak", "bookcase", "amount:45", "date:yesterday"]));
        assert_eq!(parsed.name, "Oak bookcase");
        assert_eq!(parsed.metadata.get("amount"), Some(&"45".to_string()));
        assert_eq!(parsed.metadata.get("date"), Some(&"yesterday".to_string()));
    }

    #[test]
    fn test_expand_key() {
        let candidates = keys_for(Collection::Expenses);

        assert_eq!(expand_key("a", candidates).unwrap(), "amount");
        assert_eq!(expand_key("cat", candidates).unwrap(), "category");
        assert_eq!(expand_key("date", candidates).unwrap(), "date");

        assert!(expand_key("x", candidates).is_err());
        assert_eq!(expand_key("b", keys_for(Collection::DisposedTrash)).unwrap(), "blue");
        assert!(expand_key("o", &["organization", "other"]).is_err());
    }

    #[test]
    fn test_build_sale_with_relative_date() {
        let today = d(2024, 3, 15);
        let parsed = parse_args(&args(&["Lamp", "am:$12.50", "d:-2d"]));
        match build_record(Collection::Sales, &parsed, today).unwrap() {
            Record::Sale(sale) => {
                assert_eq!(sale.item_name, "Lamp");
                assert_eq!(sale.amount, 12.5);
                assert_eq!(sale.date, d(2024, 3, 13));
            }
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[test]
    fn test_build_trash_defaults_and_notes() {
        let today = d(2024, 3, 15);
        let parsed = parse_args(&args(&["skip", "run", "blue:3", "trips:1"]));
        match build_record(Collection::DisposedTrash, &parsed, today).unwrap() {
            Record::TrashDisposal(trash) => {
                assert_eq!(trash.blue_bags, 3);
                assert_eq!(trash.yellow_bags, 0);
                assert_eq!(trash.trips_to_landfill, 1);
                assert_eq!(trash.notes, "skip run");
                assert_eq!(trash.date, today);
            }
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[test]
    fn test_build_lend_uses_borrow_date() {
        let today = d(2024, 3, 15);
        let parsed = parse_args(&args(&["Walker", "bor:Pat", "date:2024-03-01"]));
        match build_record(Collection::LendingItems, &parsed, today).unwrap() {
            Record::LendingItem(item) => {
                assert_eq!(item.borrower, "Pat");
                assert_eq!(item.date_borrowed, d(2024, 3, 1));
                assert!(item.is_on_loan());
            }
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[test]
    fn test_apply_edits_overwrites_named_fields() {
        let today = d(2024, 3, 15);
        let mut record = build_record(
            Collection::DisposedTrash,
            &parse_args(&args(&["skip", "blue:3", "date:2024-03-01"])),
            today,
        )
        .unwrap();
        let id = record.id();

        apply_edits(&mut record, &parse_args(&args(&["y:2", "t:1", "notes", "fixed"])), today).unwrap();

        match &record {
            Record::TrashDisposal(trash) => {
                assert_eq!(trash.id, id);
                assert_eq!(trash.blue_bags, 3);
                assert_eq!(trash.yellow_bags, 2);
                assert_eq!(trash.trips_to_landfill, 1);
                assert_eq!(trash.notes, "notes fixed");
                assert_eq!(trash.date, d(2024, 3, 1));
            }
            other => panic!("unexpected record {:?}", other),
        }
        assert!(apply_edits(&mut record, &parse_args(&args(&["amount:3"])), today).is_err());
    }

    #[test]
    fn test_build_rejects_missing_or_bad_values() {
        let today = d(2024, 3, 15);
        assert!(build_record(Collection::Sales, &parse_args(&args(&["Lamp"])), today).is_err());
        assert!(build_record(Collection::Sales, &parse_args(&args(&["Lamp", "amount:lots"])), today).is_err());
        assert!(build_record(Collection::VolunteerSessions, &parse_args(&args(&["Kim", "category:x"])), today).is_err());
        assert!(build_record(Collection::DisposedTrash, &parse_args(&args(&["blue:-1"])), today).is_err());
    }
}
