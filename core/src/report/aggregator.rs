use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::record::{Expense, GiftedItem, LendingItem, Record, Sale, TrashDisposal, VolunteerSession};
use crate::report::bucket::{bucket_key, BucketKey, Granularity};

/// Numeric quantities that can be summed into buckets.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Amount,
    Income,
    Expenses,
    Hours,
    BlueBags,
    YellowBags,
    TripsToLandfill,
    /// Every record counts as one item.
    Items,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Amount => "amount",
            Field::Income => "income",
            Field::Expenses => "expenses",
            Field::Hours => "hours",
            Field::BlueBags => "blueBags",
            Field::YellowBags => "yellowBags",
            Field::TripsToLandfill => "tripsToLandfill",
            Field::Items => "items",
        })
    }
}

/// Anything with a calendar date and named numeric fields.
pub trait Dated {
    fn date(&self) -> NaiveDate;

    /// Value of `field`, or `None` when the record does not carry it.
    fn value(&self, field: Field) -> Option<f64>;
}

impl Dated for Sale {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn value(&self, field: Field) -> Option<f64> {
        match field {
            Field::Amount | Field::Income => Some(self.amount),
            Field::Items => Some(1.0),
            _ => None,
        }
    }
}

impl Dated for Expense {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn value(&self, field: Field) -> Option<f64> {
        match field {
            Field::Amount | Field::Expenses => Some(self.amount),
            Field::Items => Some(1.0),
            _ => None,
        }
    }
}

impl Dated for VolunteerSession {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn value(&self, field: Field) -> Option<f64> {
        match field {
            Field::Hours => Some(self.hours),
            Field::Items => Some(1.0),
            _ => None,
        }
    }
}

impl Dated for TrashDisposal {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn value(&self, field: Field) -> Option<f64> {
        match field {
            Field::BlueBags => Some(self.blue_bags as f64),
            Field::YellowBags => Some(self.yellow_bags as f64),
            Field::TripsToLandfill => Some(self.trips_to_landfill as f64),
            Field::Items => Some(1.0),
            _ => None,
        }
    }
}

impl Dated for LendingItem {
    fn date(&self) -> NaiveDate {
        self.date_borrowed
    }

    fn value(&self, field: Field) -> Option<f64> {
        (field == Field::Items).then_some(1.0)
    }
}

impl Dated for GiftedItem {
    fn date(&self) -> NaiveDate {
        self.date_gifted
    }

    fn value(&self, field: Field) -> Option<f64> {
        (field == Field::Items).then_some(1.0)
    }
}

impl Dated for Record {
    fn date(&self) -> NaiveDate {
        Record::date(self)
    }

    fn value(&self, field: Field) -> Option<f64> {
        match self {
            Record::Sale(r) => r.value(field),
            Record::Expense(r) => r.value(field),
            Record::VolunteerSession(r) => r.value(field),
            Record::TrashDisposal(r) => r.value(field),
            Record::LendingItem(r) => r.value(field),
            Record::GiftedItem(r) => r.value(field),
        }
    }
}

impl<T: Dated + ?Sized> Dated for &T {
    fn date(&self) -> NaiveDate {
        (**self).date()
    }

    fn value(&self, field: Field) -> Option<f64> {
        (**self).value(field)
    }
}

/// Summed fields for one time bucket.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Bucket {
    pub key: BucketKey,
    pub label: String,
    pub totals: BTreeMap<Field, f64>,
}

impl Bucket {
    fn new(key: BucketKey, fields: &[Field]) -> Self {
        Self {
            key,
            label: key.label(),
            totals: fields.iter().map(|f| (*f, 0.0)).collect(),
        }
    }

    pub fn get(&self, field: Field) -> f64 {
        self.totals.get(&field).copied().unwrap_or(0.0)
    }

    /// Sum of `field` across a bucket series.
    pub fn total(buckets: &[Bucket], field: Field) -> f64 {
        buckets.iter().map(|b| b.get(field)).sum()
    }
}

/// Folds dated records into per-bucket sums of `fields`.
///
/// Buckets come out in the order their keys are first seen. Callers sort the
/// input by date beforehand when they need a chronological series.
pub fn aggregate<T: Dated>(records: &[T], granularity: Granularity, fields: &[Field]) -> Vec<Bucket> {
    // Fields form a set; a repeated field is summed once.
    let fields: Vec<Field> = fields.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
    let fields = fields.as_slice();
    let mut buckets: Vec<Bucket> = Vec::new();
    let mut index: HashMap<BucketKey, usize> = HashMap::new();
    let mut previous: Option<NaiveDate> = None;

    for record in records {
        let date = record.date();
        if let Some(prev) = previous {
            if date < prev {
                debug!(%date, %prev, "aggregate input is not sorted by date");
            }
        }
        previous = Some(date);

        let key = bucket_key(date, granularity);
        let slot = *index.entry(key).or_insert_with(|| {
            buckets.push(Bucket::new(key, fields));
            buckets.len() - 1
        });

        let bucket = &mut buckets[slot];
        for field in fields {
            if let Some(value) = record.value(*field) {
                *bucket.totals.entry(*field).or_insert(0.0) += value;
            }
        }
    }

    debug!(
        records = records.len(),
        buckets = buckets.len(),
        %granularity,
        "aggregated records"
    );
    buckets
}
