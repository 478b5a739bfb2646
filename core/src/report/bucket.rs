//! Mapping dates onto day / week / month buckets.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Daily,
    Weekly,
    #[default]
    Monthly,
}

impl Granularity {
    pub const ALL: [Granularity; 3] = [Granularity::Daily, Granularity::Weekly, Granularity::Monthly];

    pub fn next(&self) -> Self {
        match self {
            Granularity::Daily => Granularity::Weekly,
            Granularity::Weekly => Granularity::Monthly,
            Granularity::Monthly => Granularity::Daily,
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Granularity::Daily => "daily",
            Granularity::Weekly => "weekly",
            Granularity::Monthly => "monthly",
        })
    }
}

impl FromStr for Granularity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "d" | "day" | "daily" => Ok(Granularity::Daily),
            "w" | "week" | "weekly" => Ok(Granularity::Weekly),
            "m" | "month" | "monthly" => Ok(Granularity::Monthly),
            _ => Err(anyhow!("Unknown granularity: {}", s)),
        }
    }
}

/// Identifies one time bucket. Weeks are ISO-8601 weeks keyed by their
/// ISO week-year, so a week straddling New Year stays a single bucket.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(tag = "unit", rename_all = "lowercase")]
pub enum BucketKey {
    Day { date: NaiveDate },
    Week { year: i32, week: u32 },
    Month { year: i32, month: u32 },
}

impl BucketKey {
    /// First calendar day covered by the bucket.
    pub fn start(&self) -> NaiveDate {
        match *self {
            BucketKey::Day { date } => date,
            BucketKey::Week { year, week } => {
                NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).unwrap_or(NaiveDate::MIN)
            }
            BucketKey::Month { year, month } => {
                NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
            }
        }
    }

    pub fn label(&self) -> String {
        match *self {
            BucketKey::Day { date } => date.format("%Y-%m-%d").to_string(),
            BucketKey::Week { year, week } => format!("Week {}, {}", week, year),
            BucketKey::Month { .. } => self.start().format("%b %Y").to_string(),
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

pub fn bucket_key(date: NaiveDate, granularity: Granularity) -> BucketKey {
    match granularity {
        Granularity::Daily => BucketKey::Day { date },
        Granularity::Weekly => {
            let iso = date.iso_week();
            BucketKey::Week {
                year: iso.year(),
                week: iso.week(),
            }
        }
        Granularity::Monthly => BucketKey::Month {
            year: date.year(),
            month: date.month(),
        },
    }
}
