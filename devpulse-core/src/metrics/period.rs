//! Calendar-aligned period buckets.
//!
//! Both the commit stream and the Copilot usage stream are bucketed with the
//! same functions so that two independently built series produce identical
//! keys for the same day and can be joined by equality on the bucket start.
//!
//! | Period | Bucket start |
//! |--------|--------------|
//! | `Day` | the day itself |
//! | `Week` | ISO week Monday |
//! | `Month` | 1st of the month |
//! | `Quarter` | 1st of Jan / Apr / Jul / Oct |
//! | `Year` | Jan 1 |

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Aggregation granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
            Period::Quarter => "quarter",
            Period::Year => "year",
        }
    }

    /// Start of the bucket containing `date`.
    pub fn bucket_start(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Period::Day => date,
            Period::Week => {
                date - Days::new(u64::from(date.weekday().num_days_from_monday()))
            }
            Period::Month => month_start(date),
            Period::Quarter => month_start(date) - Months::new(date.month0() % 3),
            Period::Year => date - Days::new(u64::from(date.ordinal0())),
        }
    }

    /// Start of the bucket following the one that starts at `start`.
    ///
    /// `start` must already be a bucket start for this period.
    pub fn next_start(&self, start: NaiveDate) -> NaiveDate {
        match self {
            Period::Day => start + Days::new(1),
            Period::Week => start + Days::new(7),
            Period::Month => start + Months::new(1),
            Period::Quarter => start + Months::new(3),
            Period::Year => start + Months::new(12),
        }
    }

    /// The bucket containing `date`.
    pub fn bucket(&self, date: NaiveDate) -> Bucket {
        let start = self.bucket_start(date);
        Bucket {
            start,
            end: self.next_start(start),
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "d" | "day" | "daily" => Ok(Period::Day),
            "w" | "week" | "weekly" => Ok(Period::Week),
            "m" | "month" | "monthly" => Ok(Period::Month),
            "q" | "quarter" | "quarterly" => Ok(Period::Quarter),
            "y" | "year" | "yearly" => Ok(Period::Year),
            _ => Err(Error::InvalidPeriod(s.to_string())),
        }
    }
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}

/// Half-open interval `[start, end)` of one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Bucket {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Bucket {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }
}

/// Map a timestamp to the start of its bucket (UTC calendar day).
pub fn bucket_key(timestamp: DateTime<Utc>, period: Period) -> NaiveDate {
    period.bucket_start(timestamp.date_naive())
}

/// Distinct bucket starts touched by `records`, strictly ascending.
pub fn enumerate_buckets<T, F>(records: &[T], period: Period, key_fn: F) -> Vec<NaiveDate>
where
    F: Fn(&T) -> NaiveDate,
{
    records
        .iter()
        .map(|r| period.bucket_start(key_fn(r)))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Group records by an arbitrary key.
pub fn group_by<T, K, F>(records: &[T], key_fn: F) -> BTreeMap<K, Vec<&T>>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    let mut groups: BTreeMap<K, Vec<&T>> = BTreeMap::new();
    for record in records {
        groups.entry(key_fn(record)).or_default().push(record);
    }
    groups
}

/// Group records into the buckets of `period`, keyed by bucket.
///
/// Iterating the returned map yields buckets in chronological order.
pub fn bucket_records<T, F>(records: &[T], period: Period, date_fn: F) -> BTreeMap<Bucket, Vec<&T>>
where
    F: Fn(&T) -> NaiveDate,
{
    group_by(records, |r| period.bucket(date_fn(r)))
}
