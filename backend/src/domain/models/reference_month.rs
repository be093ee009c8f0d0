//! Calendar-month value type used to key monthly closings.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A calendar month in `YYYY-MM` form.
///
/// Serializes as its string form so it can travel through CSV columns and
/// JSON fields unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReferenceMonth {
    year: i32,
    month: u32,
}

/// Error returned when a reference month string is not `YYYY-MM`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceMonthParseError(pub String);

impl fmt::Display for ReferenceMonthParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid reference month '{}', expected YYYY-MM", self.0)
    }
}

impl std::error::Error for ReferenceMonthParseError {}

impl ReferenceMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) && (1900..=9999).contains(&year) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First day of the month.
    pub fn month_start(&self) -> NaiveDate {
        // Safe: year/month are validated on construction
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap()
    }

    /// Last day of the month.
    pub fn month_end(&self) -> NaiveDate {
        let (next_year, next_month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .unwrap()
            .pred_opt()
            .unwrap()
    }

    /// Month containing the given date.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for ReferenceMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for ReferenceMonth {
    type Err = ReferenceMonthParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ReferenceMonthParseError(s.to_string());
        let (year_part, month_part) = s.split_once('-').ok_or_else(err)?;
        if year_part.len() != 4 || month_part.len() != 2 {
            return Err(err());
        }
        let year: i32 = year_part.parse().map_err(|_| err())?;
        let month: u32 = month_part.parse().map_err(|_| err())?;
        Self::new(year, month).ok_or_else(err)
    }
}

impl TryFrom<String> for ReferenceMonth {
    type Error = ReferenceMonthParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ReferenceMonth> for String {
    fn from(value: ReferenceMonth) -> Self {
        value.to_string()
    }
}
