//! Field-level parse and format helpers shared by the CSV repositories.
//!
//! Parsing is strict: a malformed row is a storage fault, not something to
//! paper over with defaults.

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, Utc};
use csv::StringRecord;
use rust_decimal::Decimal;

pub(super) fn field<'a>(record: &'a StringRecord, index: usize, name: &str) -> Result<&'a str> {
    record
        .get(index)
        .ok_or_else(|| anyhow!("missing column '{}' (index {})", name, index))
}

pub(super) fn parse_date(value: &str, name: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| anyhow!("invalid date in column '{}': '{}' ({})", name, value, e))
}

pub(super) fn parse_opt_date(value: &str, name: &str) -> Result<Option<NaiveDate>> {
    if value.is_empty() {
        Ok(None)
    } else {
        parse_date(value, name).map(Some)
    }
}

pub(super) fn parse_decimal(value: &str, name: &str) -> Result<Decimal> {
    value
        .parse()
        .map_err(|e| anyhow!("invalid decimal in column '{}': '{}' ({})", name, value, e))
}

pub(super) fn parse_opt_decimal(value: &str, name: &str) -> Result<Option<Decimal>> {
    if value.is_empty() {
        Ok(None)
    } else {
        parse_decimal(value, name).map(Some)
    }
}

pub(super) fn parse_opt_u32(value: &str, name: &str) -> Result<Option<u32>> {
    if value.is_empty() {
        Ok(None)
    } else {
        value
            .parse()
            .map(Some)
            .map_err(|e| anyhow!("invalid number in column '{}': '{}' ({})", name, value, e))
    }
}

pub(super) fn parse_u32(value: &str, name: &str) -> Result<u32> {
    value
        .parse()
        .map_err(|e| anyhow!("invalid number in column '{}': '{}' ({})", name, value, e))
}

pub(super) fn parse_timestamp(value: &str, name: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| anyhow!("invalid timestamp in column '{}': '{}' ({})", name, value, e))
}

pub(super) fn opt_string(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

pub(super) fn format_opt_date(value: Option<NaiveDate>) -> String {
    value.map(|d| d.to_string()).unwrap_or_default()
}

pub(super) fn format_opt_decimal(value: Option<Decimal>) -> String {
    value.map(|d| d.to_string()).unwrap_or_default()
}

pub(super) fn format_opt_u32(value: Option<u32>) -> String {
    value.map(|n| n.to_string()).unwrap_or_default()
}
