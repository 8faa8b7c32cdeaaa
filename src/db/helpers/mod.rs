use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};

use crate::db::models::TripKind;

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_kind(value: &str) -> Result<TripKind> {
    match value {
        "time" => Ok(TripKind::Time),
        "distance" => Ok(TripKind::Distance),
        other => Err(anyhow!("unknown trip kind {other}")),
    }
}

pub fn required(value: Option<f64>, field: &str) -> Result<f64> {
    value.ok_or_else(|| anyhow!("{field} is missing"))
}
