//! Completed trips as written to the history store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    fare::{round_cents, DistanceQuote},
    trip::TripSummary,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TripKind {
    Time,
    Distance,
}

impl TripKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripKind::Time => "time",
            TripKind::Distance => "distance",
        }
    }
}

/// Immutable once created. Durations, distance and fare are stored rounded
/// to two decimals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TripRecord {
    #[serde(rename_all = "camelCase")]
    Time {
        id: String,
        recorded_at: DateTime<Utc>,
        stopped_seconds: f64,
        moving_seconds: f64,
        total_seconds: f64,
        total_fare: f64,
    },
    #[serde(rename_all = "camelCase")]
    Distance {
        id: String,
        recorded_at: DateTime<Utc>,
        distance_km: f64,
        total_fare: f64,
    },
}

impl TripRecord {
    pub fn from_summary(summary: &TripSummary) -> Self {
        TripRecord::Time {
            id: Uuid::new_v4().to_string(),
            recorded_at: summary.finished_at,
            stopped_seconds: round_cents(summary.stopped_seconds),
            moving_seconds: round_cents(summary.moving_seconds),
            total_seconds: round_cents(summary.total_seconds),
            total_fare: round_cents(summary.total_fare),
        }
    }

    pub fn from_quote(quote: &DistanceQuote, recorded_at: DateTime<Utc>) -> Self {
        TripRecord::Distance {
            id: Uuid::new_v4().to_string(),
            recorded_at,
            distance_km: round_cents(quote.distance_km),
            total_fare: round_cents(quote.fare),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            TripRecord::Time { id, .. } | TripRecord::Distance { id, .. } => id,
        }
    }

    pub fn kind(&self) -> TripKind {
        match self {
            TripRecord::Time { .. } => TripKind::Time,
            TripRecord::Distance { .. } => TripKind::Distance,
        }
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        match self {
            TripRecord::Time { recorded_at, .. } | TripRecord::Distance { recorded_at, .. } => {
                *recorded_at
            }
        }
    }

    pub fn total_fare(&self) -> f64 {
        match self {
            TripRecord::Time { total_fare, .. } | TripRecord::Distance { total_fare, .. } => {
                *total_fare
            }
        }
    }
}
