//! Fare arithmetic for time-based and distance-based trips.
//!
//! Amounts are kept as raw `f64` euros everywhere; only [`round_cents`] (used
//! when a value is shown or written to history) rounds to two decimals.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::error::TripError;

pub const DEFAULT_STOPPED_RATE: f64 = 0.02;
pub const DEFAULT_MOVING_RATE: f64 = 0.05;
pub const DEFAULT_DISTANCE_RATE: f64 = 1.10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FareRates {
    pub stopped_rate_per_second: f64,
    pub moving_rate_per_second: f64,
    pub distance_rate_per_km: f64,
    /// Flat amount added to every distance quote.
    pub distance_base_fare: f64,
}

impl Default for FareRates {
    fn default() -> Self {
        Self {
            stopped_rate_per_second: DEFAULT_STOPPED_RATE,
            moving_rate_per_second: DEFAULT_MOVING_RATE,
            distance_rate_per_km: DEFAULT_DISTANCE_RATE,
            distance_base_fare: 0.0,
        }
    }
}

impl FareRates {
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("stoppedRatePerSecond", self.stopped_rate_per_second),
            ("movingRatePerSecond", self.moving_rate_per_second),
            ("distanceRatePerKm", self.distance_rate_per_km),
            ("distanceBaseFare", self.distance_base_fare),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                bail!("fare rate {name} must be a non-negative number, got {value}");
            }
        }
        Ok(())
    }

    /// Fare for the given stopped and moving seconds.
    ///
    /// Negative durations are clamped to zero.
    pub fn time_fare(&self, stopped_seconds: f64, moving_seconds: f64) -> f64 {
        let stopped = stopped_seconds.max(0.0);
        let moving = moving_seconds.max(0.0);
        stopped * self.stopped_rate_per_second + moving * self.moving_rate_per_second
    }

    pub fn distance_fare(&self, distance_km: f64) -> Result<f64, TripError> {
        if !distance_km.is_finite() || distance_km <= 0.0 {
            return Err(TripError::InvalidDistance(distance_km.to_string()));
        }
        Ok(self.distance_base_fare + distance_km * self.distance_rate_per_km)
    }

    /// Parses user input and prices it in one step.
    pub fn quote_distance(&self, input: &str) -> Result<DistanceQuote, TripError> {
        let distance_km = parse_distance(input)?;
        let fare = self.distance_fare(distance_km)?;
        Ok(DistanceQuote { distance_km, fare })
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DistanceQuote {
    pub distance_km: f64,
    pub fare: f64,
}

/// Accepts `12.5` as well as the decimal comma form `12,5`.
pub fn parse_distance(input: &str) -> Result<f64, TripError> {
    let trimmed = input.trim();
    let normalized = trimmed.replace(',', ".");
    match normalized.parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => Ok(value),
        _ => Err(TripError::InvalidDistance(trimmed.to_string())),
    }
}

pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
