use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{error::TripError, fare::FareRates};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum TripState {
    #[default]
    Inactive,
    Stopped,
    Moving,
}

impl TripState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripState::Inactive => "inactive",
            TripState::Stopped => "stopped",
            TripState::Moving => "moving",
        }
    }
}

/// Accumulated time for the trip in progress.
///
/// `accumulated_stopped` and `accumulated_moving` only hold closed segments;
/// the open segment runs from `state_started_at` and is folded into the
/// matching accumulator on every transition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub state: TripState,
    pub started_at: Option<DateTime<Utc>>,
    pub state_started_at: Option<DateTime<Utc>>,
    pub accumulated_stopped: f64,
    pub accumulated_moving: f64,
}

/// Projected view of the trip at one instant, for live display.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySnapshot {
    pub state: TripState,
    pub stopped_seconds: f64,
    pub moving_seconds: f64,
    pub current_fare: f64,
}

/// Final figures of a finished time trip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TripSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stopped_seconds: f64,
    pub moving_seconds: f64,
    pub total_seconds: f64,
    pub total_fare: f64,
}

/// Seconds from `since` to `now`; a clock that went backwards yields zero.
fn seconds_between(since: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let delta = now.signed_duration_since(since);
    let secs = match delta.num_microseconds() {
        Some(micros) => micros as f64 / 1_000_000.0,
        None => delta.num_milliseconds() as f64 / 1_000.0,
    };
    secs.max(0.0)
}

impl Trip {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.state != TripState::Inactive
    }

    pub fn begin(&mut self, now: DateTime<Utc>) -> Result<(), TripError> {
        if self.is_active() {
            return Err(TripError::AlreadyActive);
        }

        *self = Self {
            state: TripState::Stopped,
            started_at: Some(now),
            state_started_at: Some(now),
            accumulated_stopped: 0.0,
            accumulated_moving: 0.0,
        };
        Ok(())
    }

    /// Closes the open segment and opens a new one in `target`. Switching to
    /// the current state restarts its segment without losing time.
    pub(super) fn switch_to(&mut self, target: TripState, now: DateTime<Utc>) -> Result<(), TripError> {
        if !self.is_active() {
            return Err(TripError::NoActiveTrip);
        }
        debug_assert!(target != TripState::Inactive, "use finish() to end a trip");

        self.fold_open_segment(now);
        self.state = target;
        Ok(())
    }

    /// Closes the open segment, prices the trip and resets to the inactive
    /// zeroed form.
    pub fn finish(&mut self, now: DateTime<Utc>, rates: &FareRates) -> Result<TripSummary, TripError> {
        if !self.is_active() {
            return Err(TripError::NoActiveTrip);
        }

        self.fold_open_segment(now);
        let stopped_seconds = self.accumulated_stopped;
        let moving_seconds = self.accumulated_moving;
        let summary = TripSummary {
            started_at: self.started_at.unwrap_or(now),
            finished_at: now,
            stopped_seconds,
            moving_seconds,
            total_seconds: stopped_seconds + moving_seconds,
            total_fare: rates.time_fare(stopped_seconds, moving_seconds),
        };

        self.reset();
        Ok(summary)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Totals as of `now` including the open segment. Does not touch the
    /// accumulators or the segment start.
    pub fn project(&self, now: DateTime<Utc>, rates: &FareRates) -> DisplaySnapshot {
        if !self.is_active() {
            return DisplaySnapshot::default();
        }

        let live = self.open_segment_seconds(now);
        let (stopped_seconds, moving_seconds) = match self.state {
            TripState::Stopped => (self.accumulated_stopped + live, self.accumulated_moving),
            TripState::Moving => (self.accumulated_stopped, self.accumulated_moving + live),
            TripState::Inactive => (0.0, 0.0),
        };

        DisplaySnapshot {
            state: self.state,
            stopped_seconds,
            moving_seconds,
            current_fare: rates.time_fare(stopped_seconds, moving_seconds),
        }
    }

    pub fn open_segment_seconds(&self, now: DateTime<Utc>) -> f64 {
        self.state_started_at
            .map(|since| seconds_between(since, now))
            .unwrap_or(0.0)
    }

    fn fold_open_segment(&mut self, now: DateTime<Utc>) {
        let elapsed = self.open_segment_seconds(now);
        match self.state {
            TripState::Stopped => self.accumulated_stopped += elapsed,
            TripState::Moving => self.accumulated_moving += elapsed,
            TripState::Inactive => {}
        }
        self.state_started_at = Some(now);
    }
}
