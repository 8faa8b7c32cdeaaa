use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::{
    clock::Clock,
    db::TripRecord,
    error::TripError,
    fare::{DistanceQuote, FareRates},
    history::HistoryStore,
    settings::DistancePreview,
};

use super::{DisplaySnapshot, Trip, TripState, TripSummary};

/// Outcome of writing a completed trip to history. A failed write does not
/// undo the trip.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", tag = "status", content = "reason")]
pub enum HistoryStatus {
    Saved,
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedTrip {
    pub summary: TripSummary,
    pub record: TripRecord,
    pub history: HistoryStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedDistanceTrip {
    pub quote: DistanceQuote,
    pub record: TripRecord,
    pub history: HistoryStatus,
}

fn log_outcome<T>(command: &str, result: &Result<T, TripError>) {
    match result {
        Ok(_) => info!("trip command '{command}' accepted"),
        Err(err) => warn!("trip command '{command}' rejected ({}): {err}", err.kind()),
    }
}

/// Handle to one trip. Clones share the same trip; every command and every
/// snapshot holds the single trip lock for its whole read-modify-write.
#[derive(Clone)]
pub struct TripController {
    trip: Arc<Mutex<Trip>>,
    rates: FareRates,
    distance_preview: DistancePreview,
    clock: Arc<dyn Clock>,
    history: Arc<dyn HistoryStore>,
}

impl TripController {
    pub fn new(rates: FareRates, clock: Arc<dyn Clock>, history: Arc<dyn HistoryStore>) -> Self {
        Self {
            trip: Arc::new(Mutex::new(Trip::new())),
            rates,
            distance_preview: DistancePreview::default(),
            clock,
            history,
        }
    }

    pub fn with_distance_preview(mut self, mode: DistancePreview) -> Self {
        self.distance_preview = mode;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn state(&self) -> TripState {
        self.trip.lock().await.state
    }

    pub async fn start_trip(&self) -> Result<TripState, TripError> {
        let result = {
            let mut trip = self.trip.lock().await;
            let now = self.clock.now();
            trip.begin(now).map(|_| trip.state)
        };
        log_outcome("start", &result);
        result
    }

    pub async fn stop_trip(&self) -> Result<TripState, TripError> {
        self.switch_to(TripState::Stopped, "stop").await
    }

    pub async fn move_trip(&self) -> Result<TripState, TripError> {
        self.switch_to(TripState::Moving, "move").await
    }

    async fn switch_to(&self, target: TripState, command: &str) -> Result<TripState, TripError> {
        let result = {
            let mut trip = self.trip.lock().await;
            let now = self.clock.now();
            trip.switch_to(target, now).map(|_| trip.state)
        };
        log_outcome(command, &result);
        result
    }

    /// Ends the trip, prices it and writes it to history.
    pub async fn finish_trip(&self) -> Result<CompletedTrip, TripError> {
        let result = {
            let mut trip = self.trip.lock().await;
            let now = self.clock.now();
            trip.finish(now, &self.rates)
        };
        log_outcome("finish", &result);
        let summary = result?;

        info!(
            "trip finished: stopped {:.2}s, moving {:.2}s, fare {:.2}",
            summary.stopped_seconds, summary.moving_seconds, summary.total_fare
        );

        let record = TripRecord::from_summary(&summary);
        let history = self.save(&record).await;
        Ok(CompletedTrip {
            summary,
            record,
            history,
        })
    }

    /// Projected figures at `now`. Never modifies the trip.
    pub async fn snapshot(&self, now: DateTime<Utc>) -> DisplaySnapshot {
        let trip = self.trip.lock().await;
        trip.project(now, &self.rates)
    }

    pub async fn current_snapshot(&self) -> DisplaySnapshot {
        let now = self.clock.now();
        self.snapshot(now).await
    }

    /// Prices a distance without recording anything. `None` when previews
    /// are turned off.
    pub fn preview_distance(&self, input: &str) -> Option<Result<DistanceQuote, TripError>> {
        if self.distance_preview == DistancePreview::OnSubmit {
            warn!("trip command 'preview' rejected (preview_disabled)");
            return None;
        }
        let result = self.rates.quote_distance(input);
        log_outcome("preview", &result);
        Some(result)
    }

    /// Prices a distance trip and writes it to history. Input is validated
    /// before any fare is computed.
    pub async fn record_distance_trip(&self, input: &str) -> Result<CompletedDistanceTrip, TripError> {
        let result = self.rates.quote_distance(input);
        log_outcome("distance", &result);
        let quote = result?;

        info!(
            "distance trip priced: {:.2} km, fare {:.2}",
            quote.distance_km, quote.fare
        );

        let record = TripRecord::from_quote(&quote, self.clock.now());
        let history = self.save(&record).await;
        Ok(CompletedDistanceTrip {
            quote,
            record,
            history,
        })
    }

    #[cfg(test)]
    pub(crate) async fn trip_for_tests(&self) -> Trip {
        self.trip.lock().await.clone()
    }

    pub async fn history(&self) -> Result<Vec<TripRecord>> {
        let result = self.history.read_all().await;
        match &result {
            Ok(records) => info!("trip command 'history' accepted ({} records)", records.len()),
            Err(err) => warn!("trip command 'history' failed: {err:#}"),
        }
        result
    }

    async fn save(&self, record: &TripRecord) -> HistoryStatus {
        match self.history.save(record).await {
            Ok(()) => {
                info!("trip {} saved to history", record.id());
                HistoryStatus::Saved
            }
            Err(err) => {
                error!("failed to save trip {} to history: {err:#}", record.id());
                HistoryStatus::Failed(format!("{err:#}"))
            }
        }
    }
}
