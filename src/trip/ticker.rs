//! Live display refresh.
//!
//! Runs for the life of the process rather than per trip: every tick it asks
//! the controller for a read-only snapshot and hands it to the presenter, or
//! shows the idle display when no trip is running.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::presenter::Presenter;

use super::{TripController, TripState};

// Set to true to log every tick
const ENABLE_LOGS: bool = false;

use crate::log_info;

pub const DISPLAY_INTERVAL: Duration = Duration::from_secs(1);

pub struct DisplayTicker {
    controller: TripController,
    presenter: Arc<dyn Presenter>,
    interval: Duration,
}

impl DisplayTicker {
    pub fn new(controller: TripController, presenter: Arc<dyn Presenter>) -> Self {
        Self {
            controller,
            presenter,
            interval: DISPLAY_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Starts ticking on the current runtime. The first refresh happens
    /// immediately.
    pub fn spawn(self) -> TickerHandle {
        let cancel_token = CancellationToken::new();
        let token_clone = cancel_token.clone();
        let handle = tokio::spawn(self.run(token_clone));

        TickerHandle {
            cancel_token,
            handle: Some(handle),
        }
    }

    async fn run(self, cancel_token: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks: u64 = 0;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.refresh().await;
                    ticks = ticks.wrapping_add(1);
                }
                _ = cancel_token.cancelled() => {
                    log_info!("display ticker shutting down after {ticks} ticks");
                    break;
                }
            }
        }
    }

    async fn refresh(&self) {
        let now = self.controller.now();
        let snapshot = self.controller.snapshot(now).await;

        if snapshot.state == TripState::Inactive {
            self.presenter.present_idle();
        } else {
            log_info!(
                "tick: {} stopped={:.2} moving={:.2} fare={:.2}",
                snapshot.state.as_str(),
                snapshot.stopped_seconds,
                snapshot.moving_seconds,
                snapshot.current_fare
            );
            self.presenter.present_display(&snapshot);
        }
    }
}

/// Stops the ticker task. Dropping the handle without calling [`stop`]
/// leaves the task running until the runtime shuts down.
///
/// [`stop`]: TickerHandle::stop
pub struct TickerHandle {
    cancel_token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl TickerHandle {
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    pub async fn stop(mut self) -> Result<()> {
        self.cancel_token.cancel();

        if let Some(handle) = self.handle.take() {
            handle.await.context("display ticker task failed to join")
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use crate::{
        clock::ManualClock,
        fare::FareRates,
        history::test_support::MemoryHistory,
        presenter::test_support::{Presented, RecordingPresenter},
    };

    use super::*;

    fn setup() -> (TripController, ManualClock, Arc<RecordingPresenter>) {
        let start = DateTime::parse_from_rfc3339("2024-05-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let clock = ManualClock::new(start);
        let controller = TripController::new(
            FareRates::default(),
            Arc::new(clock.clone()),
            Arc::new(MemoryHistory::default()),
        );
        (controller, clock, Arc::new(RecordingPresenter::default()))
    }

    fn displays(events: &[Presented]) -> Vec<crate::trip::DisplaySnapshot> {
        events
            .iter()
            .filter_map(|event| match event {
                Presented::Display(snapshot) => Some(*snapshot),
                _ => None,
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn idle_display_without_trip() {
        let (controller, _clock, presenter) = setup();
        let handle = DisplayTicker::new(controller, presenter.clone()).spawn();

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        handle.stop().await.unwrap();

        let events = presenter.events();
        assert!(events.len() >= 2);
        assert!(events.iter().all(|event| *event == Presented::Idle));
    }

    #[tokio::test(start_paused = true)]
    async fn forwards_projected_figures_each_second() {
        const EPS: f64 = 1e-9;
        let (controller, clock, presenter) = setup();
        controller.start_trip().await.unwrap();
        let handle = DisplayTicker::new(controller.clone(), presenter.clone()).spawn();

        // ticks land on whole seconds; the meter clock moves half a second before each
        tokio::time::sleep(Duration::from_millis(500)).await;
        for _ in 0..3 {
            clock.advance_secs(1);
            tokio::time::sleep(DISPLAY_INTERVAL).await;
        }
        controller.move_trip().await.unwrap();
        for _ in 0..2 {
            clock.advance_secs(1);
            tokio::time::sleep(DISPLAY_INTERVAL).await;
        }
        handle.stop().await.unwrap();

        let shown = displays(&presenter.events());
        assert_eq!(shown.len(), 6);

        for (secs, snapshot) in shown[..4].iter().enumerate() {
            let secs = secs as f64;
            assert_eq!(snapshot.state, TripState::Stopped);
            assert!((snapshot.stopped_seconds - secs).abs() < EPS);
            assert_eq!(snapshot.moving_seconds, 0.0);
            assert!((snapshot.current_fare - secs * 0.02).abs() < EPS);
        }

        for (secs, snapshot) in shown[4..].iter().enumerate() {
            let secs = secs as f64 + 1.0;
            assert_eq!(snapshot.state, TripState::Moving);
            assert!((snapshot.stopped_seconds - 3.0).abs() < EPS);
            assert!((snapshot.moving_seconds - secs).abs() < EPS);
            assert!((snapshot.current_fare - (3.0 * 0.02 + secs * 0.05)).abs() < EPS);
        }

        // refreshing never touched the accumulators
        let trip = controller.trip_for_tests().await;
        assert!((trip.accumulated_stopped - 3.0).abs() < EPS);
        assert_eq!(trip.accumulated_moving, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_ends_the_task() {
        let (controller, _clock, presenter) = setup();
        let handle = DisplayTicker::new(controller, presenter.clone())
            .with_interval(Duration::from_millis(200))
            .spawn();
        assert!(handle.is_running());

        tokio::time::sleep(Duration::from_millis(450)).await;
        handle.stop().await.unwrap();
        let seen = presenter.events().len();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(presenter.events().len(), seen);
    }
}
