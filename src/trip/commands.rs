//! Text commands typed at the terminal, and their dispatch onto the trip
//! controller. English and Spanish command words are both accepted.

use crate::presenter::{Notice, Presenter};

use super::{HistoryStatus, TripController};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Move,
    Finish,
    Distance(String),
    Preview(String),
    History,
    Help,
    Exit,
    Empty,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let mut parts = line.split_whitespace();
        let Some(word) = parts.next() else {
            return Command::Empty;
        };
        let rest = parts.collect::<Vec<_>>().join(" ");

        match word.to_lowercase().as_str() {
            "start" | "iniciar" => Command::Start,
            "stop" | "parar" => Command::Stop,
            "move" | "mover" => Command::Move,
            "finish" | "finalizar" => Command::Finish,
            "distance" | "distancia" => Command::Distance(rest),
            "preview" | "tarifa" => Command::Preview(rest),
            "history" | "historial" => Command::History,
            "help" | "ayuda" => Command::Help,
            "exit" | "quit" | "salir" => Command::Exit,
            other => Command::Unknown(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub async fn dispatch(
    controller: &TripController,
    presenter: &dyn Presenter,
    command: Command,
) -> Flow {
    match command {
        Command::Start => match controller.start_trip().await {
            Ok(state) => presenter.present_state(state),
            Err(err) => presenter.present_error(&err),
        },
        Command::Stop => match controller.stop_trip().await {
            Ok(state) => presenter.present_state(state),
            Err(err) => presenter.present_error(&err),
        },
        Command::Move => match controller.move_trip().await {
            Ok(state) => presenter.present_state(state),
            Err(err) => presenter.present_error(&err),
        },
        Command::Finish => match controller.finish_trip().await {
            Ok(done) => {
                presenter.present_summary(&done.summary);
                if let HistoryStatus::Failed(reason) = done.history {
                    presenter.present_notice(&Notice::HistorySaveFailed(reason));
                }
            }
            Err(err) => presenter.present_error(&err),
        },
        Command::Distance(input) => match controller.record_distance_trip(&input).await {
            Ok(done) => {
                presenter.present_distance(&done.quote, true);
                if let HistoryStatus::Failed(reason) = done.history {
                    presenter.present_notice(&Notice::HistorySaveFailed(reason));
                }
            }
            Err(err) => presenter.present_error(&err),
        },
        Command::Preview(input) => match controller.preview_distance(&input) {
            Some(Ok(quote)) => presenter.present_distance(&quote, false),
            Some(Err(err)) => presenter.present_error(&err),
            None => presenter.present_notice(&Notice::PreviewDisabled),
        },
        Command::History => match controller.history().await {
            Ok(records) => presenter.present_history(&records),
            Err(err) => presenter.present_notice(&Notice::HistoryUnavailable(format!("{err:#}"))),
        },
        Command::Help => presenter.present_notice(&Notice::Help),
        Command::Exit => {
            presenter.present_notice(&Notice::Goodbye);
            return Flow::Exit;
        }
        Command::Empty => {}
        Command::Unknown(word) => {
            presenter.present_notice(&Notice::UnknownCommand(word));
            presenter.present_notice(&Notice::Help);
        }
    }
    Flow::Continue
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use pretty_assertions::assert_eq;

    use crate::{
        clock::ManualClock,
        error::TripError,
        fare::FareRates,
        history::test_support::{BrokenHistory, MemoryHistory},
        presenter::test_support::{Presented, RecordingPresenter},
        settings::DistancePreview,
        trip::TripState,
    };

    use super::*;

    fn controller(history: Arc<dyn crate::history::HistoryStore>) -> (TripController, ManualClock) {
        let clock = ManualClock::new(Utc::now());
        let rates = FareRates {
            distance_rate_per_km: 1.0,
            ..FareRates::default()
        };
        (
            TripController::new(rates, Arc::new(clock.clone()), history),
            clock,
        )
    }

    #[test]
    fn parses_words_in_both_languages() {
        assert_eq!(Command::parse("  START "), Command::Start);
        assert_eq!(Command::parse("parar"), Command::Stop);
        assert_eq!(Command::parse("Mover"), Command::Move);
        assert_eq!(Command::parse("finalizar"), Command::Finish);
        assert_eq!(
            Command::parse("distance 12.5"),
            Command::Distance("12.5".into())
        );
        assert_eq!(Command::parse("distancia"), Command::Distance(String::new()));
        assert_eq!(Command::parse("preview 3"), Command::Preview("3".into()));
        assert_eq!(Command::parse(""), Command::Empty);
        assert_eq!(Command::parse("fly"), Command::Unknown("fly".into()));
        assert_eq!(Command::parse("salir"), Command::Exit);
    }

    #[tokio::test]
    async fn full_trip_through_dispatch() {
        let (controller, clock) = controller(Arc::new(MemoryHistory::default()));
        let presenter = RecordingPresenter::default();

        dispatch(&controller, &presenter, Command::Start).await;
        dispatch(&controller, &presenter, Command::Start).await;
        clock.advance_secs(10);
        dispatch(&controller, &presenter, Command::Move).await;
        clock.advance_secs(20);
        dispatch(&controller, &presenter, Command::Finish).await;
        dispatch(&controller, &presenter, Command::Finish).await;

        let events = presenter.events();
        assert_eq!(events[0], Presented::State(TripState::Stopped));
        assert_eq!(events[1], Presented::Error(TripError::AlreadyActive));
        assert_eq!(events[2], Presented::State(TripState::Moving));
        match &events[3] {
            Presented::Summary(summary) => assert!((summary.total_fare - 1.2).abs() < 1e-6),
            other => panic!("expected summary, got {other:?}"),
        }
        assert_eq!(events[4], Presented::Error(TripError::NoActiveTrip));
        assert_eq!(events.len(), 5);
    }

    #[tokio::test]
    async fn history_failure_is_reported_after_summary() {
        let (controller, _clock) = controller(Arc::new(BrokenHistory));
        let presenter = RecordingPresenter::default();

        dispatch(&controller, &presenter, Command::Start).await;
        dispatch(&controller, &presenter, Command::Finish).await;

        let events = presenter.events();
        assert!(matches!(events[1], Presented::Summary(_)));
        assert!(matches!(events[2], Presented::Notice(Notice::HistorySaveFailed(_))));
    }

    #[tokio::test]
    async fn preview_follows_configured_mode() {
        let (on_submit, _) = controller(Arc::new(MemoryHistory::default()));
        let live = on_submit.clone().with_distance_preview(DistancePreview::Live);
        let presenter = RecordingPresenter::default();

        dispatch(&on_submit, &presenter, Command::Preview("5".into())).await;
        dispatch(&live, &presenter, Command::Preview("5".into())).await;
        dispatch(&live, &presenter, Command::Preview("0".into())).await;

        let events = presenter.events();
        assert_eq!(events[0], Presented::Notice(Notice::PreviewDisabled));
        match &events[1] {
            Presented::Distance(quote, recorded) => {
                assert_eq!(quote.fare, 5.0);
                assert!(!recorded);
            }
            other => panic!("expected preview, got {other:?}"),
        }
        assert_eq!(
            events[2],
            Presented::Error(TripError::InvalidDistance("0".into()))
        );
    }

    #[tokio::test]
    async fn distance_then_history() {
        let history = Arc::new(MemoryHistory::default());
        let (controller, _clock) = controller(history.clone());
        let presenter = RecordingPresenter::default();

        dispatch(&controller, &presenter, Command::Distance("-5".into())).await;
        dispatch(&controller, &presenter, Command::Distance("12.5".into())).await;
        dispatch(&controller, &presenter, Command::History).await;

        let events = presenter.events();
        assert_eq!(
            events[0],
            Presented::Error(TripError::InvalidDistance("-5".into()))
        );
        assert!(matches!(events[1], Presented::Distance(q, true) if q.fare == 12.5));
        assert_eq!(events[2], Presented::History(1));
    }

    #[tokio::test]
    async fn exit_and_unknown() {
        let (controller, _clock) = controller(Arc::new(MemoryHistory::default()));
        let presenter = RecordingPresenter::default();

        assert_eq!(
            dispatch(&controller, &presenter, Command::Unknown("fly".into())).await,
            Flow::Continue
        );
        assert_eq!(
            dispatch(&controller, &presenter, Command::Exit).await,
            Flow::Exit
        );
        assert_eq!(
            presenter.events(),
            vec![
                Presented::Notice(Notice::UnknownCommand("fly".into())),
                Presented::Notice(Notice::Help),
                Presented::Notice(Notice::Goodbye),
            ]
        );
    }
}
