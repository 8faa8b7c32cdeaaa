pub mod commands;
pub mod controller;
pub mod state;
pub mod ticker;

pub use controller::{CompletedDistanceTrip, CompletedTrip, HistoryStatus, TripController};
pub use state::{DisplaySnapshot, Trip, TripState, TripSummary};
pub use ticker::{DisplayTicker, TickerHandle};
