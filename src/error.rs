use thiserror::Error;

/// Conditions a trip command can be rejected with. All of them are
/// recoverable; the caller decides how to show them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TripError {
    #[error("a trip is already in progress")]
    AlreadyActive,

    #[error("there is no trip in progress")]
    NoActiveTrip,

    #[error("invalid distance '{0}': expected a positive number of kilometres")]
    InvalidDistance(String),
}

impl TripError {
    /// Stable short name used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            TripError::AlreadyActive => "already_active",
            TripError::NoActiveTrip => "no_active_trip",
            TripError::InvalidDistance(_) => "invalid_distance",
        }
    }
}
