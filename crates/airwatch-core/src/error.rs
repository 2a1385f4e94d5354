use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Invalid latitude {0}: must be between -90 and 90")]
    InvalidLatitude(f64),

    #[error("Invalid longitude {0}: must be between -180 and 180")]
    InvalidLongitude(f64),

    #[error("{field} must be a non-negative number, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("{0} is required")]
    Required(&'static str),

    #[error("{field} too long: {len} characters (max {max})")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("{field} too short: {len} characters (min {min})")]
    TooShort {
        field: &'static str,
        len: usize,
        min: usize,
    },

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Station ID is required for AQI contributions")]
    StationRequired,

    #[error("Unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("Invalid radius {0}: must be positive")]
    InvalidRadius(f64),

    #[error("Users cannot report themselves")]
    SelfReport,
}

/// A status change that is not in the lifecycle's transition table.
#[derive(Error, Debug, PartialEq)]
#[error("{entity} cannot move from {from} to {to}")]
pub struct TransitionError {
    pub entity: &'static str,
    pub from: &'static str,
    pub to: &'static str,
}
