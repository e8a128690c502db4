use thiserror::Error;

/// Pre-flight failure of the prediction form. Never reaches the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please select both start and end locations")]
    MissingSelection,
    #[error("Start and end locations must be different")]
    SameLocation,
    #[error("Location id {0:?} is not a number")]
    InvalidLocationId(String),
    #[error("Location {0} is not one of the available locations")]
    UnknownLocation(i64),
}

impl ValidationError {
    /// Stable machine-readable reason code.
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::MissingSelection => "missing_selection",
            ValidationError::SameLocation => "same_location",
            ValidationError::InvalidLocationId(_) => "invalid_location_id",
            ValidationError::UnknownLocation(_) => "unknown_location",
        }
    }
}

/// Failure of a remote call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Transport failure or non-success HTTP status.
    #[error("Network error: {0}")]
    Network(String),
    /// The service answered, but the body did not match the expected schema.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Data-shape violations found while summarizing a prediction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeriveError {
    #[error("Prediction contains no time slots to summarize")]
    EmptyResult,
    #[error("Time slot {time_slot:?} needs zero buses; utilization is undefined")]
    DivisionByZero { time_slot: String },
}

/// Why a submitted prediction ended in the error branch. Logged; the screen
/// itself shows its generic failure message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictionError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("Prediction could not be summarized: {0}")]
    Derive(#[from] DeriveError),
}

/// A workflow refused to start a new request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("A request is already in progress")]
    InFlight,
    #[error("The screen has been closed")]
    Disposed,
}

/// Why a form submission did not reach the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} {value:?}")]
pub struct ParseVariantError {
    pub kind: &'static str,
    pub value: String,
}
