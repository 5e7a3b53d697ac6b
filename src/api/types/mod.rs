//! Request and response types for the HTTP API

pub mod error;
pub mod prediction;

pub use error::{ApiError, ApiErrorResponse, ApiErrorType};
pub use prediction::{
    unavailable_message, PredictionResponse, ProbabilityEntry, StatusResponse, LOADING_MESSAGE,
    READY_MESSAGE,
};
