use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::NaiveDateTime;

use crate::models::Intent;

/// Failures while turning free text into a structured command.
#[derive(Debug, thiserror::Error)]
pub enum InterpretError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("could not determine intent (confidence {score:.2} below threshold)")]
    AmbiguousIntent { score: f64 },

    #[error("classifier returned unmapped label '{0}'")]
    UnknownIntent(String),

    #[error("{field} is required for {intent}")]
    MissingField { intent: Intent, field: &'static str },

    #[error("could not resolve a date/time from '{0}'")]
    DateTimeUnresolvable(String),

    #[error("model call failed: {0}")]
    ModelUnavailable(String),
}

impl InterpretError {
    pub fn code(&self) -> &'static str {
        match self {
            InterpretError::InvalidInput(_) => "invalid_input",
            InterpretError::AmbiguousIntent { .. } => "ambiguous_intent",
            InterpretError::UnknownIntent(_) => "unknown_intent",
            InterpretError::MissingField { .. } => "missing_field",
            InterpretError::DateTimeUnresolvable(_) => "datetime_unresolvable",
            InterpretError::ModelUnavailable(_) => "model_unavailable",
        }
    }
}

/// Failures while validating or committing a booking operation. These are
/// surfaced to the caller verbatim, never retried.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("unsupported profession '{given}'; valid options: {valid}")]
    UnsupportedProfession { given: String, valid: String },

    #[error("cannot book a technician in the past (requested {start})")]
    PastBooking { start: NaiveDateTime },

    #[error(
        "time conflict: {technician} is already booked from {existing_start} to {existing_end}"
    )]
    SchedulingConflict {
        technician: String,
        existing_start: NaiveDateTime,
        existing_end: NaiveDateTime,
    },
}

impl BookingError {
    pub fn code(&self) -> &'static str {
        match self {
            BookingError::UnsupportedProfession { .. } => "unsupported_profession",
            BookingError::PastBooking { .. } => "past_booking",
            BookingError::SchedulingConflict { .. } => "scheduling_conflict",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Interpret(#[from] InterpretError),

    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error("not found: {0}")]
    NotFound(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Interpret(e) => e.code(),
            AppError::Booking(e) => e.code(),
            AppError::NotFound(_) => "not_found",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Interpret(InterpretError::ModelUnavailable(_)) => StatusCode::BAD_GATEWAY,
            AppError::Interpret(_) => StatusCode::BAD_REQUEST,
            AppError::Booking(BookingError::SchedulingConflict { .. }) => StatusCode::CONFLICT,
            AppError::Booking(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        };

        let body = serde_json::json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        });
        (status, axum::Json(body)).into_response()
    }
}
