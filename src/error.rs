// src/error.rs
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode as AxumStatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

// --- Validation Errors ---

/// Input problems caught before anything is sent to the backend.
/// The display text is what the person filling in the form sees.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorReason {
    #[error("Please enter Employee ID and Name!")]
    MissingIdentity,
    #[error("Please fill in both Employee ID and Name!")]
    MissingCheckInIdentity,
    #[error("Please select a leave type!")]
    MissingLeaveType,
    #[error("End date must be after or equal to start date!")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
    #[error("Please provide a detailed reason (at least {min_chars} characters)!")]
    ReasonTooShort { min_chars: usize },
    #[error("Overtime hours must be between {min} and {max} (got {hours})")]
    OvertimeHoursOutOfRange {
        hours: Decimal,
        min: Decimal,
        max: Decimal,
    },
    #[error("Regular hours must be between 0 and {max} (got {hours})")]
    RegularHoursOutOfRange { hours: u32, max: u32 },
    #[error("Hourly rate must be between ${min} and ${max} (got ${rate})")]
    HourlyRateOutOfRange {
        rate: Decimal,
        min: Decimal,
        max: Decimal,
    },
    #[error("Overtime date {date} is in the future")]
    FutureWorkDate { date: NaiveDate },
    #[error("Please fill in all required fields!")]
    RequiredFieldsMissing,
    #[error("Unknown department '{department}'")]
    UnknownDepartment { department: String },
    #[error("'{email}' is not a valid email address")]
    InvalidEmail { email: String },
    #[error("Please capture a photo before checking in!")]
    MissingPhoto,
    #[error("Captured photo could not be processed: {detail}")]
    InvalidPhoto { detail: String },
    /// Body or query string did not fit the request shape (missing field, bad date).
    #[error("Invalid request: {detail}")]
    MalformedRequest { detail: String },
}

// --- Portal Error ---

#[derive(Error, Debug)]
pub enum PortalError {
    #[error("{0}")]
    Validation(#[from] ValidationErrorReason),

    /// Backend unreachable or the call timed out. The input is not at fault.
    #[error("Cannot connect to n8n. Make sure n8n is running! ({0})")]
    Connectivity(#[source] reqwest::Error),

    /// Non-success status, or a success status with an explicit failure payload.
    #[error("n8n Error {status}: {message}")]
    BackendRejected { status: u16, message: String },

    #[error("Unreadable response from n8n: {0}")]
    InvalidResponse(String),

    #[error("JSON processing error")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PortalError {
    /// Short machine-readable tag for API consumers.
    pub fn kind(&self) -> &'static str {
        match self {
            PortalError::Validation(_) => "validation",
            PortalError::Connectivity(_) => "connectivity",
            PortalError::BackendRejected { .. } => "backend_rejected",
            PortalError::InvalidResponse(_) => "invalid_response",
            PortalError::Json(_) => "json",
            PortalError::Config(_) => "config",
        }
    }
}

impl From<JsonRejection> for PortalError {
    fn from(rejection: JsonRejection) -> Self {
        PortalError::Validation(ValidationErrorReason::MalformedRequest {
            detail: rejection.body_text(),
        })
    }
}

impl From<QueryRejection> for PortalError {
    fn from(rejection: QueryRejection) -> Self {
        PortalError::Validation(ValidationErrorReason::MalformedRequest {
            detail: rejection.body_text(),
        })
    }
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        let status_code = match &self {
            PortalError::Validation(reason) => {
                warn!("Submission rejected by validation: {}", reason);
                AxumStatusCode::UNPROCESSABLE_ENTITY
            }
            PortalError::Connectivity(e) => {
                error!("Backend unreachable: {}", e);
                AxumStatusCode::BAD_GATEWAY
            }
            PortalError::BackendRejected { status, message } => {
                error!("Backend rejected request: Status={}, Msg={}", status, message);
                AxumStatusCode::BAD_GATEWAY
            }
            PortalError::InvalidResponse(detail) => {
                error!("Backend response could not be read: {}", detail);
                AxumStatusCode::BAD_GATEWAY
            }
            PortalError::Json(e) => {
                error!("JSON processing error: {}", e);
                AxumStatusCode::INTERNAL_SERVER_ERROR
            }
            PortalError::Config(msg) => {
                error!("Configuration error: {}", msg);
                AxumStatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (
            status_code,
            Json(json!({ "error": self.kind(), "message": self.to_string() })),
        )
            .into_response()
    }
}
