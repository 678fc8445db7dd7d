//! Error types shared across the klinik core crate.
//!
//! Nothing here is fatal at process level; every variant describes the
//! failure of one user action. Store failures are surfaced once and never
//! retried.

use klinik_types::{ApiErrorBody, VisitStatus};

use crate::workflow::VisitEvent;

#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    /// The requested workflow event is not legal for the visit's current
    /// status. Nothing was written.
    #[error("cannot apply {event} while visit is {status}")]
    InvalidTransition {
        status: VisitStatus,
        event: VisitEvent,
    },
    #[error("{0} not found")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The Record Store refused the request; its error body is preserved
    /// verbatim so callers can surface the cause.
    #[error("record store rejected the request ({status} {name}): {message}")]
    RemoteRequest {
        status: u16,
        name: String,
        message: String,
        details: serde_json::Value,
    },
    #[error("record store request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("failed to decode record store response: {0}")]
    Deserialization(#[from] serde_json::Error),
    #[error("invalid record store URL: {0}")]
    Url(String),
}

impl From<ApiErrorBody> for ClinicError {
    fn from(body: ApiErrorBody) -> Self {
        ClinicError::RemoteRequest {
            status: body.status,
            name: body.name,
            message: body.message,
            details: body.details,
        }
    }
}

pub type ClinicResult<T> = std::result::Result<T, ClinicError>;
