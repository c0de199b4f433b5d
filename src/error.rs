//! Error taxonomy for the data pipeline.
//!
//! All fetch failures are recovered at the runtime boundary and surfaced as
//! warning notifications; none of these variants is ever allowed to
//! propagate into a panic outside of tests.

use serde_json::Value;
use thiserror::Error;

use crate::record::Identifier;

/// Errors produced by intent construction, data providers, and
/// response sanity checks.
///
/// Cloneable because errors travel inside dispatched actions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    /// Malformed intent or payload. Fails fast at construction.
    #[error("invalid intent: {0}")]
    Validation(String),

    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
        body: Option<Value>,
    },

    /// The request never completed (connection refused, timeout, ...).
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered, but the response does not match the request
    /// (e.g. get-one returned a record with a different id). Non-fatal:
    /// reported via notification, local state left unchanged.
    #[error("inconsistent response for '{resource}': requested {requested}, received {received}")]
    InconsistentResponse {
        resource: String,
        requested: Identifier,
        received: Identifier,
    },

    /// A component referenced a resource that was never registered.
    /// Degrades to "no data" with a diagnostic log, never throws.
    #[error("resource '{0}' has not been registered")]
    MissingResource(String),
}

impl DataError {
    /// Short machine-readable tag, used in log fields.
    pub fn error_type(&self) -> &'static str {
        match self {
            DataError::Validation(_) => "validation",
            DataError::Http { .. } => "http_error",
            DataError::Network(_) => "network_error",
            DataError::InconsistentResponse { .. } => "inconsistent_response",
            DataError::MissingResource(_) => "missing_resource",
        }
    }

    /// HTTP status, when the error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            DataError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
