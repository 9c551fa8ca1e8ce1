//! Error type for RUZ API operations.

use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Errors returned by the RUZ client.
#[derive(Debug, Error)]
#[allow(clippy::module_name_repetitions)]
pub enum RuzError {
    /// The caller passed a value the API contract does not allow.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The response body carried an `error` key.
    #[error("bad request to {path} (HTTP {status}): {payload}")]
    BadRequest {
        /// Endpoint path relative to the base URL.
        path: String,
        /// HTTP status code of the response.
        status: u16,
        /// Raw JSON body as returned by the API.
        payload: JsonValue,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    /// Transport-level failure (connect, TLS, body read).
    #[error("request to {path} failed")]
    Network {
        /// Endpoint path relative to the base URL.
        path: String,
        /// Underlying HTTP client error.
        #[source]
        source: reqwest::Error,
    },

    /// The body was not JSON or did not match the expected shape.
    #[error("failed to decode JSON response from {path}")]
    Decode {
        /// Endpoint path relative to the base URL.
        path: String,
        /// Underlying decoder error.
        #[source]
        source: serde_json::Error,
    },

    /// The campus code has no entry in the timezone table.
    #[error("unknown campus: {0:?}")]
    UnknownCampus(String),

    /// The local lesson time falls into a gap of the campus timezone.
    #[error("local time {datetime} does not exist in campus {campus:?} timezone")]
    NonexistentLocalTime {
        /// Campus code.
        campus: String,
        /// Local date and time that could not be resolved.
        datetime: NaiveDateTime,
    },
}

/// Result alias for RUZ operations.
pub type Result<T> = std::result::Result<T, RuzError>;
