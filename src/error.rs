//! Error Handling
//!
//! This module defines the crate's core error types. Inbound problems (a
//! forged or unreadable webhook) are reported as [`WebhookError`], outbound
//! problems (a failed call to the Messaging API) as [`Error`], and startup
//! problems as [`ConfigError`].

use std::error::Error as StdError;

use reqwest::StatusCode;
use serde::Deserialize;

/// The **top-level error enum** for outbound Messaging API calls.
///
/// Inside the webhook pipeline this is the error a handler returns; the
/// router logs it and moves on to the next event.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Represents an error occurring during network operations (connection
    /// issues, DNS resolution failures, TLS errors).
    #[error("A network error occurred: {0}")]
    Network(#[from] BoxError),

    /// The Messaging API answered, but not with success.
    #[error("An API service error occurred: {0}")]
    Service(#[from] ServiceError),

    /// The call did not complete within the configured reply timeout.
    #[error("The request timed out")]
    Timeout,

    /// Represents an **internal logic error**, such as a request that could
    /// not be built or a message that could not be serialized.
    #[error("An internal library error occurred: {0}")]
    Internal(BoxError),
}

impl Error {
    pub(crate) fn network(err: BoxError) -> Self {
        Self::Network(err)
    }

    pub(crate) fn internal(err: BoxError) -> Self {
        Self::Internal(err)
    }
}

/// Represents **service-level errors** returned by the Messaging API.
#[derive(thiserror::Error, Debug)]
#[error("Service error at endpoint '{endpoint}': {kind} (HTTP status {status})")]
#[non_exhaustive]
pub struct ServiceError {
    pub(crate) status: StatusCode,
    pub(crate) kind: ServiceErrorKind,
    pub(crate) endpoint: String,
}

impl ServiceError {
    /// Returns the HTTP status code associated with this service error.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the API endpoint where this service error occurred.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the specific kind of service error.
    pub fn kind(&self) -> &ServiceErrorKind {
        &self.kind
    }

    pub(crate) fn api(error: LineApiError) -> ServiceErrorKind {
        ServiceErrorKind::Api(ApiError {
            error: Box::new(error),
        })
    }

    pub(crate) fn parse(source: BoxError, body: String) -> ServiceErrorKind {
        ServiceErrorKind::Parse(ParseError {
            source: Some(source),
            body,
        })
    }
}

/// Sub-category of [`ServiceError`].
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum ServiceErrorKind {
    /// The API reported an error in its response body (bad reply token,
    /// invalid message, rate limit...).
    #[error("The API returned an error: {0}")]
    Api(#[from] ApiError),

    /// The response body could not be decoded.
    #[error("Failed to parse the API response: {0}")]
    Parse(#[from] ParseError),
}

impl ServiceErrorKind {
    pub(crate) fn service(self, endpoint: impl Into<String>, status: StatusCode) -> ServiceError {
        ServiceError {
            status,
            kind: self,
            endpoint: endpoint.into(),
        }
    }
}

/// An API error with details as decoded from the Messaging API.
#[derive(thiserror::Error, Debug)]
#[error("LINE API error: {error}")]
#[non_exhaustive]
pub struct ApiError {
    pub error: Box<LineApiError>,
}

/// The error body returned by the Messaging API on non-2xx responses.
///
/// ```json
/// {"message": "Invalid reply token", "details": []}
/// ```
#[derive(thiserror::Error, Deserialize, Clone, PartialEq, Debug)]
#[error("{message}")]
#[non_exhaustive]
pub struct LineApiError {
    pub message: String,
    #[serde(default)]
    pub details: Vec<LineApiErrorDetail>,
}

/// One entry of [`LineApiError::details`].
#[derive(Deserialize, Clone, PartialEq, Debug)]
#[non_exhaustive]
pub struct LineApiErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub property: Option<String>,
}

/// Represents an error that occurred during **data parsing or deserialization**.
///
/// # Fields
/// - `source`: The underlying cause, typically a `serde_json::Error`.
/// - `body`: The raw content that could not be parsed, useful for debugging.
#[derive(thiserror::Error, Debug)]
#[error("Failed to parse the body. Raw body content was: '{}'.", body)]
#[non_exhaustive]
pub struct ParseError {
    #[source]
    pub(crate) source: Option<BoxError>,
    pub body: String,
}

/// Reasons an inbound webhook request is rejected before any event runs.
///
/// [`PayloadTooLarge`](Self::PayloadTooLarge) maps to `413 Payload Too Large`,
/// the others to `400 Bad Request`.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum WebhookError {
    /// The `X-Line-Signature` header is missing, unreadable, or does not
    /// match the HMAC of the body.
    #[error("Signature verification failed: {0}")]
    InvalidSignature(&'static str),

    /// The body is not JSON or lacks the `{"events": [...]}` envelope.
    #[error("Malformed webhook payload: {0}")]
    MalformedPayload(#[from] ParseError),

    /// The body could not be read within the size limit.
    #[error("Request body could not be read within {limit} bytes")]
    PayloadTooLarge { limit: usize },
}

/// Startup failures. The binary refuses to start on any of these.
#[derive(thiserror::Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum ConfigError {
    /// A required credential is absent or empty.
    #[error("Missing LINE credentials: please set `{0}`")]
    MissingCredentials(&'static str),

    /// A setting is present but unusable.
    #[error("Invalid value for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            Self::Timeout
        } else if value.is_builder() || value.is_redirect() {
            // Builder and redirect errors point to misconfiguration, not the wire.
            Self::internal(value.into())
        } else {
            Self::network(value.into())
        }
    }
}

/// A convenient type alias for a boxed, trait-object error that can be sent across threads.
pub type BoxError = Box<dyn StdError + Send + Sync>;
