//! Error type for the invoice API access layer.
//!
//! # Design
//! Every failure surfaces as one `ApiError` carrying an `ApiErrorKind`.
//! Callers branch on the kind; the message is for people. The HTTP status and
//! the raw response body are kept whenever a response was received.

use thiserror::Error;

/// Discriminator for `ApiError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// The transport failed before a response was obtained.
    Network,
    /// The server answered without a JSON content type, or with a body that
    /// is not JSON.
    NonJsonResponse,
    /// The server answered with a non-2xx status.
    HttpStatus,
    /// The request body could not be serialized to JSON.
    Serialization,
    /// The request could not be built, e.g. a header name or value that is
    /// not valid HTTP. Nothing was sent.
    InvalidRequest,
}

impl ApiErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ApiErrorKind::Network => "network",
            ApiErrorKind::NonJsonResponse => "non_json_response",
            ApiErrorKind::HttpStatus => "http_status",
            ApiErrorKind::Serialization => "serialization",
            ApiErrorKind::InvalidRequest => "invalid_request",
        }
    }
}

/// Error returned by every `ApiClient` operation.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApiError {
    kind: ApiErrorKind,
    message: String,
    status: Option<u16>,
    raw: Option<String>,
}

impl ApiError {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: message.into(),
            status: None,
            raw: None,
        }
    }

    pub fn non_json(message: impl Into<String>, status: u16, raw: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::NonJsonResponse,
            message: message.into(),
            status: Some(status),
            raw: Some(raw.into()),
        }
    }

    /// A JSON body that does not have the shape the caller expected.
    pub fn unexpected_shape(message: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::NonJsonResponse,
            message: message.into(),
            status: None,
            raw: Some(raw.into()),
        }
    }

    pub fn http_status(message: impl Into<String>, status: u16, raw: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::HttpStatus,
            message: message.into(),
            status: Some(status),
            raw: Some(raw.into()),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Serialization,
            message: message.into(),
            status: None,
            raw: None,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::InvalidRequest,
            message: message.into(),
            status: None,
            raw: None,
        }
    }

    pub fn kind(&self) -> ApiErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status of the response, when one was received.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Original response body, when one was received.
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }
}
