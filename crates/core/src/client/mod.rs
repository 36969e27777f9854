//! Session-carrying HTTP client for the ticketing platform.
//!
//! Every call goes through [`AuthenticatedClient`], which applies the fixed
//! header set (including the session cookie), enforces the short per-request
//! timeout and classifies the platform's in-body "not logged in" reply as
//! [`ClientError::AuthenticationExpired`].

mod authenticated;

pub use authenticated::AuthenticatedClient;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur when calling the ticketing platform.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The session token was rejected; the user must log in again.
    #[error("session expired or not logged in, refresh the session cookie")]
    AuthenticationExpired,

    /// The platform answered with an HTTP error status.
    #[error("HTTP request failed with status {status}")]
    Transport { status: u16 },

    /// The request did not complete within the client deadline.
    #[error("request timed out")]
    Timeout,

    /// The request failed before a response was received.
    #[error("request failed: {0}")]
    Request(String),

    /// The response did not match the expected schema.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The session or a fixed header could not be encoded.
    #[error("invalid session configuration: {0}")]
    InvalidSession(String),
}

impl ClientError {
    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout
        } else {
            ClientError::Request(e.to_string())
        }
    }

    /// Label used for the request outcome metric.
    pub fn metric_label(&self) -> &'static str {
        match self {
            ClientError::AuthenticationExpired => "auth_expired",
            ClientError::Transport { .. } => "http_error",
            ClientError::Timeout => "timeout",
            ClientError::Request(_) | ClientError::InvalidSession(_) => "error",
            ClientError::MalformedResponse(_) => "malformed",
        }
    }
}

/// Decoded platform response envelope.
///
/// The platform reports its status through `errno` on some endpoints and
/// `code` on others, and its message through `msg` or `message`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// Platform status; 0 means success.
    pub code: i64,
    pub message: String,
    pub data: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawEnvelope {
    #[serde(default)]
    errno: Option<i64>,
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Value,
}

impl RawEnvelope {
    pub(crate) fn message(&self) -> &str {
        match (&self.msg, &self.message) {
            (Some(m), _) if !m.is_empty() => m.as_str(),
            (_, Some(m)) => m.as_str(),
            (Some(m), None) => m.as_str(),
            (None, None) => "",
        }
    }

    fn code(&self) -> i64 {
        [self.errno, self.code]
            .into_iter()
            .flatten()
            .find(|c| *c != 0)
            .unwrap_or(0)
    }
}

impl From<RawEnvelope> for ApiResponse {
    fn from(raw: RawEnvelope) -> Self {
        Self {
            code: raw.code(),
            message: raw.message().to_string(),
            data: raw.data,
        }
    }
}
