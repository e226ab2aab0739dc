//! Error types for the inference client.
//!
//! `LlmError` is the context carried by every `Report` the backend returns.
//! The first two variants are the ones callers surface with a dedicated
//! message; the rest collapse into a generic failure.

use std::fmt;

/// Errors from inference backend calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// Establishing the connection timed out.
    ConnectTimeout { endpoint: String },
    /// The endpoint actively refused the connection.
    ConnectionRefused { endpoint: String },
    /// The backend did not answer within the request timeout.
    Timeout,
    /// The backend answered with a non-success status.
    Status { status: u16, body: String },
    /// Response parsing failed.
    ResponseParseFailed { reason: String },
    /// Request failed for any other reason.
    RequestFailed { reason: String },
    /// Invalid configuration.
    InvalidConfig { reason: String },
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectTimeout { endpoint } => {
                write!(f, "connection to '{endpoint}' timed out")
            }
            Self::ConnectionRefused { endpoint } => {
                write!(f, "connection to '{endpoint}' refused")
            }
            Self::Timeout => write!(f, "LLM request timed out"),
            Self::Status { status, body } => {
                write!(f, "LLM backend returned HTTP {status}: {body}")
            }
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse LLM response: {reason}")
            }
            Self::RequestFailed { reason } => {
                write!(f, "LLM request failed: {reason}")
            }
            Self::InvalidConfig { reason } => {
                write!(f, "invalid LLM configuration: {reason}")
            }
        }
    }
}

impl std::error::Error for LlmError {}
