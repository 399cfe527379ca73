//! Error types for the Pinboard API client.
//!
//! # Design
//! Local misuse and remote failure are kept in separate variants so callers
//! can tell them apart without inspecting messages. `Validation` and `Config`
//! are raised before a request exists; `Http`, `Transport` and `Rejected` come
//! back from the remote side; `Decode` means the body did not match the
//! declared shape for the operation.

use thiserror::Error;

/// Errors returned by `PinboardClient` build and parse methods and by the
/// composed `Pinboard` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Credentials or configuration are missing or incomplete.
    #[error("configuration error: {0}")]
    Config(String),

    /// Caller-supplied input violates a documented constraint.
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// The server answered with a status of 400 or above.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced an HTTP response.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The server answered 2xx but reported a result code other than `done`.
    #[error("request rejected by server: {0}")]
    Rejected(String),

    /// The response body could not be decoded into the expected shape.
    #[error("failed to decode {shape} response at `{path}`: {message}")]
    Decode {
        shape: &'static str,
        path: String,
        message: String,
    },
}

impl ApiError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ApiError::Validation {
            field,
            message: message.into(),
        }
    }

    /// True for errors raised locally before any network I/O.
    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::Validation { .. } | ApiError::Config(_))
    }

    /// True for errors caused by the network or the remote status code.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Http { .. } | ApiError::Transport(_))
    }
}
