//! Error types for transport, decoding and explorer-level failures.

use thiserror::Error;

/// Errors raised by the underlying JSON-over-HTTP primitive.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed (connection refused, TLS, body read, etc.).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The server answered with a non-success status code.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Request timed out after the configured duration.
    #[error("Request timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// Response body could not be deserialized.
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// A transport or gate was built with settings it cannot run under.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An unexpected error.
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Returns `true` if this error is transient (worth resuming later).
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Deserialization(_) | Self::Config(_) | Self::Other(_) => false,
        }
    }
}

/// Errors produced while building or executing a block-explorer log query.
#[derive(Debug, Error)]
pub enum ExplorerError {
    /// A topic or topic set failed format validation.
    #[error("invalid topics: {reason}")]
    InvalidTopics { reason: String },

    /// The contract address is not a 20-byte hex address.
    #[error("invalid address '{address}'")]
    InvalidAddress { address: String },

    /// The provider answered `status: "0"` in an otherwise successful response.
    #[error("{message}")]
    Provider { message: String },

    /// Network, timeout or body decoding failure from the transport.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A page could not be mapped into domain logs.
    #[error("decode error: {0}")]
    Decode(String),
}

impl ExplorerError {
    /// Returns `true` if asking for the same page again may succeed.
    ///
    /// Provider failures (`NOTOK`, rate limit messages) are transient; input
    /// and decode errors are not, and transport errors keep their own
    /// classification.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Provider { .. } => true,
            Self::Transport(e) => e.is_retryable(),
            Self::InvalidTopics { .. } | Self::InvalidAddress { .. } | Self::Decode(_) => false,
        }
    }

    /// Returns `true` for errors caused by the caller's arguments.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::InvalidTopics { .. } | Self::InvalidAddress { .. })
    }

    pub(crate) fn invalid_topics(reason: impl Into<String>) -> Self {
        Self::InvalidTopics {
            reason: reason.into(),
        }
    }
}
