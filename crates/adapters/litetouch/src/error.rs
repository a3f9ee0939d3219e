//! LiteTouch adapter error types.

use litehub_domain::error::LiteHubError;

/// Errors specific to the LiteTouch adapter.
#[derive(Debug, thiserror::Error)]
pub enum LiteTouchError {
    /// An address that cannot be used on the bus.
    #[error("invalid LiteTouch address {0:?}")]
    InvalidAddress(String),

    /// The integration configuration is inconsistent.
    #[error("invalid LiteTouch configuration: {0}")]
    InvalidConfig(String),

    /// A frame from the bridge could not be understood.
    #[error("malformed LiteTouch frame")]
    Protocol(#[from] ProtocolError),

    /// Reading from or writing to the bridge failed.
    #[error("LiteTouch bridge I/O error")]
    Io(#[from] std::io::Error),

    /// The bridge link is down or the controller task has stopped.
    #[error("LiteTouch controller not connected")]
    NotConnected,

    /// The outbound command buffer is full.
    #[error("LiteTouch command buffer full")]
    Busy,

    /// A domain-level error (validation, not-found, etc.).
    #[error("domain error")]
    Domain(#[source] LiteHubError),
}

/// Details about why a frame from the bridge was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// Nothing but whitespace between two terminators.
    #[error("empty frame")]
    Empty,

    /// The frame does not start with the `R` marker.
    #[error("frame does not start with `R`: {0:?}")]
    MissingPrefix(String),

    /// Only the `R` marker was present.
    #[error("frame has no message type")]
    MissingType,

    /// A status frame without a level field.
    #[error("{msg_type} frame has no level field")]
    MissingLevel {
        /// Message type of the offending frame.
        msg_type: String,
    },

    /// A level field that is not an integer.
    #[error("invalid level {value:?} in {msg_type} frame")]
    InvalidLevel {
        /// Message type of the offending frame.
        msg_type: String,
        /// The raw field.
        value: String,
    },
}

impl LiteTouchError {
    /// Convert into a [`LiteHubError::Storage`] for propagation across port
    /// boundaries.
    #[must_use]
    pub fn into_domain(self) -> LiteHubError {
        match self {
            Self::Domain(err) => err,
            other => LiteHubError::Storage(Box::new(other)),
        }
    }
}

impl From<LiteTouchError> for LiteHubError {
    fn from(err: LiteTouchError) -> Self {
        err.into_domain()
    }
}

impl From<LiteHubError> for LiteTouchError {
    fn from(err: LiteHubError) -> Self {
        Self::Domain(err)
    }
}
