//! TMDB client error types.

use thiserror::Error;

use super::session::{AuthPhase, AuthStep};

/// Errors raised below the decode layer: the request never produced a usable body.
#[derive(Debug, Error)]
#[allow(clippy::module_name_repetitions)]
pub enum TransportError {
    /// Connection, TLS, or timeout failure. No body was received.
    #[error("network error: {0}")]
    Network(String),

    /// The body matched neither the expected shape nor the status envelope.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The request body could not be serialized to JSON.
    #[error("failed to encode request body: {0}")]
    Encode(String),

    /// A raw (non-JSON) download returned a non-success HTTP status.
    #[error("unexpected HTTP status {0}")]
    Status(u16),
}

/// Errors returned by `TmdbClient` operations.
#[derive(Debug, Error)]
#[allow(clippy::module_name_repetitions)]
pub enum TmdbError {
    /// Network failure or an unparseable response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server reported a failure in its own status envelope.
    #[error("TMDB API error: code={status_code}, message={status_message}")]
    RemoteApi {
        /// TMDB status code.
        status_code: u32,
        /// TMDB status message.
        status_message: String,
    },

    /// A URL could not be built from the configured components.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// An authentication step was invoked from a phase that does not allow it.
    #[error("{step} is not allowed while {phase}")]
    OutOfOrder {
        /// The rejected step.
        step: AuthStep,
        /// The phase the session was in.
        phase: AuthPhase,
    },
}

impl TmdbError {
    /// Returns the TMDB status code when the server reported the failure.
    #[must_use]
    pub const fn status_code(&self) -> Option<u32> {
        match self {
            Self::RemoteApi { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<url::ParseError> for TmdbError {
    fn from(err: url::ParseError) -> Self {
        Self::Configuration(err.to_string())
    }
}
