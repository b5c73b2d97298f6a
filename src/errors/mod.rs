//! Error types for query routing
//!
//! Provides:
//! - Distinct error types for different failure modes
//! - A routing wrapper that preserves the underlying cause
//! - Structured parse diagnostics (offending token, valid range)

use thiserror::Error;

/// Result type alias using RouterError
pub type Result<T> = std::result::Result<T, RouterError>;

/// Why a model response could not be parsed into selections
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseReason {
    #[error("no selection tokens found")]
    Empty,

    #[error("token {token:?} is not a number")]
    NotANumber { token: String },

    #[error("index {index} is outside 1..={max}")]
    OutOfRange { index: usize, max: usize },
}

/// Query routing error types
#[derive(Error, Debug)]
pub enum RouterError {
    /// The chat model call failed (transport, provider, timeout)
    #[error("chat model invocation failed: {message}")]
    Invocation { message: String },

    /// The (filtered) model response yielded no valid index set
    #[error("unparseable routing response {response:?}: {reason}")]
    Parse { response: String, reason: ParseReason },

    /// Surfaced to the caller under the fail-fast fallback strategy,
    /// wrapping the invocation or parse failure that triggered it
    #[error("failed to route query: {cause}")]
    Routing {
        #[source]
        cause: Box<RouterError>,
    },

    /// Invalid construction-time configuration (empty catalog,
    /// duplicate sources, unusable client settings)
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Errors raised by caller-provided collaborators
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RouterError {
    /// Build an invocation error from any displayable failure
    pub fn invocation(message: impl Into<String>) -> Self {
        RouterError::Invocation {
            message: message.into(),
        }
    }

    /// True for model invocation failures
    pub fn is_invocation(&self) -> bool {
        matches!(self, RouterError::Invocation { .. })
    }

    /// True for response parse failures
    pub fn is_parse(&self) -> bool {
        matches!(self, RouterError::Parse { .. })
    }

    /// Unwrap routing wrappers down to the originating failure
    pub fn root_cause(&self) -> &RouterError {
        match self {
            RouterError::Routing { cause } => cause.root_cause(),
            other => other,
        }
    }
}
