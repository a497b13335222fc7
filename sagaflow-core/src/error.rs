//! Error types shared by descriptors, computations and the scheduler.
//!
//! A `SagaError` travels through the same channel as a successful value: the
//! interpreter injects it into the suspended computation as an `Err` resume
//! value, so it has to be cheap to clone and comparable in assertions.

use thiserror::Error;

/// Errors raised while building, interpreting or driving effects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SagaError {
    /// A descriptor was built with the wrong number of arguments.
    #[error("{target} expects {expected} argument(s), got {got}")]
    Arity {
        target: String,
        expected: usize,
        got: usize,
    },

    /// An event was dispatched without a `kind`.
    #[error("event kind must not be empty")]
    EmptyKind,

    /// A watch pattern that can never match.
    #[error("watch pattern matches no event kind")]
    EmptyPattern,

    /// Raised by user code: a target that failed or a computation that gave up.
    #[error("{0}")]
    Raised(String),

    /// A value could not be converted to the shape a computation expected.
    #[error("malformed value: {0}")]
    Decode(String),

    /// Delegation or nested invocation went deeper than the configured limit.
    #[error("nesting depth limit of {limit} exceeded")]
    DepthExceeded { limit: usize },

    /// A driver was polled after its computation had already finished.
    #[error("computation already finished")]
    Exhausted,
}

impl SagaError {
    /// Build a user-raised error.
    pub fn raised(message: impl Into<String>) -> Self {
        Self::Raised(message.into())
    }
}

impl From<serde_json::Error> for SagaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
