//! Typed failures raised through `anyhow`.
//!
//! Public functions return `anyhow::Result`; callers that need to tell a
//! cancelled call from a malformed input can `downcast_ref::<PatternError>()`.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// Input arrays, strings or parameters violate the engine's contract.
    InputContract(String),
    /// The caller interrupted a running extraction.
    Cancelled,
}

impl PatternError {
    pub fn contract<S: Into<String>>(msg: S) -> Self {
        PatternError::InputContract(msg.into())
    }
}

impl fmt::Display for PatternError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            PatternError::InputContract(msg) => {
                write!(f, "Input contract violation: {}", msg)
            },
            PatternError::Cancelled => write!(f, "Extraction cancelled"),
        }
    }
}

impl std::error::Error for PatternError {}

/// Returns `true` if `err` was caused by cancellation.
pub fn is_cancelled(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<PatternError>(),
        Some(PatternError::Cancelled)
    )
}
