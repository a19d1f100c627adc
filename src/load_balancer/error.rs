//! Pick errors.

use thiserror::Error;

/// Errors returned synchronously from `pick`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PickError {
    /// Neither the requested color nor the default group has a ready member.
    #[error("no available backend (color: {color:?})")]
    NoAvailableBackend { color: String },
}

impl PickError {
    /// The runtime may retry; a later picker can have members again.
    pub fn is_retryable(&self) -> bool {
        match self {
            PickError::NoAvailableBackend { .. } => true,
        }
    }
}
