//! Call outcome reported back to the picker.
//!
//! # Design Decisions
//! - Only transport-level failures count against a backend
//! - `Unknown` is what application handlers surface for business errors,
//!   so it is treated like success

use std::fmt;
use thiserror::Error;

/// RPC status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    Ok,
    Cancelled,
    Unknown,
    InvalidArgument,
    DeadlineExceeded,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    ResourceExhausted,
    FailedPrecondition,
    Aborted,
    OutOfRange,
    Unimplemented,
    Internal,
    Unavailable,
    DataLoss,
    Unauthenticated,
}

impl Code {
    /// True when a call ending with this code should count as a backend error.
    pub fn is_backend_error(self) -> bool {
        !matches!(self, Code::Ok | Code::Unknown)
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Error a finished call ended with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct CallError {
    pub code: Code,
    pub message: String,
}

impl CallError {
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Completion report for one picked call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoneInfo {
    pub error: Option<CallError>,
}

impl DoneInfo {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn failed(error: CallError) -> Self {
        Self { error: Some(error) }
    }

    /// Outcome value recorded in the error window.
    pub fn is_backend_error(&self) -> bool {
        self.error
            .as_ref()
            .is_some_and(|e| e.code.is_backend_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_errors_are_not_backend_errors() {
        assert!(!DoneInfo::ok().is_backend_error());
        assert!(!DoneInfo::failed(CallError::new(Code::Unknown, "biz")).is_backend_error());
        assert!(!DoneInfo::failed(CallError::new(Code::Ok, "")).is_backend_error());
    }

    #[test]
    fn test_transport_errors_are_backend_errors() {
        for code in [Code::Aborted, Code::Unavailable, Code::DeadlineExceeded, Code::Internal] {
            assert!(DoneInfo::failed(CallError::new(code, "x")).is_backend_error());
        }
    }

    #[test]
    fn test_call_error_display() {
        let err = CallError::new(Code::Unavailable, "connection reset");
        assert_eq!(err.to_string(), "Unavailable: connection reset");
    }
}
