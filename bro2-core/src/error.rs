//! Error types for bro2-core

use crate::session::SessionState;

/// Result type alias for bro2 protocol operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Status line after connect did not match `+OK |-NG <code>\r\n`
    #[error("Malformed status response: {reason}")]
    MalformedStatus {
        reason: &'static str,
    },

    /// Numeric list contained an unexpected byte or overflowed
    #[error("Malformed numeric list at offset {offset}: {reason}")]
    MalformedNumericList {
        offset: usize,
        reason: &'static str,
    },

    /// Negotiate response was well formed but did not have the expected shape
    #[error("Unexpected negotiate response: {0}")]
    NegotiateResponse(String),

    /// Rendered command does not fit the wire buffer
    #[error("Encoded command too large: {size} bytes (max: {max} bytes)")]
    EncodingTooLarge {
        size: usize,
        max: usize,
    },

    /// Buffered scan data would exceed the line buffer
    #[error("Line buffer overrun: {required} bytes required (capacity: {capacity} bytes)")]
    BufferOverrun {
        required: usize,
        capacity: usize,
    },

    /// Caller-supplied output cannot hold the ready record
    #[error("Output buffer too small: record needs {required} bytes, got {available}")]
    OutputTooSmall {
        required: usize,
        available: usize,
    },

    /// Transition not allowed from the current state
    #[error("Invalid session state: cannot {action} while {state:?}")]
    InvalidSessionState {
        state: SessionState,
        action: &'static str,
    },
}

impl Error {
    /// Check if the caller can retry with a bigger buffer
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::OutputTooSmall { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_output_too_small_is_recoverable() {
        assert!(Error::OutputTooSmall { required: 12, available: 4 }.is_recoverable());
        assert!(!Error::BufferOverrun { required: 70000, capacity: 32768 }.is_recoverable());
        assert!(!Error::MalformedStatus { reason: "prefix" }.is_recoverable());
    }
}
