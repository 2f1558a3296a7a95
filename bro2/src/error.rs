//! High-level error types

use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] bro2_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] bro2_transport::Error),

    #[error("Invalid option: {0}")]
    Types(#[from] bro2_types::Error),

    #[error("Failed to connect: {0}")]
    ConnectFailed(#[source] bro2_transport::Error),

    #[error("Device is busy")]
    DeviceBusy,

    #[error("Device reported status {0}")]
    UnexpectedStatus(i64),

    #[error("Device closed the connection")]
    Disconnected,

    #[error("Short write: {written} of {expected} bytes")]
    ShortWrite {
        expected: usize,
        written: usize,
    },

    #[error("Device not connected")]
    NotConnected,
}

/// Protocol-level classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ConnectFailed,
    DeviceBusy,
    UnexpectedStatus,
    MalformedStatus,
    MalformedNumericList,
    EncodingTooLarge,
    BufferOverrun,
    OutputTooSmall,
    Disconnected,
    ShortWrite,
    InvalidState,
    InvalidOption,
    Io,
}

/// Coarse status reported to a scanning frontend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    IoError,
    DeviceBusy,
    NoMem,
    Inval,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::IoError => "Error during device I/O",
            Self::DeviceBusy => "Device busy",
            Self::NoMem => "Out of memory",
            Self::Inval => "Invalid argument",
        };
        f.write_str(text)
    }
}

impl Error {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        use bro2_core::Error as Core;

        match self {
            Self::Core(e) => match e {
                Core::MalformedStatus { .. } => ErrorKind::MalformedStatus,
                Core::MalformedNumericList { .. } | Core::NegotiateResponse(_) => {
                    ErrorKind::MalformedNumericList
                }
                Core::EncodingTooLarge { .. } => ErrorKind::EncodingTooLarge,
                Core::BufferOverrun { .. } => ErrorKind::BufferOverrun,
                Core::OutputTooSmall { .. } => ErrorKind::OutputTooSmall,
                Core::InvalidSessionState { .. } => ErrorKind::InvalidState,
            },
            Self::Transport(_) => ErrorKind::Io,
            Self::Types(_) => ErrorKind::InvalidOption,
            Self::ConnectFailed(_) => ErrorKind::ConnectFailed,
            Self::DeviceBusy => ErrorKind::DeviceBusy,
            Self::UnexpectedStatus(_) => ErrorKind::UnexpectedStatus,
            Self::Disconnected => ErrorKind::Disconnected,
            Self::ShortWrite { .. } => ErrorKind::ShortWrite,
            Self::NotConnected => ErrorKind::InvalidState,
        }
    }

    /// Map to the coarse frontend status
    pub fn status(&self) -> Status {
        match self.kind() {
            ErrorKind::DeviceBusy => Status::DeviceBusy,
            ErrorKind::OutputTooSmall | ErrorKind::BufferOverrun => Status::NoMem,
            ErrorKind::EncodingTooLarge | ErrorKind::InvalidOption | ErrorKind::InvalidState => {
                Status::Inval
            }
            ErrorKind::ConnectFailed
            | ErrorKind::UnexpectedStatus
            | ErrorKind::MalformedStatus
            | ErrorKind::MalformedNumericList
            | ErrorKind::Disconnected
            | ErrorKind::ShortWrite
            | ErrorKind::Io => Status::IoError,
        }
    }

    /// Check if a later `connect` may succeed without any other change
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DeviceBusy)
    }

    /// Check if the session was torn down by this error
    pub fn requires_reconnect(&self) -> bool {
        if let Self::Core(e) = self {
            if e.is_recoverable() {
                return false;
            }
        }

        !matches!(self.kind(), ErrorKind::InvalidOption | ErrorKind::InvalidState)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(Error::DeviceBusy.status(), Status::DeviceBusy);
        assert_eq!(Error::Disconnected.status(), Status::IoError);
        assert_eq!(
            Error::from(bro2_core::Error::OutputTooSmall { required: 10, available: 1 }).status(),
            Status::NoMem
        );
        assert_eq!(
            Error::from(bro2_core::Error::EncodingTooLarge { size: 600, max: 512 }).status(),
            Status::Inval
        );
        assert_eq!(
            Error::from(bro2_types::Error::Validation("x".into())).status(),
            Status::Inval
        );
    }

    #[test]
    fn test_kind_of_parse_errors() {
        let err = Error::from(bro2_core::Error::NegotiateResponse("short".into()));
        assert_eq!(err.kind(), ErrorKind::MalformedNumericList);

        let err = Error::from(bro2_core::Error::MalformedStatus { reason: "prefix" });
        assert_eq!(err.kind(), ErrorKind::MalformedStatus);
    }

    #[test]
    fn test_retry_policy() {
        assert!(Error::DeviceBusy.is_retryable());
        assert!(!Error::Disconnected.is_retryable());
        assert!(Error::Disconnected.requires_reconnect());
        assert!(!Error::from(bro2_core::Error::OutputTooSmall { required: 2, available: 1 })
            .requires_reconnect());
    }
}
