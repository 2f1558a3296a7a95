//! # bro2-core
//!
//! Core protocol implementation for Brother network scanners.
//!
//! This crate provides the low-level protocol primitives:
//! - Command encoding (negotiate, configure, cancel)
//! - Status line parsing
//! - Negotiate response parsing
//! - Numeric list parsing for device replies
//! - Scan-data record reassembly
//! - Session state tracking
//! - Protocol constants
//!
//! Nothing in this crate performs I/O.

pub mod capabilities;
pub mod command;
pub mod constants;
pub mod error;
pub mod numlist;
pub mod record;
pub mod session;
pub mod status;

pub use capabilities::DeviceCapabilities;
pub use command::{Command, ConfigureFields, NegotiateFields};
pub use error::{Error, Result};
pub use numlist::NumericList;
pub use record::{LineBuffer, RecordHeader, ScanRecord};
pub use session::{Session, SessionState};
pub use status::{StatusOutcome, StatusResponse};

/// Default device port
pub const DEFAULT_PORT: u16 = 54921;
