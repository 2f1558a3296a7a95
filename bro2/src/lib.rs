//! # bro2
//!
//! Rust client for the network scan protocol spoken by Brother scanners.
//!
//! ## Features
//!
//! - Async/await API using Tokio
//! - Session state machine (connect, negotiate, configure, stream, cancel)
//! - Scan-data record reassembly with a bounded buffer
//! - Option table for scanning frontends
//! - Discovery registry
//!
//! ## Quick Start
//!
//! ```no_run
//! use bro2::{Device, OptionId, OptionValue};
//!
//! #[tokio::main]
//! async fn main() -> bro2::Result<()> {
//!     // Connect to device
//!     let mut device = Device::open("bro2:192.168.1.20").await?;
//!     device.set_option(OptionId::Mode, OptionValue::Str("TEXT".into()))?;
//!
//!     // Arm it
//!     let params = device.start().await?;
//!     println!("{}", params);
//!
//!     // Read one line of scan data
//!     let mut line = vec![0u8; 16 * 1024];
//!     let n = device.read(&mut line).await?;
//!     println!("got {} bytes", n);
//!
//!     device.close().await;
//!     Ok(())
//! }
//! ```

pub mod device;
pub mod discovery;
pub mod error;

// Re-exports
pub use device::Device;
pub use discovery::{DeviceRegistry, Probe, discover};
pub use error::{Error, ErrorKind, Result, Status};

// Re-export types
pub use bro2_core::{DEFAULT_PORT, DeviceCapabilities, ScanRecord, SessionState};
pub use bro2_transport::{TcpTransport, Transport};
pub use bro2_types::{
    DeviceName, DiscoveredDevice, OptionDescriptor, OptionId, OptionValue, Resolution, ScanArea,
    ScanParameters, ScanSettings,
};
