//! Transport layer for the Brother scan protocol
//!
//! Provides the TCP byte stream the protocol engine talks through.

pub mod tcp;
pub mod error;

pub use error::{Error, Result};
pub use tcp::TcpTransport;

use async_trait::async_trait;

/// Outcome of a single read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Bytes were read into the buffer
    Data(usize),

    /// Non-blocking mode and nothing is available yet
    WouldBlock,

    /// Peer closed the stream
    Closed,
}

/// Transport trait for the duplex byte stream to a scanner
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connect to device
    async fn connect(&mut self) -> Result<()>;
    
    /// Disconnect from device
    async fn disconnect(&mut self) -> Result<()>;
    
    /// Check if connected
    fn is_connected(&self) -> bool;
    
    /// Write raw bytes, returning how many were written
    async fn write(&mut self, data: &[u8]) -> Result<usize>;
    
    /// Perform one read into `buf`
    ///
    /// No timeout is applied; callers wanting bounded waits wrap the call.
    async fn read(&mut self, buf: &mut [u8]) -> Result<ReadOutcome>;
    
    /// Switch between blocking and non-blocking reads
    fn set_nonblocking(&mut self, nonblocking: bool) -> Result<()>;
    
    /// Get remote address
    fn remote_addr(&self) -> String;
}
