//! Scan-data record reassembly
//!
//! While scanning, the device streams length-prefixed records:
//!
//! ```text
//! ┌─────────────┬─────────────┬─────────────┐
//! │    Tag      │   Length    │   Payload   │
//! │   1 byte    │   2 bytes   │   N bytes   │
//! │             │  (LE u16)   │             │
//! └─────────────┴─────────────┴─────────────┘
//! ```
//!
//! Socket reads arrive in arbitrary sizes, so bytes are accumulated in a
//! bounded [`LineBuffer`] until a whole record is present. One record is
//! handed out per call; bytes belonging to the next record stay buffered.

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};
use bytes::{Bytes, BytesMut};
use tracing::{debug, trace};

use crate::{
    constants::{LINE_BUFFER_CAPACITY, RECORD_HEADER_SIZE},
    error::{Error, Result},
};

/// Decoded record header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Record type tag
    pub tag: u8,

    /// Payload length
    pub len: u16,
}

impl RecordHeader {
    /// Decode a header from the first three bytes of `buf`
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < RECORD_HEADER_SIZE {
            return None;
        }

        Some(Self {
            tag: buf[0],
            len: LittleEndian::read_u16(&buf[1..RECORD_HEADER_SIZE]),
        })
    }

    /// Header plus payload size
    pub fn total_size(&self) -> usize {
        RECORD_HEADER_SIZE + usize::from(self.len)
    }
}

/// A complete scan-data record
#[derive(Clone, PartialEq, Eq)]
pub struct ScanRecord {
    /// Record type tag
    pub tag: u8,

    /// Record payload
    pub payload: Bytes,
}

impl fmt::Debug for ScanRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanRecord")
            .field("tag", &format!("0x{:02X}", self.tag))
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

/// Bounded reassembly buffer for scan-data records
#[derive(Debug)]
pub struct LineBuffer {
    buf: BytesMut,
    capacity: usize,
}

impl LineBuffer {
    /// Create a buffer with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(LINE_BUFFER_CAPACITY)
    }

    /// Create a buffer with a custom capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    /// Number of buffered bytes (the write cursor)
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Maximum number of buffered bytes
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Free space before the buffer is full
    pub fn remaining(&self) -> usize {
        self.capacity - self.buf.len()
    }

    /// Drop all buffered bytes
    pub fn clear(&mut self) {
        if !self.buf.is_empty() {
            debug!(discarded = self.buf.len(), "Discarding buffered scan data");
        }
        self.buf.clear();
    }

    /// Append bytes read from the socket
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferOverrun`] if the data does not fit. Nothing is
    /// appended in that case.
    pub fn feed(&mut self, data: &[u8]) -> Result<()> {
        let required = self.buf.len() + data.len();
        if required > self.capacity {
            return Err(Error::BufferOverrun {
                required,
                capacity: self.capacity,
            });
        }

        self.buf.extend_from_slice(data);

        trace!(fed = data.len(), buffered = self.buf.len(), "Fed line buffer");
        Ok(())
    }

    /// Header of the next complete record, if one is buffered
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferOverrun`] if the buffered header declares a
    /// record that can never fit.
    pub fn ready(&self) -> Result<Option<RecordHeader>> {
        let Some(header) = RecordHeader::decode(&self.buf) else {
            return Ok(None);
        };

        let required = header.total_size();
        if required > self.capacity {
            return Err(Error::BufferOverrun {
                required,
                capacity: self.capacity,
            });
        }

        if self.buf.len() < required {
            trace!(
                buffered = self.buf.len(),
                required,
                "Waiting for rest of record"
            );
            return Ok(None);
        }

        Ok(Some(header))
    }

    /// Take the next complete record
    pub fn next_record(&mut self) -> Result<Option<ScanRecord>> {
        let Some(header) = self.ready()? else {
            return Ok(None);
        };

        let mut record = self.buf.split_to(header.total_size());
        let payload = record.split_off(RECORD_HEADER_SIZE).freeze();

        Ok(Some(ScanRecord {
            tag: header.tag,
            payload,
        }))
    }

    /// Copy the payload of the next complete record into `out`
    ///
    /// Returns the header of the delivered record, or `None` if more data is
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutputTooSmall`] if `out` cannot hold the payload.
    /// The record stays buffered so the call can be retried with a larger
    /// output.
    pub fn copy_record_into(&mut self, out: &mut [u8]) -> Result<Option<RecordHeader>> {
        let Some(header) = self.ready()? else {
            return Ok(None);
        };

        let len = usize::from(header.len);
        if out.len() < len {
            return Err(Error::OutputTooSmall {
                required: len,
                available: out.len(),
            });
        }

        let record = self.buf.split_to(header.total_size());
        out[..len].copy_from_slice(&record[RECORD_HEADER_SIZE..]);

        trace!(
            tag = format!("0x{:02X}", header.tag),
            len,
            left = self.buf.len(),
            "Delivered record"
        );

        Ok(Some(header))
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}
