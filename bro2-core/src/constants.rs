//! Protocol constants

/// First byte of every host-to-device command
pub const MSG_PREFIX: u8 = 0x1B;

/// Last byte of every host-to-device command
pub const MSG_SUFFIX: u8 = 0x80;

/// Second byte of a negotiate response
pub const NEGOTIATE_RESPONSE_MARKER: u8 = 0x00;

/// Maximum encoded command size
pub const MAX_MESSAGE_SIZE: usize = 512;

/// Size of the buffer used for single-read control responses
pub const CONTROL_READ_SIZE: usize = 512;

/// Default capacity of the scan-data line buffer (32KB)
pub const LINE_BUFFER_CAPACITY: usize = 32 * 1024;

/// Scan-data record header: 1 byte tag + 2 byte LE length
pub const RECORD_HEADER_SIZE: usize = 3;

/// Default connect timeout (seconds)
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 5;

/// Status codes reported in the post-connect status line
pub mod status {
    /// Device is ready for a scan session
    pub const READY: i64 = 200;

    /// Device is serving another client
    pub const BUSY: i64 = 401;

    /// `-NG 200`: the device sent the ready code with a not-good prefix
    pub const NOT_GOOD_READY: i64 = 9001;
}

/// Layout of the seven values in a negotiate response
pub mod negotiate {
    /// Number of values the device reports
    pub const VALUE_COUNT: usize = 7;

    /// Reported horizontal resolution
    pub const X_RES: usize = 0;

    /// Reported vertical resolution
    pub const Y_RES: usize = 1;

    /// Maximum horizontal extent in device pixels
    pub const MAX_X: usize = 4;

    /// Maximum vertical extent in device pixels
    pub const MAX_Y: usize = 5;
}
