//! Negotiate response parsing
//!
//! The device answers a negotiate command with:
//!
//! ```text
//! 0x1B 0x00 <v0>,<v1>,<v2>,<v3>,<v4>,<v5>,<v6> "\n"
//! ```
//!
//! `v0`/`v1` are the resolution the device will actually use and `v4`/`v5`
//! the largest scan area at that resolution.

use tracing::debug;

use crate::{
    constants::{MSG_PREFIX, NEGOTIATE_RESPONSE_MARKER, negotiate},
    error::{Error, Result},
    numlist,
};

const HEADER: [u8; 2] = [MSG_PREFIX, NEGOTIATE_RESPONSE_MARKER];

/// Values reported in a negotiate response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCapabilities {
    values: [u32; negotiate::VALUE_COUNT],
}

impl DeviceCapabilities {
    /// Parse a complete negotiate response
    ///
    /// # Errors
    ///
    /// Fails if the header is wrong, the list is malformed, fewer than seven
    /// values are present, or bytes follow the list terminator.
    ///
    /// # Examples
    ///
    /// ```
    /// use bro2_core::capabilities::DeviceCapabilities;
    ///
    /// let caps = DeviceCapabilities::parse(b"\x1b\x00300,300,2,209,2480,3507,0\n").unwrap();
    /// assert_eq!(caps.max_extent(), (2480, 3507));
    /// ```
    pub fn parse(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER.len() {
            return Err(Error::NegotiateResponse(format!(
                "{} bytes is too short",
                buf.len()
            )));
        }

        if buf[..HEADER.len()] != HEADER {
            return Err(Error::NegotiateResponse(format!(
                "wrong header {}",
                hex::encode(&buf[..HEADER.len()])
            )));
        }

        let body = &buf[HEADER.len()..];
        let list = numlist::parse(body, negotiate::VALUE_COUNT)?;

        let values: [u32; negotiate::VALUE_COUNT] =
            list.values.as_slice().try_into().map_err(|_| {
                Error::NegotiateResponse(format!(
                    "expected {} values, got {}",
                    negotiate::VALUE_COUNT,
                    list.len()
                ))
            })?;

        if list.end != body.len() {
            return Err(Error::NegotiateResponse(format!(
                "{} trailing bytes after value list",
                body.len() - list.end
            )));
        }

        debug!(?values, "Device capabilities");

        Ok(Self { values })
    }

    /// All reported values
    pub fn values(&self) -> &[u32; negotiate::VALUE_COUNT] {
        &self.values
    }

    /// Resolution chosen by the device
    pub fn resolution(&self) -> (u32, u32) {
        (self.values[negotiate::X_RES], self.values[negotiate::Y_RES])
    }

    /// Largest scan area, in device pixels
    pub fn max_extent(&self) -> (u32, u32) {
        (self.values[negotiate::MAX_X], self.values[negotiate::MAX_Y])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_response() {
        let caps = DeviceCapabilities::parse(b"\x1b\x002400,3600,0,0,2400,3600,0\n").unwrap();

        assert_eq!(caps.values(), &[2400, 3600, 0, 0, 2400, 3600, 0]);
        assert_eq!(caps.resolution(), (2400, 3600));
        assert_eq!(caps.max_extent(), (2400, 3600));
    }

    #[test]
    fn test_parse_unterminated_response() {
        let caps = DeviceCapabilities::parse(b"\x1b\x00300,300,2,209,2480,3507,0").unwrap();
        assert_eq!(caps.resolution(), (300, 300));
    }

    #[test]
    fn test_wrong_header() {
        let result = DeviceCapabilities::parse(b"\x1b\x01300,300,2,209,2480,3507,0\n");
        assert!(matches!(result, Err(Error::NegotiateResponse(_))));

        let result = DeviceCapabilities::parse(b"+OK 200\r\n");
        assert!(matches!(result, Err(Error::NegotiateResponse(_))));

        let result = DeviceCapabilities::parse(b"\x1b");
        assert!(matches!(result, Err(Error::NegotiateResponse(_))));
    }

    #[test]
    fn test_too_few_values() {
        let result = DeviceCapabilities::parse(b"\x1b\x00300,300\n");
        assert!(matches!(result, Err(Error::NegotiateResponse(_))));
    }

    #[test]
    fn test_trailing_bytes() {
        let result = DeviceCapabilities::parse(b"\x1b\x00300,300,2,209,2480,3507,0\n\x80");
        assert!(matches!(result, Err(Error::NegotiateResponse(_))));
    }

    #[test]
    fn test_bad_byte_in_list() {
        let result = DeviceCapabilities::parse(b"\x1b\x00300,3x0,2,209,2480,3507,0\n");
        assert!(matches!(result, Err(Error::MalformedNumericList { .. })));
    }
}
