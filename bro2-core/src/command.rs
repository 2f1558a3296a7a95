//! Host-to-device command encoding
//!
//! Every command is framed as:
//!
//! ```text
//! ┌──────┬─────┬──────────────────────────────┬──────┐
//! │ 0x1B │ tag │ "\n" KEY=value "\n" ...      │ 0x80 │
//! └──────┴─────┴──────────────────────────────┴──────┘
//! ```
//!
//! Field values are written verbatim; there is no escaping of the framing
//! bytes, so values must be validated before they reach this module.

use std::fmt::{self, Write};

use bytes::{BufMut, BytesMut};
use tracing::trace;

use crate::{
    constants::{MAX_MESSAGE_SIZE, MSG_PREFIX, MSG_SUFFIX},
    error::{Error, Result},
};

/// Fields of a negotiate (`I`) command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiateFields {
    pub x_res: u32,
    pub y_res: u32,
    pub mode: String,
}

/// Fields of a configure (`X`) command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigureFields {
    pub x_res: u32,
    pub y_res: u32,
    pub mode: String,
    pub compression: String,
    pub brightness: u32,
    pub contrast: u32,
    pub tl_x: u32,
    pub tl_y: u32,
    pub br_x: u32,
    pub br_y: u32,
    pub aux: String,
}

/// Device commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Ask the device what it can do at the requested resolution and mode
    Negotiate(NegotiateFields),

    /// Commit scan parameters and arm the device
    Configure(ConfigureFields),

    /// Abort an in-progress scan
    Cancel,
}

impl Command {
    /// Wire tag byte
    pub fn tag(&self) -> u8 {
        match self {
            Self::Negotiate(_) => b'I',
            Self::Configure(_) => b'X',
            Self::Cancel => b'R',
        }
    }

    /// Get command name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Negotiate(_) => "NEGOTIATE",
            Self::Configure(_) => "CONFIGURE",
            Self::Cancel => "CANCEL",
        }
    }

    /// Encode command to bytes
    ///
    /// # Errors
    ///
    /// Returns [`Error::EncodingTooLarge`] if the rendered command exceeds
    /// [`MAX_MESSAGE_SIZE`].
    ///
    /// # Examples
    ///
    /// ```
    /// use bro2_core::Command;
    ///
    /// let bytes = Command::Cancel.encode().unwrap();
    /// assert_eq!(&bytes[..], &[0x1B, b'R', 0x80]);
    /// ```
    pub fn encode(&self) -> Result<BytesMut> {
        let mut buf = BytesMut::with_capacity(MAX_MESSAGE_SIZE);

        buf.put_u8(MSG_PREFIX);
        buf.put_u8(self.tag());

        self.write_fields(&mut buf).map_err(|_| Error::EncodingTooLarge {
            size: buf.len(),
            max: MAX_MESSAGE_SIZE,
        })?;

        buf.put_u8(MSG_SUFFIX);

        if buf.len() > MAX_MESSAGE_SIZE {
            return Err(Error::EncodingTooLarge {
                size: buf.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }

        trace!(
            command = self.name(),
            len = buf.len(),
            bytes = %hex::encode(&buf),
            "Encoded command"
        );

        Ok(buf)
    }

    fn write_fields(&self, buf: &mut BytesMut) -> fmt::Result {
        match self {
            Self::Negotiate(f) => write!(
                buf,
                "\nR={},{}\nM={}\n",
                f.x_res, f.y_res, f.mode
            ),
            // No newline between the A= quad and D= on the wire.
            Self::Configure(f) => write!(
                buf,
                "\nR={},{}\nM={}\nC={}\nB={}\nN={}\nA={},{},{},{}D={}\n",
                f.x_res,
                f.y_res,
                f.mode,
                f.compression,
                f.brightness,
                f.contrast,
                f.tl_x,
                f.tl_y,
                f.br_x,
                f.br_y,
                f.aux
            ),
            Self::Cancel => Ok(()),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.tag() as char)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn configure_fields() -> ConfigureFields {
        ConfigureFields {
            x_res: 300,
            y_res: 300,
            mode: "CGRAY".into(),
            compression: "NONE".into(),
            brightness: 50,
            contrast: 50,
            tl_x: 0,
            tl_y: 0,
            br_x: 2400,
            br_y: 3600,
            aux: "SIN".into(),
        }
    }

    #[test]
    fn test_encode_negotiate() {
        let cmd = Command::Negotiate(NegotiateFields {
            x_res: 300,
            y_res: 600,
            mode: "CGRAY".into(),
        });

        let encoded = cmd.encode().unwrap();
        assert_eq!(&encoded[..], b"\x1bI\nR=300,600\nM=CGRAY\n\x80");
    }

    #[test]
    fn test_encode_configure_keeps_area_and_aux_joined() {
        let encoded = Command::Configure(configure_fields()).encode().unwrap();

        assert_eq!(
            &encoded[..],
            &b"\x1bX\nR=300,300\nM=CGRAY\nC=NONE\nB=50\nN=50\nA=0,0,2400,3600D=SIN\n\x80"[..]
        );
    }

    #[test]
    fn test_encode_cancel_is_three_bytes() {
        let encoded = Command::Cancel.encode().unwrap();
        assert_eq!(&encoded[..], &[MSG_PREFIX, b'R', MSG_SUFFIX]);
    }

    #[test]
    fn test_encode_fields_in_order() {
        let encoded = Command::Configure(configure_fields()).encode().unwrap();
        let text = String::from_utf8_lossy(&encoded[2..encoded.len() - 1]).into_owned();

        let positions: Vec<usize> = ["R=", "M=", "C=", "B=", "N=", "A=", "D="]
            .iter()
            .map(|key| text.find(key).unwrap())
            .collect();

        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
    }

    #[test]
    fn test_encode_too_large() {
        let mut fields = configure_fields();
        fields.aux = "X".repeat(MAX_MESSAGE_SIZE);

        let result = Command::Configure(fields).encode();
        assert!(matches!(
            result,
            Err(Error::EncodingTooLarge { max: MAX_MESSAGE_SIZE, .. })
        ));
    }

    #[test]
    fn test_command_display() {
        assert_eq!(Command::Cancel.to_string(), "CANCEL(R)");
    }

    proptest::proptest! {
        #[test]
        fn prop_framing_bytes(
            x_res in 0u32..100_000,
            y_res in 0u32..100_000,
            mode in "[A-Z]{1,7}",
        ) {
            let encoded = Command::Negotiate(NegotiateFields { x_res, y_res, mode })
                .encode()
                .unwrap();

            proptest::prop_assert_eq!(encoded[0], MSG_PREFIX);
            proptest::prop_assert_eq!(encoded[encoded.len() - 1], MSG_SUFFIX);
        }
    }
}
