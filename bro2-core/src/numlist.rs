//! Comma-separated numeric list parsing
//!
//! Device replies carry lists like `300,300,2,209,2480,3507,0\n`.
//!
//! # Algorithm
//!
//! ```text
//! 1. Accumulate decimal digits into the current value
//! 2. ',' commits the current value and starts the next one
//! 3. '\n' or end of input stops parsing ('\n' is consumed)
//! 4. Fewer than `max` values committed: commit the accumulator as well
//! ```
//!
//! An empty or unterminated trailing numeral is therefore still committed.

use tracing::trace;

use crate::error::{Error, Result};

/// Result of parsing a numeric list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericList {
    /// Parsed values, at most the requested count
    pub values: Vec<u32>,

    /// Offset immediately after the terminator, or the input length
    pub end: usize,
}

impl NumericList {
    /// Number of values parsed
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no values were parsed
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Parse up to `max` comma separated unsigned integers
///
/// # Errors
///
/// Returns [`Error::MalformedNumericList`] on any byte that is not a digit,
/// `,` or `\n`, or when a value overflows `u32`.
///
/// # Examples
///
/// ```
/// use bro2_core::numlist;
///
/// let list = numlist::parse(b"1,2\n", 7).unwrap();
/// assert_eq!(list.values, vec![1, 2]);
/// assert_eq!(list.end, 4);
/// ```
pub fn parse(buf: &[u8], max: usize) -> Result<NumericList> {
    let mut values = Vec::with_capacity(max);
    let mut current: u32 = 0;
    let mut pos = 0;

    while pos < buf.len() && values.len() < max {
        let byte = buf[pos];
        pos += 1;

        match byte {
            b',' => {
                values.push(current);
                current = 0;
            }
            b'\n' => break,
            b'0'..=b'9' => {
                current = current
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(u32::from(byte - b'0')))
                    .ok_or(Error::MalformedNumericList {
                        offset: pos - 1,
                        reason: "value out of range",
                    })?;
            }
            _ => {
                trace!(offset = pos - 1, byte = format!("0x{:02X}", byte), "Bad byte in list");
                return Err(Error::MalformedNumericList {
                    offset: pos - 1,
                    reason: "unexpected byte",
                });
            }
        }
    }

    if values.len() < max {
        values.push(current);
    }

    Ok(NumericList { values, end: pos })
}
