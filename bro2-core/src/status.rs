//! Post-connect status line parsing
//!
//! Right after the TCP connection is established the device sends a single
//! line:
//!
//! ```text
//! "+OK " | "-NG "   <decimal code>   "\r\n"
//! ```
//!
//! `-NG 200` is kept apart from `+OK 200`: some firmware reports the ready
//! code with the not-good prefix.

use std::fmt;

use tracing::{trace, warn};

use crate::{
    constants::status,
    error::{Error, Result},
};

const OK_PREFIX: &[u8] = b"+OK ";
const NG_PREFIX: &[u8] = b"-NG ";
const PREFIX_LEN: usize = 4;
const MIN_STATUS_LEN: usize = PREFIX_LEN + 1;

/// Parsed status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusResponse {
    /// Line started with `-NG `
    pub not_good: bool,

    /// Numeric code as sent by the device
    pub code: i64,
}

/// What the status line means for the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutcome {
    /// `200`: ready for negotiation
    Ready,

    /// `401`: another client holds the device
    Busy,

    /// `-NG 200`
    NotGoodReady,

    /// Anything else
    Other(i64),
}

impl StatusResponse {
    /// Parse the status line
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedStatus`] if the input is shorter than five
    /// bytes, has an unknown prefix, has no number, or is not terminated by
    /// CRLF right after the number.
    ///
    /// # Examples
    ///
    /// ```
    /// use bro2_core::status::{StatusResponse, StatusOutcome};
    ///
    /// let status = StatusResponse::parse(b"+OK 200\r\n").unwrap();
    /// assert_eq!(status.outcome(), StatusOutcome::Ready);
    /// ```
    pub fn parse(buf: &[u8]) -> Result<Self> {
        if buf.len() < MIN_STATUS_LEN {
            return Err(Error::MalformedStatus {
                reason: "status line too short",
            });
        }

        let not_good = match &buf[..PREFIX_LEN] {
            p if p == NG_PREFIX => true,
            p if p == OK_PREFIX => false,
            _ => {
                return Err(Error::MalformedStatus {
                    reason: "expected \"+OK \" or \"-NG \" prefix",
                });
            }
        };

        let (code, digits_end) = parse_signed(&buf[PREFIX_LEN..])?;
        let rest = &buf[PREFIX_LEN + digits_end..];

        if !rest.starts_with(b"\r\n") {
            return Err(Error::MalformedStatus {
                reason: "status code not terminated by CRLF",
            });
        }

        if code < 0 {
            warn!(code, "Device reported a negative status");
        }

        trace!(not_good, code, "Parsed status line");

        Ok(Self { not_good, code })
    }

    /// Effective code, with `-NG 200` lifted to its own value
    pub fn effective_code(&self) -> i64 {
        if self.not_good && self.code == status::READY {
            status::NOT_GOOD_READY
        } else {
            self.code
        }
    }

    /// Classify the status for the session state machine
    pub fn outcome(&self) -> StatusOutcome {
        match self.effective_code() {
            status::READY => StatusOutcome::Ready,
            status::BUSY => StatusOutcome::Busy,
            status::NOT_GOOD_READY => StatusOutcome::NotGoodReady,
            other => StatusOutcome::Other(other),
        }
    }
}

impl fmt::Display for StatusResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.not_good { "-NG" } else { "+OK" };
        write!(f, "{} {}", prefix, self.code)
    }
}

/// Parse an optionally signed decimal, returning the value and bytes consumed
fn parse_signed(buf: &[u8]) -> Result<(i64, usize)> {
    let (negative, start) = match buf.first() {
        Some(b'-') => (true, 1),
        Some(b'+') => (false, 1),
        _ => (false, 0),
    };

    let digits = buf[start..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();

    if digits == 0 {
        return Err(Error::MalformedStatus {
            reason: "missing status code",
        });
    }

    let mut value: i64 = 0;
    for &b in &buf[start..start + digits] {
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(i64::from(b - b'0')))
            .ok_or(Error::MalformedStatus {
                reason: "status code out of range",
            })?;
    }

    Ok((if negative { -value } else { value }, start + digits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_ok_ready() {
        let status = StatusResponse::parse(b"+OK 200\r\n").unwrap();

        assert_eq!(status, StatusResponse { not_good: false, code: 200 });
        assert_eq!(status.outcome(), StatusOutcome::Ready);
    }

    #[test]
    fn test_parse_not_good_ready_is_distinct() {
        let status = StatusResponse::parse(b"-NG 200\r\n").unwrap();

        assert!(status.not_good);
        assert_eq!(status.effective_code(), status::NOT_GOOD_READY);
        assert_eq!(status.outcome(), StatusOutcome::NotGoodReady);
    }

    #[test]
    fn test_parse_busy() {
        let status = StatusResponse::parse(b"+OK 401\r\n").unwrap();
        assert_eq!(status.outcome(), StatusOutcome::Busy);

        let status = StatusResponse::parse(b"-NG 401\r\n").unwrap();
        assert_eq!(status.outcome(), StatusOutcome::Busy);
    }

    #[test]
    fn test_parse_other_code() {
        let status = StatusResponse::parse(b"-NG 500\r\n").unwrap();
        assert_eq!(status.outcome(), StatusOutcome::Other(500));
    }

    #[test]
    fn test_parse_negative_code() {
        let status = StatusResponse::parse(b"+OK -1\r\n").unwrap();
        assert_eq!(status.code, -1);
    }

    #[test]
    fn test_parse_trailing_bytes_after_crlf() {
        let status = StatusResponse::parse(b"+OK 200\r\nextra").unwrap();
        assert_eq!(status.code, 200);
    }

    #[test]
    fn test_parse_bad_prefix() {
        for input in [&b"+NG 200\r\n"[..], b"OK 200\r\n", b"+ok 200\r\n", b" +OK 200\r\n"] {
            assert!(matches!(
                StatusResponse::parse(input),
                Err(Error::MalformedStatus { .. })
            ));
        }
    }

    #[test]
    fn test_parse_too_short() {
        assert!(StatusResponse::parse(b"+OK ").is_err());
        assert!(StatusResponse::parse(b"").is_err());
    }

    #[test]
    fn test_parse_missing_crlf() {
        assert!(StatusResponse::parse(b"+OK 200").is_err());
        assert!(StatusResponse::parse(b"+OK 200\n").is_err());
        assert!(StatusResponse::parse(b"+OK 200 \r\n").is_err());
    }

    #[test]
    fn test_parse_missing_code() {
        assert!(StatusResponse::parse(b"+OK \r\n").is_err());
    }

    proptest::proptest! {
        #[test]
        fn prop_unknown_prefix_rejected(input in proptest::collection::vec(proptest::num::u8::ANY, 0..32)) {
            proptest::prop_assume!(!input.starts_with(OK_PREFIX) && !input.starts_with(NG_PREFIX));

            let rejected = matches!(
                StatusResponse::parse(&input),
                Err(Error::MalformedStatus { .. })
            );
            proptest::prop_assert!(rejected);
        }
    }
}
