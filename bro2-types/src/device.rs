//! Device naming and discovery results

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};

/// Frontend-visible device name, `bro2:<host>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceName {
    host: String,
}

impl DeviceName {
    /// Backend prefix of every device name
    pub const PREFIX: &'static str = "bro2:";

    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    /// Host part of the name
    pub fn host(&self) -> &str {
        &self.host
    }
}

impl FromStr for DeviceName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let host = s
            .strip_prefix(Self::PREFIX)
            .ok_or_else(|| Error::Parse(format!("\"{}\" does not start with {}", s, Self::PREFIX)))?;

        if host.is_empty() {
            return Err(Error::Parse(format!("\"{}\" has no host", s)));
        }

        Ok(Self::new(host))
    }
}

impl fmt::Display for DeviceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.host)
    }
}

/// A scanner that answered a discovery query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    /// Network address
    pub host: String,

    /// Model string as reported by the device
    pub model: String,

    /// When the answer arrived
    pub seen_at: DateTime<Utc>,
}

impl DiscoveredDevice {
    pub fn new(host: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            model: model.into(),
            seen_at: Utc::now(),
        }
    }

    /// Name to open this device with
    pub fn name(&self) -> DeviceName {
        DeviceName::new(self.host.clone())
    }
}

impl fmt::Display for DiscoveredDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name() {
        let name: DeviceName = "bro2:192.168.1.20".parse().unwrap();
        assert_eq!(name.host(), "192.168.1.20");
        assert_eq!(name.to_string(), "bro2:192.168.1.20");
    }

    #[test]
    fn test_parse_name_errors() {
        assert!("epson:192.168.1.20".parse::<DeviceName>().is_err());
        assert!("bro2:".parse::<DeviceName>().is_err());
        assert!("".parse::<DeviceName>().is_err());
    }

    #[test]
    fn test_discovered_display() {
        let dev = DiscoveredDevice::new("10.0.0.7", "MFC-7820N");
        assert_eq!(dev.to_string(), "bro2:10.0.0.7 (MFC-7820N)");
        assert_eq!(dev.name().host(), "10.0.0.7");
    }
}
