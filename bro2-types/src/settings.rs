//! Scan settings held by a device handle

use std::fmt;

use tracing::debug;

use crate::{
    error::{Error, Result},
    options::{OptionId, OptionValue},
};

/// Capacity of a string setting, terminator included
pub const SETTING_STR_LEN: usize = 8;

/// Modes seen on the wire
pub const KNOWN_MODES: &[&str] = &["CGRAY", "ERRDIF", "C256", "TEXT"];

/// Compression values seen on the wire
pub const KNOWN_COMPRESSIONS: &[&str] = &["NONE", "RLENGTH", "JPEG"];

/// Short ASCII setting value that is safe to place in a command
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SettingString(String);

impl SettingString {
    /// Longest accepted value
    pub const MAX_LEN: usize = SETTING_STR_LEN - 1;

    /// Validate and wrap a setting value
    ///
    /// # Errors
    ///
    /// Fails if the value is empty, longer than [`Self::MAX_LEN`], or
    /// contains anything but printable ASCII.
    pub fn new(value: &str) -> Result<Self> {
        if value.is_empty() {
            return Err(Error::Validation("setting must not be empty".into()));
        }

        if value.len() > Self::MAX_LEN {
            return Err(Error::Validation(format!(
                "\"{}\" is longer than {} characters",
                value,
                Self::MAX_LEN
            )));
        }

        if !value.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(Error::Validation(format!(
                "\"{}\" contains non-printable characters",
                value.escape_default()
            )));
        }

        Ok(Self(value.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SettingString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for SettingString {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

/// Scan resolution in DPI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub x: u32,
    pub y: u32,
}

/// Scan area in device pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanArea {
    pub tl_x: u32,
    pub tl_y: u32,
    pub br_x: u32,
    pub br_y: u32,
}

impl ScanArea {
    /// Width in pixels (zero if the corners are swapped)
    pub fn width(&self) -> u32 {
        self.br_x.saturating_sub(self.tl_x)
    }

    /// Height in pixels (zero if the corners are swapped)
    pub fn height(&self) -> u32 {
        self.br_y.saturating_sub(self.tl_y)
    }
}

/// User-adjustable scan settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSettings {
    resolution: Resolution,
    area: ScanArea,
    brightness: u32,
    contrast: u32,
    mode: SettingString,
    compression: SettingString,
    aux: SettingString,
}

impl ScanSettings {
    /// Default resolution on both axes
    pub const DEFAULT_RESOLUTION: u32 = 300;

    /// Default brightness and contrast
    pub const DEFAULT_LEVEL: u32 = 50;

    /// Upper bound of brightness and contrast
    pub const MAX_LEVEL: u32 = 100;

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn area(&self) -> ScanArea {
        self.area
    }

    pub fn brightness(&self) -> u32 {
        self.brightness
    }

    pub fn contrast(&self) -> u32 {
        self.contrast
    }

    pub fn mode(&self) -> &SettingString {
        &self.mode
    }

    pub fn compression(&self) -> &SettingString {
        &self.compression
    }

    /// The `D` setting; only `SIN` has been observed
    pub fn aux(&self) -> &SettingString {
        &self.aux
    }

    pub fn set_resolution(&mut self, resolution: Resolution) {
        self.resolution = resolution;
    }

    pub fn set_area(&mut self, area: ScanArea) {
        self.area = area;
    }

    /// Bits per pixel produced by the current mode
    pub fn depth(&self) -> u32 {
        match self.mode.as_str() {
            "ERRDIF" | "TEXT" => 1,
            _ => 8,
        }
    }

    /// Read a setting by option identifier
    pub fn get(&self, id: OptionId) -> OptionValue {
        match id {
            OptionId::XResolution => OptionValue::from_u32(self.resolution.x),
            OptionId::YResolution => OptionValue::from_u32(self.resolution.y),
            OptionId::TlX => OptionValue::from_u32(self.area.tl_x),
            OptionId::TlY => OptionValue::from_u32(self.area.tl_y),
            OptionId::BrX => OptionValue::from_u32(self.area.br_x),
            OptionId::BrY => OptionValue::from_u32(self.area.br_y),
            OptionId::Brightness => OptionValue::from_u32(self.brightness),
            OptionId::Contrast => OptionValue::from_u32(self.contrast),
            OptionId::Mode => OptionValue::Str(self.mode.to_string()),
            OptionId::Compression => OptionValue::Str(self.compression.to_string()),
            OptionId::Aux => OptionValue::Str(self.aux.to_string()),
        }
    }

    /// Update a setting by option identifier
    ///
    /// # Errors
    ///
    /// Fails if the value has the wrong kind or violates the option's
    /// constraint. The settings are unchanged on error.
    pub fn set(&mut self, id: OptionId, value: OptionValue) -> Result<()> {
        let descriptor = id.descriptor();

        match value {
            OptionValue::Int(v) => {
                let v = descriptor.check_int(v)?;
                let slot = self.int_slot(id).ok_or_else(|| descriptor.kind_mismatch())?;
                *slot = v;
            }
            OptionValue::Str(s) => {
                descriptor.check_str()?;
                let s = SettingString::new(&s)?;

                match id {
                    OptionId::Mode => {
                        if !KNOWN_MODES.contains(&s.as_str()) {
                            debug!(mode = %s, "Mode not seen on real devices");
                        }
                        self.mode = s;
                    }
                    OptionId::Compression => {
                        if !KNOWN_COMPRESSIONS.contains(&s.as_str()) {
                            debug!(compression = %s, "Compression not seen on real devices");
                        }
                        self.compression = s;
                    }
                    OptionId::Aux => self.aux = s,
                    _ => return Err(descriptor.kind_mismatch()),
                }
            }
        }

        Ok(())
    }

    fn int_slot(&mut self, id: OptionId) -> Option<&mut u32> {
        match id {
            OptionId::XResolution => Some(&mut self.resolution.x),
            OptionId::YResolution => Some(&mut self.resolution.y),
            OptionId::TlX => Some(&mut self.area.tl_x),
            OptionId::TlY => Some(&mut self.area.tl_y),
            OptionId::BrX => Some(&mut self.area.br_x),
            OptionId::BrY => Some(&mut self.area.br_y),
            OptionId::Brightness => Some(&mut self.brightness),
            OptionId::Contrast => Some(&mut self.contrast),
            OptionId::Mode | OptionId::Compression | OptionId::Aux => None,
        }
    }
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            resolution: Resolution {
                x: Self::DEFAULT_RESOLUTION,
                y: Self::DEFAULT_RESOLUTION,
            },
            area: ScanArea::default(),
            brightness: Self::DEFAULT_LEVEL,
            contrast: Self::DEFAULT_LEVEL,
            mode: SettingString("CGRAY".into()),
            compression: SettingString("NONE".into()),
            aux: SettingString("SIN".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let settings = ScanSettings::default();

        assert_eq!(settings.resolution(), Resolution { x: 300, y: 300 });
        assert_eq!(settings.brightness(), 50);
        assert_eq!(settings.contrast(), 50);
        assert_eq!(settings.mode().as_str(), "CGRAY");
        assert_eq!(settings.compression().as_str(), "NONE");
        assert_eq!(settings.aux().as_str(), "SIN");
        assert_eq!(settings.depth(), 8);
    }

    #[test]
    fn test_setting_string_validation() {
        assert!(SettingString::new("CGRAY").is_ok());
        assert!(SettingString::new("1234567").is_ok());
        assert!(SettingString::new("12345678").is_err());
        assert!(SettingString::new("").is_err());
        assert!(SettingString::new("A\nB").is_err());
        assert!(SettingString::new("\u{1b}X").is_err());
        assert!(SettingString::new("A B").is_err());
    }

    #[test]
    fn test_get_set_int() {
        let mut settings = ScanSettings::default();

        settings.set(OptionId::BrX, OptionValue::Int(1700)).unwrap();
        settings.set(OptionId::XResolution, OptionValue::Int(600)).unwrap();

        assert_eq!(settings.get(OptionId::BrX), OptionValue::Int(1700));
        assert_eq!(settings.area().br_x, 1700);
        assert_eq!(settings.resolution().x, 600);
    }

    #[test]
    fn test_set_rejects_negative() {
        let mut settings = ScanSettings::default();

        assert!(settings.set(OptionId::TlX, OptionValue::Int(-1)).is_err());
        assert_eq!(settings.area().tl_x, 0);
    }

    #[test]
    fn test_set_level_range() {
        let mut settings = ScanSettings::default();

        settings.set(OptionId::Brightness, OptionValue::Int(100)).unwrap();
        assert!(settings.set(OptionId::Brightness, OptionValue::Int(101)).is_err());
        assert!(settings.set(OptionId::Contrast, OptionValue::Int(-5)).is_err());

        assert_eq!(settings.brightness(), 100);
        assert_eq!(settings.contrast(), 50);
    }

    #[test]
    fn test_set_string() {
        let mut settings = ScanSettings::default();

        settings.set(OptionId::Mode, OptionValue::Str("ERRDIF".into())).unwrap();
        assert_eq!(settings.get(OptionId::Mode), OptionValue::Str("ERRDIF".into()));
        assert_eq!(settings.depth(), 1);

        assert!(settings.set(OptionId::Aux, OptionValue::Str("TOOLONGVALUE".into())).is_err());
        assert_eq!(settings.aux().as_str(), "SIN");
    }

    #[test]
    fn test_set_wrong_kind() {
        let mut settings = ScanSettings::default();

        assert!(settings.set(OptionId::Mode, OptionValue::Int(3)).is_err());
        assert!(settings.set(OptionId::Brightness, OptionValue::Str("50".into())).is_err());
    }

    #[test]
    fn test_area_size() {
        let area = ScanArea { tl_x: 100, tl_y: 50, br_x: 1700, br_y: 2000 };

        assert_eq!(area.width(), 1600);
        assert_eq!(area.height(), 1950);
        assert_eq!(ScanArea { tl_x: 10, ..ScanArea::default() }.width(), 0);
    }
}
