//! Option identifiers and descriptors
//!
//! Every user-visible setting has an [`OptionId`] and a static
//! [`OptionDescriptor`]. Storage lives in [`ScanSettings`](crate::ScanSettings);
//! the table only describes what a frontend may show and set.

use std::fmt;
use std::str::FromStr;

use crate::{
    error::{Error, Result},
    settings::{SETTING_STR_LEN, ScanSettings},
};

/// Settings exposed to a scanning frontend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionId {
    XResolution,
    YResolution,
    TlX,
    TlY,
    BrX,
    BrY,
    Brightness,
    Contrast,
    Mode,
    Compression,
    Aux,
}

impl OptionId {
    /// All options, in frontend display order
    pub const ALL: [OptionId; 11] = [
        Self::XResolution,
        Self::YResolution,
        Self::TlX,
        Self::TlY,
        Self::BrX,
        Self::BrY,
        Self::Brightness,
        Self::Contrast,
        Self::Mode,
        Self::Compression,
        Self::Aux,
    ];

    /// Static descriptor for this option
    pub fn descriptor(self) -> &'static OptionDescriptor {
        // DESCRIPTORS is in the same order as ALL
        &DESCRIPTORS[self as usize]
    }

    /// Option name
    pub fn name(self) -> &'static str {
        self.descriptor().name
    }

    /// Look up an option by its name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.name() == name)
    }
}

impl FromStr for OptionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| Error::UnknownOption(s.to_owned()))
    }
}

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Physical unit of an option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionUnit {
    None,
    Pixel,
    Dpi,
}

/// Value kind of an option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Int,

    /// String with a fixed capacity, terminator included
    Str { capacity: usize },
}

/// Value constraint of an option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionConstraint {
    None,
    Range { min: i32, max: i32, quant: i32 },
}

/// Static description of an option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionDescriptor {
    pub id: OptionId,
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub unit: OptionUnit,
    pub kind: OptionKind,
    pub constraint: OptionConstraint,
}

impl OptionDescriptor {
    /// Validate an integer value, returning it as stored
    pub fn check_int(&self, value: i32) -> Result<u32> {
        if self.kind != OptionKind::Int {
            return Err(self.kind_mismatch());
        }

        if let OptionConstraint::Range { min, max, .. } = self.constraint {
            if !(min..=max).contains(&value) {
                return Err(Error::Validation(format!(
                    "{} must be in {}..={}, got {}",
                    self.name, min, max, value
                )));
            }
        }

        u32::try_from(value).map_err(|_| {
            Error::Validation(format!("{} must not be negative, got {}", self.name, value))
        })
    }

    /// Check that this option takes a string
    pub fn check_str(&self) -> Result<()> {
        match self.kind {
            OptionKind::Str { .. } => Ok(()),
            OptionKind::Int => Err(self.kind_mismatch()),
        }
    }

    /// Error for a value of the wrong kind
    pub fn kind_mismatch(&self) -> Error {
        let expected = match self.kind {
            OptionKind::Int => "an integer",
            OptionKind::Str { .. } => "a string",
        };
        Error::Validation(format!("{} takes {}", self.name, expected))
    }
}

/// Value passed through get/set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Int(i32),
    Str(String),
}

impl OptionValue {
    /// Wrap a stored integer, saturating at `i32::MAX`
    pub fn from_u32(value: u32) -> Self {
        Self::Int(i32::try_from(value).unwrap_or(i32::MAX))
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Int(_) => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::Str(s) => f.write_str(s),
        }
    }
}

const PERCENT: OptionConstraint = OptionConstraint::Range {
    min: 0,
    max: ScanSettings::MAX_LEVEL as i32,
    quant: 1,
};

const STR: OptionKind = OptionKind::Str {
    capacity: SETTING_STR_LEN,
};

const fn int(
    id: OptionId,
    name: &'static str,
    title: &'static str,
    description: &'static str,
    unit: OptionUnit,
    constraint: OptionConstraint,
) -> OptionDescriptor {
    OptionDescriptor {
        id,
        name,
        title,
        description,
        unit,
        kind: OptionKind::Int,
        constraint,
    }
}

const fn string(
    id: OptionId,
    name: &'static str,
    title: &'static str,
    description: &'static str,
) -> OptionDescriptor {
    OptionDescriptor {
        id,
        name,
        title,
        description,
        unit: OptionUnit::None,
        kind: STR,
        constraint: OptionConstraint::None,
    }
}

static DESCRIPTORS: [OptionDescriptor; 11] = [
    int(
        OptionId::XResolution,
        "x-resolution",
        "X-resolution",
        "Sets the horizontal resolution of the scanned image.",
        OptionUnit::Dpi,
        OptionConstraint::None,
    ),
    int(
        OptionId::YResolution,
        "y-resolution",
        "Y-resolution",
        "Sets the vertical resolution of the scanned image.",
        OptionUnit::Dpi,
        OptionConstraint::None,
    ),
    int(
        OptionId::TlX,
        "tl-x",
        "Top-left x",
        "Top-left x position of scan area.",
        OptionUnit::Pixel,
        OptionConstraint::None,
    ),
    int(
        OptionId::TlY,
        "tl-y",
        "Top-left y",
        "Top-left y position of scan area.",
        OptionUnit::Pixel,
        OptionConstraint::None,
    ),
    int(
        OptionId::BrX,
        "br-x",
        "Bottom-right x",
        "Bottom-right x position of scan area.",
        OptionUnit::Pixel,
        OptionConstraint::None,
    ),
    int(
        OptionId::BrY,
        "br-y",
        "Bottom-right y",
        "Bottom-right y position of scan area.",
        OptionUnit::Pixel,
        OptionConstraint::None,
    ),
    int(
        OptionId::Brightness,
        "brightness",
        "Brightness",
        "Controls the brightness of the acquired image.",
        OptionUnit::None,
        PERCENT,
    ),
    int(
        OptionId::Contrast,
        "contrast",
        "Contrast",
        "Controls the contrast of the acquired image.",
        OptionUnit::None,
        PERCENT,
    ),
    string(
        OptionId::Mode,
        "mode",
        "Scan mode",
        "Selects the scan mode. CGRAY, ERRDIF, C256 or TEXT.",
    ),
    string(
        OptionId::Compression,
        "compression",
        "Image Compression Type",
        "Image Compression Type. NONE or RLENGTH or JPEG",
    ),
    string(
        OptionId::Aux,
        "d",
        "D value",
        "The D value. Only \"SIN\" has been observed.",
    ),
];

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_table_matches_ids() {
        for id in OptionId::ALL {
            assert_eq!(id.descriptor().id, id);
        }
    }

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(OptionId::from_name("br-x"), Some(OptionId::BrX));
        assert_eq!("d".parse::<OptionId>().unwrap(), OptionId::Aux);
        assert_eq!(
            "nope".parse::<OptionId>(),
            Err(Error::UnknownOption("nope".into()))
        );
    }

    #[test]
    fn test_check_int() {
        let brightness = OptionId::Brightness.descriptor();
        assert_eq!(brightness.check_int(0).unwrap(), 0);
        assert_eq!(brightness.check_int(100).unwrap(), 100);
        assert!(brightness.check_int(101).is_err());

        let tl_x = OptionId::TlX.descriptor();
        assert_eq!(tl_x.check_int(5000).unwrap(), 5000);
        assert!(tl_x.check_int(-1).is_err());

        assert!(OptionId::Mode.descriptor().check_int(1).is_err());
    }

    #[test]
    fn test_string_capacity() {
        assert_eq!(
            OptionId::Compression.descriptor().kind,
            OptionKind::Str { capacity: 8 }
        );
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(OptionValue::from_u32(u32::MAX), OptionValue::Int(i32::MAX));
        assert_eq!(OptionValue::Int(3).as_int(), Some(3));
        assert_eq!(OptionValue::Str("SIN".into()).as_str(), Some("SIN"));
        assert_eq!(OptionValue::Str("SIN".into()).to_string(), "SIN");
    }
}
