//! Output image parameters derived from the committed settings

use std::fmt;

use tracing::warn;

use crate::settings::ScanSettings;

/// Shape of the image the device will stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanParameters {
    /// Pixels per scan line
    pub pixels_per_line: u32,

    /// Bytes per scan line
    pub bytes_per_line: u32,

    /// Total lines, if known up front (the device does not say)
    pub lines: Option<u32>,

    /// Bits per pixel
    pub depth: u32,
}

impl ScanParameters {
    /// Derive parameters from settings
    ///
    /// # Examples
    ///
    /// ```
    /// use bro2_types::{ScanArea, ScanParameters, ScanSettings};
    ///
    /// let mut settings = ScanSettings::default();
    /// settings.set_area(ScanArea { tl_x: 0, tl_y: 0, br_x: 2400, br_y: 3600 });
    ///
    /// let params = ScanParameters::from_settings(&settings);
    /// assert_eq!(params.pixels_per_line, 2400);
    /// assert_eq!(params.bytes_per_line, 2400);
    /// ```
    pub fn from_settings(settings: &ScanSettings) -> Self {
        let area = settings.area();
        if area.br_x < area.tl_x {
            warn!(tl_x = area.tl_x, br_x = area.br_x, "Scan area corners are swapped");
        }

        let pixels_per_line = area.width();
        let depth = settings.depth();
        let bits = u64::from(pixels_per_line) * u64::from(depth);
        let bytes_per_line = u32::try_from(bits.div_ceil(8)).unwrap_or(u32::MAX);

        Self {
            pixels_per_line,
            bytes_per_line,
            lines: None,
            depth,
        }
    }
}

impl fmt::Display for ScanParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}px/{}B per line, {} bit, lines={}",
            self.pixels_per_line,
            self.bytes_per_line,
            self.depth,
            self.lines
                .map(|l| l.to_string())
                .unwrap_or_else(|| "unknown".into())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OptionId, OptionValue, ScanArea};

    #[test]
    fn test_gray_parameters() {
        let mut settings = ScanSettings::default();
        settings.set_area(ScanArea { tl_x: 100, tl_y: 0, br_x: 1700, br_y: 2000 });

        let params = ScanParameters::from_settings(&settings);
        assert_eq!(params.pixels_per_line, 1600);
        assert_eq!(params.bytes_per_line, 1600);
        assert_eq!(params.depth, 8);
        assert_eq!(params.lines, None);
    }

    #[test]
    fn test_bilevel_parameters_round_up() {
        let mut settings = ScanSettings::default();
        settings.set(OptionId::Mode, OptionValue::Str("TEXT".into())).unwrap();
        settings.set_area(ScanArea { tl_x: 0, tl_y: 0, br_x: 1701, br_y: 10 });

        let params = ScanParameters::from_settings(&settings);
        assert_eq!(params.depth, 1);
        assert_eq!(params.bytes_per_line, 213);
    }

    #[test]
    fn test_display() {
        let params = ScanParameters::from_settings(&ScanSettings::default());
        assert_eq!(params.to_string(), "0px/0B per line, 8 bit, lines=unknown");
    }
}
