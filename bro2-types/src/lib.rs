//! Type definitions for bro2

pub mod device;
pub mod error;
pub mod options;
pub mod params;
pub mod settings;

pub use device::{DeviceName, DiscoveredDevice};
pub use error::{Error, Result};
pub use options::{OptionConstraint, OptionDescriptor, OptionId, OptionKind, OptionUnit, OptionValue};
pub use params::ScanParameters;
pub use settings::{Resolution, ScanArea, ScanSettings, SettingString};
