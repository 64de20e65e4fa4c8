//! UPS hat device setup
//!
//! The user supplies a bus number and a hex address. The address is parsed
//! and bounds-checked, then a driver is built for it and must pass the
//! connection test before an entry is created.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::constants::device;
use crate::data::{DeviceAddress, DeviceConfig};
use crate::error::{Result, UpsHatError};
use crate::hw::{test_connection, UpsHat};

static HEX_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

fn hex_pattern() -> Option<&'static Regex> {
    HEX_PATTERN
        .get_or_init(|| Regex::new(r"^([+-]?)(?:0[xX])?([0-9a-fA-F]+)$").ok())
        .as_ref()
}

/// Parse a hex bus address such as `0x36`, `36` or `0X36`
///
/// Surrounding whitespace and a leading sign are accepted. Anything that is
/// not hex fails with `AddressNotHex`; values outside `0x00..=0x80` fail
/// with `AddressOutOfBounds`.
pub fn parse_address(raw: &str) -> Result<DeviceAddress> {
    let trimmed = raw.trim();
    let caps = hex_pattern()
        .and_then(|re| re.captures(trimmed))
        .ok_or_else(|| UpsHatError::AddressNotHex(raw.to_string()))?;

    let negative = caps.get(1).map_or(false, |m| m.as_str() == "-");
    let digits = caps.get(2).map_or("", |m| m.as_str());

    // Too many digits for i64 is still a valid hex number, just out of bounds
    let magnitude = match i64::from_str_radix(digits, 16) {
        Ok(v) => v,
        Err(_) => {
            return Err(UpsHatError::AddressOutOfBounds { address: i64::MAX });
        }
    };
    let value = if negative { -magnitude } else { magnitude };

    debug!("parsed address {:?} as {}", raw, value);
    if !(device::MIN_ADDRESS..=device::MAX_ADDRESS).contains(&value) {
        return Err(UpsHatError::AddressOutOfBounds { address: value });
    }

    // range-checked above
    Ok(DeviceAddress::new_unchecked(value as u8))
}

/// Raw input from the device form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInput {
    #[serde(default = "default_bus")]
    pub bus: u8,
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default)]
    pub simulate_fault: bool,
}

fn default_bus() -> u8 {
    device::DEFAULT_BUS
}

fn default_address() -> String {
    device::DEFAULT_ADDRESS.to_string()
}

impl Default for DeviceInput {
    fn default() -> Self {
        Self {
            bus: default_bus(),
            address: default_address(),
            simulate_fault: false,
        }
    }
}

/// A device that passed setup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEntry {
    pub title: String,
    pub config: DeviceConfig,
}

/// Validate the form without touching the bus
pub fn validate_device_input(input: &DeviceInput) -> Result<DeviceConfig> {
    let address = parse_address(&input.address)?;
    Ok(DeviceConfig::new(input.bus, address).with_simulated_fault(input.simulate_fault))
}

/// Validate the form, build a driver through `connect` and test it
///
/// Errors surface unchanged so the caller can render them with
/// [`crate::flows::form_errors`].
pub fn setup_device<H, F>(input: &DeviceInput, connect: F) -> Result<DeviceEntry>
where
    H: UpsHat,
    F: FnOnce(&DeviceConfig) -> H,
{
    let config = validate_device_input(input)?;
    let mut hat = connect(&config);
    test_connection(&mut hat)?;

    info!("UPS hat ready on bus {} at {}", config.bus, config.address);
    Ok(DeviceEntry {
        title: device::ENTRY_TITLE.to_string(),
        config,
    })
}
