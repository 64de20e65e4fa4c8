//! Core data types for Upshat
//!
//! Defines the calibration and device structures shared by the flows,
//! the fit engine and the sensor drivers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{calibration, device, timing};
use crate::error::UpsHatError;

/// A paired (measured, true) value used to fit a correction polynomial
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    pub measured: f64,
    pub true_value: f64,
}

impl CalibrationPoint {
    pub const fn new(measured: f64, true_value: f64) -> Self {
        Self {
            measured,
            true_value,
        }
    }
}

impl FromStr for CalibrationPoint {
    type Err = UpsHatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::data::validation::parse_calibration_point(s)
    }
}

impl fmt::Display for CalibrationPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.measured,
            calibration::POINT_SEPARATOR,
            self.true_value
        )
    }
}

/// Validated calibration points together with the requested degree
///
/// Only produced by [`crate::data::validate_calibration`], so
/// `points.len() > degree` always holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationSet {
    points: Vec<CalibrationPoint>,
    degree: u8,
}

impl CalibrationSet {
    pub(crate) fn new_unchecked(points: Vec<CalibrationPoint>, degree: u8) -> Self {
        Self { points, degree }
    }

    pub fn points(&self) -> &[CalibrationPoint] {
        &self.points
    }

    pub fn degree(&self) -> u8 {
        self.degree
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Smallest and largest true value, used for output limits
    pub fn true_value_bounds(&self) -> (f64, f64) {
        self.points.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(lo, hi), p| (lo.min(p.true_value), hi.max(p.true_value)),
        )
    }
}

/// A bus address accepted by the device setup flow (0x00-0x80)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceAddress(u8);

impl DeviceAddress {
    pub(crate) const fn new_unchecked(raw: u8) -> Self {
        Self(raw)
    }

    pub const fn value(self) -> u8 {
        self.0
    }
}

impl Default for DeviceAddress {
    fn default() -> Self {
        Self(0x36)
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

impl FromStr for DeviceAddress {
    type Err = UpsHatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::flows::device::parse_address(s)
    }
}

impl TryFrom<String> for DeviceAddress {
    type Error = UpsHatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DeviceAddress> for String {
    fn from(value: DeviceAddress) -> Self {
        value.to_string()
    }
}

/// Everything needed to construct a UPS hat driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub bus: u8,
    pub address: DeviceAddress,
    /// Nominal poll period in seconds
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: i64,
    /// Fail every bus transaction
    #[serde(default)]
    pub simulate_fault: bool,
}

fn default_refresh_interval_secs() -> i64 {
    timing::POLL_INTERVAL_SECS
}

impl DeviceConfig {
    pub fn new(bus: u8, address: DeviceAddress) -> Self {
        Self {
            bus,
            address,
            refresh_interval_secs: timing::POLL_INTERVAL_SECS,
            simulate_fault: false,
        }
    }

    pub fn with_refresh_interval_secs(mut self, secs: i64) -> Self {
        self.refresh_interval_secs = secs;
        self
    }

    pub fn with_simulated_fault(mut self, simulate_fault: bool) -> Self {
        self.simulate_fault = simulate_fault;
        self
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self::new(device::DEFAULT_BUS, DeviceAddress::default())
    }
}
