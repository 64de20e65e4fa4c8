//! Data types, validation and compensation modules
//!
//! Contains the calibration structures and the pure logic built on them.

mod fit;
mod types;
mod validation;

pub use fit::{round_to, Compensation, CompensationSettings, Polynomial};
pub use types::{CalibrationPoint, CalibrationSet, DeviceAddress, DeviceConfig};
pub use validation::{parse_calibration_point, validate_calibration};
