//! Upshat Core Library
//!
//! Calibration and UPS hat support for home-automation hosts.
//!
//! # Features
//!
//! - **Calibration**: Parse and validate "measured,true" data points for a polynomial of degree 0-7
//! - **Compensation**: Least-squares polynomial fit with rounding and optional clamping
//! - **UPS Hat**: Simulated X1200 fuel gauge with lazy, time-gated refresh and fault injection
//! - **Setup Flows**: Validation steps that report failures as stable message keys
//! - **Settings**: Persistent JSON settings with atomic writes
//!
//! # Module Structure
//!
//! - `data/` - Calibration types, validation, polynomial fit
//! - `hw/` - Clock, UPS hat trait, X1200 mock
//! - `flows/` - Compensation and device setup steps
//!
//! # Example
//!
//! ```
//! use uh_core::{validate_calibration, Compensation, CompensationSettings};
//!
//! let set = validate_calibration(&["0,1", "1,3", "2,5"], 1).unwrap();
//! let comp = Compensation::new(&set, CompensationSettings::default()).unwrap();
//! assert_eq!(comp.apply(3.0), 7.0);
//! ```

// Grouped modules
pub mod data;
pub mod flows;
pub mod hw;

// Standalone modules
pub mod constants;
pub mod error;
pub mod settings;

#[cfg(test)]
mod test_utils;

// Re-export primary types from data/
pub use data::{
    CalibrationPoint, CalibrationSet, Compensation, CompensationSettings, DeviceAddress,
    DeviceConfig, Polynomial,
};

// Re-export validation functions from data/
pub use data::{parse_calibration_point, round_to, validate_calibration};

// Re-export error types
pub use error::{ErrorKind, Result, UpsHatError};

// Re-export hardware types from hw/
pub use hw::{
    test_connection, Clock, ManualClock, SensorReading, SensorState, SystemClock, UpsHat,
    X1200Mock,
};

// Re-export setup flows
pub use flows::compensation::{
    entry_title, validate_options, validate_setup, CompensationOptions, CompensationSetup,
    OptionsInput, SetupInput,
};
pub use flows::device::{
    parse_address, setup_device, validate_device_input, DeviceEntry, DeviceInput,
};
pub use flows::form_errors;

// Re-export settings functions
pub use settings::{
    AppSettings, CalibrationSettings, DeviceSettings, LoggingSettings,
    get_cached_settings, get_settings_path, invalidate_settings_cache, load_settings,
    load_settings_from, save_settings, save_settings_to, update_setting,
};
