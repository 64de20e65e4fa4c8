//! Constants and configuration values for Upshat
//!
//! Centralizes all magic numbers, paths, and configuration defaults.
//! Never use magic numbers in other files - add them here first.

/// Filesystem locations
pub mod paths {
    use std::path::PathBuf;

    /// Environment variable that overrides the configuration directory
    pub const CONFIG_DIR_ENV: &str = "UPSHAT_CONFIG_DIR";

    /// Application directory name under the user config base
    pub const APP_DIR: &str = "upshat";

    /// Settings file name
    pub const SETTINGS_FILE: &str = "settings.json";

    /// Structured event log file name
    pub const EVENT_LOG_FILE: &str = "events.jsonl";

    /// Fallback event log when the config directory cannot be created
    pub const FALLBACK_EVENT_LOG: &str = "/tmp/upshat_events.jsonl";

    /// User configuration directory
    ///
    /// Resolution order: `$UPSHAT_CONFIG_DIR`, `$XDG_CONFIG_HOME/upshat`,
    /// then the platform config dir.
    pub fn user_config_dir() -> Option<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            if !dir.is_empty() {
                return Some(PathBuf::from(dir));
            }
        }

        let base = match std::env::var("XDG_CONFIG_HOME") {
            Ok(xdg) if !xdg.is_empty() => Some(PathBuf::from(xdg)),
            _ => dirs::config_dir(),
        };

        base.map(|p| p.join(APP_DIR))
    }
}

/// Calibration and compensation limits
pub mod calibration {
    /// Highest polynomial degree the options form accepts
    pub const MAX_DEGREE: u8 = 7;

    /// Degree used when the form leaves it unset
    pub const DEFAULT_DEGREE: u8 = 1;

    /// Decimal places used when the form leaves precision unset
    pub const DEFAULT_PRECISION: u32 = 2;

    /// Largest precision accepted (f64 carries ~15 significant digits)
    pub const MAX_PRECISION: u32 = 15;

    /// Default entry name for a compensation
    pub const DEFAULT_NAME: &str = "Compensation";

    /// Separator between measured and true value in a data point
    pub const POINT_SEPARATOR: char = ',';

    /// Pivot magnitude below which the normal equations are treated as singular
    pub const SINGULAR_EPSILON: f64 = 1e-12;
}

/// UPS hat bus addressing
pub mod device {
    /// Default I2C bus on the target board
    pub const DEFAULT_BUS: u8 = 12;

    /// Default X1200 fuel gauge address
    pub const DEFAULT_ADDRESS: &str = "0x36";

    /// Lowest accepted address
    pub const MIN_ADDRESS: i64 = 0x00;

    /// Highest accepted address (inclusive)
    pub const MAX_ADDRESS: i64 = 0x80;

    /// Title given to device entries
    pub const ENTRY_TITLE: &str = "X1200 UPS";
}

/// Sensor timing
pub mod timing {
    /// Nominal host poll period in seconds
    pub const POLL_INTERVAL_SECS: i64 = 30;

    /// Refresh this many seconds before the poll period elapses
    pub const GUARD_MARGIN_SECS: i64 = 10;

    /// Longest poll period accepted from settings (one day)
    pub const MAX_REFRESH_INTERVAL_SECS: i64 = 86_400;

    /// Delay between reads in the CLI poll loop
    pub const CLI_POLL_DELAY_SECS: u64 = 5;

    /// Number of reads performed by the CLI poll loop by default
    pub const CLI_POLL_COUNT: u32 = 3;
}

/// Simulated reading ranges
pub mod battery {
    /// Lowest simulated voltage (inclusive)
    pub const VOLTAGE_MIN: f64 = 10.0;

    /// Highest simulated voltage (exclusive)
    pub const VOLTAGE_MAX: f64 = 13.0;

    /// Decimal places reported for voltage
    pub const VOLTAGE_DECIMALS: u32 = 2;

    /// Highest capacity percentage (inclusive)
    pub const CAPACITY_MAX: u8 = 100;

    /// Connection test accepts levels in `0..LEVEL_SANITY_MAX`.
    ///
    /// Twice the percentage domain. Kept for compatibility with existing
    /// device setups.
    pub const LEVEL_SANITY_MAX: i32 = 200;
}
