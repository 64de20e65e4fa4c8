//! Application Settings
//!
//! Persistent settings stored as JSON in ~/.config/upshat/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::constants::{calibration, device, paths, timing};
use crate::data::DeviceConfig;
use crate::error::{Result, UpsHatError};
use crate::flows::device::{validate_device_input, DeviceInput};

// ============================================================================
// Cached Settings
// ============================================================================

static SETTINGS_CACHE: OnceLock<RwLock<Option<AppSettings>>> = OnceLock::new();

fn get_cache() -> &'static RwLock<Option<AppSettings>> {
    SETTINGS_CACHE.get_or_init(|| RwLock::new(None))
}

/// Get cached settings, loading from disk on first use
pub fn get_cached_settings() -> AppSettings {
    if let Some(settings) = get_cache().read().as_ref() {
        return settings.clone();
    }

    let settings = load_settings().unwrap_or_default();
    *get_cache().write() = Some(settings.clone());
    settings
}

/// Invalidate the settings cache
pub fn invalidate_settings_cache() {
    *get_cache().write() = None;
}

fn update_cache(settings: &AppSettings) {
    *get_cache().write() = Some(settings.clone());
}

/// Application settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub device: DeviceSettings,

    #[serde(default)]
    pub calibration: CalibrationSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Which UPS hat to talk to and how often
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSettings {
    #[serde(default = "default_bus")]
    pub bus: u8,

    /// Hex address as typed by the user
    #[serde(default = "default_address")]
    pub address: String,

    /// Nominal poll period in seconds
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: i64,

    #[serde(default)]
    pub simulate_fault: bool,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            bus: default_bus(),
            address: default_address(),
            refresh_interval_secs: default_refresh_interval(),
            simulate_fault: false,
        }
    }
}

impl DeviceSettings {
    /// Validate into a driver configuration
    pub fn to_device_config(&self) -> Result<DeviceConfig> {
        if !(0..=timing::MAX_REFRESH_INTERVAL_SECS).contains(&self.refresh_interval_secs) {
            return Err(UpsHatError::invalid_config(
                "device.refresh_interval_secs",
                format!("must be between 0 and {}", timing::MAX_REFRESH_INTERVAL_SECS),
            ));
        }

        Ok(validate_device_input(&self.to_device_input())?
            .with_refresh_interval_secs(self.refresh_interval_secs))
    }

    /// Form input for the device setup flow
    pub fn to_device_input(&self) -> DeviceInput {
        DeviceInput {
            bus: self.bus,
            address: self.address.clone(),
            simulate_fault: self.simulate_fault,
        }
    }
}

fn default_bus() -> u8 {
    device::DEFAULT_BUS
}

fn default_address() -> String {
    device::DEFAULT_ADDRESS.to_string()
}

fn default_refresh_interval() -> i64 {
    timing::POLL_INTERVAL_SECS
}

/// Defaults offered on the compensation options form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationSettings {
    #[serde(default = "default_degree")]
    pub degree: u8,

    #[serde(default = "default_precision")]
    pub precision: u32,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            degree: default_degree(),
            precision: default_precision(),
        }
    }
}

fn default_degree() -> u8 {
    calibration::DEFAULT_DEGREE
}

fn default_precision() -> u32 {
    calibration::DEFAULT_PRECISION
}

/// Structured event log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Append JSON-lines events on every run, not only with `--logging`
    #[serde(default)]
    pub event_log: bool,

    /// Override for the event log location
    #[serde(default)]
    pub event_log_path: Option<PathBuf>,
}

impl LoggingSettings {
    /// Where events are appended
    pub fn resolved_event_log_path(&self) -> PathBuf {
        self.event_log_path.clone().unwrap_or_else(|| {
            paths::user_config_dir()
                .map(|dir| dir.join(paths::EVENT_LOG_FILE))
                .unwrap_or_else(|| PathBuf::from(paths::FALLBACK_EVENT_LOG))
        })
    }
}

// ============================================================================
// Persistence
// ============================================================================

/// Path to the settings file, creating the config directory if needed
pub fn get_settings_path() -> Result<PathBuf> {
    let dir = paths::user_config_dir()
        .ok_or_else(|| UpsHatError::config("Could not determine config directory"))?;

    if !dir.exists() {
        fs::create_dir_all(&dir).map_err(|e| {
            UpsHatError::config(format!("Failed to create config directory: {}", e))
        })?;
    }

    Ok(dir.join(paths::SETTINGS_FILE))
}

/// Load settings from the default location
pub fn load_settings() -> Result<AppSettings> {
    load_settings_from(&get_settings_path()?)
}

/// Load settings from `path`, returning defaults if it does not exist
pub fn load_settings_from(path: &Path) -> Result<AppSettings> {
    if !path.exists() {
        debug!("No settings file at {:?}, using defaults", path);
        return Ok(AppSettings::default());
    }

    let content = fs::read_to_string(path).map_err(|e| UpsHatError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let settings: AppSettings = serde_json::from_str(&content)?;
    Ok(settings)
}

/// Save settings to the default location and refresh the cache
pub fn save_settings(settings: &AppSettings) -> Result<PathBuf> {
    let path = get_settings_path()?;
    save_settings_to(settings, &path)?;
    update_cache(settings);
    Ok(path)
}

/// Save settings to `path` atomically (temp file + rename)
pub fn save_settings_to(settings: &AppSettings, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(settings)?;
    let temp_path = path.with_extension("json.tmp");

    let write_err = |e| UpsHatError::FileWrite {
        path: temp_path.clone(),
        source: e,
    };
    let mut file = fs::File::create(&temp_path).map_err(write_err)?;
    file.write_all(json.as_bytes()).map_err(write_err)?;
    file.sync_all().map_err(write_err)?;
    drop(file);

    fs::rename(&temp_path, path).map_err(|e| UpsHatError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })?;

    info!("Saved settings to {:?}", path);
    Ok(())
}

/// Load, modify and save settings in one step
pub fn update_setting<F>(updater: F) -> Result<AppSettings>
where
    F: FnOnce(&mut AppSettings),
{
    let mut settings = load_settings()?;
    updater(&mut settings);
    save_settings(&settings)?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    struct ConfigDirGuard {
        dir: TempDir,
    }

    impl ConfigDirGuard {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            std::env::set_var(paths::CONFIG_DIR_ENV, dir.path());
            invalidate_settings_cache();
            Self { dir }
        }
    }

    impl Drop for ConfigDirGuard {
        fn drop(&mut self) {
            std::env::remove_var(paths::CONFIG_DIR_ENV);
            invalidate_settings_cache();
        }
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = load_settings_from(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.device.bus, 12);
        assert_eq!(settings.device.address, "0x36");
        assert_eq!(settings.calibration.degree, 1);
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut settings = AppSettings::default();
        settings.device.address = "0x40".into();
        settings.device.simulate_fault = true;
        settings.calibration.precision = 4;
        save_settings_to(&settings, &path).unwrap();

        assert!(!path.with_extension("json.tmp").exists());
        assert_eq!(load_settings_from(&path).unwrap(), settings);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"device":{"bus":1}}"#).unwrap();

        let settings = load_settings_from(&path).unwrap();
        assert_eq!(settings.device.bus, 1);
        assert_eq!(settings.device.address, "0x36");
        assert_eq!(settings.device.refresh_interval_secs, 30);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();
        assert!(load_settings_from(&path).is_err());
    }

    #[test]
    fn test_device_settings_validate() {
        let config = DeviceSettings::default().to_device_config().unwrap();
        assert_eq!(config.address.value(), 0x36);

        let bad = DeviceSettings {
            address: "0x99".into(),
            ..DeviceSettings::default()
        };
        assert!(bad.to_device_config().is_err());

        for interval in [-5, i64::MAX] {
            let bad = DeviceSettings {
                refresh_interval_secs: interval,
                ..DeviceSettings::default()
            };
            let err = bad.to_device_config().unwrap_err();
            assert_eq!(err.kind().message_key(), "invalid_config", "interval {}", interval);
        }
    }

    #[test]
    #[serial]
    fn test_env_override_and_cache() {
        let _guard = ConfigDirGuard::new();

        let path = update_setting(|s| s.calibration.degree = 3)
            .map(|_| get_settings_path().unwrap())
            .unwrap();
        assert!(path.exists());
        assert_eq!(get_cached_settings().calibration.degree, 3);

        fs::write(&path, "{}").unwrap();
        // cache still holds the saved value until invalidated
        assert_eq!(get_cached_settings().calibration.degree, 3);
        invalidate_settings_cache();
        assert_eq!(get_cached_settings().calibration.degree, 1);
    }

    #[test]
    #[serial]
    fn test_event_log_path_defaults_to_config_dir() {
        let guard = ConfigDirGuard::new();
        let path = LoggingSettings::default().resolved_event_log_path();
        assert_eq!(path, guard.dir.path().join("events.jsonl"));

        let custom = LoggingSettings {
            event_log: true,
            event_log_path: Some(PathBuf::from("/var/log/upshat.jsonl")),
        };
        assert_eq!(custom.resolved_event_log_path(), PathBuf::from("/var/log/upshat.jsonl"));
    }
}
