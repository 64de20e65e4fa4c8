//! Test utilities shared across module tests
//!
//! Deterministic clocks, seeded random sources and canned inputs.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::data::{DeviceAddress, DeviceConfig};

/// Fixed starting instant for manual clocks
pub fn start_time() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default()
}

/// Random source that yields the same sequence on every run
pub fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(0x1200)
}

/// Default device on bus 12 at 0x36 with a 30 second poll interval
pub fn test_config() -> DeviceConfig {
    DeviceConfig::new(12, DeviceAddress::default()).with_refresh_interval_secs(30)
}

/// Canned well-formed calibration points on the line y = 2x + 1
pub fn line_points(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{},{}", i, 2 * i + 1)).collect()
}
