//! Simulated X1200 UPS hat
//!
//! Stands in for the real fuel gauge during development and setup tests.
//!
//! # How It Works
//!
//! 1. **Lazy refresh**: readings are regenerated only when an accessor is
//!    called and the stored reading is older than the refresh interval minus
//!    a fixed guard margin. There is no background timer.
//!
//! 2. **Random readings**: voltage is drawn uniformly from `[10.0, 13.0)` V
//!    and capacity uniformly from `0..=100` %.
//!
//! 3. **Fault injection**: with `simulate_fault` set, the driver sits in
//!    [`SensorState::Faulted`] and every refresh fails with
//!    `BusCommunication` without touching the stored reading.

use chrono::{DateTime, TimeDelta, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace, warn};

use crate::constants::{battery, timing};
use crate::data::{round_to, DeviceConfig};
use crate::error::{Result, UpsHatError};
use crate::hw::clock::{Clock, SystemClock};
use crate::hw::ups_hat::{self, UpsHat};

/// Driver lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorState {
    /// Holding the last reading
    Idle,
    /// Computing a new reading
    Refreshing,
    /// Every bus transaction fails
    Faulted,
}

/// Last values read from the gauge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    /// Volts
    pub voltage: f64,
    /// Percent, 0-100
    pub capacity: u8,
    pub last_update: DateTime<Utc>,
}

impl SensorReading {
    /// A reading that is always stale
    pub const fn initial() -> Self {
        Self {
            voltage: 0.0,
            capacity: 0,
            last_update: DateTime::<Utc>::MIN_UTC,
        }
    }
}

impl Default for SensorReading {
    fn default() -> Self {
        Self::initial()
    }
}

/// Mocked X1200 fuel gauge with time-gated refresh
#[derive(Debug)]
pub struct X1200Mock<C = SystemClock, R = StdRng> {
    bus: u8,
    address: u8,
    reading: SensorReading,
    refresh_interval: TimeDelta,
    state: SensorState,
    clock: C,
    rng: R,
}

impl X1200Mock {
    /// Driver on the system clock with an entropy-seeded generator
    pub fn new(config: &DeviceConfig) -> Self {
        Self::with_sources(config, SystemClock, StdRng::from_entropy())
    }

    /// Construct a driver for `config` and run one connection test on it
    pub fn test_connection(config: &DeviceConfig) -> Result<bool> {
        Self::new(config).probe()
    }
}

impl<C: Clock, R: Rng> X1200Mock<C, R> {
    /// Driver with an injected clock and random source
    pub fn with_sources(config: &DeviceConfig, clock: C, rng: R) -> Self {
        let state = if config.simulate_fault {
            SensorState::Faulted
        } else {
            SensorState::Idle
        };

        debug!(
            "creating X1200 mock on bus {} at {} (state {:?})",
            config.bus, config.address, state
        );

        Self {
            bus: config.bus,
            address: config.address.value(),
            reading: SensorReading::initial(),
            refresh_interval: refresh_interval(config.refresh_interval_secs),
            state,
            clock,
            rng,
        }
    }

    /// Like [`X1200Mock::test_connection`] with injected sources
    pub fn test_connection_with(config: &DeviceConfig, clock: C, rng: R) -> Result<bool> {
        Self::with_sources(config, clock, rng).probe()
    }

    fn probe(&mut self) -> Result<bool> {
        ups_hat::test_connection(self)
    }

    pub fn state(&self) -> SensorState {
        self.state
    }

    pub fn reading(&self) -> &SensorReading {
        &self.reading
    }

    pub fn last_update(&self) -> DateTime<Utc> {
        self.reading.last_update
    }

    /// Whether the stored reading is old enough to regenerate
    pub fn needs_refresh(&self) -> bool {
        let threshold = self.refresh_interval - TimeDelta::seconds(timing::GUARD_MARGIN_SECS);
        let age = self.clock.now().signed_duration_since(self.reading.last_update);
        age > threshold
    }

    /// Regenerate the reading unconditionally
    pub fn refresh(&mut self) -> Result<()> {
        if self.state == SensorState::Faulted {
            warn!(
                "simulated bus fault on bus {} at {:#04x}",
                self.bus, self.address
            );
            return Err(UpsHatError::BusCommunication {
                bus: self.bus,
                address: self.address,
            });
        }

        self.state = SensorState::Refreshing;
        let now = self.clock.now();
        let voltage = self.rng.gen_range(battery::VOLTAGE_MIN..battery::VOLTAGE_MAX);
        let capacity = self.rng.gen_range(0..=battery::CAPACITY_MAX);

        self.reading = SensorReading {
            voltage,
            capacity,
            last_update: now.max(self.reading.last_update),
        };
        self.state = SensorState::Idle;

        trace!(
            "X1200 refreshed: {:.2} V, {} % at {}",
            voltage,
            capacity,
            self.reading.last_update
        );
        Ok(())
    }

    fn refresh_if_needed(&mut self) -> Result<()> {
        if self.needs_refresh() {
            self.refresh()?;
        }
        Ok(())
    }
}

/// Poll period clamped to `0..=MAX_REFRESH_INTERVAL_SECS`
///
/// `DeviceConfig` can be deserialized without validation.
fn refresh_interval(secs: i64) -> TimeDelta {
    let clamped = secs.clamp(0, timing::MAX_REFRESH_INTERVAL_SECS);
    if clamped != secs {
        warn!("refresh interval {} s clamped to {} s", secs, clamped);
    }
    TimeDelta::try_seconds(clamped).unwrap_or(TimeDelta::zero())
}

impl<C: Clock, R: Rng> UpsHat for X1200Mock<C, R> {
    fn bus(&self) -> u8 {
        self.bus
    }

    fn address(&self) -> u8 {
        self.address
    }

    fn battery_level(&mut self) -> Result<i32> {
        self.refresh_if_needed()?;
        Ok(i32::from(self.reading.capacity))
    }

    fn battery_voltage(&mut self) -> Result<f64> {
        self.refresh_if_needed()?;
        Ok(round_to(self.reading.voltage, battery::VOLTAGE_DECIMALS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::hw::clock::ManualClock;
    use crate::test_utils::{seeded_rng, start_time, test_config};

    fn mock(config: &DeviceConfig) -> (X1200Mock<ManualClock, StdRng>, ManualClock) {
        let clock = ManualClock::new(start_time());
        let hat = X1200Mock::with_sources(config, clock.clone(), seeded_rng());
        (hat, clock)
    }

    #[test]
    fn test_first_read_always_refreshes() {
        let (mut hat, _clock) = mock(&test_config());
        assert_eq!(hat.last_update(), DateTime::<Utc>::MIN_UTC);
        assert!(hat.needs_refresh());

        let level = hat.battery_level().unwrap();
        assert!((0..=100).contains(&level));
        assert_eq!(hat.last_update(), start_time());
        assert_eq!(hat.state(), SensorState::Idle);
    }

    #[test]
    fn test_reads_within_interval_are_cached() {
        let (mut hat, clock) = mock(&test_config());
        let level = hat.battery_level().unwrap();
        let voltage = hat.battery_voltage().unwrap();
        let stamp = hat.last_update();

        // threshold is 30 - 10 = 20 seconds; exactly 20 is not stale yet
        clock.advance(TimeDelta::seconds(20));
        assert!(!hat.needs_refresh());
        assert_eq!(hat.battery_level().unwrap(), level);
        assert_eq!(hat.battery_voltage().unwrap(), voltage);
        assert_eq!(hat.last_update(), stamp);
    }

    #[test]
    fn test_reads_after_guarded_interval_refresh() {
        let (mut hat, clock) = mock(&test_config());
        hat.battery_level().unwrap();

        clock.advance(TimeDelta::seconds(21));
        assert!(hat.needs_refresh());
        hat.battery_voltage().unwrap();
        assert_eq!(hat.last_update(), start_time() + TimeDelta::seconds(21));
    }

    #[test]
    fn test_readings_stay_in_range() {
        let (mut hat, clock) = mock(&test_config());
        for _ in 0..500 {
            clock.advance(TimeDelta::seconds(60));
            let level = hat.battery_level().unwrap();
            let voltage = hat.battery_voltage().unwrap();
            assert!((0..=100).contains(&level));
            assert!((10.0..=13.0).contains(&voltage), "voltage {}", voltage);
            assert_eq!(voltage, round_to(voltage, 2));
        }
    }

    #[test]
    fn test_last_update_never_moves_backwards() {
        let (mut hat, clock) = mock(&test_config().with_refresh_interval_secs(0));
        hat.battery_level().unwrap();

        // interval 0 minus the guard margin is -10 s, so a clock 5 s in the
        // past still counts as stale
        clock.set(start_time() - TimeDelta::seconds(5));
        assert!(hat.needs_refresh());
        hat.battery_level().unwrap();
        assert_eq!(hat.last_update(), start_time());
    }

    #[test]
    fn test_out_of_range_interval_is_clamped() {
        // huge intervals act as one day
        let (mut hat, clock) = mock(&test_config().with_refresh_interval_secs(i64::MAX));
        hat.battery_level().unwrap();
        clock.advance(TimeDelta::seconds(timing::MAX_REFRESH_INTERVAL_SECS - 10));
        assert!(!hat.needs_refresh());
        clock.advance(TimeDelta::seconds(1));
        assert!(hat.needs_refresh());

        // negative intervals act as zero, so every read refreshes
        let (mut hat, _clock) = mock(&test_config().with_refresh_interval_secs(-5));
        hat.battery_level().unwrap();
        assert!(hat.needs_refresh());

        let (mut hat, _clock) = mock(&test_config().with_refresh_interval_secs(i64::MIN));
        assert!(hat.battery_voltage().is_ok());
    }

    #[test]
    fn test_deserialized_config_cannot_break_driver() {
        let config: DeviceConfig = serde_json::from_str(
            r#"{"bus":12,"address":"0x36","refresh_interval_secs":9223372036854775807}"#,
        )
        .unwrap();
        assert!(X1200Mock::test_connection(&config).unwrap());
    }

    #[test]
    fn test_faulted_sensor_never_updates() {
        let (mut hat, clock) = mock(&test_config().with_simulated_fault(true));
        assert_eq!(hat.state(), SensorState::Faulted);

        for _ in 0..3 {
            let err = hat.battery_level().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::BusCommunication);
            let err = hat.battery_voltage().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::BusCommunication);
            assert_eq!(hat.last_update(), DateTime::<Utc>::MIN_UTC);
            assert_eq!(*hat.reading(), SensorReading::initial());
            clock.advance(TimeDelta::seconds(120));
        }
    }

    #[test]
    fn test_connection_succeeds_on_simulated_device() {
        let clock = ManualClock::new(start_time());
        assert!(X1200Mock::test_connection_with(&test_config(), clock, seeded_rng()).unwrap());
        assert!(X1200Mock::test_connection(&DeviceConfig::default()).unwrap());
    }

    #[test]
    fn test_connection_reports_bus_fault() {
        let config = test_config().with_simulated_fault(true);
        let err = X1200Mock::test_connection(&config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BusCommunication);
    }

    #[test]
    fn test_same_seed_same_readings() {
        let (mut a, _) = mock(&test_config());
        let (mut b, _) = mock(&test_config());
        assert_eq!(a.battery_level().unwrap(), b.battery_level().unwrap());
        assert_eq!(a.battery_voltage().unwrap(), b.battery_voltage().unwrap());
    }
}
