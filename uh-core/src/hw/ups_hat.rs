//! Generic UPS hat interface
//!
//! Every battery board driver, simulated or real, implements [`UpsHat`].
//! Host polling code and the setup flow only ever talk to this trait.

use tracing::{info, warn};

use crate::constants::battery;
use crate::error::{Result, UpsHatError};

/// A battery-backed power board reachable on a bus
#[cfg_attr(test, mockall::automock)]
pub trait UpsHat {
    /// Bus the board is attached to
    fn bus(&self) -> u8;

    /// Address of the fuel gauge on the bus
    fn address(&self) -> u8;

    /// Battery level as a whole percentage
    fn battery_level(&mut self) -> Result<i32>;

    /// Battery voltage in volts, rounded to two decimals
    fn battery_voltage(&mut self) -> Result<f64>;
}

/// Verify that a freshly constructed board answers with a sane level
///
/// Performs one `battery_level()` read. Levels in `[0, 200)` pass; anything
/// else is reported as `UnexpectedReading`. The upper bound is wider than
/// the percentage domain on purpose and must not be tightened without
/// checking existing device setups. Bus errors propagate unchanged.
pub fn test_connection<H: UpsHat + ?Sized>(hat: &mut H) -> Result<bool> {
    info!(
        "testing connectivity on bus {} at {:#04x}",
        hat.bus(),
        hat.address()
    );

    let level = hat.battery_level()?;
    if (0..battery::LEVEL_SANITY_MAX).contains(&level) {
        return Ok(true);
    }

    warn!("battery level {} was not expected", level);
    Err(UpsHatError::UnexpectedReading { level })
}
