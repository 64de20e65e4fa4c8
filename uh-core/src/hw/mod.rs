//! Hardware interaction modules
//!
//! Contains the UPS hat abstraction, its simulated driver and the time
//! source drivers are gated on.

mod clock;
mod ups_hat;
mod x1200;

pub use clock::{Clock, ManualClock, SystemClock};
#[cfg(test)]
pub use ups_hat::MockUpsHat;
pub use ups_hat::{test_connection, UpsHat};
pub use x1200::{SensorReading, SensorState, X1200Mock};
