//! Reading pipeline leaves: the bounded display window and lifetime statistics.
//!
//! The two are deliberately independent; the orchestrator feeds both from the
//! same parsed value.

pub mod stats;
pub mod window;

pub use stats::StatisticsEngine;
pub use window::WindowBuffer;

use emg_core::{EmgError, Result};

/// Parse one raw inbound payload into a finite reading value.
///
/// Anything that is not a finite `f64` (including `NaN` and `inf`) is rejected so
/// it can never reach the window or the statistics.
pub fn parse_reading(raw: &str) -> Result<f64> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| EmgError::Reading(raw.to_string()))?;

    if value.is_finite() {
        Ok(value)
    } else {
        Err(EmgError::Reading(raw.to_string()))
    }
}
