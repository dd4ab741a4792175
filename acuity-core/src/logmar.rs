use serde::{Deserialize, Serialize};
use std::fmt;

/// Stimulus size on the LogMAR scale. Lower values are smaller and harder
/// to resolve; 0.0 corresponds to 20/20 acuity.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogMar(f64);

impl LogMar {
    pub const fn new(value: f64) -> Self {
        LogMar(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Letter height in degrees of visual angle.
    ///
    /// LogMAR = log10(MAR) with MAR in arcmin per fifth of the optotype, so
    /// height = 5 * 10^logmar arcmin, divided by 60 for degrees.
    pub fn to_degrees(&self) -> f64 {
        5.0 * 10f64.powf(self.0) / 60.0
    }

    pub fn stepped_down(&self, step: f64) -> Self {
        LogMar(self.0 - step)
    }

    pub fn stepped_up(&self, step: f64) -> Self {
        LogMar(self.0 + step)
    }

    pub fn clamped(&self, floor: LogMar, ceiling: LogMar) -> Self {
        LogMar(self.0.clamp(floor.0, ceiling.0))
    }
}

impl fmt::Display for LogMar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
