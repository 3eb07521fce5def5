//! Observation time filtering.

use serde::{Deserialize, Serialize};

use crate::error::{BinningError, Result};

/// A half-open time window `[start_mjd, start_mjd + duration_days)` in
/// modified Julian days.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPeriod {
    pub start_mjd: f64,
    pub duration_days: f64,
}

impl DataPeriod {
    pub fn new(start_mjd: f64, duration_days: f64) -> Self {
        Self {
            start_mjd,
            duration_days,
        }
    }

    pub fn end_mjd(&self) -> f64 {
        self.start_mjd + self.duration_days
    }

    /// Check if an observation time falls inside the period.
    #[inline]
    pub fn contains(&self, mjd: f64) -> bool {
        mjd >= self.start_mjd && mjd < self.end_mjd()
    }

    pub fn validate(&self) -> Result<()> {
        if !self.start_mjd.is_finite() {
            return Err(BinningError::config("data period start must be finite"));
        }
        if !(self.duration_days > 0.0) {
            return Err(BinningError::config(format!(
                "data period duration must be > 0, got {}",
                self.duration_days
            )));
        }
        Ok(())
    }
}
