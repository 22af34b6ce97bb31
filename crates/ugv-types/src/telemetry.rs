use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One 3-axis attitude reading pushed by the companion device, in degrees.
///
/// Only the newest sample matters to the display; samples are never queued
/// for history (last-write-wins).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientationSample {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl OrientationSample {
    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self { alpha, beta, gamma }
    }

    /// Formatted readout used by the gyro label.
    pub fn display_line(&self) -> String {
        format!(
            "α: {:.2}, β: {:.2}, γ: {:.2}",
            self.alpha, self.beta, self.gamma
        )
    }
}

impl Default for OrientationSample {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

/// Sample plus the moment the console took delivery, for staleness display.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimestampedSample {
    pub sample: OrientationSample,
    pub received_at: DateTime<Utc>,
}

impl TimestampedSample {
    pub fn now(sample: OrientationSample) -> Self {
        Self {
            sample,
            received_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_line_formats_two_decimals() {
        let sample = OrientationSample::new(10.0, -5.5, 0.0);
        assert_eq!(sample.display_line(), "α: 10.00, β: -5.50, γ: 0.00");
    }
}
