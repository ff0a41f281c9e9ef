//! Time utilities for replay sampling

use std::time::Instant;

/// Sampling rate configuration
pub const RECORDING_FPS: u32 = 10; // 10 samples per second of match time

/// Minimum replay time between two samples (in seconds)
pub fn sample_interval() -> f32 {
    1.0 / RECORDING_FPS as f32
}

/// Boost drained per second while boosting, in replicated byte units (0-255)
pub const BOOST_CONSUMPTION_RATE: f32 = 85.0;

/// A simple timer for measuring durations
#[derive(Debug, Clone)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_interval_matches_recording_rate() {
        assert!((sample_interval() - 0.1).abs() < f32::EPSILON);
    }
}
