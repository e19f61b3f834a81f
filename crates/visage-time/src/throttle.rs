//! Frame throttle - bounds visual updates to a target rate
//!
//! Pacing is measured in elapsed wall time, never in tick counts, so the
//! same rate results on a 60 Hz and a 144 Hz display.

use std::time::Duration;

use visage_core::FrameTime;

/// Default target visual rate
pub const DEFAULT_VISUAL_RATE_HZ: f64 = 30.0;

/// Frames landing this close to the deadline count as on time, otherwise a
/// 60 Hz display (16.67 ms) would alias a 30 Hz target down to 20 Hz.
pub const FRAME_SLACK: Duration = Duration::from_millis(1);

#[derive(Debug, Clone)]
pub struct FrameThrottle {
    /// Minimum wall time between accepted frames
    interval: Duration,
    /// Frame time of the last accepted frame
    last: Option<FrameTime>,
}

impl FrameThrottle {
    pub fn new(interval: Duration) -> Self {
        FrameThrottle {
            interval,
            last: None,
        }
    }

    /// Throttle for a target rate in Hz. Non-positive rates disable throttling.
    pub fn from_rate_hz(rate_hz: f64) -> Self {
        if rate_hz.is_finite() && rate_hz > 0.0 {
            Self::new(Duration::from_micros((1_000_000.0 / rate_hz) as u64))
        } else {
            Self::new(Duration::ZERO)
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns true (and records `now`) when enough wall time has passed
    /// since the last accepted frame. The first frame is always accepted.
    pub fn ready(&mut self, now: FrameTime) -> bool {
        match self.last {
            Some(last) if now.since(last) + FRAME_SLACK < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }

    /// Forget the last accepted frame so the next one is accepted
    pub fn reset(&mut self) {
        self.last = None;
    }

    pub fn last_accepted(&self) -> Option<FrameTime> {
        self.last
    }
}

impl Default for FrameThrottle {
    fn default() -> Self {
        Self::from_rate_hz(DEFAULT_VISUAL_RATE_HZ)
    }
}
