//! Time primitives for the avatar engine
//!
//! Two clocks are in play:
//! - MediaTime: position on a playback clock (audio or simulated), may jump
//! - FrameTime: host wall time handed to every frame, monotonic

use std::ops::{Add, Sub};
use std::time::Duration;

/// Playback position, microseconds since the start of the media
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MediaTime(pub i64);

impl MediaTime {
    pub const ZERO: MediaTime = MediaTime(0);
    pub const MAX: MediaTime = MediaTime(i64::MAX);

    #[inline]
    pub fn from_micros(micros: i64) -> Self {
        MediaTime(micros)
    }

    #[inline]
    pub fn from_millis(millis: i64) -> Self {
        MediaTime(millis * 1000)
    }

    /// Rounds to the nearest microsecond so decimal wire values such as
    /// `0.2` land exactly on their boundary.
    #[inline]
    pub fn from_secs_f64(secs: f64) -> Self {
        MediaTime((secs * 1_000_000.0).round() as i64)
    }

    #[inline]
    pub fn as_micros(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn as_millis(self) -> i64 {
        self.0 / 1000
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    /// Multiply by a factor (used for the completion threshold)
    #[inline]
    pub fn scale(self, factor: f64) -> Self {
        MediaTime((self.0 as f64 * factor).round() as i64)
    }

    #[inline]
    pub fn saturating_add(self, duration: Duration) -> Self {
        MediaTime(self.0.saturating_add(duration.as_micros() as i64))
    }
}

impl Add<Duration> for MediaTime {
    type Output = MediaTime;

    #[inline]
    fn add(self, rhs: Duration) -> Self::Output {
        MediaTime(self.0 + rhs.as_micros() as i64)
    }
}

impl Sub<MediaTime> for MediaTime {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: MediaTime) -> Self::Output {
        let diff = self.0 - rhs.0;
        if diff >= 0 {
            Duration::from_micros(diff as u64)
        } else {
            Duration::ZERO
        }
    }
}

impl std::fmt::Debug for MediaTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "media({:.3}s)", self.as_secs_f64())
    }
}

/// Host wall time, microseconds since engine start
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FrameTime(pub u64);

impl FrameTime {
    pub const ZERO: FrameTime = FrameTime(0);

    #[inline]
    pub fn from_micros(micros: u64) -> Self {
        FrameTime(micros)
    }

    #[inline]
    pub fn from_millis(millis: u64) -> Self {
        FrameTime(millis * 1000)
    }

    #[inline]
    pub fn from_secs_f64(secs: f64) -> Self {
        FrameTime((secs.max(0.0) * 1_000_000.0).round() as u64)
    }

    #[inline]
    pub fn as_micros(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn as_millis(self) -> u64 {
        self.0 / 1000
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    /// Wall time elapsed since `earlier`, zero if `earlier` is in the future
    #[inline]
    pub fn since(self, earlier: FrameTime) -> Duration {
        Duration::from_micros(self.0.saturating_sub(earlier.0))
    }

    #[inline]
    pub fn saturating_add(self, duration: Duration) -> Self {
        FrameTime(self.0.saturating_add(duration.as_micros() as u64))
    }
}

impl Add<Duration> for FrameTime {
    type Output = FrameTime;

    #[inline]
    fn add(self, rhs: Duration) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl Sub<FrameTime> for FrameTime {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: FrameTime) -> Self::Output {
        self.since(rhs)
    }
}

impl std::fmt::Debug for FrameTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "frame({:.3}ms)", self.0 as f64 / 1000.0)
    }
}
