//! Clock implementations for the sync engine

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use visage_core::{FrameTime, MediaTime};

/// Read side of a playback clock
///
/// `now` is the host frame time; clocks that do not depend on wall time
/// ignore it.
pub trait PlaybackClock: Send {
    /// Current elapsed position on the media
    fn position(&self, now: FrameTime) -> MediaTime;

    /// Whether the stream has reported its end
    fn has_ended(&self, now: FrameTime) -> bool;

    /// Short name for diagnostics
    fn kind(&self) -> ClockKind;
}

/// Clock variant driving a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockKind {
    /// Actual decoded audio position
    Audio,
    /// Wall time since a synthetic start
    Simulated,
}

#[derive(Debug, Default)]
struct MediaClockShared {
    position_us: AtomicI64,
    started: AtomicBool,
    ended: AtomicBool,
}

/// Audio-driven clock
///
/// Cloned handles share state. The audio collaborator is the single writer;
/// the engine only reads.
#[derive(Debug, Clone, Default)]
pub struct MediaClock {
    shared: Arc<MediaClockShared>,
}

impl MediaClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the current playback position
    /// Positions before zero are clamped to zero
    pub fn set_position(&self, position: MediaTime) {
        self.shared
            .position_us
            .store(position.as_micros().max(0), Ordering::Release);
    }

    pub fn mark_started(&self) {
        self.shared.started.store(true, Ordering::Release);
    }

    pub fn mark_ended(&self) {
        self.shared.ended.store(true, Ordering::Release);
    }

    pub fn is_started(&self) -> bool {
        self.shared.started.load(Ordering::Acquire)
    }

    pub fn current(&self) -> MediaTime {
        MediaTime::from_micros(self.shared.position_us.load(Ordering::Acquire))
    }

    pub fn is_ended(&self) -> bool {
        self.shared.ended.load(Ordering::Acquire)
    }
}

impl PlaybackClock for MediaClock {
    fn position(&self, _now: FrameTime) -> MediaTime {
        self.current()
    }

    fn has_ended(&self, _now: FrameTime) -> bool {
        self.is_ended()
    }

    fn kind(&self) -> ClockKind {
        ClockKind::Audio
    }
}

/// Wall-clock driven stand-in for audio
///
/// Plays a timeline at its own declared rate when no audio was sent.
#[derive(Debug, Clone)]
pub struct SimulatedClock {
    /// Frame time the simulated playback began
    started_at: FrameTime,
    /// Position at which the simulated stream ends
    length: MediaTime,
}

impl SimulatedClock {
    pub fn new(started_at: FrameTime, length: MediaTime) -> Self {
        SimulatedClock { started_at, length }
    }

    pub fn started_at(&self) -> FrameTime {
        self.started_at
    }

    pub fn length(&self) -> MediaTime {
        self.length
    }
}

impl PlaybackClock for SimulatedClock {
    fn position(&self, now: FrameTime) -> MediaTime {
        MediaTime::ZERO + now.since(self.started_at)
    }

    fn has_ended(&self, now: FrameTime) -> bool {
        self.position(now) >= self.length
    }

    fn kind(&self) -> ClockKind {
        ClockKind::Simulated
    }
}
