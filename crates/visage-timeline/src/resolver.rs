//! Timeline resolver - playback position to mouth pose
//!
//! Rules, in priority order:
//! 1. Inside an interval: that interval's label (earliest start wins)
//! 2. In a gap before the timeline end with more intervals ahead: rest
//! 3. Past the timeline end but before the reported duration: hold the last
//!    label, covering an audio tail with no annotated mouth shape
//! 4. Otherwise (empty timeline, or past the duration): rest

use visage_core::{MediaTime, Mouth};

use crate::{Timeline, VisemeInterval};

/// Which rule produced a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// `t` lies inside this interval
    Active(&'a VisemeInterval),
    /// Between intervals, more to come
    Gap,
    /// Past the last interval, audio still running
    TailHold(&'a VisemeInterval),
    /// Nothing left to show
    Finished,
}

impl Resolution<'_> {
    /// Mouth pose for this resolution
    pub fn mouth(&self) -> Mouth {
        match self {
            Resolution::Active(iv) | Resolution::TailHold(iv) => iv.label.clone(),
            Resolution::Gap | Resolution::Finished => Mouth::Rest,
        }
    }
}

/// Resolve with the rule that fired
pub fn resolve_detailed(timeline: &Timeline, t: MediaTime, duration: MediaTime) -> Resolution<'_> {
    let intervals = timeline.intervals();
    let started = timeline.started_by(t);

    if let Some(active) = intervals[..started].iter().find(|iv| t < iv.end) {
        return Resolution::Active(active);
    }

    if started < intervals.len() && t < timeline.end() {
        return Resolution::Gap;
    }

    if t >= timeline.end() && t < duration {
        if let Some(last) = timeline.last() {
            return Resolution::TailHold(last);
        }
    }

    Resolution::Finished
}

/// Mouth pose for playback position `t` given the reported total duration
#[inline]
pub fn resolve(timeline: &Timeline, t: MediaTime, duration: MediaTime) -> Mouth {
    resolve_detailed(timeline, t, duration).mouth()
}
