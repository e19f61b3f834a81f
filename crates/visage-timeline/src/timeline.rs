//! Viseme timeline - immutable, start-sorted interval list

use visage_core::{MediaTime, Mouth, VisemeCue};

/// One mouth shape held over `[start, end)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisemeInterval {
    pub start: MediaTime,
    pub end: MediaTime,
    pub label: Mouth,
}

impl VisemeInterval {
    /// Create an interval. Returns `None` unless `0 <= start < end`.
    pub fn new(start: MediaTime, end: MediaTime, label: Mouth) -> Option<Self> {
        if start < MediaTime::ZERO || end <= start {
            return None;
        }
        Some(VisemeInterval { start, end, label })
    }

    /// Convert a wire cue (seconds)
    pub fn from_cue(cue: &VisemeCue) -> Option<Self> {
        if !cue.start.is_finite() || !cue.end.is_finite() {
            return None;
        }
        Self::new(
            MediaTime::from_secs_f64(cue.start),
            MediaTime::from_secs_f64(cue.end),
            Mouth::from_label(&cue.viseme),
        )
    }

    /// Half-open containment: `start <= t < end`
    #[inline]
    pub fn contains(&self, t: MediaTime) -> bool {
        self.start <= t && t < self.end
    }
}

/// Ordered-by-start sequence of viseme intervals
///
/// Gaps and overlaps are allowed; the resolver defines how they read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    intervals: Vec<VisemeInterval>,
    /// Latest end over all intervals
    end: MediaTime,
}

impl Timeline {
    /// Empty timeline
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from intervals in any order. Sorting is stable, so intervals
    /// sharing a start keep their input order.
    pub fn from_intervals(mut intervals: Vec<VisemeInterval>) -> Self {
        intervals.sort_by_key(|iv| iv.start);
        let end = intervals
            .iter()
            .map(|iv| iv.end)
            .max()
            .unwrap_or(MediaTime::ZERO);
        Timeline { intervals, end }
    }

    /// Build from wire cues, dropping cues that are not valid intervals
    pub fn from_cues(cues: &[VisemeCue]) -> Self {
        let mut intervals = Vec::with_capacity(cues.len());
        for cue in cues {
            match VisemeInterval::from_cue(cue) {
                Some(iv) => intervals.push(iv),
                None => tracing::warn!(
                    start = cue.start,
                    end = cue.end,
                    viseme = %cue.viseme,
                    "dropping invalid viseme cue"
                ),
            }
        }
        Self::from_intervals(intervals)
    }

    #[inline]
    pub fn intervals(&self) -> &[VisemeInterval] {
        &self.intervals
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Latest interval end (zero when empty)
    #[inline]
    pub fn end(&self) -> MediaTime {
        self.end
    }

    /// Last interval in start order
    pub fn last(&self) -> Option<&VisemeInterval> {
        self.intervals.last()
    }

    /// Number of leading intervals with `start <= t`
    #[inline]
    pub(crate) fn started_by(&self, t: MediaTime) -> usize {
        self.intervals.partition_point(|iv| iv.start <= t)
    }
}
