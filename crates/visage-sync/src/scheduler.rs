//! Sync scheduler - per-frame mouth driver
//!
//! State machine:
//!
//! ```text
//! Idle -> Running -> (Completed | Superseded | Cancelled) -> Idle
//! ```
//!
//! Every tick, in order:
//! 1. generation check: a superseded run stops without touching the face
//! 2. cancellation: one final rest update, then stop
//! 3. completion (clock ended, or position past the completion ratio of the
//!    duration hint): one final rest update, then stop
//! 4. throttle by elapsed wall time
//! 5. resolve and emit an update only when the mouth changed
//!
//! Audio-driven and simulated sessions go through exactly the same path;
//! only the session's clock differs.

use serde::{Deserialize, Serialize};
use visage_core::{FrameTime, MediaTime, Mouth, VisageError};
use visage_time::{FrameThrottle, DEFAULT_VISUAL_RATE_HZ};

use crate::{SessionManager, SessionStatus, SessionTicket};

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Target rate for mouth updates, independent of display refresh
    pub visual_rate_hz: f64,
    /// Fraction of the duration hint treated as the logical end. Some audio
    /// backends stop reporting progress just short of the real end.
    pub completion_ratio: f64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            visual_rate_hz: DEFAULT_VISUAL_RATE_HZ,
            completion_ratio: 0.99,
        }
    }
}

impl SyncConfig {
    /// Half-rate mouth updates for constrained hosts
    pub fn low_power() -> Self {
        SyncConfig {
            visual_rate_hz: 15.0,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), VisageError> {
        if !(self.visual_rate_hz.is_finite() && self.visual_rate_hz > 0.0) {
            return Err(VisageError::InvalidConfig(
                "visual_rate_hz must be positive".to_string(),
            ));
        }
        if !(self.completion_ratio > 0.0 && self.completion_ratio <= 1.0) {
            return Err(VisageError::InvalidConfig(
                "completion_ratio must be within (0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Running,
    Completed,
    Superseded,
    Cancelled,
}

/// Why a run stopped with a final rest update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Completed,
    Cancelled,
}

/// One mouth change destined for the compositor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncUpdate {
    pub ticket: SessionTicket,
    pub mouth: Mouth,
    /// Clock position the mouth was resolved at
    pub position: MediaTime,
}

/// Result of one scheduler tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing running
    Idle,
    /// Display hidden, no work done
    Paused,
    /// The run belonged to a superseded session and was dropped untouched
    Stale(SessionTicket),
    /// Too soon since the last evaluation
    Throttled,
    /// Evaluated, mouth unchanged
    Unchanged,
    /// Mouth changed
    Apply(SyncUpdate),
    /// Final rest update, run over
    Stopped { update: SyncUpdate, reason: StopReason },
}

impl TickOutcome {
    /// Update to forward to the compositor, if any
    pub fn update(&self) -> Option<&SyncUpdate> {
        match self {
            TickOutcome::Apply(update) | TickOutcome::Stopped { update, .. } => Some(update),
            _ => None,
        }
    }
}

/// Scheduler counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub ticks: u64,
    pub evaluations: u64,
    pub throttled: u64,
    pub applied: u64,
    pub stale: u64,
    pub runs_started: u64,
    pub runs_completed: u64,
}

#[derive(Debug)]
struct SyncRun {
    ticket: SessionTicket,
    last_applied: Option<Mouth>,
    throttle: FrameThrottle,
}

#[derive(Debug)]
pub struct SyncScheduler {
    config: SyncConfig,
    state: SyncState,
    run: Option<SyncRun>,
    paused: bool,
    stats: SyncStats,
}

impl SyncScheduler {
    pub fn new(config: SyncConfig) -> Self {
        SyncScheduler {
            config,
            state: SyncState::Idle,
            run: None,
            paused: false,
            stats: SyncStats::default(),
        }
    }

    /// Begin driving `ticket`. Refused unless the ticket is current.
    ///
    /// A run already in progress is superseded. Returns false if refused.
    pub fn start(&mut self, sessions: &SessionManager, ticket: SessionTicket, now: FrameTime) -> bool {
        if !sessions.is_current(ticket) {
            tracing::debug!(?ticket, "refusing to start stale session");
            return false;
        }

        if let Some(previous) = self.run.take() {
            tracing::debug!(ticket = ?previous.ticket, "run superseded by restart");
        }

        tracing::debug!(?ticket, ?now, "sync run started");
        self.run = Some(SyncRun {
            ticket,
            last_applied: None,
            throttle: FrameThrottle::from_rate_hz(self.config.visual_rate_hz),
        });
        self.state = SyncState::Running;
        self.stats.runs_started += 1;
        true
    }

    /// Advance one display frame
    pub fn tick(&mut self, sessions: &mut SessionManager, now: FrameTime) -> TickOutcome {
        self.stats.ticks += 1;

        if self.paused {
            return TickOutcome::Paused;
        }

        let Some(run) = self.run.as_mut() else {
            self.state = SyncState::Idle;
            return TickOutcome::Idle;
        };
        let ticket = run.ticket;

        match sessions.status(ticket) {
            SessionStatus::Superseded => {
                self.stats.stale += 1;
                return self.stop_silently(SyncState::Superseded, ticket);
            }
            SessionStatus::Cancelled => {
                let position = sessions.clock_position(ticket, now).unwrap_or_default();
                return self.stop_at_rest(ticket, position, StopReason::Cancelled);
            }
            SessionStatus::Ended => {
                let position = sessions.clock_position(ticket, now).unwrap_or_default();
                return self.stop_at_rest(ticket, position, StopReason::Completed);
            }
            SessionStatus::Current => {}
        }

        let Some(session) = sessions.session(ticket) else {
            return self.stop_silently(SyncState::Superseded, ticket);
        };

        let position = session.position(now);
        let hint = session.duration_hint();
        let past_hint = hint > MediaTime::ZERO && position >= hint.scale(self.config.completion_ratio);
        if session.clock_ended(now) || past_hint {
            sessions.finish(ticket);
            return self.stop_at_rest(ticket, position, StopReason::Completed);
        }

        if !run.throttle.ready(now) {
            self.stats.throttled += 1;
            return TickOutcome::Throttled;
        }
        self.stats.evaluations += 1;

        let mouth = session.resolve_at(now);
        if run.last_applied.as_ref() == Some(&mouth) {
            return TickOutcome::Unchanged;
        }

        run.last_applied = Some(mouth.clone());
        self.stats.applied += 1;
        TickOutcome::Apply(SyncUpdate {
            ticket,
            mouth,
            position,
        })
    }

    /// Stop scheduling frames (display hidden)
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume after `pause`; the next tick samples the live clock at once
    pub fn resume(&mut self, now: FrameTime) {
        self.paused = false;
        if let Some(run) = self.run.as_mut() {
            run.throttle.reset();
            tracing::debug!(ticket = ?run.ticket, ?now, "sync run resumed");
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SyncState::Running
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Ticket of the run in progress
    pub fn ticket(&self) -> Option<SessionTicket> {
        self.run.as_ref().map(|r| r.ticket)
    }

    pub fn last_applied(&self) -> Option<&Mouth> {
        self.run.as_ref().and_then(|r| r.last_applied.as_ref())
    }

    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    fn stop_silently(&mut self, state: SyncState, ticket: SessionTicket) -> TickOutcome {
        tracing::debug!(?ticket, ?state, "sync run dropped");
        self.run = None;
        self.state = state;
        TickOutcome::Stale(ticket)
    }

    fn stop_at_rest(
        &mut self,
        ticket: SessionTicket,
        position: MediaTime,
        reason: StopReason,
    ) -> TickOutcome {
        self.run = None;
        self.state = match reason {
            StopReason::Completed => {
                self.stats.runs_completed += 1;
                SyncState::Completed
            }
            StopReason::Cancelled => SyncState::Cancelled,
        };
        self.stats.applied += 1;
        tracing::debug!(?ticket, ?position, ?reason, "sync run stopped");
        TickOutcome::Stopped {
            update: SyncUpdate {
                ticket,
                mouth: Mouth::Rest,
                position,
            },
            reason,
        }
    }
}

impl Default for SyncScheduler {
    fn default() -> Self {
        Self::new(SyncConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use visage_core::VisemeCue;
    use visage_time::{MediaClock, SimulatedClock};
    use visage_timeline::Timeline;

    fn timeline(cues: &[(f64, f64, &str)]) -> Arc<Timeline> {
        let cues: Vec<_> = cues.iter().map(|&(s, e, v)| VisemeCue::new(s, e, v)).collect();
        Arc::new(Timeline::from_cues(&cues))
    }

    fn ms(v: u64) -> FrameTime {
        FrameTime::from_millis(v)
    }

    fn arm_audio(sessions: &mut SessionManager, cues: &[(f64, f64, &str)], duration: f64) -> (SessionTicket, MediaClock) {
        let clock = MediaClock::new();
        let ticket = sessions.arm(
            timeline(cues),
            Box::new(clock.clone()),
            MediaTime::from_secs_f64(duration),
        );
        (ticket, clock)
    }

    #[test]
    fn test_idle_without_run() {
        let mut sessions = SessionManager::new();
        let mut scheduler = SyncScheduler::default();
        assert_eq!(scheduler.tick(&mut sessions, ms(0)), TickOutcome::Idle);
        assert_eq!(scheduler.state(), SyncState::Idle);
    }

    #[test]
    fn test_applies_once_per_change() {
        let mut sessions = SessionManager::new();
        let mut scheduler = SyncScheduler::default();
        let (ticket, clock) = arm_audio(&mut sessions, &[(0.0, 0.2, "A"), (0.2, 0.5, "M")], 0.5);
        assert!(scheduler.start(&sessions, ticket, ms(0)));

        clock.set_position(MediaTime::from_millis(10));
        let first = scheduler.tick(&mut sessions, ms(0));
        assert_eq!(first.update().map(|u| u.mouth.clone()), Some(Mouth::shape("A")));

        clock.set_position(MediaTime::from_millis(60));
        assert_eq!(scheduler.tick(&mut sessions, ms(50)), TickOutcome::Unchanged);

        clock.set_position(MediaTime::from_millis(250));
        let second = scheduler.tick(&mut sessions, ms(100));
        assert_eq!(second.update().map(|u| u.mouth.clone()), Some(Mouth::shape("M")));
        assert_eq!(scheduler.stats().applied, 2);
    }

    #[test]
    fn test_throttles_by_wall_time() {
        let mut sessions = SessionManager::new();
        let mut scheduler = SyncScheduler::default();
        let (ticket, clock) = arm_audio(&mut sessions, &[(0.0, 0.2, "A"), (0.2, 0.5, "M")], 0.5);
        scheduler.start(&sessions, ticket, ms(0));

        clock.set_position(MediaTime::from_millis(10));
        assert!(matches!(scheduler.tick(&mut sessions, ms(0)), TickOutcome::Apply(_)));

        // Clock already in M, but only 8 ms of wall time passed
        clock.set_position(MediaTime::from_millis(210));
        assert_eq!(scheduler.tick(&mut sessions, ms(8)), TickOutcome::Throttled);
        assert!(matches!(scheduler.tick(&mut sessions, ms(34)), TickOutcome::Apply(_)));
    }

    #[test]
    fn test_completes_at_ratio_of_duration() {
        let mut sessions = SessionManager::new();
        let mut scheduler = SyncScheduler::default();
        let (ticket, clock) = arm_audio(&mut sessions, &[(0.0, 1.0, "O")], 1.0);
        scheduler.start(&sessions, ticket, ms(0));

        clock.set_position(MediaTime::from_millis(500));
        scheduler.tick(&mut sessions, ms(0));

        clock.set_position(MediaTime::from_millis(991));
        let outcome = scheduler.tick(&mut sessions, ms(40));
        match outcome {
            TickOutcome::Stopped { update, reason } => {
                assert_eq!(update.mouth, Mouth::Rest);
                assert_eq!(reason, StopReason::Completed);
            }
            other => panic!("expected stop, got {other:?}"),
        }
        assert_eq!(scheduler.state(), SyncState::Completed);
        assert_eq!(sessions.status(ticket), SessionStatus::Ended);

        assert_eq!(scheduler.tick(&mut sessions, ms(80)), TickOutcome::Idle);
        assert_eq!(scheduler.state(), SyncState::Idle);
    }

    #[test]
    fn test_completes_when_clock_ends() {
        let mut sessions = SessionManager::new();
        let mut scheduler = SyncScheduler::default();
        let (ticket, clock) = arm_audio(&mut sessions, &[(0.0, 1.0, "O")], 5.0);
        scheduler.start(&sessions, ticket, ms(0));

        clock.set_position(MediaTime::from_millis(300));
        scheduler.tick(&mut sessions, ms(0));
        clock.mark_ended();

        // Completion is checked before the throttle
        let outcome = scheduler.tick(&mut sessions, ms(1));
        assert!(matches!(
            outcome,
            TickOutcome::Stopped { reason: StopReason::Completed, .. }
        ));
    }

    #[test]
    fn test_superseded_run_never_updates() {
        let mut sessions = SessionManager::new();
        let mut scheduler = SyncScheduler::default();
        let (old, old_clock) = arm_audio(&mut sessions, &[(0.0, 1.0, "A")], 1.0);
        scheduler.start(&sessions, old, ms(0));
        old_clock.set_position(MediaTime::from_millis(100));

        let (_new, _clock) = arm_audio(&mut sessions, &[(0.0, 1.0, "M")], 1.0);

        assert_eq!(scheduler.tick(&mut sessions, ms(0)), TickOutcome::Stale(old));
        assert_eq!(scheduler.state(), SyncState::Superseded);
        assert_eq!(scheduler.stats().applied, 0);
        assert_eq!(scheduler.stats().stale, 1);
    }

    #[test]
    fn test_start_refuses_stale_ticket() {
        let mut sessions = SessionManager::new();
        let mut scheduler = SyncScheduler::default();
        let (old, _) = arm_audio(&mut sessions, &[(0.0, 1.0, "A")], 1.0);
        let (new, _) = arm_audio(&mut sessions, &[(0.0, 1.0, "M")], 1.0);

        assert!(!scheduler.start(&sessions, old, ms(0)));
        assert!(scheduler.start(&sessions, new, ms(0)));
        assert_eq!(scheduler.ticket(), Some(new));
    }

    #[test]
    fn test_cancel_rests_and_stops() {
        let mut sessions = SessionManager::new();
        let mut scheduler = SyncScheduler::default();
        let (ticket, clock) = arm_audio(&mut sessions, &[(0.0, 1.0, "A")], 1.0);
        scheduler.start(&sessions, ticket, ms(0));
        clock.set_position(MediaTime::from_millis(100));
        scheduler.tick(&mut sessions, ms(0));

        sessions.cancel();
        let outcome = scheduler.tick(&mut sessions, ms(5));
        assert!(matches!(
            outcome,
            TickOutcome::Stopped { reason: StopReason::Cancelled, .. }
        ));
        assert_eq!(outcome.update().map(|u| u.mouth.clone()), Some(Mouth::Rest));
        assert_eq!(scheduler.state(), SyncState::Cancelled);
    }

    #[test]
    fn test_pause_and_resume_from_live_clock() {
        let mut sessions = SessionManager::new();
        let mut scheduler = SyncScheduler::default();
        let (ticket, clock) = arm_audio(
            &mut sessions,
            &[(0.0, 0.5, "A"), (0.5, 1.0, "E"), (1.0, 2.0, "O")],
            2.0,
        );
        scheduler.start(&sessions, ticket, ms(0));
        clock.set_position(MediaTime::from_millis(100));
        scheduler.tick(&mut sessions, ms(0));

        scheduler.pause();
        clock.set_position(MediaTime::from_millis(1200));
        assert_eq!(scheduler.tick(&mut sessions, ms(500)), TickOutcome::Paused);

        scheduler.resume(ms(1010));
        // Throttle was reset: samples immediately, skipping the stale "E"
        let outcome = scheduler.tick(&mut sessions, ms(1010));
        assert_eq!(outcome.update().map(|u| u.mouth.clone()), Some(Mouth::shape("O")));
    }

    #[test]
    fn test_simulated_clock_shares_logic() {
        let mut sessions = SessionManager::new();
        let mut scheduler = SyncScheduler::default();
        let start = ms(1000);
        let ticket = sessions.arm(
            timeline(&[(0.0, 0.2, "A"), (0.2, 0.4, "M")]),
            Box::new(SimulatedClock::new(start, MediaTime::from_millis(400))),
            MediaTime::from_millis(400),
        );
        scheduler.start(&sessions, ticket, start);

        let mut seen = Vec::new();
        let mut stopped = false;
        for frame in 0..60 {
            let outcome = scheduler.tick(&mut sessions, start + std::time::Duration::from_millis(frame * 16));
            if let Some(update) = outcome.update() {
                seen.push(update.mouth.label().to_string());
            }
            if matches!(outcome, TickOutcome::Stopped { .. }) {
                stopped = true;
                break;
            }
        }
        assert!(stopped);
        assert_eq!(seen, vec!["A", "M", "rest"]);
    }

    #[test]
    fn test_restart_supersedes_previous_run() {
        let mut sessions = SessionManager::new();
        let mut scheduler = SyncScheduler::default();
        let (first, first_clock) = arm_audio(&mut sessions, &[(0.0, 1.0, "A")], 1.0);
        scheduler.start(&sessions, first, ms(0));
        first_clock.set_position(MediaTime::from_millis(100));
        scheduler.tick(&mut sessions, ms(0));

        let (second, second_clock) = arm_audio(&mut sessions, &[(0.0, 1.0, "M")], 1.0);
        scheduler.start(&sessions, second, ms(10));
        second_clock.set_position(MediaTime::from_millis(50));

        let outcome = scheduler.tick(&mut sessions, ms(20));
        let update = outcome.update().cloned().unwrap();
        assert_eq!(update.ticket, second);
        assert_eq!(update.mouth, Mouth::shape("M"));
    }

    #[test]
    fn test_config_validation() {
        assert!(SyncConfig::default().validate().is_ok());
        assert!(SyncConfig { visual_rate_hz: 0.0, ..Default::default() }.validate().is_err());
        assert!(SyncConfig { completion_ratio: 1.5, ..Default::default() }.validate().is_err());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_updates_only_on_change(
                labels in proptest::collection::vec(0usize..4, 1..12),
                steps in proptest::collection::vec(1u64..60, 50..400),
            ) {
                const NAMES: [&str; 4] = ["A", "E", "M", "rest"];
                let cues: Vec<_> = labels
                    .iter()
                    .enumerate()
                    .map(|(i, &l)| (i as f64 * 0.1, (i + 1) as f64 * 0.1, NAMES[l]))
                    .collect();
                let timeline = timeline(&cues);
                let length = timeline.end();

                let mut sessions = SessionManager::new();
                let mut scheduler = SyncScheduler::default();
                let ticket = sessions.arm(
                    timeline,
                    Box::new(SimulatedClock::new(FrameTime::ZERO, length)),
                    length,
                );
                scheduler.start(&sessions, ticket, FrameTime::ZERO);

                let mut now = FrameTime::ZERO;
                let mut applied: Vec<Mouth> = Vec::new();
                let mut stopped = false;
                for step in steps {
                    let outcome = scheduler.tick(&mut sessions, now);
                    if let TickOutcome::Apply(update) = &outcome {
                        prop_assert_ne!(applied.last(), Some(&update.mouth));
                    }
                    if let Some(update) = outcome.update() {
                        prop_assert!(!stopped);
                        applied.push(update.mouth.clone());
                    }
                    if matches!(outcome, TickOutcome::Stopped { .. }) {
                        stopped = true;
                    }
                    now = now + std::time::Duration::from_millis(step);
                }

                if stopped {
                    prop_assert_eq!(applied.last(), Some(&Mouth::Rest));
                }
            }
        }
    }
}
