//! Playback sessions - generation-tagged clock + timeline bindings

use std::fmt;
use std::sync::Arc;

use visage_core::{FrameTime, Generation, MediaTime, Mouth};
use visage_time::{ClockKind, PlaybackClock};
use visage_timeline::{resolve, Timeline};

/// Handle to one armed session, compared by value
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionTicket(Generation);

impl SessionTicket {
    pub fn generation(self) -> Generation {
        self.0
    }
}

impl fmt::Debug for SessionTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ticket({})", self.0)
    }
}

/// How a ticket relates to the current session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// The most recently armed session, still active
    Current,
    /// Most recent, but explicitly cancelled
    Cancelled,
    /// Most recent, clock reached its end
    Ended,
    /// A newer session was armed
    Superseded,
}

/// One clock bound to one timeline
pub struct PlaybackSession {
    generation: Generation,
    clock: Box<dyn PlaybackClock>,
    timeline: Arc<Timeline>,
    /// Reported total duration of the media
    duration_hint: MediaTime,
    status: SessionStatus,
}

impl PlaybackSession {
    pub fn ticket(&self) -> SessionTicket {
        SessionTicket(self.generation)
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn timeline(&self) -> &Arc<Timeline> {
        &self.timeline
    }

    pub fn duration_hint(&self) -> MediaTime {
        self.duration_hint
    }

    pub fn clock_kind(&self) -> ClockKind {
        self.clock.kind()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Current
    }

    pub fn position(&self, now: FrameTime) -> MediaTime {
        self.clock.position(now)
    }

    pub fn clock_ended(&self, now: FrameTime) -> bool {
        self.clock.has_ended(now)
    }

    /// Mouth pose at the clock's current position
    pub fn resolve_at(&self, now: FrameTime) -> Mouth {
        resolve(&self.timeline, self.position(now), self.duration_hint)
    }
}

impl fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("generation", &self.generation)
            .field("clock", &self.clock.kind())
            .field("intervals", &self.timeline.len())
            .field("duration_hint", &self.duration_hint)
            .field("status", &self.status)
            .finish()
    }
}

/// Owner of the single current session
#[derive(Debug, Default)]
pub struct SessionManager {
    /// Generation of the most recently armed session
    generation: Generation,
    current: Option<PlaybackSession>,
    /// Sessions replaced before they finished
    superseded: u64,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a new session, invalidating the previous one
    ///
    /// The previous clock is left alone; its lifecycle belongs to the audio
    /// collaborator.
    pub fn arm(
        &mut self,
        timeline: Arc<Timeline>,
        clock: Box<dyn PlaybackClock>,
        duration_hint: MediaTime,
    ) -> SessionTicket {
        if let Some(previous) = self.current.take() {
            if previous.is_active() {
                self.superseded += 1;
            }
            tracing::debug!(generation = %previous.generation, "session superseded");
        }

        self.generation = self.generation.next();
        let session = PlaybackSession {
            generation: self.generation,
            clock,
            timeline,
            duration_hint,
            status: SessionStatus::Current,
        };
        tracing::debug!(?session, "session armed");
        self.current = Some(session);
        SessionTicket(self.generation)
    }

    /// True only for the most recent session while it is still active
    pub fn is_current(&self, ticket: SessionTicket) -> bool {
        self.status(ticket) == SessionStatus::Current
    }

    pub fn status(&self, ticket: SessionTicket) -> SessionStatus {
        match &self.current {
            Some(session) if session.generation == ticket.0 => session.status,
            _ => SessionStatus::Superseded,
        }
    }

    /// Mark the current session cancelled. Dependents stop on their next check.
    pub fn cancel(&mut self) -> Option<SessionTicket> {
        let session = self.current.as_mut().filter(|s| s.is_active())?;
        session.status = SessionStatus::Cancelled;
        tracing::debug!(generation = %session.generation, "session cancelled");
        Some(session.ticket())
    }

    /// Mark the session ended if it is still the current one
    pub fn finish(&mut self, ticket: SessionTicket) -> bool {
        match self.current.as_mut() {
            Some(session) if session.generation == ticket.0 && session.is_active() => {
                session.status = SessionStatus::Ended;
                true
            }
            _ => false,
        }
    }

    pub fn current(&self) -> Option<&PlaybackSession> {
        self.current.as_ref()
    }

    /// Session for `ticket` if it is still the most recent (any status)
    pub fn session(&self, ticket: SessionTicket) -> Option<&PlaybackSession> {
        self.current.as_ref().filter(|s| s.generation == ticket.0)
    }

    /// Clock position of `ticket`'s session; `None` once superseded
    pub fn clock_position(&self, ticket: SessionTicket, now: FrameTime) -> Option<MediaTime> {
        self.session(ticket).map(|s| s.position(now))
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn superseded_count(&self) -> u64 {
        self.superseded
    }
}
