//! Avatar engine - one owner for sessions, sync, face and idle motion

use std::sync::Arc;

use visage_core::{
    EmotionId, FrameTime, Generation, InboundMessage, MediaTime, OutboundMessage, TtsResponse,
    VisageError, VisageResult,
};
use visage_face::{
    AssetCatalog, Composite, Compositor, IdleMotionGenerator, RenderSink, StaticCatalog,
};
use visage_sync::{
    SessionManager, SessionStatus, SessionTicket, StopReason, SyncScheduler, TickOutcome,
};
use visage_time::{ClockKind, MediaClock, SimulatedClock};
use visage_timeline::Timeline;

use crate::{AudioOutput, EngineConfig, LogEntry, UserLog};

/// How a host callback was received
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Applied,
    /// Callback for a session that is no longer current; ignored
    Stale,
}

/// Everything that happened in one frame
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub sync: TickOutcome,
    /// A blink pulse was started this frame
    pub blinked: bool,
    /// Layers pushed to the sink; `None` while hidden
    pub composite: Option<Composite>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub frames: u64,
    pub responses: u64,
    pub rejected: u64,
    pub stale_callbacks: u64,
    pub playback_failures: u64,
    pub completed: u64,
}

pub struct AvatarEngine {
    config: EngineConfig,
    sessions: SessionManager,
    scheduler: SyncScheduler,
    compositor: Compositor,
    idle: IdleMotionGenerator,
    sink: Box<dyn RenderSink>,
    audio: Box<dyn AudioOutput>,
    log: UserLog,
    /// Expression requested by the latest response
    emotion: EmotionId,
    visible: bool,
    stats: EngineStats,
}

impl AvatarEngine {
    /// Engine over the default asset catalog
    pub fn new(
        config: EngineConfig,
        audio: Box<dyn AudioOutput>,
        sink: Box<dyn RenderSink>,
    ) -> VisageResult<Self> {
        Self::with_catalog(config, Box::new(StaticCatalog::with_defaults()), audio, sink)
    }

    pub fn with_catalog(
        config: EngineConfig,
        catalog: Box<dyn AssetCatalog>,
        audio: Box<dyn AudioOutput>,
        sink: Box<dyn RenderSink>,
    ) -> VisageResult<Self> {
        config.validate()?;
        Ok(AvatarEngine {
            sessions: SessionManager::new(),
            scheduler: SyncScheduler::new(config.sync.clone()),
            compositor: Compositor::with_catalog(config.face.clone(), catalog),
            idle: IdleMotionGenerator::new(config.idle.clone()),
            log: UserLog::new(config.user_log_capacity),
            sink,
            audio,
            emotion: EmotionId::neutral(),
            visible: true,
            stats: EngineStats::default(),
            config,
        })
    }

    /// Handle one JSON text frame from the backend
    ///
    /// Malformed frames are dropped without touching any state; the error is
    /// returned for the host's benefit only.
    pub fn handle_message(&mut self, text: &str, now: FrameTime) -> VisageResult<Option<SessionTicket>> {
        let message = match InboundMessage::from_json(text) {
            Ok(message) => message,
            Err(e) => {
                self.stats.rejected += 1;
                tracing::warn!(error = %e, "dropping inbound message");
                return Err(e);
            }
        };

        match message {
            InboundMessage::Info { msg } => {
                self.log.push(LogEntry::info(&msg));
                Ok(None)
            }
            InboundMessage::Tts(response) => Ok(self.handle_response(response, now)),
        }
    }

    /// Start presenting a spoken response, replacing whatever was playing
    ///
    /// Returns the new session's ticket, or `None` when the response has
    /// neither audio nor timed cues to animate.
    pub fn handle_response(&mut self, response: TtsResponse, now: FrameTime) -> Option<SessionTicket> {
        self.stats.responses += 1;
        let emotion = response.emotion_id();
        self.log.push(LogEntry::bot(&emotion, &response.reply));

        self.stop_playback();
        self.emotion = emotion.clone();
        self.compositor.set_emotion(emotion);

        let timeline = Arc::new(Timeline::from_cues(response.cues()));
        if !timeline.is_empty() {
            self.log.push(LogEntry::status(format!(
                "Lip-sync ready: {} viseme frames",
                timeline.len()
            )));
        }
        let duration_hint = self.duration_hint(&response, &timeline);

        let audio = match response.decode_audio() {
            Ok(audio) => audio,
            Err(e) => {
                self.fail_playback(self.sessions.generation(), &e.to_string());
                return None;
            }
        };

        match audio {
            Some(bytes) => Some(self.start_audio(timeline, bytes, duration_hint)),
            None if !timeline.is_empty() => Some(self.start_simulated(timeline, duration_hint, now)),
            None => None,
        }
    }

    /// Build an outbound chat message from user input. Blank input is refused.
    pub fn compose_user_message(&mut self, text: &str) -> Option<OutboundMessage> {
        let message = OutboundMessage::user_message(text)?;
        let OutboundMessage::UserMessage { text } = &message;
        self.log.push(LogEntry::user(text));
        Some(message)
    }

    /// The audio for `ticket` began playing; lip-sync starts now
    pub fn playback_started(&mut self, ticket: SessionTicket, now: FrameTime) -> Dispatch {
        if !self.sessions.is_current(ticket) {
            return self.stale(ticket, "playback_started");
        }

        self.compositor.start_speaking();
        self.scheduler.start(&self.sessions, ticket, now);
        self.log.push(LogEntry::status("Audio started playing"));
        tracing::info!(?ticket, "playback started");
        Dispatch::Applied
    }

    /// The audio for `ticket` reached its end
    pub fn playback_ended(&mut self, ticket: SessionTicket, _now: FrameTime) -> Dispatch {
        match self.sessions.status(ticket) {
            SessionStatus::Current => {
                self.sessions.finish(ticket);
                self.log.push(LogEntry::status("Audio playback ended"));
                // A running scheduler finishes up on its next tick
                if self.scheduler.ticket() != Some(ticket) {
                    self.complete(ticket);
                }
                Dispatch::Applied
            }
            // Already wound down at the completion threshold
            SessionStatus::Ended => {
                self.log.push(LogEntry::status("Audio playback ended"));
                Dispatch::Applied
            }
            SessionStatus::Cancelled | SessionStatus::Superseded => {
                self.stale(ticket, "playback_ended")
            }
        }
    }

    /// The audio for `ticket` could not be played
    pub fn playback_failed(&mut self, ticket: SessionTicket, reason: &str, _now: FrameTime) -> Dispatch {
        if !self.sessions.is_current(ticket) {
            return self.stale(ticket, "playback_failed");
        }
        self.fail_playback(ticket.generation(), reason);
        Dispatch::Applied
    }

    /// User-requested stop. Returns whether anything was playing.
    pub fn stop(&mut self, _now: FrameTime) -> bool {
        let stopped = self.stop_playback();
        self.log.push(LogEntry::status("Playback stopped by user"));
        stopped
    }

    /// Run one display frame
    pub fn frame(&mut self, now: FrameTime) -> FrameReport {
        self.stats.frames += 1;
        if !self.visible {
            return FrameReport {
                sync: TickOutcome::Paused,
                blinked: false,
                composite: None,
            };
        }

        let sync = self.scheduler.tick(&mut self.sessions, now);
        match &sync {
            TickOutcome::Apply(update) => {
                self.compositor.set_viseme(update.mouth.clone());
            }
            TickOutcome::Stopped {
                update,
                reason: StopReason::Completed,
            } => self.complete(update.ticket),
            TickOutcome::Stopped {
                reason: StopReason::Cancelled,
                ..
            } => self.compositor.reset_to_rest(),
            _ => {}
        }

        let idle = self.idle.advance(now, self.compositor.is_speaking());
        let blinked = idle.blink_due && self.compositor.pulse_blink();

        self.compositor.advance(now);
        let composite = self.compositor.render(self.sink.as_mut(), idle.transform);

        FrameReport {
            sync,
            blinked,
            composite: Some(composite),
        }
    }

    /// Pause frame work while hidden; resume from the live clock when shown
    pub fn set_visible(&mut self, visible: bool, now: FrameTime) {
        if visible == self.visible {
            return;
        }
        self.visible = visible;
        if visible {
            self.scheduler.resume(now);
            self.idle.rebase(now);
        } else {
            self.scheduler.pause();
        }
        tracing::debug!(visible, ?now, "visibility changed");
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn scheduler(&self) -> &SyncScheduler {
        &self.scheduler
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    pub fn log(&self) -> &UserLog {
        &self.log
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    fn duration_hint(&self, response: &TtsResponse, timeline: &Timeline) -> MediaTime {
        response
            .duration_secs()
            .map(MediaTime::from_secs_f64)
            .or_else(|| (!timeline.is_empty()).then(|| timeline.end()))
            .filter(|d| *d > MediaTime::ZERO)
            .unwrap_or_else(|| MediaTime::from_secs_f64(self.config.default_duration_secs))
    }

    fn start_audio(&mut self, timeline: Arc<Timeline>, bytes: Vec<u8>, duration_hint: MediaTime) -> SessionTicket {
        let clock = MediaClock::new();
        let ticket = self.sessions.arm(timeline, Box::new(clock.clone()), duration_hint);
        tracing::info!(?ticket, bytes = bytes.len(), ?duration_hint, "audio session armed");

        if let Err(e) = self.audio.play(ticket, bytes, clock) {
            self.fail_playback(ticket.generation(), &e.to_string());
        }
        ticket
    }

    fn start_simulated(&mut self, timeline: Arc<Timeline>, duration_hint: MediaTime, now: FrameTime) -> SessionTicket {
        let clock = SimulatedClock::new(now, timeline.end());
        let ticket = self.sessions.arm(timeline, Box::new(clock), duration_hint);
        tracing::info!(?ticket, ?duration_hint, "simulated session armed");

        self.compositor.start_speaking();
        self.scheduler.start(&self.sessions, ticket, now);
        ticket
    }

    /// Cancel the current session, silence its audio and rest the mouth
    ///
    /// An `Ended` audio session may still be sounding: the scheduler ends it
    /// at the completion threshold, before the player reports the end.
    fn stop_playback(&mut self) -> bool {
        let audible = self.sessions.current().is_some_and(|s| {
            s.clock_kind() == ClockKind::Audio
                && matches!(s.status(), SessionStatus::Current | SessionStatus::Ended)
        });
        let cancelled = self.sessions.cancel();
        if audible {
            self.audio.stop();
        }
        if let Some(ticket) = cancelled {
            tracing::info!(?ticket, "playback cancelled");
        }
        self.compositor.reset_to_rest();
        audible || cancelled.is_some()
    }

    fn fail_playback(&mut self, generation: Generation, reason: &str) {
        let error = VisageError::PlaybackFailure {
            generation,
            reason: reason.to_string(),
        };
        tracing::warn!(%error, "playback failed");
        self.stats.playback_failures += 1;

        self.sessions.cancel();
        self.audio.stop();
        self.compositor.reset_to_rest();
        self.log.push(LogEntry::audio_error(reason));
    }

    fn complete(&mut self, ticket: SessionTicket) {
        self.stats.completed += 1;
        let simulated = self
            .sessions
            .session(ticket)
            .is_some_and(|s| s.clock_kind() == ClockKind::Simulated);
        if simulated {
            self.log.push(LogEntry::status("Simulated lip-sync complete"));
        }
        self.compositor.stop_speaking();
        self.compositor.set_emotion(self.emotion.clone());
        tracing::info!(?ticket, "playback complete");
    }

    fn stale(&mut self, ticket: SessionTicket, callback: &'static str) -> Dispatch {
        self.stats.stale_callbacks += 1;
        tracing::debug!(?ticket, callback, "ignoring stale callback");
        Dispatch::Stale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use visage_core::Mouth;
    use visage_face::{IdleConfig, NullSink};
    use visage_sync::SyncState;

    #[derive(Default)]
    struct Plays {
        started: Vec<(SessionTicket, usize, MediaClock)>,
        stops: u32,
    }

    #[derive(Clone, Default)]
    struct RecordingAudio {
        plays: Rc<RefCell<Plays>>,
        refuse: bool,
    }

    impl AudioOutput for RecordingAudio {
        fn play(&mut self, ticket: SessionTicket, audio: Vec<u8>, clock: MediaClock) -> VisageResult<()> {
            if self.refuse {
                return Err(VisageError::InvalidAudio("unsupported format".to_string()));
            }
            self.plays.borrow_mut().started.push((ticket, audio.len(), clock));
            Ok(())
        }

        fn stop(&mut self) {
            self.plays.borrow_mut().stops += 1;
        }
    }

    const SPOKEN: &str = r#"{"type":"tts","reply":"hi","emotion":"happy","audio":"AAEC",
        "visemes":[{"start":0,"end":0.2,"viseme":"A"},{"start":0.2,"end":0.5,"viseme":"M"}],
        "duration":0.5}"#;

    const SILENT: &str = r#"{"type":"tts","reply":"hi","emotion":"happy",
        "visemes":[{"start":0,"end":0.2,"viseme":"A"},{"start":0.2,"end":0.5,"viseme":"M"}],
        "duration":0.5}"#;

    fn ms(v: u64) -> FrameTime {
        FrameTime::from_millis(v)
    }

    fn engine_with(audio: RecordingAudio) -> AvatarEngine {
        AvatarEngine::new(EngineConfig::deterministic(1), Box::new(audio), Box::new(NullSink)).unwrap()
    }

    #[test]
    fn test_info_message_logged() {
        let mut engine = engine_with(RecordingAudio::default());
        let ticket = engine
            .handle_message(r#"{"type":"info","msg":"connected"}"#, ms(0))
            .unwrap();
        assert!(ticket.is_none());
        assert_eq!(engine.log().last().map(|e| e.text.as_str()), Some("System: connected"));
    }

    #[test]
    fn test_malformed_message_changes_nothing() {
        let mut engine = engine_with(RecordingAudio::default());
        let err = engine.handle_message("{not json", ms(0)).unwrap_err();
        assert!(matches!(err, VisageError::MalformedPayload(_)));

        let err = engine.handle_message(r#"{"type":"dance"}"#, ms(0)).unwrap_err();
        assert!(matches!(err, VisageError::MalformedPayload(_)));

        assert!(engine.log().is_empty());
        assert_eq!(engine.stats().rejected, 2);
        assert_eq!(engine.sessions().generation().value(), 0);
        assert!(engine.compositor().emotion().is_neutral());
    }

    #[test]
    fn test_simulated_response_plays_through() {
        let mut engine = engine_with(RecordingAudio::default());
        let ticket = engine.handle_message(SILENT, ms(0)).unwrap();
        assert!(ticket.is_some());
        assert!(engine.compositor().is_speaking());
        assert_eq!(engine.compositor().emotion().as_str(), "happy");
        assert!(engine.log().contains("Bot [happy]: hi"));
        assert!(engine.log().contains("Lip-sync ready: 2 viseme frames"));

        let mut applied = Vec::new();
        for frame in 0..60 {
            let report = engine.frame(ms(frame * 16));
            if let Some(update) = report.sync.update() {
                applied.push(update.mouth.label().to_string());
            }
        }

        assert_eq!(applied, vec!["A", "M", "rest"]);
        assert!(!engine.compositor().is_speaking());
        assert_eq!(engine.scheduler().state(), SyncState::Idle);
        assert_eq!(engine.stats().completed, 1);
        assert_eq!(engine.compositor().emotion().as_str(), "happy");
        assert!(engine.log().contains("Simulated lip-sync complete"));
    }

    #[test]
    fn test_audio_response_waits_for_playback() {
        let audio = RecordingAudio::default();
        let mut engine = engine_with(audio.clone());
        let ticket = engine.handle_message(SPOKEN, ms(0)).unwrap().unwrap();

        let clock = {
            let plays = audio.plays.borrow();
            assert_eq!(plays.started.len(), 1);
            assert_eq!(plays.started[0].0, ticket);
            assert_eq!(plays.started[0].1, 3);
            plays.started[0].2.clone()
        };

        // Not started yet: nothing drives the mouth
        assert_eq!(engine.frame(ms(50)).sync, TickOutcome::Idle);
        assert!(!engine.compositor().is_speaking());

        assert_eq!(engine.playback_started(ticket, ms(100)), Dispatch::Applied);
        clock.set_position(MediaTime::from_millis(50));
        let report = engine.frame(ms(100));
        assert_eq!(report.sync.update().map(|u| u.mouth.clone()), Some(Mouth::shape("A")));
        assert_eq!(engine.compositor().viseme().map(|v| v.as_str()), Some("A"));

        clock.set_position(MediaTime::from_millis(300));
        engine.frame(ms(140));
        assert_eq!(engine.compositor().viseme().map(|v| v.as_str()), Some("M"));

        clock.mark_ended();
        assert_eq!(engine.playback_ended(ticket, ms(160)), Dispatch::Applied);
        let report = engine.frame(ms(170));
        assert!(matches!(
            report.sync,
            TickOutcome::Stopped { reason: StopReason::Completed, .. }
        ));
        assert!(!engine.compositor().is_speaking());
        assert!(engine.log().contains("Audio playback ended"));
    }

    #[test]
    fn test_stale_callbacks_ignored() {
        let audio = RecordingAudio::default();
        let mut engine = engine_with(audio.clone());
        let first = engine.handle_message(SPOKEN, ms(0)).unwrap().unwrap();
        let second = engine.handle_message(SPOKEN, ms(10)).unwrap().unwrap();

        assert_eq!(audio.plays.borrow().stops, 1);
        assert_eq!(engine.playback_started(first, ms(20)), Dispatch::Stale);
        assert!(!engine.scheduler().is_running());
        assert_eq!(engine.playback_failed(first, "late", ms(20)), Dispatch::Stale);
        assert_eq!(engine.playback_ended(first, ms(20)), Dispatch::Stale);
        assert_eq!(engine.stats().stale_callbacks, 3);

        assert_eq!(engine.playback_started(second, ms(30)), Dispatch::Applied);
        assert_eq!(engine.scheduler().ticket(), Some(second));
    }

    #[test]
    fn test_playback_failure_returns_to_rest() {
        let audio = RecordingAudio::default();
        let mut engine = engine_with(audio.clone());
        let ticket = engine.handle_message(SPOKEN, ms(0)).unwrap().unwrap();
        engine.playback_started(ticket, ms(0));
        let clock = audio.plays.borrow().started[0].2.clone();
        clock.set_position(MediaTime::from_millis(50));
        engine.frame(ms(0));
        assert!(engine.compositor().viseme().is_some());

        assert_eq!(engine.playback_failed(ticket, "decode error", ms(10)), Dispatch::Applied);
        assert_eq!(engine.log().last().map(|e| e.text.as_str()), Some("Audio error: decode error"));
        assert!(!engine.compositor().is_speaking());
        assert!(engine.compositor().viseme().is_none());
        assert_eq!(engine.sessions().status(ticket), SessionStatus::Cancelled);

        let report = engine.frame(ms(50));
        assert!(matches!(
            report.sync,
            TickOutcome::Stopped { reason: StopReason::Cancelled, .. }
        ));
        assert_eq!(engine.playback_failed(ticket, "again", ms(60)), Dispatch::Stale);
    }

    #[test]
    fn test_refused_play_is_a_failure() {
        let audio = RecordingAudio {
            refuse: true,
            ..Default::default()
        };
        let mut engine = engine_with(audio);
        let ticket = engine.handle_message(SPOKEN, ms(0)).unwrap().unwrap();

        assert_eq!(engine.stats().playback_failures, 1);
        assert_eq!(engine.sessions().status(ticket), SessionStatus::Cancelled);
        assert!(engine
            .log()
            .last()
            .is_some_and(|e| e.text.starts_with("Audio error:")));
    }

    #[test]
    fn test_undecodable_audio_is_a_failure() {
        let audio = RecordingAudio::default();
        let mut engine = engine_with(audio.clone());
        let bad = SPOKEN.replace("AAEC", "%%%");
        let ticket = engine.handle_message(&bad, ms(0)).unwrap();

        assert!(ticket.is_none());
        assert!(audio.plays.borrow().started.is_empty());
        assert_eq!(engine.stats().playback_failures, 1);
        assert!(!engine.compositor().is_speaking());
        assert!(engine
            .log()
            .last()
            .is_some_and(|e| e.text.starts_with("Audio error:")));

        for frame in 0..40 {
            assert!(engine.frame(ms(frame * 16)).sync.update().is_none());
        }
        assert!(engine.compositor().viseme().is_none());
    }

    #[test]
    fn test_stop_silences_audio_past_completion() {
        let audio = RecordingAudio::default();
        let mut engine = engine_with(audio.clone());
        let ticket = engine.handle_message(SPOKEN, ms(0)).unwrap().unwrap();
        engine.playback_started(ticket, ms(0));
        let clock = audio.plays.borrow().started[0].2.clone();

        // Past the completion threshold while the player keeps going
        clock.set_position(MediaTime::from_millis(500));
        let report = engine.frame(ms(500));
        assert!(matches!(
            report.sync,
            TickOutcome::Stopped { reason: StopReason::Completed, .. }
        ));
        assert_eq!(engine.sessions().status(ticket), SessionStatus::Ended);
        assert_eq!(audio.plays.borrow().stops, 0);

        assert!(engine.stop(ms(600)));
        assert_eq!(audio.plays.borrow().stops, 1);
        assert!(!engine.log().contains("Simulated lip-sync complete"));
    }

    #[test]
    fn test_new_response_silences_ended_audio() {
        let audio = RecordingAudio::default();
        let mut engine = engine_with(audio.clone());
        let first = engine.handle_message(SPOKEN, ms(0)).unwrap().unwrap();
        engine.playback_started(first, ms(0));
        let clock = audio.plays.borrow().started[0].2.clone();
        clock.set_position(MediaTime::from_millis(500));
        engine.frame(ms(500));
        assert_eq!(engine.sessions().status(first), SessionStatus::Ended);

        engine.handle_message(SPOKEN, ms(600)).unwrap();
        assert_eq!(audio.plays.borrow().stops, 1);
    }

    #[test]
    fn test_user_stop() {
        let mut engine = engine_with(RecordingAudio::default());
        engine.handle_message(SILENT, ms(0)).unwrap();
        engine.frame(ms(0));

        assert!(engine.stop(ms(20)));
        assert!(engine.log().contains("Playback stopped by user"));
        assert!(!engine.compositor().is_speaking());

        let report = engine.frame(ms(40));
        assert_eq!(report.sync.update().map(|u| u.mouth.clone()), Some(Mouth::Rest));
        assert!(!engine.stop(ms(60)));
    }

    #[test]
    fn test_hidden_frames_do_nothing() {
        let mut engine = engine_with(RecordingAudio::default());
        engine.handle_message(SILENT, ms(0)).unwrap();
        engine.frame(ms(0));

        engine.set_visible(false, ms(10));
        let report = engine.frame(ms(100));
        assert_eq!(report.sync, TickOutcome::Paused);
        assert!(report.composite.is_none());

        engine.set_visible(true, ms(300));
        let report = engine.frame(ms(300));
        assert_eq!(report.sync.update().map(|u| u.mouth.clone()), Some(Mouth::shape("M")));
    }

    #[test]
    fn test_blinks_from_idle_motion() {
        let mut config = EngineConfig::deterministic(3);
        config.idle = IdleConfig {
            blink_interval_ms: (300, 300),
            seed: Some(3),
            ..IdleConfig::still()
        };
        let mut engine =
            AvatarEngine::new(config, Box::new(RecordingAudio::default()), Box::new(NullSink)).unwrap();

        let blinks = (0..125).filter(|i| engine.frame(ms(i * 16)).blinked).count();
        assert!(blinks >= 4, "only {blinks} blinks");
        assert!(engine.compositor().blink().completed() >= 3);
    }

    #[test]
    fn test_compose_user_message() {
        let mut engine = engine_with(RecordingAudio::default());
        assert!(engine.compose_user_message("   ").is_none());
        assert!(engine.log().is_empty());

        let message = engine.compose_user_message("  hello ").unwrap();
        assert_eq!(message, OutboundMessage::UserMessage { text: "hello".to_string() });
        assert!(engine.log().contains("You: hello"));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = EngineConfig::default();
        config.user_log_capacity = 0;
        let result = AvatarEngine::new(config, Box::new(RecordingAudio::default()), Box::new(NullSink));
        assert!(matches!(result, Err(VisageError::InvalidConfig(_))));
    }
}
