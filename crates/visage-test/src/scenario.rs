//! Lip-sync scenario runner
//!
//! Steps an `AvatarEngine` frame by frame at a chosen display refresh rate
//! and plays the role of the host:
//! - delivers scripted backend messages and user actions
//! - plays requested audio by writing the `MediaClock` in real time
//! - reports start, end and failure back to the engine
//!
//! Frame intervals get seeded random jitter so runs are reproducible.

use std::collections::VecDeque;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use visage_core::{FrameTime, MediaTime, Mouth, VisageResult};
use visage_runtime::{AvatarEngine, EngineConfig, FrameReport};
use visage_sync::{SessionTicket, TickOutcome};

use crate::{PlayRequest, RecordingSink, ScriptedAudio};

/// How the simulated audio player behaves
#[derive(Clone, Debug)]
pub struct PlaybackModel {
    /// Delay between the play request and the player reporting start
    pub start_delay: Duration,
    /// Position stops advancing at this fraction of the length and the end
    /// is never reported
    pub stall_at: Option<f64>,
    /// Report a failure this long after start
    pub fail_after: Option<(Duration, String)>,
}

impl Default for PlaybackModel {
    fn default() -> Self {
        PlaybackModel {
            start_delay: Duration::from_millis(100),
            stall_at: None,
            fail_after: None,
        }
    }
}

impl PlaybackModel {
    /// Player whose progress freezes just short of the end
    pub fn stalling(fraction: f64) -> Self {
        PlaybackModel {
            stall_at: Some(fraction),
            ..Self::default()
        }
    }

    pub fn failing_after(after: Duration, reason: &str) -> Self {
        PlaybackModel {
            fail_after: Some((after, reason.to_string())),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug)]
pub struct ScenarioConfig {
    /// Display refresh rate
    pub refresh_hz: f64,
    /// Maximum extra delay added to each frame interval
    pub frame_jitter_us: u32,
    pub seed: u64,
    pub playback: PlaybackModel,
    pub engine: EngineConfig,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        ScenarioConfig {
            refresh_hz: 60.0,
            frame_jitter_us: 0,
            seed: 0,
            playback: PlaybackModel::default(),
            engine: EngineConfig::deterministic(0),
        }
    }
}

impl ScenarioConfig {
    pub fn at_refresh(refresh_hz: f64) -> Self {
        ScenarioConfig {
            refresh_hz,
            ..Self::default()
        }
    }

    /// Uneven frame pacing, up to `jitter_us` late per frame
    pub fn jittery(refresh_hz: f64, jitter_us: u32, seed: u64) -> Self {
        ScenarioConfig {
            refresh_hz,
            frame_jitter_us: jitter_us,
            seed,
            engine: EngineConfig::deterministic(seed),
            ..Self::default()
        }
    }
}

/// Host action scheduled at a point in scenario time
#[derive(Clone, Debug, PartialEq)]
pub enum ScriptedEvent {
    Message(String),
    Visibility(bool),
    Stop,
}

/// A mouth update the engine forwarded to the compositor
#[derive(Clone, Debug, PartialEq)]
pub struct AppliedMouth {
    pub at: FrameTime,
    pub ticket: SessionTicket,
    pub mouth: Mouth,
    pub position: MediaTime,
}

#[derive(Clone, Debug, Default)]
pub struct ScenarioResult {
    pub frames: u64,
    pub applied: Vec<AppliedMouth>,
    pub blinks: u64,
    /// Ticks that dropped a superseded run
    pub stale_ticks: u64,
    /// When the player reported start, per session
    pub playback_started: Vec<(SessionTicket, FrameTime)>,
}

impl ScenarioResult {
    /// Labels of every applied mouth, in order
    pub fn labels(&self) -> Vec<String> {
        self.applied.iter().map(|a| a.mouth.label().to_string()).collect()
    }

    pub fn labels_for(&self, ticket: SessionTicket) -> Vec<String> {
        self.applied
            .iter()
            .filter(|a| a.ticket == ticket)
            .map(|a| a.mouth.label().to_string())
            .collect()
    }

    /// First time `label` was applied
    pub fn first_applied(&self, label: &str) -> Option<&AppliedMouth> {
        self.applied.iter().find(|a| a.mouth.label() == label)
    }

    pub fn started_at(&self, ticket: SessionTicket) -> Option<FrameTime> {
        self.playback_started
            .iter()
            .find(|(t, _)| *t == ticket)
            .map(|(_, at)| *at)
    }
}

#[derive(Debug)]
struct ActivePlayback {
    request: PlayRequest,
    requested_at: FrameTime,
    started_at: Option<FrameTime>,
    finished: bool,
}

pub struct LipSyncScenario {
    config: ScenarioConfig,
    engine: AvatarEngine,
    audio: ScriptedAudio,
    sink: RecordingSink,
    rng: StdRng,
    frame_interval: Duration,
    now: FrameTime,
    script: VecDeque<(FrameTime, ScriptedEvent)>,
    active: Option<ActivePlayback>,
    seen_requests: usize,
    seen_stops: u32,
    result: ScenarioResult,
}

impl LipSyncScenario {
    pub fn new(config: ScenarioConfig) -> VisageResult<Self> {
        Self::with_audio(config, ScriptedAudio::new())
    }

    pub fn with_audio(config: ScenarioConfig, audio: ScriptedAudio) -> VisageResult<Self> {
        let sink = RecordingSink::new();
        let engine = AvatarEngine::new(
            config.engine.clone(),
            Box::new(audio.clone()),
            Box::new(sink.clone()),
        )?;

        Ok(LipSyncScenario {
            rng: StdRng::seed_from_u64(config.seed),
            frame_interval: Duration::from_secs_f64(1.0 / config.refresh_hz),
            config,
            engine,
            audio,
            sink,
            now: FrameTime::ZERO,
            script: VecDeque::new(),
            active: None,
            seen_requests: 0,
            seen_stops: 0,
            result: ScenarioResult::default(),
        })
    }

    /// Schedule an event `at` after scenario start
    pub fn schedule(&mut self, at: Duration, event: ScriptedEvent) -> &mut Self {
        let at = FrameTime::ZERO + at;
        let index = self.script.partition_point(|(t, _)| *t <= at);
        self.script.insert(index, (at, event));
        self
    }

    pub fn send_at(&mut self, at: Duration, text: String) -> &mut Self {
        self.schedule(at, ScriptedEvent::Message(text))
    }

    /// Run one frame and move the clock to the next
    pub fn step(&mut self) -> FrameReport {
        self.deliver_due();
        self.sync_audio();
        self.drive_playback();
        self.sync_audio();

        let report = self.engine.frame(self.now);
        self.record(&report);

        let jitter = if self.config.frame_jitter_us > 0 {
            Duration::from_micros(self.rng.gen_range(0..=self.config.frame_jitter_us) as u64)
        } else {
            Duration::ZERO
        };
        self.now = self.now + self.frame_interval + jitter;
        report
    }

    /// Step until `duration` of scenario time has passed
    pub fn run_for(&mut self, duration: Duration) -> &ScenarioResult {
        let end = self.now + duration;
        while self.now < end {
            self.step();
        }
        &self.result
    }

    pub fn engine(&self) -> &AvatarEngine {
        &self.engine
    }

    pub fn sink(&self) -> &RecordingSink {
        &self.sink
    }

    pub fn audio(&self) -> &ScriptedAudio {
        &self.audio
    }

    pub fn result(&self) -> &ScenarioResult {
        &self.result
    }

    pub fn now(&self) -> FrameTime {
        self.now
    }

    fn deliver_due(&mut self) {
        while self.script.front().is_some_and(|(at, _)| *at <= self.now) {
            let Some((_, event)) = self.script.pop_front() else {
                break;
            };
            match event {
                ScriptedEvent::Message(text) => {
                    // Malformed frames are part of some scenarios
                    let _ = self.engine.handle_message(&text, self.now);
                }
                ScriptedEvent::Visibility(visible) => self.engine.set_visible(visible, self.now),
                ScriptedEvent::Stop => {
                    self.engine.stop(self.now);
                }
            }
        }
    }

    /// Mirror what the engine asked of the player since the last check
    fn sync_audio(&mut self) {
        let (requests, stops) = {
            let log = self.audio.log();
            (log.requests.len(), log.stops)
        };

        if stops != self.seen_stops {
            self.seen_stops = stops;
            self.active = None;
        }
        if requests != self.seen_requests {
            self.seen_requests = requests;
            self.active = self.audio.latest().map(|request| ActivePlayback {
                request,
                requested_at: self.now,
                started_at: None,
                finished: false,
            });
        }
    }

    fn drive_playback(&mut self) {
        let now = self.now;
        let Some(active) = self.active.as_mut() else {
            return;
        };
        if active.finished {
            return;
        }
        let ticket = active.request.ticket;
        let clock = active.request.clock.clone();

        let Some(started_at) = active.started_at else {
            if now >= active.requested_at + self.config.playback.start_delay {
                active.started_at = Some(now);
                clock.mark_started();
                self.result.playback_started.push((ticket, now));
                self.engine.playback_started(ticket, now);
            }
            return;
        };

        let elapsed = now.since(started_at);
        if let Some((after, reason)) = &self.config.playback.fail_after {
            if elapsed >= *after {
                active.finished = true;
                self.engine.playback_failed(ticket, reason, now);
                return;
            }
        }

        let length = active.request.length;
        let position = MediaTime::from_micros(elapsed.as_micros() as i64);
        if let Some(fraction) = self.config.playback.stall_at {
            let stall = length.scale(fraction);
            if position >= stall {
                clock.set_position(stall);
                return;
            }
        }

        if position >= length {
            clock.set_position(length);
            clock.mark_ended();
            active.finished = true;
            self.engine.playback_ended(ticket, now);
        } else {
            clock.set_position(position);
        }
    }

    fn record(&mut self, report: &FrameReport) {
        self.result.frames += 1;
        if report.blinked {
            self.result.blinks += 1;
        }
        if let TickOutcome::Stale(_) = report.sync {
            self.result.stale_ticks += 1;
        }
        if let Some(update) = report.sync.update() {
            self.result.applied.push(AppliedMouth {
                at: self.now,
                ticket: update.ticket,
                mouth: update.mouth.clone(),
                position: update.position,
            });
        }
    }
}
