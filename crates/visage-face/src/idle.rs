//! Idle motion - procedural life while the avatar waits or talks
//!
//! Four independently timed processes:
//! - blink scheduling (randomized interval, partly skipped while speaking)
//! - eye micro-jitter (short randomized interval, small bounded offset)
//! - head tilt (long randomized interval, damped while speaking)
//! - breathing (fixed step, sinusoidal in an accumulating phase)
//!
//! They combine additively into one transform shared by every layer. The
//! generator never touches expression or mouth state; a due blink is only
//! reported back to the caller.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use visage_core::{FrameTime, VisageError};

use crate::{Transform2D, Vec2};

/// Idle motion configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdleConfig {
    /// Blink interval range (ms)
    pub blink_interval_ms: (u64, u64),
    /// Probability of skipping a scheduled blink while speaking
    pub blink_skip_while_speaking: f64,
    /// Eye jitter resample interval range (ms)
    pub eye_jitter_interval_ms: (u64, u64),
    /// Full horizontal/vertical eye jitter span (px), centered on zero
    pub eye_jitter_span: (f32, f32),
    /// Head tilt resample interval range (ms)
    pub head_tilt_interval_ms: (u64, u64),
    /// Full head tilt span (degrees), centered on zero
    pub head_tilt_span_deg: f32,
    /// Tilt multiplier while speaking
    pub speaking_tilt_damping: f32,
    /// Breathing step (ms)
    pub breath_step_ms: u64,
    /// Phase advance per breathing step
    pub breath_phase_step: f32,
    /// Breathing amplitude (px)
    pub breath_amplitude: (f32, f32),
    /// Vertical breathing frequency relative to horizontal
    pub breath_y_ratio: f32,
    /// Most breathing steps replayed after a long gap
    pub max_breath_catchup: u32,
    /// Fixed RNG seed; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for IdleConfig {
    fn default() -> Self {
        IdleConfig {
            blink_interval_ms: (2000, 4500),
            blink_skip_while_speaking: 0.3,
            eye_jitter_interval_ms: (150, 350),
            eye_jitter_span: (0.8, 0.6),
            head_tilt_interval_ms: (2000, 5000),
            head_tilt_span_deg: 1.5,
            speaking_tilt_damping: 0.2,
            breath_step_ms: 40,
            breath_phase_step: 0.02,
            breath_amplitude: (0.1, 0.08),
            breath_y_ratio: 0.7,
            max_breath_catchup: 25,
            seed: None,
        }
    }
}

impl IdleConfig {
    /// Motionless avatar: no jitter, no tilt, no breathing (blinks remain)
    pub fn still() -> Self {
        IdleConfig {
            eye_jitter_span: (0.0, 0.0),
            head_tilt_span_deg: 0.0,
            breath_amplitude: (0.0, 0.0),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), VisageError> {
        let ranges = [
            ("blink_interval_ms", self.blink_interval_ms),
            ("eye_jitter_interval_ms", self.eye_jitter_interval_ms),
            ("head_tilt_interval_ms", self.head_tilt_interval_ms),
        ];
        for (name, (min, max)) in ranges {
            if min == 0 || min > max {
                return Err(VisageError::InvalidConfig(format!(
                    "{name} must satisfy 0 < min <= max, got ({min}, {max})"
                )));
            }
        }
        if self.breath_step_ms == 0 {
            return Err(VisageError::InvalidConfig(
                "breath_step_ms must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.blink_skip_while_speaking) {
            return Err(VisageError::InvalidConfig(
                "blink_skip_while_speaking must be within [0, 1]".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.speaking_tilt_damping) {
            return Err(VisageError::InvalidConfig(
                "speaking_tilt_damping must be within [0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}

/// Current idle offsets
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IdleMotionState {
    pub eye_jitter: Vec2,
    /// Degrees
    pub head_tilt: f32,
    pub breath_offset: Vec2,
    /// Breathing phase (radians)
    pub phase: f64,
}

impl IdleMotionState {
    /// Combined transform: translate by jitter plus breath, rotate by tilt
    pub fn transform(&self) -> Transform2D {
        Transform2D {
            translate: self.eye_jitter.add(&self.breath_offset),
            rotate_deg: self.head_tilt,
        }
    }
}

/// Result of one idle step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdleOutput {
    pub transform: Transform2D,
    /// A blink is due; the caller forwards it to the compositor
    pub blink_due: bool,
}

/// Randomized periodic timer
#[derive(Debug, Clone)]
struct Cadence {
    min_ms: u64,
    max_ms: u64,
    next_due: Option<FrameTime>,
}

impl Cadence {
    fn new((min_ms, max_ms): (u64, u64)) -> Self {
        Cadence {
            min_ms,
            max_ms: max_ms.max(min_ms),
            next_due: None,
        }
    }

    fn sample<R: Rng>(&self, rng: &mut R) -> Duration {
        Duration::from_millis(rng.gen_range(self.min_ms..=self.max_ms))
    }

    /// Fires at most once per call and reschedules from `now`, so a long
    /// pause never produces a burst.
    fn fire<R: Rng>(&mut self, now: FrameTime, rng: &mut R) -> bool {
        match self.next_due {
            Some(due) if now < due => false,
            Some(_) => {
                self.next_due = Some(now + self.sample(rng));
                true
            }
            None => {
                self.next_due = Some(now + self.sample(rng));
                false
            }
        }
    }

    fn rebase<R: Rng>(&mut self, now: FrameTime, rng: &mut R) {
        self.next_due = Some(now + self.sample(rng));
    }
}

/// Procedural idle motion
pub struct IdleMotionGenerator<R: Rng = StdRng> {
    config: IdleConfig,
    rng: R,
    state: IdleMotionState,
    blink: Cadence,
    eye_jitter: Cadence,
    head_tilt: Cadence,
    /// Last breathing step
    breath_at: Option<FrameTime>,
    was_speaking: bool,
}

impl IdleMotionGenerator<StdRng> {
    /// Seeded from `config.seed`, or from entropy when unset
    pub fn new(config: IdleConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> IdleMotionGenerator<R> {
    pub fn with_rng(config: IdleConfig, rng: R) -> Self {
        IdleMotionGenerator {
            blink: Cadence::new(config.blink_interval_ms),
            eye_jitter: Cadence::new(config.eye_jitter_interval_ms),
            head_tilt: Cadence::new(config.head_tilt_interval_ms),
            config,
            rng,
            state: IdleMotionState::default(),
            breath_at: None,
            was_speaking: false,
        }
    }

    pub fn state(&self) -> &IdleMotionState {
        &self.state
    }

    pub fn transform(&self) -> Transform2D {
        self.state.transform()
    }

    /// Run every process that is due at `now`
    pub fn advance(&mut self, now: FrameTime, speaking: bool) -> IdleOutput {
        if speaking && !self.was_speaking {
            self.state.head_tilt *= self.config.speaking_tilt_damping;
        }
        self.was_speaking = speaking;

        let mut blink_due = false;
        if self.blink.fire(now, &mut self.rng) {
            blink_due = !speaking || self.rng.gen::<f64>() >= self.config.blink_skip_while_speaking;
        }

        if self.eye_jitter.fire(now, &mut self.rng) {
            self.resample_eye_jitter();
        }

        if self.head_tilt.fire(now, &mut self.rng) {
            self.resample_head_tilt(speaking);
        }

        self.breathe(now);

        IdleOutput {
            transform: self.state.transform(),
            blink_due,
        }
    }

    /// Restart every timer from `now`, e.g. after the display was hidden
    pub fn rebase(&mut self, now: FrameTime) {
        self.blink.rebase(now, &mut self.rng);
        self.eye_jitter.rebase(now, &mut self.rng);
        self.head_tilt.rebase(now, &mut self.rng);
        self.breath_at = Some(now);
    }

    fn centered(&mut self, span: f32) -> f32 {
        (self.rng.gen::<f32>() - 0.5) * span
    }

    fn resample_eye_jitter(&mut self) {
        let (span_x, span_y) = self.config.eye_jitter_span;
        self.state.eye_jitter = Vec2::new(self.centered(span_x), self.centered(span_y));
    }

    fn resample_head_tilt(&mut self, speaking: bool) {
        let tilt = self.centered(self.config.head_tilt_span_deg);
        self.state.head_tilt = if speaking {
            tilt * self.config.speaking_tilt_damping
        } else {
            tilt
        };
    }

    fn breathe(&mut self, now: FrameTime) {
        let step = Duration::from_millis(self.config.breath_step_ms);
        let Some(last) = self.breath_at else {
            self.breath_at = Some(now);
            return;
        };

        let elapsed = now.since(last);
        let due = (elapsed.as_micros() / step.as_micros().max(1)) as u32;
        if due == 0 {
            return;
        }
        self.breath_at = Some(last + step * due);

        let steps = due.min(self.config.max_breath_catchup);
        self.state.phase += f64::from(self.config.breath_phase_step) * f64::from(steps);
        self.state.breath_offset = breath_offset(&self.config, self.state.phase);
    }
}

/// Breathing offset for a phase; pure so it can be checked directly
pub fn breath_offset(config: &IdleConfig, phase: f64) -> Vec2 {
    let (amp_x, amp_y) = config.breath_amplitude;
    let y_phase = phase * f64::from(config.breath_y_ratio);
    Vec2::new(
        phase.sin() as f32 * amp_x,
        y_phase.cos() as f32 * amp_y,
    )
}
