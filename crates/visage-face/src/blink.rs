//! Blink pulse - a self-terminating eyelid animation
//!
//! The pulse runs in three equal phases: closing, holding, opening. It is
//! advanced by the compositor's frame clock and drops back to idle on its
//! own once the full duration has elapsed.

use std::time::Duration;

/// Default total blink length
pub const DEFAULT_BLINK_DURATION: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkPhase {
    Idle,
    Closing,
    Holding,
    Opening,
}

#[derive(Debug, Clone)]
pub struct BlinkPulse {
    /// Total pulse length
    duration: Duration,
    /// Time since trigger, `None` when idle
    elapsed: Option<Duration>,
    /// Completed pulses
    count: u64,
}

impl BlinkPulse {
    pub fn new(duration: Duration) -> Self {
        BlinkPulse {
            duration: duration.max(Duration::from_millis(3)),
            elapsed: None,
            count: 0,
        }
    }

    /// Start a pulse. Refused (returns false) while one is in flight.
    pub fn trigger(&mut self) -> bool {
        if self.elapsed.is_some() {
            return false;
        }
        self.elapsed = Some(Duration::ZERO);
        true
    }

    /// Advance by frame delta; finishes the pulse when due
    pub fn advance(&mut self, dt: Duration) {
        if let Some(elapsed) = self.elapsed {
            let elapsed = elapsed + dt;
            if elapsed >= self.duration {
                self.elapsed = None;
                self.count += 1;
            } else {
                self.elapsed = Some(elapsed);
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.elapsed.is_some()
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn elapsed(&self) -> Option<Duration> {
        self.elapsed
    }

    /// Number of pulses that ran to completion
    pub fn completed(&self) -> u64 {
        self.count
    }

    fn third(&self) -> Duration {
        self.duration / 3
    }

    pub fn phase(&self) -> BlinkPhase {
        match self.elapsed {
            None => BlinkPhase::Idle,
            Some(e) if e < self.third() => BlinkPhase::Closing,
            Some(e) if e < self.third() * 2 => BlinkPhase::Holding,
            Some(_) => BlinkPhase::Opening,
        }
    }

    /// Eyelid layer opacity for the current phase
    pub fn opacity(&self) -> f32 {
        let third = self.third().as_secs_f32();
        match (self.phase(), self.elapsed) {
            (BlinkPhase::Closing, Some(e)) => (e.as_secs_f32() / third).clamp(0.0, 1.0),
            (BlinkPhase::Holding, _) => 1.0,
            (BlinkPhase::Opening, Some(e)) => {
                let into = e.as_secs_f32() - 2.0 * third;
                (1.0 - into / third).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }
}

impl Default for BlinkPulse {
    fn default() -> Self {
        Self::new(DEFAULT_BLINK_DURATION)
    }
}
