//! Tokio host loop
//!
//! Runs an `AvatarEngine` on the current task: a frame ticker at the
//! display rate plus a channel of host events, multiplexed with `select!`.
//! The engine itself is not `Send`; callers await `run` directly (or inside
//! a `LocalSet`).

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use visage_core::{FrameTime, OutboundMessage};
use visage_sync::SessionTicket;

use crate::AvatarEngine;

/// Events delivered to the engine between frames
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// JSON text frame from the backend
    Inbound(String),
    /// Text typed by the user
    UserInput(String),
    PlaybackStarted(SessionTicket),
    PlaybackEnded(SessionTicket),
    PlaybackFailed(SessionTicket, String),
    /// User-requested stop
    Stop,
    Visibility(bool),
    Shutdown,
}

/// Host event sender
pub type HostSender = mpsc::Sender<HostEvent>;

/// Host event receiver
pub type HostReceiver = mpsc::Receiver<HostEvent>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverStats {
    pub frames: u64,
    pub events: u64,
    pub rejected: u64,
    pub outbound: u64,
}

/// Wall clock anchored at driver start
#[derive(Debug, Clone, Copy)]
struct FrameClock {
    origin: Instant,
}

impl FrameClock {
    fn new() -> Self {
        FrameClock {
            origin: Instant::now(),
        }
    }

    fn now(&self) -> FrameTime {
        FrameTime::from_micros(self.origin.elapsed().as_micros() as u64)
    }
}

/// Drive `engine` until `Shutdown` arrives or every sender is dropped
///
/// User messages accepted by the engine are forwarded to `outbound` when
/// one is given.
pub async fn run(
    engine: &mut AvatarEngine,
    mut events: HostReceiver,
    outbound: Option<mpsc::Sender<OutboundMessage>>,
) -> DriverStats {
    let period = Duration::from_secs_f64(1.0 / engine.config().display_rate_hz);
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let clock = FrameClock::new();
    let mut stats = DriverStats::default();
    tracing::info!(?period, "driver started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                engine.frame(clock.now());
                stats.frames += 1;
            }
            event = events.recv() => {
                let Some(event) = event else {
                    tracing::debug!("all host senders dropped");
                    break;
                };
                if event == HostEvent::Shutdown {
                    break;
                }
                stats.events += 1;
                dispatch(engine, event, clock.now(), outbound.as_ref(), &mut stats).await;
            }
        }
    }

    tracing::info!(frames = stats.frames, events = stats.events, "driver stopped");
    stats
}

async fn dispatch(
    engine: &mut AvatarEngine,
    event: HostEvent,
    now: FrameTime,
    outbound: Option<&mpsc::Sender<OutboundMessage>>,
    stats: &mut DriverStats,
) {
    match event {
        HostEvent::Inbound(text) => {
            if engine.handle_message(&text, now).is_err() {
                stats.rejected += 1;
            }
        }
        HostEvent::UserInput(text) => {
            let Some(message) = engine.compose_user_message(&text) else {
                return;
            };
            if let Some(tx) = outbound {
                if tx.send(message).await.is_err() {
                    tracing::warn!("outbound channel closed, user message dropped");
                } else {
                    stats.outbound += 1;
                }
            }
        }
        HostEvent::PlaybackStarted(ticket) => {
            engine.playback_started(ticket, now);
        }
        HostEvent::PlaybackEnded(ticket) => {
            engine.playback_ended(ticket, now);
        }
        HostEvent::PlaybackFailed(ticket, reason) => {
            engine.playback_failed(ticket, &reason, now);
        }
        HostEvent::Stop => {
            engine.stop(now);
        }
        HostEvent::Visibility(visible) => engine.set_visible(visible, now),
        HostEvent::Shutdown => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EngineConfig, NullAudio};
    use visage_face::NullSink;
    use visage_sync::SyncState;

    fn engine() -> AvatarEngine {
        AvatarEngine::new(EngineConfig::deterministic(5), Box::new(NullAudio), Box::new(NullSink)).unwrap()
    }

    const SILENT: &str = r#"{"type":"tts","reply":"ok","emotion":"sad",
        "visemes":[{"start":0,"end":0.3,"viseme":"O"},{"start":0.3,"end":0.6,"viseme":"E"}]}"#;

    #[tokio::test(start_paused = true)]
    async fn test_runs_simulated_response_to_completion() {
        let mut engine = engine();
        let (tx, rx) = mpsc::channel(16);

        tx.send(HostEvent::Inbound(SILENT.to_string())).await.unwrap();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            let _ = tx.send(HostEvent::Shutdown).await;
        });

        let stats = run(&mut engine, rx, None).await;

        assert!(stats.frames >= 100, "only {} frames", stats.frames);
        assert_eq!(stats.events, 1);
        assert_eq!(engine.stats().completed, 1);
        assert!(!engine.compositor().is_speaking());
        assert_eq!(engine.scheduler().state(), SyncState::Idle);
        assert_eq!(engine.compositor().emotion().as_str(), "sad");
    }

    #[tokio::test(start_paused = true)]
    async fn test_forwards_user_input() {
        let mut engine = engine();
        let (tx, rx) = mpsc::channel(16);
        let (out_tx, mut out_rx) = mpsc::channel(4);

        tx.send(HostEvent::UserInput("  hello  ".to_string())).await.unwrap();
        tx.send(HostEvent::UserInput("   ".to_string())).await.unwrap();
        tx.send(HostEvent::Inbound("garbage".to_string())).await.unwrap();
        tx.send(HostEvent::Shutdown).await.unwrap();

        let stats = run(&mut engine, rx, Some(out_tx)).await;

        assert_eq!(stats.outbound, 1);
        assert_eq!(stats.rejected, 1);
        assert_eq!(
            out_rx.recv().await,
            Some(OutboundMessage::UserMessage { text: "hello".to_string() })
        );
        assert!(engine.log().contains("You: hello"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_senders_dropped() {
        let mut engine = engine();
        let (tx, rx) = mpsc::channel(4);
        tx.send(HostEvent::Visibility(false)).await.unwrap();
        drop(tx);

        let stats = run(&mut engine, rx, None).await;
        assert_eq!(stats.events, 1);
        assert!(!engine.is_visible());
    }
}
