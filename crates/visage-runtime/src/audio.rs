//! Audio output seam
//!
//! The engine never decodes or plays sound. It hands wave bytes and a
//! `MediaClock` handle to the host's player, which writes the playback
//! position into the clock and reports lifecycle events back through
//! `AvatarEngine::playback_started` / `playback_ended` / `playback_failed`.

use visage_core::VisageResult;
use visage_sync::SessionTicket;
use visage_time::MediaClock;

pub trait AudioOutput {
    /// Begin playing `audio` for the session `ticket`
    ///
    /// An `Err` is treated as an immediate playback failure.
    fn play(&mut self, ticket: SessionTicket, audio: Vec<u8>, clock: MediaClock) -> VisageResult<()>;

    /// Stop whatever is playing. Must be safe to call when idle.
    fn stop(&mut self);
}

/// Discards audio and never reports progress (headless hosts)
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioOutput for NullAudio {
    fn play(&mut self, ticket: SessionTicket, audio: Vec<u8>, _clock: MediaClock) -> VisageResult<()> {
        tracing::debug!(?ticket, bytes = audio.len(), "audio discarded");
        Ok(())
    }

    fn stop(&mut self) {}
}
