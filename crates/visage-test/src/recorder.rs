//! Recording collaborators
//!
//! Both hand out a cloneable handle sharing state with the boxed value the
//! engine owns, so a test can inspect what the engine did.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use visage_core::{AssetId, MediaTime, VisageError, VisageResult};
use visage_face::{LayerKind, RenderSink, Transform2D};
use visage_runtime::AudioOutput;
use visage_sync::SessionTicket;
use visage_time::MediaClock;

use crate::FAKE_AUDIO_RATE;

/// Last paint received for one layer
#[derive(Debug, Clone, PartialEq)]
pub struct LayerRecord {
    pub asset: Option<AssetId>,
    pub opacity: f32,
    pub transform: Transform2D,
}

#[derive(Debug, Default)]
pub struct SinkLog {
    pub layers: HashMap<LayerKind, LayerRecord>,
    /// Visible mouth asset each time it changed (`None` = hidden)
    pub viseme_history: Vec<Option<AssetId>>,
    /// Layer order of every `set_layer` call
    pub paint_calls: Vec<LayerKind>,
    /// Frames where layers disagreed on the transform
    pub transform_mismatches: u64,
}

/// Render sink that records paints
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    log: Rc<RefCell<SinkLog>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> std::cell::Ref<'_, SinkLog> {
        self.log.borrow()
    }

    /// Visible mouth asset, if any
    pub fn visible_viseme(&self) -> Option<AssetId> {
        self.log
            .borrow()
            .layers
            .get(&LayerKind::Viseme)
            .filter(|r| r.opacity > 0.0)
            .and_then(|r| r.asset.clone())
    }

    /// Opacity of a layer as last painted
    pub fn opacity(&self, layer: LayerKind) -> f32 {
        self.log.borrow().layers.get(&layer).map_or(0.0, |r| r.opacity)
    }
}

impl RenderSink for RecordingSink {
    fn set_layer(&mut self, layer: LayerKind, asset: Option<&AssetId>, opacity: f32) {
        let mut log = self.log.borrow_mut();
        log.paint_calls.push(layer);

        let record = log.layers.entry(layer).or_insert(LayerRecord {
            asset: None,
            opacity: 0.0,
            transform: Transform2D::identity(),
        });
        record.asset = asset.cloned();
        record.opacity = opacity;

        if layer == LayerKind::Viseme {
            let visible = asset.filter(|_| opacity > 0.0).cloned();
            if log.viseme_history.last() != Some(&visible) {
                log.viseme_history.push(visible);
            }
        }
    }

    fn set_transform(&mut self, layer: LayerKind, transform: Transform2D) {
        let mut log = self.log.borrow_mut();
        if let Some(record) = log.layers.get_mut(&layer) {
            record.transform = transform;
        }
        // The blink layer is painted last; compare the whole frame there
        if layer == LayerKind::Blink {
            let first = log.layers.get(&LayerKind::Base).map(|r| r.transform);
            let consistent = log.layers.values().all(|r| Some(r.transform) == first);
            if !consistent {
                log.transform_mismatches += 1;
            }
        }
    }
}

/// One `play` request seen by the scripted player
#[derive(Debug, Clone)]
pub struct PlayRequest {
    pub ticket: SessionTicket,
    pub clock: MediaClock,
    /// Playback length implied by the byte count
    pub length: MediaTime,
}

#[derive(Debug, Default)]
pub struct AudioLog {
    pub requests: Vec<PlayRequest>,
    pub stops: u32,
}

/// Audio player that records requests; the scenario runner plays them
#[derive(Debug, Clone, Default)]
pub struct ScriptedAudio {
    log: Rc<RefCell<AudioLog>>,
    refuse: Option<String>,
}

impl ScriptedAudio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Player that rejects every request with `reason`
    pub fn refusing(reason: &str) -> Self {
        ScriptedAudio {
            refuse: Some(reason.to_string()),
            ..Self::default()
        }
    }

    pub fn log(&self) -> std::cell::Ref<'_, AudioLog> {
        self.log.borrow()
    }

    pub fn requests(&self) -> usize {
        self.log.borrow().requests.len()
    }

    pub fn stops(&self) -> u32 {
        self.log.borrow().stops
    }

    pub fn latest(&self) -> Option<PlayRequest> {
        self.log.borrow().requests.last().cloned()
    }
}

impl AudioOutput for ScriptedAudio {
    fn play(&mut self, ticket: SessionTicket, audio: Vec<u8>, clock: MediaClock) -> VisageResult<()> {
        if let Some(reason) = &self.refuse {
            return Err(VisageError::PlaybackFailure {
                generation: ticket.generation(),
                reason: reason.clone(),
            });
        }

        let length = MediaTime::from_secs_f64(audio.len() as f64 / FAKE_AUDIO_RATE as f64);
        self.log.borrow_mut().requests.push(PlayRequest {
            ticket,
            clock,
            length,
        });
        Ok(())
    }

    fn stop(&mut self) {
        self.log.borrow_mut().stops += 1;
    }
}
