//! Facial layer compositor
//!
//! Owns the emotion, viseme and blink layer state and produces one
//! `Composite` per frame. Setting the emotion never touches the viseme layer
//! and vice versa; the blink pulse runs on its own.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use visage_core::{AssetId, EmotionId, FrameTime, Mouth, VisageError, VisemeId};

use crate::{
    AssetCatalog, BlinkPulse, Composite, LayerKind, LayerPaint, RenderSink, StaticCatalog,
    Transform2D,
};

/// Compositor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceConfig {
    /// Time for a new expression to reach full opacity
    pub emotion_fade_in_ms: u64,
    /// Time for the mouth layer to ease out when speech stops
    pub viseme_fade_out_ms: u64,
    /// Total blink pulse length
    pub blink_duration_ms: u64,
}

impl Default for FaceConfig {
    fn default() -> Self {
        FaceConfig {
            emotion_fade_in_ms: 330,
            viseme_fade_out_ms: 200,
            blink_duration_ms: 150,
        }
    }
}

impl FaceConfig {
    /// Snappier fades for low-power displays running at reduced frame rates
    pub fn low_power() -> Self {
        FaceConfig {
            emotion_fade_in_ms: 150,
            viseme_fade_out_ms: 100,
            blink_duration_ms: 150,
        }
    }

    pub fn validate(&self) -> Result<(), VisageError> {
        if self.blink_duration_ms < 3 {
            return Err(VisageError::InvalidConfig(
                "blink_duration_ms must be at least 3".to_string(),
            ));
        }
        Ok(())
    }
}

/// Progress per unit of elapsed time; a zero-length fade completes at once
fn fade_fraction(dt: Duration, length_ms: u64) -> f32 {
    if length_ms == 0 {
        1.0
    } else {
        dt.as_secs_f32() * 1000.0 / length_ms as f32
    }
}

#[derive(Debug, Clone)]
struct EmotionLayer {
    id: EmotionId,
    asset: AssetId,
    /// Fade-in progress [0.0 - 1.0]
    progress: f32,
}

#[derive(Debug, Clone, Default)]
struct VisemeLayer {
    /// Mouth shape last requested, `None` at rest
    current: Option<VisemeId>,
    /// Image still on screen (may outlive `current` while fading)
    asset: Option<AssetId>,
    opacity: f32,
    fading: bool,
}

impl VisemeLayer {
    fn snap_hidden(&mut self) {
        self.current = None;
        self.asset = None;
        self.opacity = 0.0;
        self.fading = false;
    }

    fn ease_hidden(&mut self) {
        self.current = None;
        if self.opacity > 0.0 {
            self.fading = true;
        } else {
            self.snap_hidden();
        }
    }
}

/// Layered face state machine
pub struct Compositor {
    config: FaceConfig,
    catalog: Box<dyn AssetCatalog>,
    emotion: EmotionLayer,
    viseme: VisemeLayer,
    blink: BlinkPulse,
    speaking: bool,
    last_advance: Option<FrameTime>,
}

impl Compositor {
    /// Compositor over the default asset catalog
    pub fn new() -> Self {
        Self::with_catalog(FaceConfig::default(), Box::new(StaticCatalog::with_defaults()))
    }

    pub fn with_catalog(config: FaceConfig, catalog: Box<dyn AssetCatalog>) -> Self {
        let neutral = EmotionId::neutral();
        Compositor {
            blink: BlinkPulse::new(Duration::from_millis(config.blink_duration_ms)),
            config,
            catalog,
            emotion: EmotionLayer {
                asset: AssetId::emotion(&neutral),
                id: neutral,
                progress: 1.0,
            },
            viseme: VisemeLayer::default(),
            speaking: false,
            last_advance: None,
        }
    }

    /// Switch expression and restart its fade-in. Returns false if unchanged.
    pub fn set_emotion(&mut self, emotion: EmotionId) -> bool {
        if self.emotion.id == emotion {
            return false;
        }

        let wanted = AssetId::emotion(&emotion);
        let asset = if self.catalog.contains(&wanted) {
            wanted
        } else {
            tracing::warn!(
                error = %VisageError::AssetUnavailable(wanted),
                "falling back to neutral expression"
            );
            AssetId::emotion(&EmotionId::neutral())
        };

        tracing::debug!(from = %self.emotion.id, to = %emotion, "emotion change");
        self.emotion = EmotionLayer {
            id: emotion,
            asset,
            progress: 0.0,
        };
        true
    }

    pub fn emotion(&self) -> &EmotionId {
        &self.emotion.id
    }

    pub fn emotion_asset(&self) -> &AssetId {
        &self.emotion.asset
    }

    pub fn emotion_progress(&self) -> f32 {
        self.emotion.progress
    }

    /// Show a mouth shape, or hide the mouth layer on `Rest`
    ///
    /// Shapes appear at full opacity immediately. Rest snaps while speaking
    /// and eases out otherwise. Returns whether the layer changed.
    pub fn set_viseme(&mut self, mouth: Mouth) -> bool {
        match mouth {
            Mouth::Rest if self.speaking => {
                let changed = self.viseme.current.is_some() || self.viseme.opacity > 0.0;
                self.viseme.snap_hidden();
                changed
            }
            Mouth::Rest => {
                let changed = self.viseme.current.is_some();
                if changed {
                    self.viseme.ease_hidden();
                }
                changed
            }
            Mouth::Shape(id) => {
                if self.viseme.current.as_ref() == Some(&id) {
                    return false;
                }

                let asset = AssetId::viseme(&id);
                if !self.catalog.contains(&asset) {
                    tracing::warn!(
                        error = %VisageError::AssetUnavailable(asset),
                        "showing rest mouth instead"
                    );
                    let changed = self.viseme.current.is_some() || self.viseme.opacity > 0.0;
                    self.viseme.snap_hidden();
                    return changed;
                }

                self.viseme = VisemeLayer {
                    current: Some(id),
                    asset: Some(asset),
                    opacity: 1.0,
                    fading: false,
                };
                true
            }
        }
    }

    /// Mouth shape currently requested
    pub fn viseme(&self) -> Option<&VisemeId> {
        self.viseme.current.as_ref()
    }

    pub fn viseme_opacity(&self) -> f32 {
        self.viseme.opacity
    }

    pub fn is_viseme_fading(&self) -> bool {
        self.viseme.fading
    }

    pub fn start_speaking(&mut self) {
        self.speaking = true;
    }

    /// End speech: forget the current mouth shape and ease the layer out
    pub fn stop_speaking(&mut self) {
        self.speaking = false;
        self.viseme.ease_hidden();
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    /// Drop straight to a closed, silent mouth (used on playback failure)
    pub fn reset_to_rest(&mut self) {
        self.speaking = false;
        self.viseme.snap_hidden();
    }

    /// Start a blink. Refused while one is already running.
    pub fn pulse_blink(&mut self) -> bool {
        self.blink.trigger()
    }

    pub fn blink(&self) -> &BlinkPulse {
        &self.blink
    }

    /// Advance fades and the blink pulse to `now`
    pub fn advance(&mut self, now: FrameTime) {
        let dt = self.last_advance.map(|last| now.since(last)).unwrap_or_default();
        self.last_advance = Some(now);

        if self.emotion.progress < 1.0 {
            let step = fade_fraction(dt, self.config.emotion_fade_in_ms);
            self.emotion.progress = (self.emotion.progress + step).min(1.0);
        }

        if self.viseme.fading {
            let step = fade_fraction(dt, self.config.viseme_fade_out_ms);
            self.viseme.opacity -= step;
            if self.viseme.opacity <= 0.0 {
                self.viseme.snap_hidden();
            }
        }

        self.blink.advance(dt);
    }

    /// Current layers, bottom to top, all under the same transform
    pub fn composite(&self, transform: Transform2D) -> Composite {
        let paint = |layer, asset: Option<AssetId>, opacity: f32| LayerPaint {
            layer,
            asset,
            opacity: opacity.clamp(0.0, 1.0),
            transform,
        };

        Composite::new(vec![
            paint(LayerKind::Base, Some(AssetId::base()), 1.0),
            paint(
                LayerKind::Emotion,
                Some(self.emotion.asset.clone()),
                self.emotion.progress,
            ),
            paint(LayerKind::Viseme, self.viseme.asset.clone(), self.viseme.opacity),
            paint(LayerKind::Blink, Some(AssetId::blink()), self.blink.opacity()),
        ])
    }

    /// Composite and push every layer to the sink, bottom to top
    pub fn render(&self, sink: &mut dyn RenderSink, transform: Transform2D) -> Composite {
        let composite = self.composite(transform);
        for paint in composite.layers() {
            sink.set_layer(paint.layer, paint.asset.as_ref(), paint.opacity);
            sink.set_transform(paint.layer, paint.transform);
        }
        composite
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new()
    }
}
