//! Layer primitives and the render seam

use visage_core::AssetId;

/// Visual layer, listed bottom to top
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Base,
    Emotion,
    Viseme,
    Blink,
}

impl LayerKind {
    /// All layers in paint order
    pub const PAINT_ORDER: [LayerKind; 4] = [
        LayerKind::Base,
        LayerKind::Emotion,
        LayerKind::Viseme,
        LayerKind::Blink,
    ];

    /// Stacking index handed to the renderer
    pub fn z_index(self) -> u8 {
        match self {
            LayerKind::Base => 1,
            LayerKind::Emotion => 2,
            LayerKind::Viseme => 10,
            LayerKind::Blink => 11,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LayerKind::Base => "base",
            LayerKind::Emotion => "emotion",
            LayerKind::Viseme => "viseme",
            LayerKind::Blink => "blink",
        }
    }
}

/// 2D offset in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn add(&self, other: &Vec2) -> Vec2 {
        Vec2 {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

/// Translate then rotate, applied identically to every layer
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Transform2D {
    pub translate: Vec2,
    /// Rotation in degrees
    pub rotate_deg: f32,
}

impl Transform2D {
    pub fn identity() -> Self {
        Self::default()
    }

    /// CSS-style representation, handy for web renderers and logs
    pub fn to_css(&self) -> String {
        format!(
            "translate({:.3}px, {:.3}px) rotate({:.3}deg)",
            self.translate.x, self.translate.y, self.rotate_deg
        )
    }
}

/// What one layer should show this frame
#[derive(Debug, Clone, PartialEq)]
pub struct LayerPaint {
    pub layer: LayerKind,
    /// `None` leaves the layer without an image (fully hidden)
    pub asset: Option<AssetId>,
    /// Opacity [0.0 - 1.0]
    pub opacity: f32,
    pub transform: Transform2D,
}

impl LayerPaint {
    pub fn is_visible(&self) -> bool {
        self.asset.is_some() && self.opacity > 0.0
    }
}

/// One composited frame, bottom to top
#[derive(Debug, Clone, PartialEq)]
pub struct Composite {
    layers: Vec<LayerPaint>,
}

impl Composite {
    /// Build from paints in any order; they are stacked by z-index
    pub fn new(mut layers: Vec<LayerPaint>) -> Self {
        layers.sort_by_key(|p| p.layer.z_index());
        Composite { layers }
    }

    pub fn layers(&self) -> &[LayerPaint] {
        &self.layers
    }

    pub fn layer(&self, kind: LayerKind) -> Option<&LayerPaint> {
        self.layers.iter().find(|p| p.layer == kind)
    }

    /// Strictly increasing z-index, bottom to top
    pub fn is_paint_ordered(&self) -> bool {
        self.layers
            .windows(2)
            .all(|w| w[0].layer.z_index() < w[1].layer.z_index())
    }
}

/// Rendering collaborator
///
/// Receives, per layer, which image is visible at what opacity and the
/// transform to apply. Calls arrive bottom to top.
pub trait RenderSink {
    fn set_layer(&mut self, layer: LayerKind, asset: Option<&AssetId>, opacity: f32);

    fn set_transform(&mut self, layer: LayerKind, transform: Transform2D);
}

/// Sink that discards everything (headless runs)
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn set_layer(&mut self, _layer: LayerKind, _asset: Option<&AssetId>, _opacity: f32) {}

    fn set_transform(&mut self, _layer: LayerKind, _transform: Transform2D) {}
}
