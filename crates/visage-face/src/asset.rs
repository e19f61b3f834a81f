//! Asset catalog - which images the renderer can actually show

use std::collections::HashSet;

use visage_core::{AssetId, EmotionId, VisemeId};

/// Default mouth-shape vocabulary
pub const DEFAULT_VISEMES: &[&str] = &["A", "B", "C", "D", "E", "FV", "L", "M", "O"];

/// Default expression set
pub const DEFAULT_EMOTIONS: &[&str] = &["neutral", "happy", "sad", "angry", "surprised", "thinking"];

/// Asset collaborator
///
/// Loading and caching are the host's concern; the compositor only asks
/// whether an asset can be shown so it never leaves a layer half-loaded.
pub trait AssetCatalog {
    fn contains(&self, asset: &AssetId) -> bool;
}

/// Catalog that accepts every asset
#[derive(Debug, Default, Clone, Copy)]
pub struct AnyAsset;

impl AssetCatalog for AnyAsset {
    fn contains(&self, _asset: &AssetId) -> bool {
        true
    }
}

/// Fixed set of known assets
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    assets: HashSet<AssetId>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Base, blink, the default visemes and the default emotions
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();
        catalog.insert(AssetId::base());
        catalog.insert(AssetId::blink());
        for v in DEFAULT_VISEMES {
            catalog.insert_viseme(&VisemeId::new(v));
        }
        for e in DEFAULT_EMOTIONS {
            catalog.insert_emotion(&EmotionId::new(e));
        }
        catalog
    }

    pub fn insert(&mut self, asset: AssetId) {
        self.assets.insert(asset);
    }

    pub fn insert_viseme(&mut self, viseme: &VisemeId) {
        self.insert(AssetId::viseme(viseme));
    }

    pub fn insert_emotion(&mut self, emotion: &EmotionId) {
        self.insert(AssetId::emotion(emotion));
    }

    pub fn remove(&mut self, asset: &AssetId) {
        self.assets.remove(asset);
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl AssetCatalog for StaticCatalog {
    fn contains(&self, asset: &AssetId) -> bool {
        self.assets.contains(asset)
    }
}
