//! Identity types for the avatar engine
//!
//! Viseme and emotion identifiers are an open vocabulary received over the
//! wire, so they are interned as shared strings rather than closed enums.

use std::fmt;
use std::sync::Arc;

/// Session generation - strictly increasing, compared by value
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(pub u64);

impl Generation {
    pub const ZERO: Generation = Generation(0);

    #[inline]
    pub fn new(value: u64) -> Self {
        Generation(value)
    }

    #[inline]
    pub fn next(self) -> Self {
        Generation(self.0.wrapping_add(1))
    }

    #[inline]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gen({})", self.0)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sentinel label for a closed mouth
pub const REST_LABEL: &str = "rest";

/// Mouth-shape identifier (e.g. `A`, `FV`, `M`)
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct VisemeId(Arc<str>);

impl VisemeId {
    pub fn new(label: &str) -> Self {
        VisemeId(Arc::from(label))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for VisemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Viseme({})", self.0)
    }
}

impl fmt::Display for VisemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolved mouth pose: a concrete viseme or the closed rest pose
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub enum Mouth {
    #[default]
    Rest,
    Shape(VisemeId),
}

impl Mouth {
    /// Parse a wire label. Blank labels and `rest` (any case) map to `Rest`.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        if label.is_empty() || label.eq_ignore_ascii_case(REST_LABEL) {
            Mouth::Rest
        } else {
            Mouth::Shape(VisemeId::new(label))
        }
    }

    /// Shorthand for `Mouth::Shape(VisemeId::new(label))`
    pub fn shape(label: &str) -> Self {
        Mouth::Shape(VisemeId::new(label))
    }

    #[inline]
    pub fn is_rest(&self) -> bool {
        matches!(self, Mouth::Rest)
    }

    pub fn viseme(&self) -> Option<&VisemeId> {
        match self {
            Mouth::Rest => None,
            Mouth::Shape(id) => Some(id),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Mouth::Rest => REST_LABEL,
            Mouth::Shape(id) => id.as_str(),
        }
    }
}

impl fmt::Debug for Mouth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mouth({})", self.label())
    }
}

impl fmt::Display for Mouth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Emotion identifier (e.g. `neutral`, `happy`)
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct EmotionId(Arc<str>);

impl EmotionId {
    pub const NEUTRAL: &'static str = "neutral";

    pub fn new(name: &str) -> Self {
        EmotionId(Arc::from(name))
    }

    pub fn neutral() -> Self {
        Self::new(Self::NEUTRAL)
    }

    /// Blank names fall back to neutral
    pub fn from_wire(name: Option<&str>) -> Self {
        match name.map(str::trim) {
            Some(n) if !n.is_empty() => Self::new(n),
            _ => Self::neutral(),
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_neutral(&self) -> bool {
        &*self.0 == Self::NEUTRAL
    }
}

impl Default for EmotionId {
    fn default() -> Self {
        Self::neutral()
    }
}

impl fmt::Debug for EmotionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Emotion({})", self.0)
    }
}

impl fmt::Display for EmotionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Static image/resource identifier understood by the renderer
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AssetId(Arc<str>);

impl AssetId {
    pub fn new(path: &str) -> Self {
        AssetId(Arc::from(path))
    }

    pub fn base() -> Self {
        Self::new("base")
    }

    pub fn blink() -> Self {
        Self::new("blink")
    }

    pub fn emotion(emotion: &EmotionId) -> Self {
        Self::new(&format!("emotions/{}", emotion.as_str()))
    }

    pub fn viseme(viseme: &VisemeId) -> Self {
        Self::new(&format!("visemes/{}", viseme.as_str()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Asset({})", self.0)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
