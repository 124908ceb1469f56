//! Stickers - emoji placed on the canvas.

use serde::{Deserialize, Serialize};

/// Unique identifier for a sticker within a document.
///
/// Ids are handed out by [`Document`](crate::Document) in increasing order and
/// are never reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct StickerId(u64);

impl StickerId {
    /// Wrap a raw id value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for StickerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An emoji placed on the canvas.
///
/// `text` and `id` are fixed at creation. Position and size change only through
/// the owning document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sticker {
    text: String,
    x: i32,
    y: i32,
    size: i32,
    id: StickerId,
}

impl Sticker {
    pub(crate) fn new(text: String, x: i32, y: i32, size: i32, id: StickerId) -> Self {
        Self {
            text,
            x,
            y,
            size,
            id,
        }
    }

    /// The emoji glyph(s).
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Horizontal offset from the canvas center.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical offset from the canvas center.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Point size.
    #[must_use]
    pub const fn size(&self) -> i32 {
        self.size
    }

    /// Stable identifier.
    #[must_use]
    pub const fn id(&self) -> StickerId {
        self.id
    }

    /// Offset the sticker. Fractional deltas are truncated toward zero.
    pub(crate) fn offset_by(&mut self, dx: f64, dy: f64) {
        self.x = self.x.saturating_add(truncate(dx));
        self.y = self.y.saturating_add(truncate(dy));
    }

    /// Multiply the size, rounding to nearest with ties away from zero.
    pub(crate) fn scale_by(&mut self, factor: f64) {
        // f64 -> i32 casts saturate and map NaN to 0
        #[allow(clippy::cast_possible_truncation)]
        let size = (f64::from(self.size) * factor).round() as i32;
        self.size = size;
    }
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn truncate(value: f64) -> i32 {
    value.trunc() as i32
}
