//! The emoji art document and its canonical serialized form.
//!
//! A [`Document`] is a plain value: a background plus stickers in insertion
//! order. The canonical form is JSON:
//!
//! ```text
//! {
//!   "background": {"type": "url", "data": "https://x/img.png"},
//!   "stickers": [{"text": "🏈", "x": 10, "y": -5, "size": 40, "id": 1}],
//!   "next_id": 2
//! }
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{ArtError, ArtResult, Background, Sticker, StickerId};

/// First id handed out by an empty document.
const FIRST_STICKER_ID: u64 = 1;

/// Largest id or counter accepted from a serialized document. Keeping
/// decoded counters in the signed 64-bit range leaves room for every
/// subsequent `add_sticker`.
const MAX_DECODED_ID: u64 = u64::MAX >> 1;

/// An emoji art document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    background: Background,
    stickers: Vec<Sticker>,
    /// Id the next created sticker receives. Always greater than every
    /// existing sticker id, and never decreases.
    next_id: u64,
}

/// Decoded form before invariants are checked.
#[derive(Deserialize)]
struct DocumentWire {
    background: Background,
    stickers: Vec<Sticker>,
    #[serde(default)]
    next_id: u64,
}

impl DocumentWire {
    fn into_document(self) -> ArtResult<Document> {
        let mut seen = HashSet::with_capacity(self.stickers.len());
        for sticker in &self.stickers {
            if !seen.insert(sticker.id()) {
                return Err(ArtError::InvalidDocument(format!(
                    "duplicate sticker id {}",
                    sticker.id()
                )));
            }
        }

        if self.next_id > MAX_DECODED_ID {
            return Err(ArtError::InvalidDocument(format!(
                "sticker id counter {} out of range",
                self.next_id
            )));
        }
        let mut floor = FIRST_STICKER_ID;
        for sticker in &self.stickers {
            let id = sticker.id().get();
            if id >= MAX_DECODED_ID {
                return Err(ArtError::InvalidDocument(format!(
                    "sticker id {id} out of range"
                )));
            }
            floor = floor.max(id + 1);
        }
        if self.next_id < floor {
            tracing::debug!(
                stored = self.next_id,
                repaired = floor,
                "Raising sticker id counter above existing ids"
            );
        }

        Ok(Document {
            background: self.background,
            stickers: self.stickers,
            next_id: self.next_id.max(floor),
        })
    }
}

impl Document {
    /// Create an empty document with a blank background.
    #[must_use]
    pub fn new() -> Self {
        Self {
            background: Background::Blank,
            stickers: Vec::new(),
            next_id: FIRST_STICKER_ID,
        }
    }

    /// The current background.
    #[must_use]
    pub fn background(&self) -> &Background {
        &self.background
    }

    /// Replace the background.
    pub fn set_background(&mut self, background: Background) {
        self.background = background;
    }

    /// All stickers in insertion order.
    #[must_use]
    pub fn stickers(&self) -> &[Sticker] {
        &self.stickers
    }

    /// Look up a sticker by id.
    #[must_use]
    pub fn sticker(&self, id: StickerId) -> Option<&Sticker> {
        self.stickers.iter().find(|s| s.id() == id)
    }

    /// The id the next created sticker will receive.
    #[must_use]
    pub const fn next_id(&self) -> StickerId {
        StickerId::new(self.next_id)
    }

    /// Number of stickers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stickers.len()
    }

    /// Whether the document has no stickers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stickers.is_empty()
    }

    /// Place a new sticker and return a copy of it.
    ///
    /// Duplicate text and positions are allowed; only the id is unique.
    pub fn add_sticker(&mut self, text: impl Into<String>, x: i32, y: i32, size: i32) -> Sticker {
        let id = StickerId::new(self.next_id);
        self.next_id += 1;
        let sticker = Sticker::new(text.into(), x, y, size, id);
        self.stickers.push(sticker.clone());
        sticker
    }

    /// Move a sticker by a delta. Fractional deltas are truncated toward zero.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::StickerNotFound`] if no sticker has this id. The
    /// document is left unchanged.
    pub fn move_sticker(&mut self, id: StickerId, dx: f64, dy: f64) -> ArtResult<()> {
        self.sticker_mut(id)?.offset_by(dx, dy);
        Ok(())
    }

    /// Scale a sticker's size, rounding to nearest with ties away from zero.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::StickerNotFound`] if no sticker has this id. The
    /// document is left unchanged.
    pub fn scale_sticker(&mut self, id: StickerId, factor: f64) -> ArtResult<()> {
        self.sticker_mut(id)?.scale_by(factor);
        Ok(())
    }

    /// Remove a sticker. Its id is not handed out again.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::StickerNotFound`] if no sticker has this id.
    pub fn remove_sticker(&mut self, id: StickerId) -> ArtResult<Sticker> {
        let index = self
            .stickers
            .iter()
            .position(|s| s.id() == id)
            .ok_or(ArtError::StickerNotFound(id))?;
        Ok(self.stickers.remove(index))
    }

    fn sticker_mut(&mut self, id: StickerId) -> ArtResult<&mut Sticker> {
        self.stickers
            .iter_mut()
            .find(|s| s.id() == id)
            .ok_or(ArtError::StickerNotFound(id))
    }

    /// Serialize to the canonical JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::Encoding`] if serialization fails.
    pub fn to_json(&self) -> ArtResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(ArtError::Encoding)
    }

    /// Deserialize from the canonical JSON form.
    ///
    /// A missing or too-small `next_id` is raised above the largest sticker id.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::Decoding`] if the bytes are not a well-formed
    /// document, and [`ArtError::InvalidDocument`] if two stickers share an id
    /// or an id or counter is outside the signed 64-bit range.
    pub fn from_json(bytes: &[u8]) -> ArtResult<Self> {
        let wire: DocumentWire = serde_json::from_slice(bytes).map_err(ArtError::Decoding)?;
        wire.into_document()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
