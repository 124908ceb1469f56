//! Observable controller state.

use std::sync::Arc;

use art_core::{Background, Document, Sticker};
use url::Url;

use crate::decode::DecodedImage;

/// Progress of background image resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FetchStatus {
    /// Nothing in flight. The image, if any, matches the current background.
    #[default]
    Idle,
    /// Downloading the given URL.
    Fetching(Url),
    /// Fetching or decoding the given URL failed.
    Failed(Url),
}

impl FetchStatus {
    /// Whether a fetch is in flight.
    #[must_use]
    pub fn is_fetching(&self) -> bool {
        matches!(self, Self::Fetching(_))
    }

    /// The URL that failed, if the last resolution failed.
    #[must_use]
    pub fn failed_url(&self) -> Option<&Url> {
        match self {
            Self::Failed(url) => Some(url),
            _ => None,
        }
    }
}

/// Immutable view of the controller, published after every state change.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// The current document.
    pub document: Document,
    /// The decoded background, if resolution succeeded.
    pub background_image: Option<Arc<DecodedImage>>,
    /// Background resolution progress.
    pub fetch_status: FetchStatus,
}

impl Snapshot {
    /// Stickers of the current document.
    #[must_use]
    pub fn stickers(&self) -> &[Sticker] {
        self.document.stickers()
    }

    /// Background of the current document.
    #[must_use]
    pub fn background(&self) -> &Background {
        self.document.background()
    }
}
