//! Error types for document operations.

use thiserror::Error;

use crate::StickerId;

/// Result type for document operations.
pub type ArtResult<T> = Result<T, ArtError>;

/// Errors that can occur in document operations.
#[derive(Debug, Error)]
pub enum ArtError {
    /// Sticker not found in the document.
    #[error("Sticker not found: {0}")]
    StickerNotFound(StickerId),

    /// The document could not be encoded to its canonical form.
    #[error("Encoding error: {0}")]
    Encoding(#[source] serde_json::Error),

    /// The bytes are not a well-formed document.
    #[error("Decoding error: {0}")]
    Decoding(#[source] serde_json::Error),

    /// The document decoded but violates an invariant.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

impl ArtError {
    /// Returns true if this error came from serializing or deserializing.
    #[must_use]
    pub fn is_serialization(&self) -> bool {
        matches!(
            self,
            Self::Encoding(_) | Self::Decoding(_) | Self::InvalidDocument(_)
        )
    }
}
