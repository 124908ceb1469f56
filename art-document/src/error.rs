//! Error types for the document controller's collaborators.

use std::path::PathBuf;

use art_core::ArtError;
use thiserror::Error;

/// Errors that can occur while fetching a remote background.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP layer failed (connection, timeout, body read).
    #[error("background fetch failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("background fetch returned HTTP {0}")]
    Status(u16),
    /// Any other fetcher-specific failure.
    #[error("background fetch failed: {0}")]
    Other(String),
}

/// Errors that can occur while decoding image bytes.
#[derive(Debug, Error)]
pub enum ImageDecodeError {
    /// There were no bytes to decode.
    #[error("image data is empty")]
    Empty,
    /// The bytes are not a supported image.
    #[error("failed to decode image: {0}")]
    Decode(String),
}

/// Errors that can occur while loading or saving the autosaved document.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Nothing has been saved yet.
    #[error("no saved document at {}", .0.display())]
    NotFound(PathBuf),
    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The document could not be encoded or decoded.
    #[error("Document error: {0}")]
    Document(#[from] ArtError),
}
