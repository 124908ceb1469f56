//! # Emoji Art Document
//!
//! The document controller for Emoji Art. It owns an [`art_core::Document`],
//! applies user intents to it, autosaves it after a quiet period, and resolves
//! the background into a decoded image.
//!
//! ## Architecture
//!
//! ```text
//!   UI intents ──► DocumentController ──► Snapshot (watch channel)
//!                    │            │
//!          debounce  │            │  background changed
//!                    ▼            ▼
//!             DocumentStore   ImageFetcher ─► ImageDecoder
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use art_document::{ControllerConfig, DocumentController};
//!
//! let config = ControllerConfig::new().with_autosave_dir(data_dir);
//! let document = DocumentController::open(&config).await?;
//! let sticker = document.add_emoji("🏈", 10, -5, 40.0);
//! document.scale_sticker(sticker.id(), 1.5);
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod controller;
pub mod decode;
pub mod error;
pub mod fetch;
pub mod state;
pub mod store;

pub use config::{Collaborators, ControllerConfig, AUTOSAVE_FILENAME, DEFAULT_COALESCING_INTERVAL};
pub use controller::DocumentController;
pub use decode::{DecodedImage, ImageDecoder, ImageFormat, RasterDecoder};
pub use error::{FetchError, ImageDecodeError, StoreError};
pub use fetch::{HttpImageFetcher, ImageFetcher};
pub use state::{FetchStatus, Snapshot};
pub use store::{DocumentStore, FileStore, MemoryStore};
