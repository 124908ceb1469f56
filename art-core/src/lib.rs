//! # Emoji Art Core
//!
//! The document model behind Emoji Art: emoji stickers placed over a
//! background, plus the canonical serialized form used for autosave.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                  art-core                   │
//! ├─────────────────────────────────────────────┤
//! │  Document         │  Canonical form         │
//! │  - Background     │  - JSON encode/decode   │
//! │  - Stickers       │  - Id counter restored  │
//! │  - Id allocation  │  - Invariant checks     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! The document is a plain value. Mutation, autosave and background fetching
//! live in `art-document`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod background;
pub mod document;
pub mod error;
pub mod sticker;

pub use background::Background;
pub use document::Document;
pub use error::{ArtError, ArtResult};
pub use sticker::{Sticker, StickerId};

/// Re-exported so callers can build [`Background::Url`] without a direct
/// dependency.
pub use url::Url;

/// Art core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
