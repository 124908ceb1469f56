//! Canvas backdrop.

use serde::{Deserialize, Serialize};
use url::Url;

/// The canvas backdrop: nothing, a remote image, or embedded image bytes.
///
/// Equality is structural, so two `Url` backgrounds pointing at the same
/// address are equal and two `ImageData` backgrounds are equal only when their
/// payloads match byte for byte.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Background {
    /// No background.
    #[default]
    Blank,
    /// A remote image reference.
    Url(Url),
    /// An embedded raw image payload (base64 in the canonical form).
    ImageData(#[serde(with = "base64_bytes")] Vec<u8>),
}

impl Background {
    /// The remote reference, if this background is a URL.
    #[must_use]
    pub fn as_url(&self) -> Option<&Url> {
        match self {
            Self::Url(url) => Some(url),
            _ => None,
        }
    }

    /// Whether this is the blank background.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Blank)
    }
}

impl From<Url> for Background {
    fn from(url: Url) -> Self {
        Self::Url(url)
    }
}

impl std::fmt::Display for Background {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blank => write!(f, "blank"),
            Self::Url(url) => write!(f, "url({url})"),
            Self::ImageData(data) => write!(f, "image data ({} bytes)", data.len()),
        }
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
