//! Controller configuration and collaborator wiring.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::decode::{ImageDecoder, RasterDecoder};
use crate::error::FetchError;
use crate::fetch::{HttpImageFetcher, ImageFetcher};
use crate::store::{DocumentStore, FileStore};

/// File name of the autosaved document.
pub const AUTOSAVE_FILENAME: &str = "Autosaved.emojiart";

/// Default coalescing window between a mutation and its autosave.
pub const DEFAULT_COALESCING_INTERVAL: Duration = Duration::from_secs(5);

/// Configuration for a [`DocumentController`](crate::DocumentController).
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Directory holding the autosave file. `None` disables autosave and
    /// restore.
    pub autosave_dir: Option<PathBuf>,
    /// Autosave file name inside `autosave_dir`.
    pub autosave_filename: String,
    /// Quiet period after the last mutation before the document is saved.
    pub coalescing_interval: Duration,
    /// User agent sent by the default HTTP fetcher.
    pub user_agent: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ControllerConfig {
    /// Configuration with autosave disabled and default timings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            autosave_dir: None,
            autosave_filename: AUTOSAVE_FILENAME.to_string(),
            coalescing_interval: DEFAULT_COALESCING_INTERVAL,
            user_agent: format!("emoji-art/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Autosave into `dir`.
    #[must_use]
    pub fn with_autosave_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.autosave_dir = Some(dir.into());
        self
    }

    /// Override the autosave file name.
    #[must_use]
    pub fn with_autosave_filename(mut self, filename: impl Into<String>) -> Self {
        self.autosave_filename = filename.into();
        self
    }

    /// Override the coalescing window.
    #[must_use]
    pub fn with_coalescing_interval(mut self, interval: Duration) -> Self {
        self.coalescing_interval = interval;
        self
    }

    /// Override the HTTP user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Full path of the autosave file, if autosave is enabled.
    #[must_use]
    pub fn autosave_path(&self) -> Option<PathBuf> {
        self.autosave_dir
            .as_ref()
            .map(|dir| dir.join(&self.autosave_filename))
    }
}

/// The external services a controller talks to.
#[derive(Clone)]
pub struct Collaborators {
    /// Downloads remote backgrounds.
    pub fetcher: Arc<dyn ImageFetcher>,
    /// Decodes fetched or embedded image bytes.
    pub decoder: Arc<dyn ImageDecoder>,
    /// Persists the autosaved document. `None` disables autosave.
    pub store: Option<Arc<dyn DocumentStore>>,
}

impl Collaborators {
    /// Build the default collaborators for `config`: an HTTP fetcher, the
    /// raster decoder, and a file store when an autosave directory is set.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the HTTP client fails to build.
    pub fn from_config(config: &ControllerConfig) -> Result<Self, FetchError> {
        let fetcher = HttpImageFetcher::new(&config.user_agent)?;
        let store = config
            .autosave_path()
            .map(|path| Arc::new(FileStore::new(path)) as Arc<dyn DocumentStore>);
        Ok(Self {
            fetcher: Arc::new(fetcher),
            decoder: Arc::new(RasterDecoder),
            store,
        })
    }

    /// Collaborators with the given fetcher and store, and the raster decoder.
    #[must_use]
    pub fn new(fetcher: Arc<dyn ImageFetcher>, store: Option<Arc<dyn DocumentStore>>) -> Self {
        Self {
            fetcher,
            decoder: Arc::new(RasterDecoder),
            store,
        }
    }

    /// Replace the image decoder.
    #[must_use]
    pub fn with_decoder(mut self, decoder: Arc<dyn ImageDecoder>) -> Self {
        self.decoder = decoder;
        self
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("store", &self.store.is_some())
            .finish_non_exhaustive()
    }
}
