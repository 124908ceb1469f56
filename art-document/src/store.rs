//! Autosave persistence backends.
//!
//! The controller persists the canonical document bytes through a
//! [`DocumentStore`]. [`FileStore`] writes a single file at a fixed location;
//! [`MemoryStore`] keeps the bytes in memory for embedding and tests.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StoreError;

/// Durable home for the autosaved document.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read the last saved bytes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if nothing was saved yet, or
    /// [`StoreError::Io`] if reading fails.
    async fn load(&self) -> Result<Vec<u8>, StoreError>;

    /// Replace the saved bytes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if writing fails.
    async fn save(&self, bytes: &[u8]) -> Result<(), StoreError>;
}

/// Single-file store.
///
/// Saves go to a sibling temporary file that is renamed over the target, so a
/// crash mid-write leaves the previous autosave intact. The temporary path is
/// fixed, so saves to one store must not overlap; the controller serializes
/// its writes.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store for the file at `path`. Nothing is touched until the
    /// first load or save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the autosave file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn load(&self) -> Result<Vec<u8>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(self.path.clone()))
            }
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn save(&self, bytes: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let temp = self.temp_path();
        tokio::fs::write(&temp, bytes).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        Ok(())
    }
}

/// In-memory store that counts writes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    contents: Mutex<Option<Vec<u8>>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `bytes`.
    #[must_use]
    pub fn with_contents(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            contents: Mutex::new(Some(bytes.into())),
            writes: AtomicUsize::new(0),
        }
    }

    /// The last saved bytes, if any.
    #[must_use]
    pub fn contents(&self) -> Option<Vec<u8>> {
        self.contents
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Number of completed saves.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn load(&self) -> Result<Vec<u8>, StoreError> {
        self.contents()
            .ok_or_else(|| StoreError::NotFound(PathBuf::from("<memory>")))
    }

    async fn save(&self, bytes: &[u8]) -> Result<(), StoreError> {
        *self
            .contents
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(bytes.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
