//! The document controller: sole mutator of a [`Document`].
//!
//! Every intent clones the current document, edits the clone and swaps it in
//! while holding the controller's single state lock. The same critical section
//! reschedules the autosave timer, starts background resolution when the
//! background changed, and publishes a [`Snapshot`]. Async work (the autosave
//! timer and the background fetch) runs on spawned tasks that re-take the lock
//! to apply their results.
//!
//! ## Background resolution
//!
//! ```text
//! Blank ────────────────────────────────► Idle (no image)
//! ImageData ── decode ──────────────────► Idle (image, or none if undecodable)
//! Url(u) ──► Fetching(u) ── ok ─────────► Idle (image)
//!                        └─ error ──────► Failed(u)
//! ```
//!
//! A fetch result is applied only if the background generation it was started
//! under is still current and the background is still `Url(u)`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use art_core::{Background, Document, Sticker, StickerId};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use url::Url;

use crate::config::{Collaborators, ControllerConfig};
use crate::decode::DecodedImage;
use crate::error::{FetchError, StoreError};
use crate::state::{FetchStatus, Snapshot};
use crate::store::DocumentStore;

/// Handle to an emoji art document and its side effects.
///
/// Cloning is cheap; all clones drive the same document. Intents are
/// synchronous and may be called from any thread.
#[derive(Clone)]
pub struct DocumentController {
    shared: Arc<Shared>,
}

struct Shared {
    state: Mutex<State>,
    collaborators: Collaborators,
    coalescing_interval: Duration,
    runtime: Handle,
    snapshots: watch::Sender<Snapshot>,
    /// Held across every store write. Holds the save generation of the last
    /// document written, so a slower older write never lands after a newer one.
    written: tokio::sync::Mutex<u64>,
}

/// Everything guarded by the single lock.
struct State {
    document: Document,
    background_image: Option<Arc<DecodedImage>>,
    fetch_status: FetchStatus,
    /// Bumped on every background change; fetches carry the value they
    /// started under.
    background_generation: u64,
    fetch_task: Option<JoinHandle<()>>,
    /// Bumped on every reschedule; a timer that wakes under an older value
    /// lost a race with a newer mutation.
    save_generation: u64,
    autosave_task: Option<JoinHandle<()>>,
}

impl State {
    fn new(document: Document) -> Self {
        Self {
            document,
            background_image: None,
            fetch_status: FetchStatus::Idle,
            background_generation: 0,
            fetch_task: None,
            save_generation: 0,
            autosave_task: None,
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            document: self.document.clone(),
            background_image: self.background_image.clone(),
            fetch_status: self.fetch_status.clone(),
        }
    }
}

impl DocumentController {
    /// Open a controller with the default collaborators for `config`.
    ///
    /// The autosaved document is restored if one exists; otherwise the
    /// controller starts with an empty document.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the HTTP client fails to build.
    pub async fn open(config: &ControllerConfig) -> Result<Self, FetchError> {
        let collaborators = Collaborators::from_config(config)?;
        Ok(Self::open_with(config, collaborators).await)
    }

    /// Open a controller with injected collaborators.
    ///
    /// Restore failures (nothing saved, unreadable, malformed) fall back to an
    /// empty document.
    pub async fn open_with(config: &ControllerConfig, collaborators: Collaborators) -> Self {
        let restored = match &collaborators.store {
            Some(store) => match store.load().await {
                Ok(bytes) => match Document::from_json(&bytes) {
                    Ok(document) => {
                        tracing::info!(
                            stickers = document.len(),
                            background = %document.background(),
                            "Restored autosaved document"
                        );
                        Some(document)
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Ignoring malformed autosave");
                        None
                    }
                },
                Err(StoreError::NotFound(_)) => {
                    tracing::debug!("No autosaved document, starting empty");
                    None
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read autosave, starting empty");
                    None
                }
            },
            None => None,
        };

        let is_restored = restored.is_some();
        let state = State::new(restored.unwrap_or_default());
        let (snapshots, _) = watch::channel(state.snapshot());
        let controller = Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                collaborators,
                coalescing_interval: config.coalescing_interval,
                runtime: Handle::current(),
                snapshots,
                written: tokio::sync::Mutex::new(0),
            }),
        };

        if is_restored {
            let mut state = controller.shared.lock();
            Shared::resolve_background(&controller.shared, &mut state);
            controller.shared.publish(&state);
        }
        controller
    }

    // -----------------------------------------------------------------------
    // Intents
    // -----------------------------------------------------------------------

    /// Replace the background.
    ///
    /// Always reschedules autosave. Background resolution restarts only if
    /// `background` differs from the current one.
    pub fn set_background(&self, background: Background) {
        tracing::info!(background = %background, "Background set");
        let mut state = self.shared.lock();
        let mut next = state.document.clone();
        next.set_background(background);
        Shared::commit(&self.shared, &mut state, next);
    }

    /// Place an emoji at integer canvas coordinates.
    ///
    /// `size` is a floating-point point size, as produced by zoom and pinch
    /// gestures, and is truncated toward zero.
    pub fn add_emoji(&self, text: impl Into<String>, x: i32, y: i32, size: f64) -> Sticker {
        let mut state = self.shared.lock();
        let mut next = state.document.clone();
        #[allow(clippy::cast_possible_truncation)]
        let sticker = next.add_sticker(text, x, y, size.trunc() as i32);
        Shared::commit(&self.shared, &mut state, next);
        sticker
    }

    /// Move a sticker by a delta, truncating fractions toward zero.
    ///
    /// Unknown ids are ignored: nothing changes and nothing is saved.
    pub fn move_sticker(&self, id: StickerId, dx: f64, dy: f64) {
        let mut state = self.shared.lock();
        let mut next = state.document.clone();
        if let Err(e) = next.move_sticker(id, dx, dy) {
            tracing::debug!(error = %e, "Ignoring move");
            return;
        }
        Shared::commit(&self.shared, &mut state, next);
    }

    /// Scale a sticker's size, rounding to nearest with ties away from zero.
    ///
    /// Unknown ids are ignored: nothing changes and nothing is saved.
    pub fn scale_sticker(&self, id: StickerId, factor: f64) {
        let mut state = self.shared.lock();
        let mut next = state.document.clone();
        if let Err(e) = next.scale_sticker(id, factor) {
            tracing::debug!(error = %e, "Ignoring scale");
            return;
        }
        Shared::commit(&self.shared, &mut state, next);
    }

    // -----------------------------------------------------------------------
    // Observation
    // -----------------------------------------------------------------------

    /// A copy of the current document.
    #[must_use]
    pub fn document(&self) -> Document {
        self.shared.lock().document.clone()
    }

    /// The current stickers in insertion order.
    #[must_use]
    pub fn stickers(&self) -> Vec<Sticker> {
        self.shared.lock().document.stickers().to_vec()
    }

    /// The current background.
    #[must_use]
    pub fn background(&self) -> Background {
        self.shared.lock().document.background().clone()
    }

    /// The decoded background image, if resolution succeeded.
    #[must_use]
    pub fn background_image(&self) -> Option<Arc<DecodedImage>> {
        self.shared.lock().background_image.clone()
    }

    /// Background resolution progress.
    #[must_use]
    pub fn fetch_status(&self) -> FetchStatus {
        self.shared.lock().fetch_status.clone()
    }

    /// Everything at once, consistent with a single point in time.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.shared.lock().snapshot()
    }

    /// Receive a snapshot after every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.shared.snapshots.subscribe()
    }

    /// Whether an autosave timer is waiting to fire.
    #[must_use]
    pub fn has_pending_autosave(&self) -> bool {
        self.shared.lock().autosave_task.is_some()
    }

    /// Cancel the pending autosave timer and save now.
    ///
    /// Waits for an autosave that is already writing, then writes the current
    /// document. Does nothing if autosave is disabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be encoded or written.
    pub async fn flush(&self) -> Result<(), StoreError> {
        let Some(store) = self.shared.collaborators.store.clone() else {
            return Ok(());
        };
        let (generation, bytes) = {
            let mut state = self.shared.lock();
            state.save_generation += 1;
            if let Some(task) = state.autosave_task.take() {
                task.abort();
            }
            (state.save_generation, state.document.to_json()?)
        };
        if self.shared.write(store.as_ref(), generation, &bytes).await? {
            tracing::info!(bytes = bytes.len(), "Flushed document");
        }
        Ok(())
    }
}

impl std::fmt::Debug for DocumentController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("DocumentController")
            .field("stickers", &state.document.len())
            .field("background", &state.document.background().to_string())
            .field("fetch_status", &state.fetch_status)
            .finish_non_exhaustive()
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write `bytes` captured under save generation `generation`.
    ///
    /// Returns `false` without writing if a newer generation is already on
    /// disk.
    async fn write(
        &self,
        store: &dyn DocumentStore,
        generation: u64,
        bytes: &[u8],
    ) -> Result<bool, StoreError> {
        let mut written = self.written.lock().await;
        if *written > generation {
            tracing::debug!(generation, written = *written, "Skipping superseded save");
            return Ok(false);
        }
        store.save(bytes).await?;
        *written = generation;
        Ok(true)
    }

    fn publish(&self, state: &State) {
        self.snapshots.send_replace(state.snapshot());
    }

    /// Swap in a new document and run the side effects of the transition.
    fn commit(shared: &Arc<Self>, state: &mut State, next: Document) {
        let background_changed = next.background() != state.document.background();
        state.document = next;
        Self::schedule_autosave(shared, state);
        if background_changed {
            Self::resolve_background(shared, state);
        }
        shared.publish(state);
    }

    fn schedule_autosave(shared: &Arc<Self>, state: &mut State) {
        state.save_generation += 1;
        if let Some(task) = state.autosave_task.take() {
            task.abort();
        }
        let Some(store) = shared.collaborators.store.clone() else {
            return;
        };

        let generation = state.save_generation;
        let interval = shared.coalescing_interval;
        let owner = Arc::clone(shared);
        state.autosave_task = Some(shared.runtime.spawn(async move {
            tokio::time::sleep(interval).await;

            let encoded = {
                let mut state = owner.lock();
                if state.save_generation != generation {
                    return;
                }
                // Detach so a mutation during the write cannot abort it.
                state.autosave_task = None;
                state.document.to_json()
            };

            match encoded {
                Ok(bytes) => match owner.write(store.as_ref(), generation, &bytes).await {
                    Ok(true) => tracing::info!(bytes = bytes.len(), "Autosaved document"),
                    Ok(false) => {}
                    Err(e) => tracing::warn!(error = %e, "Failed to autosave document"),
                },
                Err(e) => tracing::warn!(error = %e, "Failed to encode document for autosave"),
            }
        }));
    }

    fn resolve_background(shared: &Arc<Self>, state: &mut State) {
        state.background_generation += 1;
        if let Some(task) = state.fetch_task.take() {
            task.abort();
        }
        state.background_image = None;

        match state.document.background().clone() {
            Background::Blank => {
                state.fetch_status = FetchStatus::Idle;
            }
            Background::ImageData(data) => {
                state.fetch_status = FetchStatus::Idle;
                match shared.collaborators.decoder.decode(&data) {
                    Ok(image) => state.background_image = Some(Arc::new(image)),
                    Err(e) => tracing::warn!(error = %e, "Embedded background is not an image"),
                }
            }
            Background::Url(url) => {
                state.fetch_status = FetchStatus::Fetching(url.clone());
                let generation = state.background_generation;
                let fetcher = Arc::clone(&shared.collaborators.fetcher);
                let decoder = Arc::clone(&shared.collaborators.decoder);
                let owner = Arc::downgrade(shared);
                state.fetch_task = Some(shared.runtime.spawn(async move {
                    let outcome = match fetcher.fetch(&url).await {
                        Ok(bytes) => decoder.decode(&bytes).map_err(|e| e.to_string()),
                        Err(e) => Err(e.to_string()),
                    };
                    Self::complete_fetch(&owner, generation, &url, outcome);
                }));
            }
        }
    }

    fn complete_fetch(
        owner: &Weak<Self>,
        generation: u64,
        url: &Url,
        outcome: Result<DecodedImage, String>,
    ) {
        let Some(shared) = owner.upgrade() else {
            return;
        };
        let mut state = shared.lock();
        if state.background_generation != generation
            || state.document.background().as_url() != Some(url)
        {
            tracing::debug!(url = %url, "Discarding stale background fetch");
            return;
        }

        state.fetch_task = None;
        match outcome {
            Ok(image) => {
                tracing::debug!(
                    url = %url,
                    width = image.width,
                    height = image.height,
                    "Background image ready"
                );
                state.background_image = Some(Arc::new(image));
                state.fetch_status = FetchStatus::Idle;
            }
            Err(error) => {
                tracing::warn!(url = %url, error = %error, "Background fetch failed");
                state.background_image = None;
                state.fetch_status = FetchStatus::Failed(url.clone());
            }
        }
        shared.publish(&state);
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = state.fetch_task.take() {
            task.abort();
        }
    }
}
