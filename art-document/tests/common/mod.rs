//! Shared helpers for controller integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use art_document::{
    Collaborators, ControllerConfig, DocumentController, DocumentStore, FetchError, ImageFetcher,
    MemoryStore, Snapshot, StoreError,
};
use async_trait::async_trait;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Install a test subscriber once. Later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("art_document=debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Encode a small solid PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([20, 120, 220, 255]));
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}

pub fn url(s: &str) -> Url {
    Url::parse(s).expect("valid url")
}

#[derive(Clone)]
struct Route {
    delay: Duration,
    response: Result<Vec<u8>, String>,
}

/// Fetcher that answers each URL after a fixed delay with a canned response.
#[derive(Default)]
pub struct ScriptedFetcher {
    routes: Mutex<HashMap<String, Route>>,
    calls: Mutex<Vec<Url>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with `body` after `delay`.
    pub fn ok(self, url: &str, delay: Duration, body: Vec<u8>) -> Self {
        self.route(url, delay, Ok(body))
    }

    /// Fail `url` with a network error after `delay`.
    pub fn fail(self, url: &str, delay: Duration) -> Self {
        self.route(url, delay, Err("connection reset".to_string()))
    }

    fn route(self, url: &str, delay: Duration, response: Result<Vec<u8>, String>) -> Self {
        self.routes
            .lock()
            .expect("routes lock")
            .insert(url.to_string(), Route { delay, response });
        self
    }

    /// Every URL requested so far, in order.
    pub fn calls(&self) -> Vec<Url> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl ImageFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        self.calls.lock().expect("calls lock").push(url.clone());
        let route = self.routes.lock().expect("routes lock").get(url.as_str()).cloned();
        let Some(route) = route else {
            return Err(FetchError::Other(format!("no route for {url}")));
        };
        tokio::time::sleep(route.delay).await;
        route.response.map_err(FetchError::Other)
    }
}

/// Store whose saves always fail.
#[derive(Default)]
pub struct FailingStore {
    attempts: AtomicUsize,
}

impl FailingStore {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn load(&self) -> Result<Vec<u8>, StoreError> {
        Err(StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read denied",
        )))
    }

    async fn save(&self, _bytes: &[u8]) -> Result<(), StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "write denied",
        )))
    }
}

/// Memory store whose first save stalls for `delay` before landing.
pub struct SlowFirstStore {
    inner: MemoryStore,
    delay: Duration,
    stalled: AtomicBool,
    started: AtomicUsize,
}

impl SlowFirstStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MemoryStore::new(),
            delay,
            stalled: AtomicBool::new(false),
            started: AtomicUsize::new(0),
        }
    }

    /// Saves that have begun, finished or not.
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Saves that have landed.
    pub fn writes(&self) -> usize {
        self.inner.writes()
    }

    pub fn contents(&self) -> Option<Vec<u8>> {
        self.inner.contents()
    }
}

#[async_trait]
impl DocumentStore for SlowFirstStore {
    async fn load(&self) -> Result<Vec<u8>, StoreError> {
        self.inner.load().await
    }

    async fn save(&self, bytes: &[u8]) -> Result<(), StoreError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        if !self.stalled.swap(true, Ordering::SeqCst) {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.save(bytes).await
    }
}

/// Open a controller with the default config and the given collaborators.
pub async fn open(
    fetcher: Arc<dyn ImageFetcher>,
    store: Option<Arc<dyn DocumentStore>>,
) -> DocumentController {
    init_tracing();
    DocumentController::open_with(&ControllerConfig::new(), Collaborators::new(fetcher, store)).await
}

/// Wait (up to a minute of runtime time) for a snapshot matching `predicate`.
pub async fn wait_for(
    controller: &DocumentController,
    predicate: impl FnMut(&Snapshot) -> bool,
) -> Snapshot {
    let mut rx = controller.subscribe();
    let snapshot = tokio::time::timeout(Duration::from_secs(60), rx.wait_for(predicate))
        .await
        .expect("timed out waiting for snapshot")
        .expect("controller dropped")
        .clone();
    snapshot
}
