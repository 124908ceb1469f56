//! Integration tests for background image resolution.
//!
//! Covers the fetch state machine, the stale-result guard when backgrounds
//! change while a fetch is in flight, and the real HTTP fetcher end to end.

mod common;

use std::sync::Arc;
use std::time::Duration;

use art_core::Background;
use art_document::{
    Collaborators, ControllerConfig, DocumentController, FetchStatus, HttpImageFetcher,
    MemoryStore,
};
use common::{open, png_bytes, url, wait_for, ScriptedFetcher};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const IMG: &str = "https://x/img.png";
const OTHER: &str = "https://x/other.png";

// ===========================================================================
// State machine
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn url_background_resolves_to_image() {
    let fetcher = Arc::new(ScriptedFetcher::new().ok(IMG, Duration::from_secs(1), png_bytes(8, 6)));
    let doc = open(fetcher.clone(), None).await;

    doc.set_background(Background::Url(url(IMG)));
    assert_eq!(doc.fetch_status(), FetchStatus::Fetching(url(IMG)));
    assert!(doc.background_image().is_none());

    let snapshot = wait_for(&doc, |s| s.fetch_status == FetchStatus::Idle).await;
    let image = snapshot.background_image.expect("image resolved");
    assert_eq!((image.width, image.height), (8, 6));
    assert!(!image.is_empty());
    assert_eq!(fetcher.calls(), vec![url(IMG)]);
}

#[tokio::test(start_paused = true)]
async fn network_failure_marks_url_failed() {
    let fetcher = Arc::new(ScriptedFetcher::new().fail(IMG, Duration::from_millis(200)));
    let doc = open(fetcher, None).await;

    doc.set_background(Background::Url(url(IMG)));
    let snapshot = wait_for(&doc, |s| !s.fetch_status.is_fetching()).await;
    assert_eq!(snapshot.fetch_status, FetchStatus::Failed(url(IMG)));
    assert_eq!(snapshot.fetch_status.failed_url(), Some(&url(IMG)));
    assert!(snapshot.background_image.is_none());
}

#[tokio::test(start_paused = true)]
async fn undecodable_body_marks_url_failed() {
    let fetcher = Arc::new(ScriptedFetcher::new().ok(
        IMG,
        Duration::from_millis(10),
        b"<html>not an image</html>".to_vec(),
    ));
    let doc = open(fetcher, None).await;

    doc.set_background(Background::Url(url(IMG)));
    let snapshot = wait_for(&doc, |s| !s.fetch_status.is_fetching()).await;
    assert_eq!(snapshot.fetch_status, FetchStatus::Failed(url(IMG)));
    assert!(snapshot.background_image.is_none());
}

#[tokio::test(start_paused = true)]
async fn equal_background_does_not_refetch() {
    let fetcher = Arc::new(ScriptedFetcher::new().ok(IMG, Duration::from_millis(100), png_bytes(2, 2)));
    let store = Arc::new(MemoryStore::new());
    let doc = open(fetcher.clone(), Some(store)).await;

    doc.set_background(Background::Url(url(IMG)));
    wait_for(&doc, |s| s.fetch_status == FetchStatus::Idle).await;

    doc.set_background(Background::Url(url(IMG)));
    assert_eq!(doc.fetch_status(), FetchStatus::Idle);
    assert!(doc.background_image().is_some());
    // The assignment still counts as an edit for autosave.
    assert!(doc.has_pending_autosave());

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(fetcher.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn different_background_refetches() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .ok(IMG, Duration::from_millis(100), png_bytes(2, 2))
            .ok(OTHER, Duration::from_millis(100), png_bytes(3, 3)),
    );
    let doc = open(fetcher.clone(), None).await;

    doc.set_background(Background::Url(url(IMG)));
    wait_for(&doc, |s| s.fetch_status == FetchStatus::Idle).await;
    doc.set_background(Background::Url(url(OTHER)));
    assert_eq!(doc.fetch_status(), FetchStatus::Fetching(url(OTHER)));
    assert!(doc.background_image().is_none());

    let snapshot = wait_for(&doc, |s| s.fetch_status == FetchStatus::Idle).await;
    assert_eq!(snapshot.background_image.expect("image").width, 3);
    assert_eq!(fetcher.calls(), vec![url(IMG), url(OTHER)]);
}

// ===========================================================================
// Stale-result guard
// ===========================================================================

/// A slow success for A must not overwrite B's failure.
#[tokio::test(start_paused = true)]
async fn superseded_fetch_result_is_discarded() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .ok(IMG, Duration::from_secs(10), png_bytes(5, 5))
            .fail(OTHER, Duration::from_secs(1)),
    );
    let doc = open(fetcher.clone(), None).await;

    doc.set_background(Background::Url(url(IMG)));
    // Let A's request go out before superseding it.
    tokio::time::sleep(Duration::from_millis(100)).await;
    doc.set_background(Background::Url(url(OTHER)));

    let snapshot = wait_for(&doc, |s| !s.fetch_status.is_fetching()).await;
    assert_eq!(snapshot.fetch_status, FetchStatus::Failed(url(OTHER)));

    // Well past A's delay.
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(doc.fetch_status(), FetchStatus::Failed(url(OTHER)));
    assert!(doc.background_image().is_none());
    assert_eq!(fetcher.calls(), vec![url(IMG), url(OTHER)]);
}

/// Leaving and returning to a URL starts a fresh fetch; only the newest one
/// may land.
#[tokio::test(start_paused = true)]
async fn returning_to_a_url_uses_the_newest_fetch() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .ok(IMG, Duration::from_secs(2), png_bytes(7, 7))
            .ok(OTHER, Duration::from_secs(1), png_bytes(1, 1)),
    );
    let doc = open(fetcher.clone(), None).await;

    doc.set_background(Background::Url(url(IMG)));
    tokio::time::sleep(Duration::from_secs(1)).await;
    doc.set_background(Background::Url(url(OTHER)));
    tokio::time::sleep(Duration::from_millis(100)).await;
    doc.set_background(Background::Url(url(IMG)));
    assert_eq!(doc.fetch_status(), FetchStatus::Fetching(url(IMG)));

    let snapshot = wait_for(&doc, |s| s.fetch_status == FetchStatus::Idle).await;
    assert_eq!(snapshot.background_image.expect("image").width, 7);
    assert_eq!(fetcher.calls(), vec![url(IMG), url(OTHER), url(IMG)]);
}

#[tokio::test(start_paused = true)]
async fn switching_to_blank_cancels_fetch() {
    let fetcher = Arc::new(ScriptedFetcher::new().ok(IMG, Duration::from_secs(5), png_bytes(4, 4)));
    let doc = open(fetcher, None).await;

    doc.set_background(Background::Url(url(IMG)));
    doc.set_background(Background::Blank);
    assert_eq!(doc.fetch_status(), FetchStatus::Idle);

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(doc.fetch_status(), FetchStatus::Idle);
    assert!(doc.background_image().is_none());
}

#[tokio::test(start_paused = true)]
async fn switching_to_embedded_image_wins_over_fetch() {
    let fetcher = Arc::new(ScriptedFetcher::new().ok(IMG, Duration::from_secs(5), png_bytes(4, 4)));
    let doc = open(fetcher, None).await;

    doc.set_background(Background::Url(url(IMG)));
    doc.set_background(Background::ImageData(png_bytes(9, 9)));
    assert_eq!(doc.fetch_status(), FetchStatus::Idle);

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(doc.background_image().expect("embedded image").width, 9);
}

// ===========================================================================
// HTTP fetcher end to end
// ===========================================================================

async fn http_controller() -> DocumentController {
    common::init_tracing();
    let fetcher = HttpImageFetcher::new("art-document-test").expect("client");
    DocumentController::open_with(
        &ControllerConfig::new(),
        Collaborators::new(Arc::new(fetcher), None),
    )
    .await
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn http_background_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bg.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes(6, 4)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone.png"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let doc = http_controller().await;

    let good = url(&format!("{}/bg.png", server.uri()));
    doc.set_background(Background::Url(good));
    let snapshot = wait_for(&doc, |s| !s.fetch_status.is_fetching()).await;
    assert_eq!(snapshot.fetch_status, FetchStatus::Idle);
    assert_eq!(snapshot.background_image.expect("image").height, 4);

    let bad = url(&format!("{}/gone.png", server.uri()));
    doc.set_background(Background::Url(bad.clone()));
    let snapshot = wait_for(&doc, |s| !s.fetch_status.is_fetching()).await;
    assert_eq!(snapshot.fetch_status, FetchStatus::Failed(bad));
    assert!(snapshot.background_image.is_none());
}
