//! Controller behavior against a scripted photo API.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use image::{DynamicImage, ImageFormat, RgbImage};
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use unsplash_grid::app::{NotificationStream, SearchSettings};
use unsplash_grid::domain::{ImageBytes, Page, Query};
use unsplash_grid::{decode_selected, Notification, PhotoApi, SearchController, SearchError};

const WAIT: Duration = Duration::from_secs(5);

struct Shared {
    pages: Mutex<HashMap<(String, u32), Vec<String>>>,
    failing_searches: Mutex<HashSet<(String, u32)>>,
    held_queries: Mutex<HashSet<String>>,
    failing_urls: Mutex<HashSet<String>>,
    download_delay: Mutex<Duration>,
    gate: watch::Sender<bool>,
    png: ImageBytes,
    search_calls: AtomicUsize,
    cancel_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Shared {
    async fn wait_gate(&self) {
        let mut open = self.gate.subscribe();
        let _ = open.wait_for(|open| *open).await;
    }
}

/// Decrements the in-flight count even when the download is aborted.
struct InFlight(Arc<Shared>);

impl InFlight {
    fn enter(shared: &Arc<Shared>) -> Self {
        let now = shared.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        shared.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(Arc::clone(shared))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Clone)]
struct FakeApi(Arc<Shared>);

impl FakeApi {
    fn new() -> Self {
        let mut png = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(2, 3))
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();

        let (gate, _) = watch::channel(true);
        Self(Arc::new(Shared {
            pages: Mutex::default(),
            failing_searches: Mutex::default(),
            held_queries: Mutex::default(),
            failing_urls: Mutex::default(),
            download_delay: Mutex::new(Duration::ZERO),
            gate,
            png: ImageBytes::from(png),
            search_calls: AtomicUsize::new(0),
            cancel_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }))
    }

    fn page(self, query: &str, page: u32, urls: &[&str]) -> Self {
        self.0.pages.lock().unwrap().insert(
            (query.to_string(), page),
            urls.iter().map(|u| (*u).to_string()).collect(),
        );
        self
    }

    fn failing_search(self, query: &str, page: u32) -> Self {
        self.0
            .failing_searches
            .lock()
            .unwrap()
            .insert((query.to_string(), page));
        self
    }

    fn held_query(self, query: &str) -> Self {
        self.hold(query);
        self
    }

    /// Blocks searches for `query` and all downloads until the gate opens.
    fn hold(&self, query: &str) {
        self.0.held_queries.lock().unwrap().insert(query.to_string());
        self.close_gate();
    }

    fn failing_url(self, url: &str) -> Self {
        self.0.failing_urls.lock().unwrap().insert(url.to_string());
        self
    }

    fn download_delay(self, delay: Duration) -> Self {
        *self.0.download_delay.lock().unwrap() = delay;
        self
    }

    fn close_gate(&self) {
        self.0.gate.send_replace(false);
    }

    fn open_gate(&self) {
        self.0.gate.send_replace(true);
    }

    fn in_flight(&self) -> usize {
        self.0.in_flight.load(Ordering::SeqCst)
    }

    fn max_in_flight(&self) -> usize {
        self.0.max_in_flight.load(Ordering::SeqCst)
    }

    fn search_calls(&self) -> usize {
        self.0.search_calls.load(Ordering::SeqCst)
    }

    fn cancel_calls(&self) -> usize {
        self.0.cancel_calls.load(Ordering::SeqCst)
    }
}

impl PhotoApi for FakeApi {
    fn search_photos(
        &self,
        query: &Query,
        page: Page,
        _per_page: u32,
    ) -> BoxFuture<'static, unsplash_grid::Result<Vec<String>>> {
        let shared = Arc::clone(&self.0);
        let key = (query.as_str().to_string(), page.get());

        async move {
            shared.search_calls.fetch_add(1, Ordering::SeqCst);
            let held = shared.held_queries.lock().unwrap().contains(&key.0);
            if held {
                shared.wait_gate().await;
            }
            if shared.failing_searches.lock().unwrap().contains(&key) {
                return Err(SearchError::InvalidResponse);
            }
            let urls = shared.pages.lock().unwrap().get(&key).cloned();
            Ok(urls.unwrap_or_default())
        }
        .boxed()
    }

    fn load_image(&self, url: &str) -> BoxFuture<'static, unsplash_grid::Result<ImageBytes>> {
        let shared = Arc::clone(&self.0);
        let url = url.to_string();

        async move {
            let _in_flight = InFlight::enter(&shared);
            shared.wait_gate().await;

            let delay = *shared.download_delay.lock().unwrap();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            if shared.failing_urls.lock().unwrap().contains(&url) {
                return Err(SearchError::NoData);
            }
            Ok(Arc::clone(&shared.png))
        }
        .boxed()
    }

    fn cancel_all(&self) {
        self.0.cancel_calls.fetch_add(1, Ordering::SeqCst);
    }
}

fn controller(api: &FakeApi) -> (SearchController<FakeApi>, NotificationStream) {
    SearchController::new(api.clone(), SearchSettings::default()).unwrap()
}

/// Collects notifications up to and including the first one matching `stop`.
async fn collect_until(
    stream: &mut NotificationStream,
    stop: impl Fn(&Notification) -> bool,
) -> Vec<Notification> {
    let mut seen = Vec::new();
    loop {
        let next = tokio::time::timeout(WAIT, stream.recv())
            .await
            .expect("timed out waiting for a notification")
            .expect("notification stream closed");
        let done = stop(&next);
        seen.push(next);
        if done {
            return seen;
        }
    }
}

async fn until_idle(stream: &mut NotificationStream) -> Vec<Notification> {
    collect_until(stream, |n| *n == Notification::LoadingChanged(false)).await
}

async fn eventually(what: &str, condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + WAIT;
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {what}"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

fn images_updated(notifications: &[Notification]) -> Vec<usize> {
    notifications
        .iter()
        .filter_map(|n| match n {
            Notification::ImagesUpdated { count } => Some(*count),
            _ => None,
        })
        .collect()
}

fn urls(prefix: &str, n: usize) -> Vec<String> {
    (0..n).map(|i| format!("https://img/{prefix}/{i}")).collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_two_results_notify_once_and_finish_idle() {
    let api = FakeApi::new().page("cats", 1, &["https://img/a", "https://img/b"]);
    let (controller, mut stream) = controller(&api);

    controller.set_query(Some("cats"));
    let seen = until_idle(&mut stream).await;

    assert_eq!(images_updated(&seen), vec![2]);
    assert!(seen.contains(&Notification::LoadingChanged(true)));
    assert_eq!(controller.number_of_images(), 2);
    assert!(!controller.is_loading());
    assert_eq!(controller.current_page(), Page::FIRST);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_empty_result_sets_no_results() {
    let api = FakeApi::new();
    let (controller, mut stream) = controller(&api);

    controller.set_query(Some("cats"));
    let seen = until_idle(&mut stream).await;

    assert!(seen.contains(&Notification::NoResultsChanged(true)));
    assert!(controller.no_results_found());
    assert_eq!(controller.number_of_images(), 0);
    assert_eq!(controller.current_page(), Page::FIRST);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reset_during_downloads_discards_everything() {
    let api = FakeApi::new().page("cats", 1, &["https://img/a", "https://img/b", "https://img/c"]);
    api.close_gate();
    let (controller, mut stream) = controller(&api);

    controller.set_query(Some("cats"));
    eventually("downloads to start", || api.in_flight() == 3).await;

    controller.set_query(None);
    assert_eq!(controller.number_of_images(), 0);
    assert!(!controller.is_loading());

    let seen = collect_until(&mut stream, |n| *n == Notification::LoadingChanged(false)).await;
    assert!(seen.contains(&Notification::CacheCleared));

    api.open_gate();
    eventually("aborted downloads to drop", || api.in_flight() == 0).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(controller.number_of_images(), 0);
    assert_eq!(controller.tasks_in_flight(), 0);
    assert!(api.cancel_calls() >= 1);
    assert_eq!(stream.drain(), vec![Notification::ImagesUpdated { count: 0 }]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_downloads_never_exceed_admission_limit() {
    let page = urls("many", 12);
    let refs: Vec<&str> = page.iter().map(String::as_str).collect();
    let api = FakeApi::new()
        .page("cats", 1, &refs)
        .download_delay(Duration::from_millis(20));
    let (controller, mut stream) = controller(&api);

    controller.set_query(Some("cats"));
    let seen = until_idle(&mut stream).await;

    assert_eq!(controller.number_of_images(), 12);
    assert!(api.max_in_flight() <= 5, "max in flight {}", api.max_in_flight());
    assert!(api.max_in_flight() > 1);
    assert_eq!(images_updated(&seen), vec![10, 12]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_double_load_next_page_advances_once() {
    let api = FakeApi::new()
        .page("cats", 1, &["https://img/p1"])
        .page("cats", 2, &["https://img/p2"])
        .page("cats", 3, &["https://img/p3"]);
    let (controller, mut stream) = controller(&api);

    controller.set_query(Some("cats"));
    until_idle(&mut stream).await;

    api.hold("cats");
    controller.load_next_page();
    controller.load_next_page();
    controller.load_next_page();
    eventually("page 2 search to start", || api.search_calls() == 2).await;
    assert_eq!(controller.current_page(), Page::FIRST);

    api.open_gate();
    until_idle(&mut stream).await;

    assert_eq!(api.search_calls(), 2);
    assert_eq!(controller.current_page().get(), 2);
    assert_eq!(controller.number_of_images(), 2);
    assert_eq!(controller.snapshot().url_count, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_out_of_range_lookups_are_not_found() {
    let api = FakeApi::new().page("cats", 1, &["https://img/a"]);
    let (controller, mut stream) = controller(&api);

    controller.set_query(Some("cats"));
    until_idle(&mut stream).await;

    assert!(controller.image(1).is_none());
    assert!(controller.image(usize::MAX).is_none());
    assert!(controller.thumbnail(7).unwrap().is_none());

    controller.image_tapped(1);
    assert!(stream.drain().is_empty());

    controller.image_tapped(0);
    match stream.drain().as_slice() {
        [Notification::ImageSelected(image)] => assert_eq!(image.url, "https://img/a"),
        other => panic!("expected a selection, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_search_failure_reports_and_clears_loading() {
    let api = FakeApi::new().failing_search("cats", 1);
    let (controller, mut stream) = controller(&api);

    controller.set_query(Some("cats"));
    let seen = collect_until(&mut stream, |n| {
        matches!(n, Notification::SearchFailed { .. })
    })
    .await;

    assert!(seen.contains(&Notification::LoadingChanged(false)));
    assert!(!controller.is_loading());
    assert_eq!(controller.number_of_images(), 0);
    assert_eq!(controller.snapshot().url_count, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_single_download_failure_is_omitted() {
    let api = FakeApi::new()
        .page("cats", 1, &["https://img/ok0", "https://img/bad", "https://img/ok1"])
        .failing_url("https://img/bad");
    let (controller, mut stream) = controller(&api);

    controller.set_query(Some("cats"));
    let seen = until_idle(&mut stream).await;

    assert_eq!(controller.number_of_images(), 2);
    assert_eq!(controller.snapshot().url_count, 3);
    assert_eq!(images_updated(&seen), vec![2]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_new_query_supersedes_pending_search() {
    let api = FakeApi::new()
        .page("cats", 1, &["https://img/cat"])
        .page("dogs", 1, &["https://img/dog"])
        .held_query("cats");
    let (controller, mut stream) = controller(&api);

    controller.set_query(Some("cats"));
    eventually("cats search to start", || api.search_calls() == 1).await;

    controller.set_query(Some("dogs"));
    api.open_gate();
    until_idle(&mut stream).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(controller.number_of_images(), 1);
    assert_eq!(controller.image(0).unwrap().url, "https://img/dog");
    assert_eq!(controller.snapshot().query.as_deref(), Some("dogs"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_new_query_discards_previous_downloads() {
    let api = FakeApi::new()
        .page("cats", 1, &["https://img/cat/0", "https://img/cat/1", "https://img/cat/2"])
        .page("dogs", 1, &["https://img/dog"]);
    api.close_gate();
    let (controller, mut stream) = controller(&api);

    controller.set_query(Some("cats"));
    eventually("cat downloads to start", || api.in_flight() == 3).await;

    controller.set_query(Some("dogs"));
    assert_eq!(controller.number_of_images(), 0);
    assert!(controller.is_loading());

    api.open_gate();
    let seen = until_idle(&mut stream).await;
    eventually("downloads to settle", || api.in_flight() == 0).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let images: Vec<String> = (0..controller.number_of_images())
        .filter_map(|i| controller.image(i).map(|image| image.url))
        .collect();
    assert_eq!(images, vec!["https://img/dog"]);
    assert_eq!(controller.snapshot().url_count, 1);
    assert_eq!(images_updated(&seen), vec![0, 1]);
    assert!(!controller.is_loading());
    assert_eq!(controller.tasks_in_flight(), 0);
    assert!(stream.drain().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_thumbnail_is_cached_until_reset() {
    let api = FakeApi::new().page("cats", 1, &["https://img/a"]);
    let (controller, mut stream) = controller(&api);

    controller.set_query(Some("cats"));
    until_idle(&mut stream).await;

    let first = controller.thumbnail(0).unwrap().unwrap();
    let second = controller.thumbnail(0).unwrap().unwrap();
    assert_eq!((first.width(), first.height()), (2, 3));
    assert!(Arc::ptr_eq(&first, &second));

    let selected = controller.image(0).unwrap();
    let detail = decode_selected(&selected).unwrap();
    assert_eq!(detail.height(), 3);

    controller.set_query(Some("  "));
    assert!(stream.drain().contains(&Notification::CacheCleared));
    assert!(controller.thumbnail(0).unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_drop_cancels_outstanding_work() {
    let api = FakeApi::new().page("cats", 1, &["https://img/a", "https://img/b"]);
    api.close_gate();
    let (controller, mut stream) = controller(&api);

    controller.set_query(Some("cats"));
    eventually("downloads to start", || api.in_flight() == 2).await;

    drop(controller);
    eventually("downloads to be aborted", || api.in_flight() == 0).await;
    assert!(api.cancel_calls() >= 1);

    let rest = tokio::time::timeout(WAIT, async {
        let mut rest = Vec::new();
        while let Some(n) = stream.recv().await {
            rest.push(n);
        }
        rest
    })
    .await
    .expect("stream should close once the controller is gone");
    assert!(!rest.iter().any(|n| matches!(n, Notification::ImagesUpdated { count } if *count > 0)));
}
