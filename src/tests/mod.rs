use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::Notify;

use crate::api::{
    ApiClient, ApiError, CompanyResult, ExportResponse, Rating, SearchRequest, SearchResponse,
};
use crate::controller::{ControllerOptions, ExportOutcome, SearchController, SearchOutcome};
use crate::loading::{BUSY_LABEL, SEARCH_LABEL};
use crate::notify::Severity;
use crate::surface::memory::{DownloadRecord, MemoryPage};
use crate::surface::{InputField, ScrollTarget};

#[derive(Default)]
struct FakeApi {
    health_calls: AtomicUsize,
    scrape_calls: AtomicUsize,
    export_calls: AtomicUsize,
    health_down: AtomicBool,
    gated: AtomicBool,
    gate: Notify,
    scrape_reply: Mutex<Option<Result<SearchResponse, u16>>>,
    export_reply: Mutex<Option<Result<ExportResponse, u16>>>,
    requests: Mutex<Vec<SearchRequest>>,
    exported: Mutex<Vec<Vec<CompanyResult>>>,
}

impl FakeApi {
    fn replying(response: SearchResponse) -> Arc<Self> {
        let api = Self::default();
        *api.scrape_reply.lock() = Some(Ok(response));
        Arc::new(api)
    }

    fn scrape_status(&self, status: u16) {
        *self.scrape_reply.lock() = Some(Err(status));
    }

    fn export_with(&self, reply: Result<ExportResponse, u16>) {
        *self.export_reply.lock() = Some(reply);
    }

    fn hold_scrapes(&self) {
        self.gated.store(true, Ordering::SeqCst);
    }

    fn release_scrape(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl ApiClient for FakeApi {
    async fn health(&self) -> Result<Value, ApiError> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        if self.health_down.load(Ordering::SeqCst) {
            return Err(ApiError::Status { status: 503 });
        }
        Ok(json!({"status": "healthy", "service": "Google Maps Scraper", "version": "1.0.0"}))
    }

    async fn scrape(&self, request: &SearchRequest) -> Result<SearchResponse, ApiError> {
        self.scrape_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());
        if self.gated.load(Ordering::SeqCst) {
            self.gate.notified().await;
        }
        match self.scrape_reply.lock().clone() {
            Some(Ok(response)) => Ok(response),
            Some(Err(status)) => Err(ApiError::Status { status }),
            None => Ok(success(Vec::new())),
        }
    }

    async fn export(&self, results: &[CompanyResult]) -> Result<ExportResponse, ApiError> {
        self.export_calls.fetch_add(1, Ordering::SeqCst);
        self.exported.lock().push(results.to_vec());
        match self.export_reply.lock().clone() {
            Some(Ok(response)) => Ok(response),
            Some(Err(status)) => Err(ApiError::Status { status }),
            None => Ok(ExportResponse {
                success: true,
                download_url: "/static/export_20240101_120000.csv".to_string(),
                filename: "export_20240101_120000.csv".to_string(),
                error: None,
            }),
        }
    }
}

fn success(results: Vec<CompanyResult>) -> SearchResponse {
    SearchResponse {
        success: true,
        total_results: Some(results.len()),
        results,
        error: None,
    }
}

fn company(name: &str, phone: Option<&str>) -> CompanyResult {
    CompanyResult {
        name: Some(name.to_string()),
        phone: phone.map(str::to_string),
        ..Default::default()
    }
}

fn harness(api: Arc<FakeApi>) -> (Arc<SearchController>, MemoryPage) {
    let mem = MemoryPage::new();
    let controller = SearchController::new(api, mem.page(), ControllerOptions::default());
    (Arc::new(controller), mem)
}

async fn search_for(controller: &SearchController, mem: &MemoryPage, query: &str) -> SearchOutcome {
    mem.query_input.set_value(query);
    controller.submit().await
}

fn last_banner(mem: &MemoryPage) -> (Severity, String) {
    let n = mem.banners.last().expect("a banner was shown");
    (n.severity, n.message)
}

#[tokio::test(start_paused = true)]
async fn whitespace_query_warns_without_calling_the_backend() {
    let api = Arc::new(FakeApi::default());
    let (controller, mem) = harness(api.clone());

    let outcome = search_for(&controller, &mem, "   ").await;

    assert_eq!(outcome, SearchOutcome::Rejected);
    assert_eq!(api.scrape_calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        last_banner(&mem),
        (Severity::Warning, "Please enter a search term".to_string())
    );
    assert!(!mem.loading_section.is_visible());
    assert!(!controller.is_loading());
}

#[tokio::test(start_paused = true)]
async fn second_submit_while_in_flight_is_dropped() {
    let api = FakeApi::replying(success(vec![company("Acme", None)]));
    api.hold_scrapes();
    let (controller, mem) = harness(api.clone());
    mem.query_input.set_value("bakeries");

    let first = tokio::spawn({
        let controller = controller.clone();
        async move { controller.submit().await }
    });
    while !controller.is_loading() {
        tokio::task::yield_now().await;
    }

    assert!(mem.loading_section.is_visible());
    assert!(mem.search_button.is_disabled());
    assert_eq!(mem.search_button.content(), BUSY_LABEL);

    assert_eq!(controller.submit().await, SearchOutcome::Busy);
    assert_eq!(api.scrape_calls.load(Ordering::SeqCst), 1);

    api.release_scrape();
    let outcome = first.await.unwrap();
    assert_eq!(outcome, SearchOutcome::Completed { total: 1 });
    assert_eq!(api.scrape_calls.load(Ordering::SeqCst), 1);
    assert!(!controller.is_loading());
    assert!(!mem.search_button.is_disabled());
    assert_eq!(mem.search_button.content(), SEARCH_LABEL);
}

#[tokio::test(start_paused = true)]
async fn perform_search_also_respects_busy_flag() {
    let api = Arc::new(FakeApi::default());
    api.hold_scrapes();
    let (controller, _mem) = harness(api.clone());
    let request = SearchRequest {
        search_query: "cafes".into(),
        max_results: 5,
    };

    let first = tokio::spawn({
        let controller = controller.clone();
        let request = request.clone();
        async move { controller.perform_search(request).await }
    });
    while !controller.is_loading() {
        tokio::task::yield_now().await;
    }
    assert_eq!(controller.perform_search(request).await, SearchOutcome::Busy);

    api.release_scrape();
    assert_eq!(first.await.unwrap(), SearchOutcome::Completed { total: 0 });
}

#[tokio::test(start_paused = true)]
async fn n_results_render_n_rows_and_matching_total() {
    let results: Vec<_> = (0..7).map(|i| company(&format!("Shop {i}"), None)).collect();
    let api = FakeApi::replying(success(results));
    let (controller, mem) = harness(api);

    let outcome = search_for(&controller, &mem, "shops").await;

    assert_eq!(outcome, SearchOutcome::Completed { total: 7 });
    assert_eq!(mem.results_list.content().matches("class=\"result-row\"").count(), 7);
    assert!(mem.results_stats.content().contains(">7</div>"));
    assert_eq!(controller.current_results().len(), 7);
    assert!(mem.results_section.is_visible());
    assert!(!mem.loading_section.is_visible());
    assert_eq!(mem.viewport.scrolls(), vec![ScrollTarget::Results]);
    assert_eq!(
        last_banner(&mem),
        (Severity::Success, "7 companies found!".to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn phone_counter_counts_real_numbers_only() {
    let api = FakeApi::replying(success(vec![
        company("A", Some("(11) 3333-4444")),
        company("B", Some("N/A")),
        company("C", Some("+55 11 98888-7777")),
    ]));
    let (controller, mem) = harness(api);

    search_for(&controller, &mem, "x").await;

    let stats = controller.current_stats().unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.with_phone, 2);
    assert!(mem
        .results_stats
        .content()
        .contains(r#"color: #2196F3;">2</div>"#));
}

#[tokio::test(start_paused = true)]
async fn server_total_is_shown_as_reported() {
    let mut response = success(vec![company("A", None)]);
    response.total_results = Some(40);
    let (controller, mem) = harness(FakeApi::replying(response));

    assert_eq!(
        search_for(&controller, &mem, "x").await,
        SearchOutcome::Completed { total: 40 }
    );
    assert_eq!(controller.current_stats().map(|s| s.total), Some(40));
    assert_eq!(last_banner(&mem).1, "40 companies found!");
}

#[tokio::test(start_paused = true)]
async fn half_star_rating_rounds_up() {
    let mut result = company("Rated", None);
    result.rating = Some(Rating::Text("4.5".into()));
    let (controller, mem) = harness(FakeApi::replying(success(vec![result])));

    search_for(&controller, &mem, "x").await;

    let html = mem.results_list.content();
    assert_eq!(html.matches("#FFD700").count(), 5);
    assert!(html.contains("<span>4.5</span>"));
}

#[tokio::test(start_paused = true)]
async fn empty_results_show_placeholder_and_zero_total() {
    let (controller, mem) = harness(FakeApi::replying(success(Vec::new())));

    let outcome = search_for(&controller, &mem, "nothing here").await;

    assert_eq!(outcome, SearchOutcome::Completed { total: 0 });
    let list = mem.results_list.content();
    assert!(list.contains("No results found"));
    assert!(!list.contains("<table"));
    assert!(mem.results_stats.content().contains(">0</div>"));
    assert!(mem.results_section.is_visible());
    assert_eq!(controller.current_stats().map(|s| s.total), Some(0));
}

#[tokio::test(start_paused = true)]
async fn max_results_input_is_parsed_and_clamped() {
    let api = FakeApi::replying(success(Vec::new()));
    let (controller, mem) = harness(api.clone());

    mem.max_results_input.set_value("500");
    search_for(&controller, &mem, "  clinics ").await;
    mem.max_results_input.set_value("abc");
    search_for(&controller, &mem, "clinics").await;

    let requests = api.requests.lock().clone();
    assert_eq!(requests[0].search_query, "clinics");
    assert_eq!(requests[0].max_results, 200);
    assert_eq!(requests[1].max_results, 50);
}

#[tokio::test(start_paused = true)]
async fn http_error_is_reported_and_ui_recovers() {
    let api = FakeApi::replying(success(vec![company("Kept", None)]));
    let (controller, mem) = harness(api.clone());
    search_for(&controller, &mem, "first").await;

    api.scrape_status(500);
    let outcome = search_for(&controller, &mem, "second").await;

    assert_eq!(
        outcome,
        SearchOutcome::Failed {
            message: "HTTP error! status: 500".into()
        }
    );
    assert_eq!(
        last_banner(&mem),
        (
            Severity::Error,
            "Search failed: HTTP error! status: 500".to_string()
        )
    );
    assert!(!controller.is_loading());
    assert!(!mem.loading_section.is_visible());
    assert!(!mem.search_button.is_disabled());
    assert_eq!(mem.progress_fill.percent(), 0.0);
    // the previous results are still the exportable set
    assert_eq!(controller.current_results().len(), 1);

    *api.scrape_reply.lock() = Some(Ok(success(Vec::new())));
    assert_eq!(
        search_for(&controller, &mem, "third").await,
        SearchOutcome::Completed { total: 0 }
    );
}

#[tokio::test(start_paused = true)]
async fn application_failure_uses_server_message_or_fallback() {
    let api = FakeApi::replying(SearchResponse {
        success: false,
        error: Some("Search query is required".into()),
        ..Default::default()
    });
    let (controller, mem) = harness(api.clone());

    search_for(&controller, &mem, "x").await;
    assert_eq!(last_banner(&mem).1, "Search failed: Search query is required");

    *api.scrape_reply.lock() = Some(Ok(SearchResponse::default()));
    search_for(&controller, &mem, "x").await;
    assert_eq!(last_banner(&mem).1, "Search failed: Unknown error");
}

#[tokio::test(start_paused = true)]
async fn export_without_results_warns_without_calling_the_backend() {
    let api = Arc::new(FakeApi::default());
    let (controller, mem) = harness(api.clone());

    assert_eq!(controller.export().await, ExportOutcome::NothingToExport);
    assert_eq!(api.export_calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        last_banner(&mem),
        (Severity::Warning, "No results to export".to_string())
    );
    assert!(!mem.export_modal.is_visible());
    assert!(mem.downloader.downloads().is_empty());
}

#[tokio::test(start_paused = true)]
async fn export_sends_results_verbatim_and_downloads_the_file() {
    let raw = json!({
        "name": "Padaria Central",
        "phone": "N/A",
        "emails": null,
        "place_id": "abc123",
        "rating": 4.7
    });
    let result: CompanyResult = serde_json::from_value(raw).unwrap();
    let api = FakeApi::replying(success(vec![result.clone()]));
    let (controller, mem) = harness(api.clone());
    search_for(&controller, &mem, "padarias").await;

    let outcome = controller.export().await;

    assert_eq!(
        outcome,
        ExportOutcome::Exported {
            filename: "export_20240101_120000.csv".into(),
            path: "export_20240101_120000.csv".into(),
        }
    );
    assert_eq!(api.exported.lock().clone(), vec![vec![result]]);
    let sent = serde_json::to_value(&api.exported.lock()[0][0]).unwrap();
    assert_eq!(sent["place_id"], "abc123");
    assert_eq!(
        mem.downloader.downloads(),
        vec![DownloadRecord {
            url: "/static/export_20240101_120000.csv".into(),
            filename: "export_20240101_120000.csv".into(),
        }]
    );
    assert_eq!(
        last_banner(&mem),
        (
            Severity::Success,
            "CSV file exported successfully!".to_string()
        )
    );
    assert!(!mem.export_modal.is_visible());
    assert!(!mem.viewport.is_scroll_locked());
    assert!(!controller.modal().is_open());
}

#[tokio::test(start_paused = true)]
async fn export_failures_close_the_modal() {
    let api = FakeApi::replying(success(vec![company("A", None)]));
    let (controller, mem) = harness(api.clone());
    search_for(&controller, &mem, "a").await;

    api.export_with(Ok(ExportResponse {
        success: false,
        error: Some("No results to export".into()),
        ..Default::default()
    }));
    assert_eq!(
        controller.export().await,
        ExportOutcome::Failed {
            message: "No results to export".into()
        }
    );
    assert_eq!(last_banner(&mem).1, "Export failed: No results to export");
    assert!(!mem.export_modal.is_visible());

    api.export_with(Ok(ExportResponse::default()));
    controller.export().await;
    assert_eq!(last_banner(&mem).1, "Export failed: Export error");

    api.export_with(Err(502));
    controller.export().await;
    assert_eq!(
        last_banner(&mem),
        (
            Severity::Error,
            "Export failed: HTTP error! status: 502".to_string()
        )
    );

    api.export_with(Ok(ExportResponse {
        success: true,
        download_url: "/static/a.csv".into(),
        filename: "a.csv".into(),
        error: None,
    }));
    mem.downloader.fail_with("connection reset");
    controller.export().await;
    assert_eq!(last_banner(&mem).1, "Export failed: connection reset");
    assert!(!mem.export_modal.is_visible());
    assert!(!mem.viewport.is_scroll_locked());
}

#[tokio::test(start_paused = true)]
async fn modal_is_open_while_export_is_in_flight() {
    struct SlowExport {
        inner: FakeApi,
        seen_open: Arc<AtomicBool>,
        modal_state: Arc<Mutex<Option<Arc<crate::surface::memory::MemoryElement>>>>,
    }

    #[async_trait]
    impl ApiClient for SlowExport {
        async fn health(&self) -> Result<Value, ApiError> {
            self.inner.health().await
        }

        async fn scrape(&self, request: &SearchRequest) -> Result<SearchResponse, ApiError> {
            self.inner.scrape(request).await
        }

        async fn export(&self, results: &[CompanyResult]) -> Result<ExportResponse, ApiError> {
            if let Some(modal) = self.modal_state.lock().clone() {
                self.seen_open.store(modal.is_visible(), Ordering::SeqCst);
            }
            self.inner.export(results).await
        }
    }

    let seen_open = Arc::new(AtomicBool::new(false));
    let modal_state = Arc::new(Mutex::new(None));
    let inner = FakeApi::default();
    *inner.scrape_reply.lock() = Some(Ok(success(vec![company("A", None)])));
    let api = Arc::new(SlowExport {
        inner,
        seen_open: seen_open.clone(),
        modal_state: modal_state.clone(),
    });
    let mem = MemoryPage::new();
    *modal_state.lock() = Some(mem.export_modal.clone());
    let controller = SearchController::new(api, mem.page(), ControllerOptions::default());

    search_for(&controller, &mem, "a").await;
    controller.export().await;

    assert!(seen_open.load(Ordering::SeqCst));
    assert!(!mem.export_modal.is_visible());
}

#[tokio::test(start_paused = true)]
async fn new_search_resets_the_form() {
    let (controller, mem) = harness(FakeApi::replying(success(vec![company("A", None)])));
    mem.max_results_input.set_value("120");
    search_for(&controller, &mem, "bakeries").await;
    assert!(mem.results_section.is_visible());

    controller.new_search();

    assert_eq!(mem.query_input.value(), "");
    assert_eq!(mem.max_results_input.value(), "50");
    assert!(!mem.results_section.is_visible());
    assert!(controller.current_results().is_empty());
    assert_eq!(controller.current_stats(), None);
    assert!(mem.query_input.is_focused());
    assert_eq!(
        mem.viewport.scrolls().last().copied(),
        Some(ScrollTarget::Top)
    );
}

#[tokio::test(start_paused = true)]
async fn new_search_restores_fifty_even_with_a_configured_default() {
    let mem = MemoryPage::new();
    let options = ControllerOptions {
        default_max_results: 20,
        ..ControllerOptions::default()
    };
    let controller = SearchController::new(
        FakeApi::replying(success(vec![company("A", None)])),
        mem.page(),
        options,
    );
    mem.max_results_input.set_value("120");
    search_for(&controller, &mem, "bakeries").await;

    controller.new_search();
    assert_eq!(mem.max_results_input.value(), "50");
}

#[tokio::test(start_paused = true)]
async fn notifications_expire_and_never_stack() {
    let api = Arc::new(FakeApi::default());
    let (controller, mem) = harness(api);

    search_for(&controller, &mem, "").await;
    controller.export().await;
    search_for(&controller, &mem, "cafes").await;

    assert_eq!(mem.banners.shown().len(), 3);
    assert_eq!(mem.banners.visible().len(), 1);

    tokio::time::sleep(Duration::from_millis(5100)).await;
    assert!(mem.banners.visible().is_empty());
}

#[tokio::test(start_paused = true)]
async fn health_check_failure_is_notified_but_not_fatal() {
    let api = Arc::new(FakeApi::default());
    api.health_down.store(true, Ordering::SeqCst);
    let (controller, mem) = harness(api.clone());

    assert_eq!(controller.initialize().await, None);
    assert_eq!(
        last_banner(&mem),
        (
            Severity::Error,
            "Could not connect to the service".to_string()
        )
    );
    assert_eq!(mem.search_button.content(), SEARCH_LABEL);

    assert_eq!(
        search_for(&controller, &mem, "still works").await,
        SearchOutcome::Completed { total: 0 }
    );
}

#[tokio::test(start_paused = true)]
async fn healthy_backend_shows_no_banner() {
    let api = Arc::new(FakeApi::default());
    let (controller, mem) = harness(api.clone());

    let payload = controller.initialize().await.unwrap();

    assert_eq!(payload["status"], "healthy");
    assert_eq!(api.health_calls.load(Ordering::SeqCst), 1);
    assert!(mem.banners.shown().is_empty());
    assert!(!mem.results_section.is_visible());
}

#[tokio::test(start_paused = true)]
async fn progress_animates_while_waiting_and_resets_after() {
    let api = FakeApi::replying(success(Vec::new()));
    api.hold_scrapes();
    let (controller, mem) = harness(api.clone());
    mem.query_input.set_value("slow");

    let pending = tokio::spawn({
        let controller = controller.clone();
        async move { controller.submit().await }
    });
    while !controller.is_loading() {
        tokio::task::yield_now().await;
    }

    tokio::time::sleep(Duration::from_secs(40)).await;
    let history = mem.progress_fill.percent_history();
    // 30 s of 500 ms ticks, then the safety timeout stops the animation
    assert!(history.len() <= 60);
    assert!(history.iter().all(|p| *p <= 90.0));
    assert!(controller.is_loading());

    api.release_scrape();
    pending.await.unwrap();
    assert_eq!(mem.progress_fill.percent(), 0.0);
    assert!(!mem.loading_section.is_visible());
}
