use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;

use crate::api::{ApiClient, ApiError, CompanyResult, SearchRequest};
use crate::form::{SearchForm, DEFAULT_MAX_RESULTS};
use crate::loading::{LoadingIndicator, LoadingOptions, SEARCH_LABEL};
use crate::modal::Modal;
use crate::notify::{Notifier, DEFAULT_TTL};
use crate::render::{render_results_list, render_stats, ResultStats};
use crate::surface::{Page, ScrollTarget};

#[derive(Clone, Debug)]
pub struct ControllerOptions {
    pub default_max_results: u32,
    pub loading: LoadingOptions,
    pub notification_ttl: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            default_max_results: DEFAULT_MAX_RESULTS,
            loading: LoadingOptions::default(),
            notification_ttl: DEFAULT_TTL,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    Completed { total: usize },
    /// The form did not validate; nothing was sent.
    Rejected,
    /// Another search was still in flight; nothing was sent.
    Busy,
    Failed { message: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExportOutcome {
    Exported { filename: String, path: PathBuf },
    NothingToExport,
    Failed { message: String },
}

#[derive(Default)]
struct ResultSet {
    results: Vec<CompanyResult>,
    total: usize,
    displayed: bool,
}

/// Clears the busy flag and puts the loading UI back, however the search ends.
struct SearchGuard<'a> {
    busy: &'a AtomicBool,
    loading: &'a LoadingIndicator,
}

impl<'a> SearchGuard<'a> {
    fn acquire(busy: &'a AtomicBool, loading: &'a LoadingIndicator) -> Option<Self> {
        busy.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(Self { busy, loading })
    }
}

impl Drop for SearchGuard<'_> {
    fn drop(&mut self) {
        self.loading.hide();
        self.busy.store(false, Ordering::Release);
    }
}

pub struct SearchController {
    client: Arc<dyn ApiClient>,
    page: Page,
    loading: LoadingIndicator,
    notifier: Notifier,
    modal: Modal,
    options: ControllerOptions,
    busy: AtomicBool,
    results: Mutex<ResultSet>,
}

impl SearchController {
    pub fn new(client: Arc<dyn ApiClient>, page: Page, options: ControllerOptions) -> Self {
        let loading = LoadingIndicator::new(&page, options.loading.clone());
        let notifier = Notifier::new(page.banners.clone(), options.notification_ttl);
        let modal = Modal::new(page.export_modal.clone(), page.viewport.clone());
        Self {
            client,
            page,
            loading,
            notifier,
            modal,
            options,
            busy: AtomicBool::new(false),
            results: Mutex::new(ResultSet::default()),
        }
    }

    /// Puts the page in its idle state and probes the backend.
    pub async fn initialize(&self) -> Option<Value> {
        self.page.loading_section.hide();
        self.page.results_section.hide();
        self.page.search_button.set_disabled(false);
        self.page.search_button.set_content(SEARCH_LABEL);
        self.check_health().await
    }

    pub async fn check_health(&self) -> Option<Value> {
        match self.client.health().await {
            Ok(payload) => {
                log::info!("service health: {}", payload);
                Some(payload)
            }
            Err(err) => {
                log::error!("service health check failed: {}", err);
                self.notifier.error("Could not connect to the service");
                None
            }
        }
    }

    /// The search form's submit action.
    pub async fn submit(&self) -> SearchOutcome {
        if self.is_loading() {
            log::debug!("search submitted while another is running, ignoring");
            return SearchOutcome::Busy;
        }

        let form = SearchForm::read(
            &*self.page.query_input,
            &*self.page.max_results_input,
            self.options.default_max_results,
        );
        match form.validate() {
            Ok(request) => self.perform_search(request).await,
            Err(err) => {
                self.notifier.warning(err.to_string());
                SearchOutcome::Rejected
            }
        }
    }

    pub async fn perform_search(&self, request: SearchRequest) -> SearchOutcome {
        let Some(_guard) = SearchGuard::acquire(&self.busy, &self.loading) else {
            return SearchOutcome::Busy;
        };
        self.loading.show();
        log::info!(
            "searching '{}' (max {} results)",
            request.search_query,
            request.max_results
        );

        let response = match self.client.scrape(&request).await {
            Ok(response) if response.success => response,
            Ok(response) => return self.search_failed(response.failure_message("Unknown error")),
            Err(err) => return self.search_failed(err.to_string()),
        };

        let total = response.total();
        {
            let mut set = self.results.lock();
            set.results = response.results;
            set.total = total;
            set.displayed = true;
        }
        self.display_results();
        self.notifier.success(format!("{} companies found!", total));
        SearchOutcome::Completed { total }
    }

    fn search_failed(&self, message: String) -> SearchOutcome {
        log::error!("search failed: {}", message);
        self.notifier.error(format!("Search failed: {}", message));
        self.loading.hide();
        SearchOutcome::Failed { message }
    }

    fn display_results(&self) {
        self.loading.hide();
        self.page.results_section.show();
        self.page.viewport.scroll_to(ScrollTarget::Results);

        let set = self.results.lock();
        let stats = ResultStats::compute(&set.results, set.total);
        self.page.results_stats.set_content(&render_stats(&stats));
        self.page
            .results_list
            .set_content(&render_results_list(&set.results));
    }

    pub async fn export(&self) -> ExportOutcome {
        let results = self.current_results();
        if results.is_empty() {
            self.notifier.warning("No results to export");
            return ExportOutcome::NothingToExport;
        }

        let _session = self.modal.session();
        match self.export_results(&results).await {
            Ok((filename, path)) => {
                log::info!("exported {} results to {}", results.len(), path.display());
                self.notifier.success("CSV file exported successfully!");
                ExportOutcome::Exported { filename, path }
            }
            Err(err) => {
                let message = err.to_string();
                log::error!("export failed: {}", message);
                self.notifier.error(format!("Export failed: {}", message));
                ExportOutcome::Failed { message }
            }
        }
    }

    async fn export_results(
        &self,
        results: &[CompanyResult],
    ) -> Result<(String, PathBuf), ApiError> {
        let response = self.client.export(results).await?;
        if !response.success {
            return Err(ApiError::Application {
                message: response.failure_message("Export error"),
            });
        }
        let path = self
            .page
            .downloader
            .download(&response.download_url, &response.filename)
            .await?;
        Ok((response.filename, path))
    }

    pub fn new_search(&self) {
        *self.results.lock() = ResultSet::default();
        self.page.results_section.hide();
        self.page.query_input.set_value("");
        self.page
            .max_results_input
            .set_value(&DEFAULT_MAX_RESULTS.to_string());
        self.page.viewport.scroll_to(ScrollTarget::Top);
        self.page.query_input.focus();
    }

    pub fn is_loading(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn current_results(&self) -> Vec<CompanyResult> {
        self.results.lock().results.clone()
    }

    /// Stats of the displayed results, `None` when nothing is displayed.
    pub fn current_stats(&self) -> Option<ResultStats> {
        let set = self.results.lock();
        set.displayed.then(|| ResultStats::compute(&set.results, set.total))
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn modal(&self) -> &Modal {
        &self.modal
    }

    pub fn page(&self) -> &Page {
        &self.page
    }
}
