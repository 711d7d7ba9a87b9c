//! Headless surface that records everything drawn into it.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{
    BannerHost, Control, Downloader, InputField, Page, ProgressTarget, RenderTarget, ScrollTarget,
    Viewport,
};
use crate::api::ApiError;
use crate::notify::Notification;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ElementState {
    pub content: String,
    pub visible: bool,
    pub disabled: bool,
    pub percent: f64,
    pub value: String,
    pub focused: bool,
}

/// One element; implements every element trait so any slot of a [`Page`] can
/// be backed by it.
#[derive(Debug, Default)]
pub struct MemoryElement {
    state: Mutex<ElementState>,
    percent_history: Mutex<Vec<f64>>,
}

impl MemoryElement {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_value(value: &str) -> Arc<Self> {
        let element = Self::default();
        element.state.lock().value = value.to_string();
        Arc::new(element)
    }

    pub fn snapshot(&self) -> ElementState {
        self.state.lock().clone()
    }

    pub fn content(&self) -> String {
        self.state.lock().content.clone()
    }

    pub fn is_visible(&self) -> bool {
        self.state.lock().visible
    }

    pub fn is_disabled(&self) -> bool {
        self.state.lock().disabled
    }

    pub fn percent(&self) -> f64 {
        self.state.lock().percent
    }

    pub fn percent_history(&self) -> Vec<f64> {
        self.percent_history.lock().clone()
    }

    pub fn is_focused(&self) -> bool {
        self.state.lock().focused
    }
}

impl RenderTarget for MemoryElement {
    fn set_content(&self, html: &str) {
        self.state.lock().content = html.to_string();
    }

    fn show(&self) {
        self.state.lock().visible = true;
    }

    fn hide(&self) {
        self.state.lock().visible = false;
    }
}

impl Control for MemoryElement {
    fn set_disabled(&self, disabled: bool) {
        self.state.lock().disabled = disabled;
    }
}

impl ProgressTarget for MemoryElement {
    fn set_percent(&self, percent: f64) {
        self.state.lock().percent = percent;
        self.percent_history.lock().push(percent);
    }
}

impl InputField for MemoryElement {
    fn value(&self) -> String {
        self.state.lock().value.clone()
    }

    fn set_value(&self, value: &str) {
        self.state.lock().value = value.to_string();
    }

    fn focus(&self) {
        self.state.lock().focused = true;
    }
}

#[derive(Debug, Default)]
pub struct MemoryViewport {
    scrolls: Mutex<Vec<ScrollTarget>>,
    locked: Mutex<bool>,
}

impl MemoryViewport {
    pub fn scrolls(&self) -> Vec<ScrollTarget> {
        self.scrolls.lock().clone()
    }

    pub fn is_scroll_locked(&self) -> bool {
        *self.locked.lock()
    }
}

impl Viewport for MemoryViewport {
    fn scroll_to(&self, target: ScrollTarget) {
        self.scrolls.lock().push(target);
    }

    fn set_scroll_locked(&self, locked: bool) {
        *self.locked.lock() = locked;
    }
}

#[derive(Debug, Default)]
struct BannerState {
    visible: Vec<Notification>,
    shown: Vec<Notification>,
}

#[derive(Debug, Default)]
pub struct MemoryBanners {
    state: Mutex<BannerState>,
}

impl MemoryBanners {
    /// Banners currently attached.
    pub fn visible(&self) -> Vec<Notification> {
        self.state.lock().visible.clone()
    }

    /// Every banner ever mounted, oldest first.
    pub fn shown(&self) -> Vec<Notification> {
        self.state.lock().shown.clone()
    }

    pub fn last(&self) -> Option<Notification> {
        self.state.lock().shown.last().cloned()
    }
}

impl BannerHost for MemoryBanners {
    fn mount(&self, notification: &Notification) {
        let mut state = self.state.lock();
        state.visible.push(notification.clone());
        state.shown.push(notification.clone());
    }

    fn unmount(&self, id: u64) {
        self.state.lock().visible.retain(|n| n.id != id);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadRecord {
    pub url: String,
    pub filename: String,
}

#[derive(Debug, Default)]
pub struct RecordingDownloader {
    downloads: Mutex<Vec<DownloadRecord>>,
    failure: Mutex<Option<String>>,
}

impl RecordingDownloader {
    pub fn downloads(&self) -> Vec<DownloadRecord> {
        self.downloads.lock().clone()
    }

    /// Makes every following download fail with `message`.
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock() = Some(message.to_string());
    }
}

#[async_trait]
impl Downloader for RecordingDownloader {
    async fn download(&self, url: &str, filename: &str) -> Result<PathBuf, ApiError> {
        if let Some(message) = self.failure.lock().clone() {
            return Err(ApiError::Application { message });
        }
        self.downloads.lock().push(DownloadRecord {
            url: url.to_string(),
            filename: filename.to_string(),
        });
        Ok(PathBuf::from(filename))
    }
}

/// A fully in-memory page with typed handles to every element.
#[derive(Clone, Debug)]
pub struct MemoryPage {
    pub search_button: Arc<MemoryElement>,
    pub query_input: Arc<MemoryElement>,
    pub max_results_input: Arc<MemoryElement>,
    pub loading_section: Arc<MemoryElement>,
    pub progress_fill: Arc<MemoryElement>,
    pub results_section: Arc<MemoryElement>,
    pub results_stats: Arc<MemoryElement>,
    pub results_list: Arc<MemoryElement>,
    pub export_modal: Arc<MemoryElement>,
    pub banners: Arc<MemoryBanners>,
    pub viewport: Arc<MemoryViewport>,
    pub downloader: Arc<RecordingDownloader>,
}

impl MemoryPage {
    pub fn new() -> Self {
        Self {
            search_button: MemoryElement::new(),
            query_input: MemoryElement::new(),
            max_results_input: MemoryElement::with_value("50"),
            loading_section: MemoryElement::new(),
            progress_fill: MemoryElement::new(),
            results_section: MemoryElement::new(),
            results_stats: MemoryElement::new(),
            results_list: MemoryElement::new(),
            export_modal: MemoryElement::new(),
            banners: Arc::new(MemoryBanners::default()),
            viewport: Arc::new(MemoryViewport::default()),
            downloader: Arc::new(RecordingDownloader::default()),
        }
    }

    pub fn page(&self) -> Page {
        Page {
            search_button: self.search_button.clone(),
            query_input: self.query_input.clone(),
            max_results_input: self.max_results_input.clone(),
            loading_section: self.loading_section.clone(),
            progress_fill: self.progress_fill.clone(),
            results_section: self.results_section.clone(),
            results_stats: self.results_stats.clone(),
            results_list: self.results_list.clone(),
            export_modal: self.export_modal.clone(),
            banners: self.banners.clone(),
            viewport: self.viewport.clone(),
            downloader: self.downloader.clone(),
        }
    }
}

impl Default for MemoryPage {
    fn default() -> Self {
        Self::new()
    }
}
