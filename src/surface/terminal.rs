//! Terminal front-end for the controller: the loading section and its
//! progress fill are one indicatif bar, the export modal is a spinner and
//! banners are printed as tagged lines. Rendered HTML lands in memory
//! elements so the CLI can summarize it or write it to a report.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use parking_lot::Mutex;
use regex::Regex;

use super::memory::MemoryElement;
use super::{
    BannerHost, Control, Downloader, Page, ProgressTarget, RenderTarget, ScrollTarget, Viewport,
};
use crate::notify::{Notification, Severity};

fn tag_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>|&times;").unwrap())
}

/// Markup reduced to its visible text, whitespace collapsed.
pub fn plain_text(html: &str) -> String {
    let stripped = tag_pattern().replace_all(html, " ");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn draw_target(hidden: bool) -> ProgressDrawTarget {
    if hidden {
        ProgressDrawTarget::hidden()
    } else {
        ProgressDrawTarget::stderr()
    }
}

/// Loading section, progress fill and search button share one bar.
pub struct TerminalLoading {
    bar: ProgressBar,
    hidden: bool,
}

impl TerminalLoading {
    pub fn new(hidden: bool) -> Result<Self, String> {
        let bar = ProgressBar::with_draw_target(Some(100), ProgressDrawTarget::hidden());
        bar.set_style(
            ProgressStyle::with_template(
                ":: Progress: [{bar:30}] {pos:>3}% :: Duration: [{elapsed_precise}] :: {msg}",
            )
            .map_err(|e| format!("failed to build progress bar style: {e}"))?
            .progress_chars(r#"#>-"#),
        );
        Ok(Self { bar, hidden })
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn message(&self) -> String {
        self.bar.message()
    }
}

impl RenderTarget for TerminalLoading {
    fn set_content(&self, html: &str) {
        self.bar.set_message(plain_text(html));
    }

    fn show(&self) {
        self.bar.reset();
        self.bar.set_draw_target(draw_target(self.hidden));
        self.bar.enable_steady_tick(Duration::from_millis(200));
    }

    fn hide(&self) {
        self.bar.disable_steady_tick();
        self.bar.set_draw_target(ProgressDrawTarget::hidden());
    }
}

impl Control for TerminalLoading {
    fn set_disabled(&self, disabled: bool) {
        log::trace!("search control disabled={}", disabled);
    }
}

impl ProgressTarget for TerminalLoading {
    fn set_percent(&self, percent: f64) {
        self.bar.set_position(percent.clamp(0.0, 100.0).round() as u64);
    }
}

/// The export modal as a spinner showing the modal's text.
pub struct TerminalSpinner {
    bar: ProgressBar,
    hidden: bool,
    text: Mutex<String>,
}

impl TerminalSpinner {
    pub fn new(hidden: bool) -> Self {
        Self {
            bar: ProgressBar::hidden(),
            hidden,
            text: Mutex::new(String::new()),
        }
    }

    pub fn text(&self) -> String {
        self.text.lock().clone()
    }
}

impl RenderTarget for TerminalSpinner {
    fn set_content(&self, html: &str) {
        *self.text.lock() = plain_text(html);
    }

    fn show(&self) {
        self.bar.reset();
        self.bar.set_style(ProgressStyle::default_spinner());
        self.bar.set_message(self.text());
        self.bar.set_draw_target(draw_target(self.hidden));
        self.bar.enable_steady_tick(Duration::from_millis(100));
    }

    fn hide(&self) {
        self.bar.disable_steady_tick();
        self.bar.finish_and_clear();
        self.bar.set_draw_target(ProgressDrawTarget::hidden());
    }
}

pub fn banner_line(notification: &Notification) -> String {
    let tag = match notification.severity {
        Severity::Success => "[OK]".bold().green(),
        Severity::Error => "[ERR]".bold().red(),
        Severity::Warning => "[WRN]".bold().yellow(),
        Severity::Info => "[INF]".bold().blue(),
    };
    format!("{} {}", tag, notification.message)
}

/// Prints each banner once; a printed line cannot be taken back.
#[derive(Default)]
pub struct TerminalBanners;

impl BannerHost for TerminalBanners {
    fn mount(&self, notification: &Notification) {
        eprintln!("{}", banner_line(notification));
    }

    fn unmount(&self, id: u64) {
        log::trace!("banner {} dismissed", id);
    }
}

#[derive(Default)]
pub struct TerminalViewport;

impl Viewport for TerminalViewport {
    fn scroll_to(&self, target: ScrollTarget) {
        log::debug!("scroll to {:?}", target);
    }

    fn set_scroll_locked(&self, locked: bool) {
        log::trace!("scroll locked={}", locked);
    }
}

pub struct TerminalSurface {
    pub loading: Arc<TerminalLoading>,
    pub modal: Arc<TerminalSpinner>,
    pub banners: Arc<TerminalBanners>,
    pub viewport: Arc<TerminalViewport>,
    pub query_input: Arc<MemoryElement>,
    pub max_results_input: Arc<MemoryElement>,
    pub results_section: Arc<MemoryElement>,
    pub results_stats: Arc<MemoryElement>,
    pub results_list: Arc<MemoryElement>,
}

impl TerminalSurface {
    /// `hide_progress` keeps the bars off screen, e.g. when stderr is not a terminal.
    pub fn new(hide_progress: bool, default_max_results: u32) -> Result<Self, String> {
        Ok(Self {
            loading: Arc::new(TerminalLoading::new(hide_progress)?),
            modal: Arc::new(TerminalSpinner::new(hide_progress)),
            banners: Arc::new(TerminalBanners),
            viewport: Arc::new(TerminalViewport),
            query_input: MemoryElement::new(),
            max_results_input: MemoryElement::with_value(&default_max_results.to_string()),
            results_section: MemoryElement::new(),
            results_stats: MemoryElement::new(),
            results_list: MemoryElement::new(),
        })
    }

    pub fn page(&self, downloader: Arc<dyn Downloader>) -> Page {
        Page {
            search_button: self.loading.clone(),
            query_input: self.query_input.clone(),
            max_results_input: self.max_results_input.clone(),
            loading_section: self.loading.clone(),
            progress_fill: self.loading.clone(),
            results_section: self.results_section.clone(),
            results_stats: self.results_stats.clone(),
            results_list: self.results_list.clone(),
            export_modal: self.modal.clone(),
            banners: self.banners.clone(),
            viewport: self.viewport.clone(),
            downloader,
        }
    }
}
