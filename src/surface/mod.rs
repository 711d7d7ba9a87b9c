//! The elements the controller draws into.
//!
//! Every element is bound once when the [`Page`] is built and then only reached
//! through these small traits, so the controller never knows whether it is
//! driving a terminal, a headless test page or something else.

pub mod memory;
pub mod terminal;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::api::ApiError;
use crate::notify::Notification;

pub trait RenderTarget: Send + Sync {
    fn set_content(&self, html: &str);
    fn show(&self);
    fn hide(&self);
}

/// A clickable control whose label is rendered content.
pub trait Control: RenderTarget {
    fn set_disabled(&self, disabled: bool);
}

pub trait ProgressTarget: Send + Sync {
    /// `percent` is in `0.0..=100.0`.
    fn set_percent(&self, percent: f64);
}

pub trait InputField: Send + Sync {
    fn value(&self) -> String;
    fn set_value(&self, value: &str);
    fn focus(&self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollTarget {
    Top,
    Results,
}

pub trait Viewport: Send + Sync {
    fn scroll_to(&self, target: ScrollTarget);
    fn set_scroll_locked(&self, locked: bool);
}

/// Where notification banners are attached and detached.
pub trait BannerHost: Send + Sync {
    fn mount(&self, notification: &Notification);
    fn unmount(&self, id: u64);
}

/// Saves a file the backend offers at `url` under `filename`.
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, url: &str, filename: &str) -> Result<PathBuf, ApiError>;
}

#[derive(Clone)]
pub struct Page {
    pub search_button: Arc<dyn Control>,
    pub query_input: Arc<dyn InputField>,
    pub max_results_input: Arc<dyn InputField>,
    pub loading_section: Arc<dyn RenderTarget>,
    pub progress_fill: Arc<dyn ProgressTarget>,
    pub results_section: Arc<dyn RenderTarget>,
    pub results_stats: Arc<dyn RenderTarget>,
    pub results_list: Arc<dyn RenderTarget>,
    pub export_modal: Arc<dyn RenderTarget>,
    pub banners: Arc<dyn BannerHost>,
    pub viewport: Arc<dyn Viewport>,
    pub downloader: Arc<dyn Downloader>,
}
