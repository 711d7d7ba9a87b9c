pub mod http;

use std::borrow::Cow;
use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub use http::{ClientOptions, FileDownloader, HttpApiClient};

/// Sentinel the backend uses for "field not available".
pub const NOT_AVAILABLE: &str = "N/A";

pub const HEALTH_PATH: &str = "/api/health";
pub const SCRAPE_PATH: &str = "/api/scrape";
pub const EXPORT_PATH: &str = "/api/export";

/// A value counts as present when it exists, is non-empty and is not the
/// `"N/A"` sentinel.
pub fn is_available(value: Option<&str>) -> bool {
    matches!(value, Some(v) if !v.is_empty() && v != NOT_AVAILABLE)
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub search_query: String,
    pub max_results: u32,
}

/// Ratings arrive either as JSON numbers or as scraped text ("4.5", "N/A").
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rating {
    Number(f64),
    Text(String),
}

impl Rating {
    pub fn is_present(&self) -> bool {
        match self {
            Rating::Number(n) => *n != 0.0 && !n.is_nan(),
            Rating::Text(s) => is_available(Some(s.as_str())),
        }
    }

    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Rating::Number(n) => Cow::Owned(n.to_string()),
            Rating::Text(s) => Cow::Borrowed(s.as_str()),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_maps_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub emails: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub phones: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub social_media: BTreeMap<String, String>,
    /// Fields this client does not interpret; sent back untouched on export.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CompanyResult {
    pub fn has_phone(&self) -> bool {
        is_available(self.phone.as_deref())
    }

    pub fn has_website(&self) -> bool {
        is_available(self.website.as_deref())
    }

    pub fn has_email(&self) -> bool {
        !self.emails.is_empty()
    }

    pub fn has_social_media(&self) -> bool {
        !self.social_media.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<CompanyResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_results: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchResponse {
    pub fn total(&self) -> usize {
        self.total_results.unwrap_or(self.results.len())
    }

    pub fn failure_message(&self, fallback: &str) -> String {
        non_empty_or(self.error.as_deref(), fallback)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ExportRequest<'a> {
    pub results: &'a [CompanyResult],
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub download_url: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExportResponse {
    pub fn failure_message(&self, fallback: &str) -> String {
        non_empty_or(self.error.as_deref(), fallback)
    }
}

fn non_empty_or(value: Option<&str>, fallback: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => fallback.to_string(),
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error! status: {status}")]
    Status { status: u16 },

    #[error("request failed: {source}")]
    Transport {
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid response body: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
    },

    #[error("{message}")]
    Application { message: String },

    #[error("invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("invalid download filename '{filename}'")]
    InvalidFilename { filename: String },

    #[error("failed to save download to {path}: {source}")]
    DownloadWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },
}

/// The three backend endpoints the controller talks to.
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn health(&self) -> Result<Value, ApiError>;

    async fn scrape(&self, request: &SearchRequest) -> Result<SearchResponse, ApiError>;

    async fn export(&self, results: &[CompanyResult]) -> Result<ExportResponse, ApiError>;
}
