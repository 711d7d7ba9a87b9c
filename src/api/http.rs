use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{
    ApiClient, ApiError, CompanyResult, ExportRequest, ExportResponse, SearchRequest,
    SearchResponse, EXPORT_PATH, HEALTH_PATH, SCRAPE_PATH,
};
use crate::surface::Downloader;

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";

/// Scrapes drive a headless browser server-side and routinely take minutes.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 300;

#[derive(Clone, Debug)]
pub struct ClientOptions {
    pub server: String,
    pub timeout_seconds: u64,
    pub proxy: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            proxy: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct HttpApiClient {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpApiClient {
    pub fn new(options: &ClientOptions) -> Result<Self, ApiError> {
        let base_url = Url::parse(options.server.trim()).map_err(|e| ApiError::InvalidUrl {
            url: options.server.clone(),
            message: e.to_string(),
        })?;
        let client = build_client(options.proxy.as_deref(), options.timeout_seconds)?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves an endpoint or server-relative link (`/static/x.csv`) against
    /// the server base URL.
    pub fn resolve(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url.join(path).map_err(|e| ApiError::InvalidUrl {
            url: path.to_string(),
            message: e.to_string(),
        })
    }

    /// A downloader sharing this client's connection pool, saving into `output_dir`.
    pub fn downloader(&self, output_dir: impl Into<PathBuf>) -> FileDownloader {
        FileDownloader {
            api: self.clone(),
            output_dir: output_dir.into(),
        }
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.resolve(path)?;
        log::debug!("POST {url}");
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|source| ApiError::Transport { source })?;
        decode_json(response, true).await
    }
}

fn build_client(proxy: Option<&str>, timeout_seconds: u64) -> Result<reqwest::Client, ApiError> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_static(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        )),
    );

    let mut builder = reqwest::Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(timeout_seconds.max(1)));

    if let Some(proxy) = proxy.filter(|p| !p.trim().is_empty()) {
        let proxy = reqwest::Proxy::all(proxy).map_err(|e| ApiError::ProxySetup {
            proxy: proxy.to_string(),
            source: e,
        })?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|source| ApiError::ClientBuild { source })
}

async fn decode_json<T: DeserializeOwned>(
    response: reqwest::Response,
    require_success: bool,
) -> Result<T, ApiError> {
    let status = response.status();
    if require_success && !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
        });
    }
    let body = response
        .bytes()
        .await
        .map_err(|source| ApiError::Transport { source })?;
    serde_json::from_slice(&body).map_err(|source| ApiError::Decode { source })
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn health(&self) -> Result<Value, ApiError> {
        let url = self.resolve(HEALTH_PATH)?;
        log::debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ApiError::Transport { source })?;
        // Any JSON answer counts as reachable, whatever the status.
        decode_json(response, false).await
    }

    async fn scrape(&self, request: &SearchRequest) -> Result<SearchResponse, ApiError> {
        self.post_json(SCRAPE_PATH, request).await
    }

    async fn export(&self, results: &[CompanyResult]) -> Result<ExportResponse, ApiError> {
        self.post_json(EXPORT_PATH, &ExportRequest { results }).await
    }
}

/// Fetches exported files from the backend and writes them under `output_dir`.
#[derive(Clone, Debug)]
pub struct FileDownloader {
    api: HttpApiClient,
    output_dir: PathBuf,
}

impl FileDownloader {
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn target_path(&self, filename: &str) -> Result<PathBuf, ApiError> {
        let name = Path::new(filename.trim())
            .file_name()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ApiError::InvalidFilename {
                filename: filename.to_string(),
            })?;
        Ok(self.output_dir.join(name))
    }
}

#[async_trait]
impl Downloader for FileDownloader {
    async fn download(&self, url: &str, filename: &str) -> Result<PathBuf, ApiError> {
        let path = self.target_path(filename)?;
        let url = self.api.resolve(url)?;
        log::debug!("GET {url} -> {}", path.display());

        let response = self
            .api
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ApiError::Transport { source })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
            });
        }
        let body = response
            .bytes()
            .await
            .map_err(|source| ApiError::Transport { source })?;

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| ApiError::DownloadWrite {
                path: self.output_dir.display().to_string(),
                source,
            })?;
        tokio::fs::write(&path, &body)
            .await
            .map_err(|source| ApiError::DownloadWrite {
                path: path.display().to_string(),
                source,
            })?;
        Ok(path)
    }
}
