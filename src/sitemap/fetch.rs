//! Fetching one sitemap location and reducing it to a [`RecordSet`].
//!
//! Every stage either yields its output or falls through to the next
//! fallback:
//!
//! ```text
//! download ──(error/status/timeout)──────────────▶ empty set
//!    │
//! gunzip ──(not gzip)──▶ raw bytes
//!    │
//! parse ──(no root)────▶ salvage <loc> scan
//!    │                        │
//! tree query ─────────────────┴──────────────────▶ records
//! ```

use crate::error::FetchError;
use crate::models::RecordSet;
use crate::sitemap::decode::gunzip_or_raw;
use crate::sitemap::extract::Extraction;
use reqwest::StatusCode;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::fs;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Anything that can turn a source location into a record set.
///
/// Implementations never fail: a location that cannot be retrieved or read
/// contributes an empty set.
pub trait FetchSitemap {
    async fn fetch(&self, location: &str) -> RecordSet;
}

/// Settings for [`SitemapFetcher`].
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Upper bound for one fetch, connection through last body byte.
    pub timeout: Duration,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
    /// When set, each decoded document is also written here.
    pub archive_dir: Option<PathBuf>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
            archive_dir: None,
        }
    }
}

/// HTTP sitemap fetcher.
#[derive(Debug, Clone)]
pub struct SitemapFetcher {
    client: reqwest::Client,
    timeout: Duration,
    archive_dir: Option<PathBuf>,
}

impl SitemapFetcher {
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()?;
        Ok(Self {
            client,
            timeout: config.timeout,
            archive_dir: config.archive_dir,
        })
    }

    async fn download(&self, location: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(location).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                url: location.to_string(),
                status,
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn download_within_deadline(&self, location: &str) -> Result<Vec<u8>, FetchError> {
        tokio::time::timeout(self.timeout, self.download(location))
            .await
            .map_err(|_| FetchError::Timeout {
                url: location.to_string(),
                after: self.timeout,
            })?
    }

    /// Keep a copy of the decoded document next to the datasets.
    async fn archive(&self, location: &str, content: &[u8]) {
        let Some(dir) = &self.archive_dir else {
            return;
        };
        let Some(name) = archive_file_name(location) else {
            warn!("Cannot derive an archive file name; skipping");
            return;
        };
        let path = dir.join(&name);
        match fs::write(&path, content).await {
            Ok(()) => debug!(path = %path.display(), "Archived sitemap document"),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to archive sitemap document"),
        }
    }
}

impl FetchSitemap for SitemapFetcher {
    #[instrument(level = "info", skip_all, fields(url = %location))]
    async fn fetch(&self, location: &str) -> RecordSet {
        let t0 = Instant::now();
        let body = match self.download_within_deadline(location).await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Failed to download sitemap");
                return RecordSet::new();
            }
        };

        let content = gunzip_or_raw(&body);
        self.archive(location, &content).await;

        let extraction = Extraction::select(&content);
        let records = extraction.records();
        info!(
            bytes = body.len(),
            strategy = extraction.strategy(),
            records = records.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Processed sitemap"
        );
        records
    }
}

/// Last path segment of `location` without a trailing `.gz`.
fn archive_file_name(location: &str) -> Option<String> {
    let url = Url::parse(location).ok()?;
    let segment = url.path_segments()?.next_back()?;
    let name = segment.strip_suffix(".gz").unwrap_or(segment);
    (!name.is_empty()).then(|| name.to_string())
}
