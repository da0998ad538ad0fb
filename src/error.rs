//! Error types for configuration and sitemap retrieval.
//!
//! [`ConfigError`] is fatal and surfaces before any period is enumerated.
//! [`ParseError`] only selects the salvage extraction path.
//! [`FetchError`] never leaves the fetcher: it is logged and the affected
//! source location contributes an empty record set.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown publisher '{name}' (known: {known})")]
    UnknownPublisher { name: String, known: String },

    #[error("invalid url template '{template}': {reason}")]
    Template { template: String, reason: String },

    #[error("daily publisher '{name}' needs a {{day}} placeholder in its url template")]
    MissingDayPlaceholder { name: String },

    #[error("failed to read profile file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse profile file {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("fetch of {url} timed out after {after:?}")]
    Timeout { url: String, after: Duration },
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed xml at byte {position}: {source}")]
    Syntax {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    #[error("document has no root element")]
    NoRoot,
}
