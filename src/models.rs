//! Data models for extracted sitemap entries.
//!
//! - [`ArticleRecord`]: one `<url>` entry recovered from a publisher sitemap
//! - [`RecordSet`]: every record produced by a single fetch, in document order
//!
//! Records serialize with snake_case field names; the dataset writers emit
//! them as a flat table of five string columns.

use serde::{Deserialize, Serialize};

/// A single article entry extracted from a sitemap document.
///
/// Only `url` is guaranteed to be non-empty. The metadata fields hold the
/// raw (trimmed) element text or an empty string when the element is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArticleRecord {
    /// The article location (`<loc>`).
    pub url: String,
    /// Last modification timestamp (`<lastmod>`), usually ISO-8601.
    pub last_modified: String,
    /// Change frequency hint (`<changefreq>`).
    pub change_frequency: String,
    /// Crawl priority hint (`<priority>`).
    pub priority: String,
    /// First associated image location (`<image:image><image:loc>`).
    ///
    /// Only the structured extraction path fills this in.
    pub image_url: String,
}

impl ArticleRecord {
    /// Build a record that carries nothing but a location.
    ///
    /// Returns `None` when the trimmed location is empty.
    pub fn from_location(url: &str) -> Option<Self> {
        let url = url.trim();
        if url.is_empty() {
            return None;
        }
        Some(Self {
            url: url.to_string(),
            ..Self::default()
        })
    }
}

/// The ordered records produced by one fetch. May be empty.
pub type RecordSet = Vec<ArticleRecord>;
