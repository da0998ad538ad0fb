//! Turning a decoded payload into [`ArticleRecord`]s.
//!
//! The parse outcome picks the strategy:
//!
//! | Parse outcome | Strategy | Fields produced |
//! |---------------|----------|-----------------|
//! | element tree (possibly recovered) | [`Extraction::Structured`] | all five |
//! | no root element | [`Extraction::Salvage`] | `url` only |
//!
//! Entries in the sitemaps.org namespace are accepted, as are entries with
//! no namespace at all. Image locations must be in the Google image
//! namespace.

use crate::error::ParseError;
use crate::models::{ArticleRecord, RecordSet};
use crate::sitemap::document::{self, Element};
use crate::utils::truncate_for_log;
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use tracing::{debug, warn};

pub const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
pub const IMAGE_NS: &str = "http://www.google.com/schemas/sitemap-image/1.1";

/// Matches `<loc>...</loc>` literally, byte-wise, on a single line.
/// Matched bytes are taken as-is; entities are not expanded.
static LOC_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u)<loc>(.*?)</loc>").expect("loc pattern is valid"));

const PREVIEW_CHARS: usize = 200;

/// The strategy used to pull records out of one payload.
#[derive(Debug)]
pub enum Extraction<'a> {
    /// The payload parsed; records come from a tree query.
    Structured(Element),
    /// No element tree could be recovered; records come from a raw `<loc>` scan.
    Salvage(&'a [u8]),
}

impl<'a> Extraction<'a> {
    /// Parse `content` and choose the matching strategy.
    pub fn select(content: &'a [u8]) -> Self {
        match document::parse(content) {
            Ok(root) => Extraction::Structured(root),
            Err(e) => {
                log_parse_failure(&e, content);
                Extraction::Salvage(content)
            }
        }
    }

    /// Short label for logging.
    pub fn strategy(&self) -> &'static str {
        match self {
            Extraction::Structured(_) => "structured",
            Extraction::Salvage(_) => "salvage",
        }
    }

    /// Collect the records in document order.
    pub fn records(&self) -> RecordSet {
        match self {
            Extraction::Structured(root) => structured_records(root),
            Extraction::Salvage(payload) => {
                let records = salvaged_records(payload);
                if records.is_empty() {
                    warn!("Salvage found no <loc> entries");
                } else {
                    debug!(count = records.len(), "Salvaged URLs from malformed sitemap");
                }
                records
            }
        }
    }
}

fn log_parse_failure(error: &ParseError, content: &[u8]) {
    let head = &content[..content.len().min(PREVIEW_CHARS * 4)];
    warn!(
        error = %error,
        bytes = content.len(),
        preview = %truncate_for_log(&String::from_utf8_lossy(head), PREVIEW_CHARS),
        "Failed to parse sitemap XML; falling back to salvage"
    );
}

fn in_sitemap_ns(element: &Element, name: &str) -> bool {
    element.name == name
        && element
            .namespace
            .as_deref()
            .is_none_or(|ns| ns == SITEMAP_NS)
}

fn structured_records(root: &Element) -> RecordSet {
    let records: RecordSet = root
        .descendants()
        .filter(|e| in_sitemap_ns(e, "url"))
        .filter_map(url_entry)
        .collect();

    if records.is_empty() {
        debug!(root = %root.name, "Document contains no <url> entries with a location");
    }
    records
}

/// Read one `<url>` entry; entries without a usable `<loc>` are skipped.
fn url_entry(entry: &Element) -> Option<ArticleRecord> {
    let field = |name: &str| {
        entry
            .child(|c| in_sitemap_ns(c, name))
            .map(|c| c.trimmed_text().to_string())
            .unwrap_or_default()
    };

    let loc = entry.child(|c| in_sitemap_ns(c, "loc"))?;
    let mut record = ArticleRecord::from_location(loc.trimmed_text())?;
    record.last_modified = field("lastmod");
    record.change_frequency = field("changefreq");
    record.priority = field("priority");
    record.image_url = entry
        .child(|c| c.is(IMAGE_NS, "image"))
        .and_then(|image| image.child(|c| c.is(IMAGE_NS, "loc")))
        .map(|loc| loc.trimmed_text().to_string())
        .unwrap_or_default();
    Some(record)
}

fn salvaged_records(payload: &[u8]) -> RecordSet {
    LOC_PATTERN
        .captures_iter(payload)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| ArticleRecord::from_location(&String::from_utf8_lossy(m.as_bytes())))
        .collect()
}
