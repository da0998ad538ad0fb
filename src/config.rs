//! Publisher profiles: where each news wire keeps its sitemaps and how they
//! are sharded over time.
//!
//! The built-in table covers the supported wires. A YAML file passed with
//! `--config` may add publishers or override built-in entries:
//!
//! ```yaml
//! publishers:
//!   example:
//!     start_date: 2019-01-01
//!     url_template: "https://example.com/sitemaps/{year}-{month}.xml"
//!     granularity: monthly
//! ```
//!
//! # URL templates
//!
//! | Placeholder | Expands to |
//! |-------------|------------|
//! | `{year}` | four digit year |
//! | `{month}` | two digit month |
//! | `{month_text}` | `Jan` .. `Dec` |
//! | `{day}` | two digit day of month |

use crate::error::ConfigError;
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{info, instrument};

/// Three-letter month names used by the `{month_text}` placeholder.
pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// How finely a publisher shards its sitemaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One sitemap per calendar month.
    Monthly,
    /// One sitemap per calendar day.
    Daily,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placeholder {
    Year,
    Month,
    MonthText,
    Day,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Placeholder),
}

/// A parsed sitemap URL template.
///
/// Parsing happens once, when the profile is built, so rendering a location
/// for a period cannot fail.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct UrlTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl UrlTemplate {
    /// Parse a template string, rejecting unknown or unterminated placeholders.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::Template {
            template: raw.to_string(),
            reason,
        };

        let mut segments = Vec::new();
        let mut rest = raw;
        while let Some(open) = rest.find('{') {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 1..];
            let close = after
                .find('}')
                .ok_or_else(|| invalid("unterminated placeholder".to_string()))?;
            let field = match &after[..close] {
                "year" => Placeholder::Year,
                "month" => Placeholder::Month,
                "month_text" => Placeholder::MonthText,
                "day" => Placeholder::Day,
                other => return Err(invalid(format!("unknown placeholder {{{other}}}"))),
            };
            segments.push(Segment::Field(field));
            rest = &after[close + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// Whether the template distinguishes days within a month.
    pub fn has_day(&self) -> bool {
        self.segments
            .iter()
            .any(|s| *s == Segment::Field(Placeholder::Day))
    }

    /// Resolve the source location for the period containing `date`.
    pub fn render(&self, date: NaiveDate) -> String {
        let mut out = String::with_capacity(self.raw.len() + 8);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(Placeholder::Year) => out.push_str(&format!("{:04}", date.year())),
                Segment::Field(Placeholder::Month) => {
                    out.push_str(&format!("{:02}", date.month()))
                }
                Segment::Field(Placeholder::MonthText) => {
                    out.push_str(MONTH_ABBREVIATIONS[date.month0() as usize])
                }
                Segment::Field(Placeholder::Day) => out.push_str(&format!("{:02}", date.day())),
            }
        }
        out
    }
}

impl TryFrom<String> for UrlTemplate {
    type Error = ConfigError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Immutable description of one publisher's sitemap archive.
#[derive(Debug, Clone, Deserialize)]
pub struct PublisherProfile {
    /// Publisher key, filled in from the table entry.
    #[serde(skip)]
    pub name: String,
    /// First period with a published sitemap.
    pub start_date: NaiveDate,
    /// Template resolving a period to its sitemap location.
    pub url_template: UrlTemplate,
    /// Whether sitemaps are sharded per month or per day.
    pub granularity: Granularity,
}

impl PublisherProfile {
    pub fn new(
        name: &str,
        start_date: NaiveDate,
        url_template: &str,
        granularity: Granularity,
    ) -> Result<Self, ConfigError> {
        let profile = Self {
            name: name.to_string(),
            start_date,
            url_template: UrlTemplate::parse(url_template)?,
            granularity,
        };
        profile.validate()?;
        Ok(profile)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.granularity == Granularity::Daily && !self.url_template.has_day() {
            return Err(ConfigError::MissingDayPlaceholder {
                name: self.name.clone(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ProfileFile {
    publishers: BTreeMap<String, PublisherProfile>,
}

/// Lookup table from publisher name to profile.
#[derive(Debug, Clone)]
pub struct PublisherTable {
    profiles: BTreeMap<String, PublisherProfile>,
}

impl PublisherTable {
    /// The publishers supported out of the box.
    pub fn builtin() -> Self {
        let entries = [
            (
                "prnewswire",
                (2011, 1, 1),
                "https://www.prnewswire.com/Sitemap_Index_{month_text}_{year}.xml.gz",
                Granularity::Monthly,
            ),
            (
                "canadawire",
                (2014, 1, 1),
                "https://www.newswire.ca/Sitemap_Index_{month_text}_{year}.xml.gz",
                Granularity::Monthly,
            ),
            (
                "businesswire",
                (2020, 11, 1),
                "https://www.businesswire.com/smaps/smaps-bw/{year}-{month}-{day}.xml.gz",
                Granularity::Daily,
            ),
        ];

        let profiles = entries
            .into_iter()
            .map(|(name, (y, m, d), template, granularity)| {
                let start = NaiveDate::from_ymd_opt(y, m, d).expect("built-in start date is valid");
                let profile = PublisherProfile::new(name, start, template, granularity)
                    .expect("built-in profile is valid");
                (name.to_string(), profile)
            })
            .collect();

        Self { profiles }
    }

    /// Merge publisher entries from a YAML document, replacing entries with
    /// the same name.
    pub fn merge_yaml(&mut self, yaml: &str, origin: &str) -> Result<usize, ConfigError> {
        let file: ProfileFile = serde_yaml::from_str(yaml).map_err(|source| ConfigError::Yaml {
            path: origin.to_string(),
            source,
        })?;

        let count = file.publishers.len();
        for (name, mut profile) in file.publishers {
            let name = name.to_lowercase();
            profile.name = name.clone();
            profile.validate()?;
            self.profiles.insert(name, profile);
        }
        Ok(count)
    }

    /// Read a YAML profile file and merge it into the table.
    #[instrument(level = "info", skip(self))]
    pub async fn load_file(&mut self, path: &str) -> Result<(), ConfigError> {
        let yaml = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_string(),
                source,
            })?;
        let count = self.merge_yaml(&yaml, path)?;
        info!(count, "Loaded publisher profiles");
        Ok(())
    }

    /// Look up a publisher by case-insensitive name.
    pub fn resolve(&self, name: &str) -> Result<&PublisherProfile, ConfigError> {
        self.profiles
            .get(&name.to_lowercase())
            .ok_or_else(|| ConfigError::UnknownPublisher {
                name: name.to_string(),
                known: self.names().join(", "),
            })
    }

    /// Known publisher names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }
}
