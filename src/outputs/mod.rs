//! Dataset output.
//!
//! The run driver hands every sealed year to a [`PeriodSink`] as soon as the
//! year closes; the cumulative dataset is written once the run is complete.
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! └── prnewswire_sitemaps/
//!     ├── annual_sitemap_2011.json
//!     ├── annual_sitemap_2012.json
//!     ├── ...
//!     ├── full_sitemap_prnewswire.json
//!     └── Sitemap_Index_Jan_2011.xml   # only with --keep-xml
//! ```
//!
//! Each JSON file is an array of records with the five
//! [`ArticleRecord`](crate::models::ArticleRecord) columns, in dataset order.

use crate::aggregate::SealedPeriod;
use std::error::Error;

pub mod json;

/// Destination for sealed aggregation windows.
pub trait PeriodSink {
    async fn write_period(&self, sealed: &SealedPeriod) -> Result<(), Box<dyn Error>>;
}
