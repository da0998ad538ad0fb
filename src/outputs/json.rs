//! JSON dataset files.
//!
//! Files live in a per-publisher folder:
//! ```text
//! {output_dir}/{publisher}_sitemaps/
//! ├── annual_sitemap_{year}.json
//! └── full_sitemap_{publisher}.json
//! ```

use crate::aggregate::{CumulativeDataset, SealedPeriod};
use crate::outputs::PeriodSink;
use serde::Serialize;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Writes sealed years and the cumulative dataset as JSON arrays.
#[derive(Debug, Clone)]
pub struct JsonDatasetWriter {
    dir: PathBuf,
    publisher: String,
}

impl JsonDatasetWriter {
    pub fn new(output_dir: impl AsRef<Path>, publisher: &str) -> Self {
        Self {
            dir: output_dir.as_ref().join(format!("{publisher}_sitemaps")),
            publisher: publisher.to_string(),
        }
    }

    /// The publisher folder all files are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the full-history dataset, even when it is empty.
    #[instrument(level = "info", skip_all, fields(publisher = %self.publisher))]
    pub async fn write_cumulative(
        &self,
        cumulative: &CumulativeDataset,
    ) -> Result<PathBuf, Box<dyn Error>> {
        let file_name = format!("full_sitemap_{}.json", self.publisher);
        self.write_json(&file_name, cumulative, cumulative.len()).await
    }

    async fn write_json<T: Serialize>(
        &self,
        file_name: &str,
        value: &T,
        records: usize,
    ) -> Result<PathBuf, Box<dyn Error>> {
        let json = serde_json::to_string(value)?;
        fs::create_dir_all(&self.dir).await?;

        let path = self.dir.join(file_name);
        fs::write(&path, json).await?;
        info!(path = %path.display(), records, "Wrote dataset");
        Ok(path)
    }
}

impl PeriodSink for JsonDatasetWriter {
    #[instrument(level = "info", skip_all, fields(publisher = %self.publisher, year = sealed.year))]
    async fn write_period(&self, sealed: &SealedPeriod) -> Result<(), Box<dyn Error>> {
        let file_name = format!("annual_sitemap_{}.json", sealed.year);
        self.write_json(&file_name, &sealed.records, sealed.len()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Aggregator;
    use crate::models::ArticleRecord;

    fn record(url: &str) -> ArticleRecord {
        ArticleRecord::from_location(url).unwrap()
    }

    #[tokio::test]
    async fn test_writes_annual_and_full_files() {
        let out = tempfile::tempdir().unwrap();
        let writer = JsonDatasetWriter::new(out.path(), "prnewswire");
        assert_eq!(writer.dir(), out.path().join("prnewswire_sitemaps"));

        let mut aggregator = Aggregator::new();
        aggregator.append(2011, vec![record("https://example.com/a.html")]);
        let sealed = aggregator
            .append(2012, vec![record("https://example.com/b.html")])
            .unwrap()
            .clone();
        writer.write_period(&sealed).await.unwrap();

        let cumulative = aggregator.finish();
        let full = writer.write_cumulative(&cumulative).await.unwrap();
        assert_eq!(full, writer.dir().join("full_sitemap_prnewswire.json"));

        let annual = std::fs::read_to_string(writer.dir().join("annual_sitemap_2011.json")).unwrap();
        let annual: Vec<ArticleRecord> = serde_json::from_str(&annual).unwrap();
        assert_eq!(annual, vec![record("https://example.com/a.html")]);

        let full: Vec<ArticleRecord> =
            serde_json::from_str(&std::fs::read_to_string(full).unwrap()).unwrap();
        let urls: Vec<&str> = full.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["https://example.com/a.html", "https://example.com/b.html"]);
    }

    #[tokio::test]
    async fn test_empty_cumulative_is_still_written() {
        let out = tempfile::tempdir().unwrap();
        let writer = JsonDatasetWriter::new(out.path(), "canadawire");

        let path = writer
            .write_cumulative(&Aggregator::new().finish())
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "[]");
    }
}
