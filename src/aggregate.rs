//! Folding per-fetch record sets into yearly and cumulative datasets.
//!
//! Record sets arrive in period order. They are appended to the open
//! [`PeriodDataset`] for the current calendar year; when a period from a new
//! year arrives, the open year is sealed into a [`SealedPeriod`] and moved
//! into the [`CumulativeDataset`]. Nothing is deduplicated or reordered.

use crate::models::{ArticleRecord, RecordSet};
use serde::{Serialize, Serializer};

/// Records accumulated for the aggregation window that is still open.
#[derive(Debug, Default)]
pub struct PeriodDataset {
    records: Vec<ArticleRecord>,
}

impl PeriodDataset {
    /// Append a record set, keeping its order.
    pub fn append(&mut self, records: RecordSet) {
        self.records.extend(records);
    }

    /// Finalize the accumulated records for `year`, leaving this dataset empty.
    pub fn seal(&mut self, year: i32) -> SealedPeriod {
        SealedPeriod {
            year,
            records: std::mem::take(&mut self.records),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// An immutable, finished aggregation window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SealedPeriod {
    pub year: i32,
    pub records: Vec<ArticleRecord>,
}

impl SealedPeriod {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Every sealed window of a run, in chronological order.
///
/// Serializes as one flat sequence of records.
#[derive(Debug, Default)]
pub struct CumulativeDataset {
    periods: Vec<SealedPeriod>,
}

impl CumulativeDataset {
    /// Append a sealed window after all earlier ones.
    pub fn fold(&mut self, sealed: SealedPeriod) -> &SealedPeriod {
        self.periods.push(sealed);
        &self.periods[self.periods.len() - 1]
    }

    /// Total number of records across all sealed windows.
    pub fn len(&self) -> usize {
        self.periods.iter().map(SealedPeriod::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The sealed windows in the order they were folded.
    pub fn periods(&self) -> &[SealedPeriod] {
        &self.periods
    }

    /// All records, concatenated in chronological order.
    pub fn records(&self) -> impl Iterator<Item = &ArticleRecord> {
        self.periods.iter().flat_map(|p| p.records.iter())
    }
}

impl Serialize for CumulativeDataset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.records())
    }
}

/// Single-writer accumulator for one publisher run.
#[derive(Debug, Default)]
pub struct Aggregator {
    open_year: Option<i32>,
    period: PeriodDataset,
    cumulative: CumulativeDataset,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `records` fetched for a period of `year`.
    ///
    /// When `year` differs from the open window, that window is sealed and
    /// folded first, and returned so it can be written out.
    pub fn append(&mut self, year: i32, records: RecordSet) -> Option<&SealedPeriod> {
        let crossed = matches!(self.open_year, Some(open) if open != year);
        let sealed = if crossed {
            self.seal_open_window()
        } else {
            None
        };
        self.open_year = Some(year);
        self.period.append(records);

        match sealed {
            Some(sealed) => Some(self.cumulative.fold(sealed)),
            None => None,
        }
    }

    /// Seal whatever window is open, even if it is partial or empty.
    ///
    /// Returns `None` only if nothing was ever appended since the last seal.
    pub fn seal(&mut self) -> Option<&SealedPeriod> {
        let sealed = self.seal_open_window()?;
        Some(self.cumulative.fold(sealed))
    }

    fn seal_open_window(&mut self) -> Option<SealedPeriod> {
        let year = self.open_year.take()?;
        Some(self.period.seal(year))
    }

    /// Records appended to the open window so far.
    pub fn open_len(&self) -> usize {
        self.period.len()
    }

    pub fn cumulative(&self) -> &CumulativeDataset {
        &self.cumulative
    }

    /// Seal the open window and hand back the cumulative dataset.
    pub fn finish(mut self) -> CumulativeDataset {
        self.seal();
        self.cumulative
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(prefix: &str, n: usize) -> RecordSet {
        (0..n)
            .map(|i| ArticleRecord::from_location(&format!("https://example.com/{prefix}/{i}.html")).unwrap())
            .collect()
    }

    #[test]
    fn test_twelve_months_seal_in_period_order() {
        let mut aggregator = Aggregator::new();
        let mut expected = Vec::new();
        for month in 1..=12 {
            let set = records(&format!("2011-{month:02}"), month);
            expected.extend(set.clone());
            assert!(aggregator.append(2011, set).is_none());
        }

        let sealed = aggregator.seal().unwrap().clone();
        assert_eq!(sealed.year, 2011);
        assert_eq!(sealed.records, expected);
        assert_eq!(aggregator.open_len(), 0);
    }

    #[test]
    fn test_year_change_seals_previous_year() {
        let mut aggregator = Aggregator::new();
        aggregator.append(2013, records("nov", 2));
        aggregator.append(2013, records("dec", 3));

        let sealed = aggregator.append(2014, records("jan", 4)).unwrap();
        assert_eq!(sealed.year, 2013);
        assert_eq!(sealed.len(), 5);
        assert_eq!(sealed.records[0].url, "https://example.com/nov/0.html");
        assert_eq!(sealed.records[4].url, "https://example.com/dec/2.html");

        assert_eq!(aggregator.open_len(), 4);
        assert_eq!(aggregator.cumulative().len(), 5);
    }

    #[test]
    fn test_partial_year_is_sealed_on_finish() {
        let mut aggregator = Aggregator::new();
        aggregator.append(2024, records("jan", 2));
        aggregator.append(2024, records("feb", 1));

        let cumulative = aggregator.finish();
        assert_eq!(cumulative.periods().len(), 1);
        assert_eq!(cumulative.periods()[0].year, 2024);
        assert_eq!(cumulative.len(), 3);
    }

    #[test]
    fn test_empty_window_still_seals() {
        let mut aggregator = Aggregator::new();
        aggregator.append(2020, RecordSet::new());

        let sealed = aggregator.seal().unwrap();
        assert_eq!(sealed.year, 2020);
        assert!(sealed.is_empty());
        assert!(aggregator.seal().is_none());
    }

    #[test]
    fn test_finish_without_appends_is_empty() {
        let cumulative = Aggregator::new().finish();
        assert!(cumulative.is_empty());
        assert!(cumulative.periods().is_empty());
    }

    #[test]
    fn test_cumulative_is_sum_of_sealed_periods_in_order() {
        let mut aggregator = Aggregator::new();
        let mut sealed_lens = Vec::new();
        for (year, n) in [(2011, 3), (2012, 0), (2013, 5), (2014, 2)] {
            if let Some(sealed) = aggregator.append(year, records(&year.to_string(), n)) {
                sealed_lens.push(sealed.len());
            }
        }
        if let Some(sealed) = aggregator.seal() {
            sealed_lens.push(sealed.len());
        }

        let cumulative = aggregator.finish();
        assert_eq!(sealed_lens, vec![3, 0, 5, 2]);
        assert_eq!(cumulative.len(), sealed_lens.iter().sum::<usize>());

        let years: Vec<i32> = cumulative.periods().iter().map(|p| p.year).collect();
        assert_eq!(years, vec![2011, 2012, 2013, 2014]);

        let urls: Vec<&str> = cumulative.records().map(|r| r.url.as_str()).collect();
        assert_eq!(urls.first(), Some(&"https://example.com/2011/0.html"));
        assert_eq!(urls.last(), Some(&"https://example.com/2014/1.html"));
    }

    #[test]
    fn test_period_dataset_resets_after_seal() {
        let mut period = PeriodDataset::default();
        period.append(records("a", 2));
        let sealed = period.seal(2011);
        assert_eq!(sealed.len(), 2);
        assert!(period.is_empty());

        period.append(records("b", 1));
        assert_eq!(period.seal(2012).records[0].url, "https://example.com/b/0.html");
    }

    #[test]
    fn test_cumulative_serializes_as_flat_records() {
        let mut aggregator = Aggregator::new();
        aggregator.append(2011, records("x", 1));
        aggregator.append(2012, records("y", 1));
        let cumulative = aggregator.finish();

        let json = serde_json::to_value(&cumulative).unwrap();
        let rows = json.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["url"], "https://example.com/y/0.html");
    }
}
