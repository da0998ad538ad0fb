//! Period enumeration: which sitemap documents exist between a publisher's
//! first period and the end of the run.
//!
//! Monthly publishers get one location per calendar month, daily publishers
//! one per calendar day. Enumeration is pure and lazy; nothing touches the
//! network until a location is handed to a fetcher.

use crate::config::{Granularity, PublisherProfile};
use chrono::{Datelike, Months, NaiveDate};
use std::fmt;

/// Identifies one period unit (a month or a day).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeriodKey {
    /// First day of the month for monthly periods, the day itself otherwise.
    pub date: NaiveDate,
    pub granularity: Granularity,
}

impl PeriodKey {
    /// Calendar year, used as the aggregation window.
    pub fn year(&self) -> i32 {
        self.date.year()
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.granularity {
            Granularity::Monthly => write!(f, "{}", self.date.format("%Y-%m")),
            Granularity::Daily => write!(f, "{}", self.date.format("%Y-%m-%d")),
        }
    }
}

/// A period together with its resolved sitemap location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodSource {
    pub key: PeriodKey,
    pub location: String,
}

/// Lazy, cloneable iterator over the periods of one publisher.
///
/// Cloning yields an independent iterator positioned at the same period,
/// so an enumeration can be restarted from any point.
#[derive(Debug, Clone)]
pub struct Periods<'a> {
    profile: &'a PublisherProfile,
    cursor: Option<NaiveDate>,
    end: NaiveDate,
}

/// Enumerate every period of `profile` up to and including `end`.
///
/// Monthly enumeration starts at the first day of the start month and steps
/// one calendar month at a time; a month is included when its first day is
/// not after `end`. Daily enumeration starts at the first day of the start
/// month and stops at `end`. A start date after `end` yields nothing.
pub fn enumerate(profile: &PublisherProfile, end: NaiveDate) -> Periods<'_> {
    let cursor = if profile.start_date > end {
        None
    } else {
        profile.start_date.with_day(1)
    };
    Periods {
        profile,
        cursor,
        end,
    }
}

/// Number of days in the given month, leap years included.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return 0;
    };
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

impl Iterator for Periods<'_> {
    type Item = PeriodSource;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.cursor.filter(|date| *date <= self.end)?;
        let granularity = self.profile.granularity;

        self.cursor = match granularity {
            Granularity::Monthly => current.checked_add_months(Months::new(1)),
            Granularity::Daily => {
                if current.day() < days_in_month(current.year(), current.month()) {
                    current.succ_opt()
                } else {
                    current
                        .with_day(1)
                        .and_then(|first| first.checked_add_months(Months::new(1)))
                }
            }
        };

        Some(PeriodSource {
            key: PeriodKey {
                date: current,
                granularity,
            },
            location: self.profile.url_template.render(current),
        })
    }
}
