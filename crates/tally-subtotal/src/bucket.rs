//! Calendar buckets.
//!
//! A bucket is identified by its first day. Billing and financial months are
//! monthly cycles anchored on a fixed day of the month instead of the 1st: a
//! date past the anchor rolls forward to the next anchor, a date before it
//! rolls back to the previous one, and the anchor day is its own bucket.

use std::cmp::Ordering;

use chrono::{Datelike, Days, Months};
use serde::{Deserialize, Serialize};
use tally_core::NaiveDate;

/// Anchor day of billing months.
pub const BILLING_DAY: u32 = 9;

/// Anchor day of financial months.
pub const FINANCIAL_DAY: u32 = 19;

/// Label of the undated bucket.
pub const UNDATED_LABEL: &str = "[null]";

/// Size of a calendar bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// One day.
    #[default]
    Day,
    /// Monday to Sunday.
    Week,
    /// Calendar month.
    Month,
    /// Calendar year.
    Year,
    /// Month cycle anchored on [`BILLING_DAY`].
    BillingMonth,
    /// Month cycle anchored on [`FINANCIAL_DAY`].
    FinancialMonth,
}

impl Granularity {
    /// First day of the bucket containing `date`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tally_core::NaiveDate;
    /// use tally_subtotal::Granularity;
    ///
    /// let d = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
    ///
    /// assert_eq!(Granularity::Week.normalize(d(2024, 5, 2)), d(2024, 4, 29));
    /// assert_eq!(Granularity::BillingMonth.normalize(d(2024, 1, 8)), d(2023, 12, 9));
    /// assert_eq!(Granularity::BillingMonth.normalize(d(2024, 12, 10)), d(2025, 1, 9));
    /// ```
    #[must_use]
    pub fn normalize(self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Day => date,
            Self::Week => date
                .checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
                .unwrap_or(date),
            Self::Month => date.with_day(1).unwrap_or(date),
            Self::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date),
            Self::BillingMonth => cycle_start(date, BILLING_DAY),
            Self::FinancialMonth => cycle_start(date, FINANCIAL_DAY),
        }
    }

    /// First day of the bucket after `bucket`, which must be normalized.
    ///
    /// Returns `None` past the end of the calendar.
    #[must_use]
    pub fn step(self, bucket: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Day => bucket.succ_opt(),
            Self::Week => bucket.checked_add_days(Days::new(7)),
            Self::Month | Self::BillingMonth | Self::FinancialMonth => {
                bucket.checked_add_months(Months::new(1))
            }
            Self::Year => bucket.checked_add_months(Months::new(12)),
        }
    }

    /// Last day of the bucket starting at `bucket`.
    #[must_use]
    pub fn last_day(self, bucket: NaiveDate) -> NaiveDate {
        self.step(bucket)
            .and_then(|next| next.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    /// Display label of a bucket.
    #[must_use]
    pub fn label(self, bucket: Option<NaiveDate>) -> String {
        match bucket {
            None => UNDATED_LABEL.to_string(),
            Some(d) => match self {
                Self::Month => d.format("%Y%m").to_string(),
                Self::Year => d.format("%Y").to_string(),
                _ => d.format("%Y%m%d").to_string(),
            },
        }
    }
}

/// Bucket of a possibly missing date; undated records stay undated.
#[must_use]
pub fn normalize(date: Option<NaiveDate>, granularity: Granularity) -> Option<NaiveDate> {
    date.map(|d| granularity.normalize(d))
}

fn cycle_start(date: NaiveDate, anchor: u32) -> NaiveDate {
    let Some(anchored) = date.with_day(anchor) else {
        return date;
    };
    let start = match date.day().cmp(&anchor) {
        Ordering::Equal => Some(date),
        Ordering::Greater => anchored.checked_add_months(Months::new(1)),
        Ordering::Less => anchored.checked_sub_months(Months::new(1)),
    };
    start.unwrap_or(date)
}
