//! Date ranges with explicit handling of undated records.
//!
//! Undated vouchers are legal and common (opening balances, pending entries),
//! so a range has to say whether it admits them. The rule mirrors how the
//! ledger has always filtered:
//!
//! - no bounds: everything, dated or not;
//! - a start bound: dated records from the start on, undated excluded;
//! - only an end bound: dated records up to the end, plus undated ones;
//! - null-only: undated records only.

use serde::{Deserialize, Serialize};

use crate::NaiveDate;

/// A closed, possibly open-ended date interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    /// First date included.
    #[serde(default)]
    pub start: Option<NaiveDate>,
    /// Last date included.
    #[serde(default)]
    pub end: Option<NaiveDate>,
    /// Whether undated records are included.
    #[serde(default)]
    pub nullable: bool,
    /// Whether only undated records are included.
    #[serde(default)]
    pub null_only: bool,
}

impl DateRange {
    /// A range matching every record, dated or not.
    #[must_use]
    pub const fn unconstrained() -> Self {
        Self {
            start: None,
            end: None,
            nullable: true,
            null_only: false,
        }
    }

    /// A range between two optional bounds; undated records are admitted when
    /// there is no start bound.
    #[must_use]
    pub const fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self {
            start,
            end,
            nullable: start.is_none(),
            null_only: false,
        }
    }

    /// A closed range `[start, end]`.
    #[must_use]
    pub const fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self::new(Some(start), Some(end))
    }

    /// Everything from `start` on.
    #[must_use]
    pub const fn since(start: NaiveDate) -> Self {
        Self::new(Some(start), None)
    }

    /// Everything up to and including `end`, plus undated records.
    #[must_use]
    pub const fn until(end: NaiveDate) -> Self {
        Self::new(None, Some(end))
    }

    /// A single day.
    #[must_use]
    pub const fn on(day: NaiveDate) -> Self {
        Self::between(day, day)
    }

    /// Undated records only.
    #[must_use]
    pub const fn null_only() -> Self {
        Self {
            start: None,
            end: None,
            nullable: true,
            null_only: true,
        }
    }

    /// Check whether a (possibly missing) date falls within the range.
    ///
    /// # Example
    ///
    /// ```
    /// use tally_core::{DateRange, NaiveDate};
    ///
    /// let d = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    /// assert!(DateRange::until(d).contains(None));
    /// assert!(!DateRange::since(d).contains(None));
    /// assert!(DateRange::on(d).contains(Some(d)));
    /// ```
    #[must_use]
    pub fn contains(&self, date: Option<NaiveDate>) -> bool {
        match date {
            None => self.nullable || self.null_only,
            Some(d) => {
                !self.null_only
                    && self.start.map_or(true, |s| s <= d)
                    && self.end.map_or(true, |e| d <= e)
            }
        }
    }

    /// Whether the range is unbounded, i.e. matches the whole ledger history.
    #[must_use]
    pub const fn is_dangerous(&self) -> bool {
        !self.null_only && self.start.is_none() && self.end.is_none()
    }
}

impl Default for DateRange {
    fn default() -> Self {
        Self::unconstrained()
    }
}
