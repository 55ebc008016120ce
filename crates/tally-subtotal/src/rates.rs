//! Exchange rates for currency equivalence.
//!
//! This module provides a rate table that stores dated quotes and resolves
//! conversions directly, through the inverse quote, or through one
//! intermediate currency.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_core::NaiveDate;

use crate::error::{checked_mul, SubtotalError};

/// Source of exchange rates.
pub trait RateLookup {
    /// Units of `quote` per unit of `base` on or before `date`; the latest
    /// known rate when `date` is `None`.
    fn rate(&self, base: &str, quote: &str, date: Option<NaiveDate>) -> Option<Decimal>;

    /// Convert `amount` from `from` into `to`.
    ///
    /// # Errors
    ///
    /// [`SubtotalError::MissingRate`] when no rate is known;
    /// [`SubtotalError::Overflow`] when the converted amount is out of range.
    fn convert(
        &self,
        amount: Decimal,
        from: &str,
        to: &str,
        date: Option<NaiveDate>,
    ) -> Result<Decimal, SubtotalError> {
        if from == to {
            return Ok(amount);
        }
        let rate = self
            .rate(from, to, date)
            .ok_or_else(|| SubtotalError::MissingRate {
                currency: from.to_string(),
                target: to.to_string(),
                date,
            })?;
        checked_mul(amount, rate)
    }
}

/// One dated quote: one unit of `base` costs `price` units of `quote`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Date of the quote.
    pub date: NaiveDate,
    /// Priced currency.
    pub base: String,
    /// Pricing currency.
    pub quote: String,
    /// Price.
    pub price: Decimal,
}

#[derive(Debug, Clone)]
struct RateEntry {
    date: NaiveDate,
    price: Decimal,
    currency: String,
}

/// In-memory table of dated exchange rates.
///
/// Rates are indexed by base currency and kept sorted by date.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tally_core::NaiveDate;
/// use tally_subtotal::{RateLookup, RateTable};
///
/// let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let mut rates = RateTable::new();
/// rates.add_rate(d, "USD", "CNY", dec!(7.1));
///
/// assert_eq!(rates.convert(dec!(10), "USD", "CNY", Some(d)).unwrap(), dec!(71.0));
/// assert!(rates.convert(dec!(10), "EUR", "CNY", Some(d)).is_err());
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "Vec<Quote>")]
pub struct RateTable {
    rates: HashMap<String, Vec<RateEntry>>,
}

impl RateTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that one unit of `base` costs `price` units of `quote` on `date`.
    pub fn add_rate(
        &mut self,
        date: NaiveDate,
        base: impl Into<String>,
        quote: impl Into<String>,
        price: Decimal,
    ) {
        let entries = self.rates.entry(base.into()).or_default();
        let at = entries.partition_point(|e| e.date <= date);
        entries.insert(
            at,
            RateEntry {
                date,
                price,
                currency: quote.into(),
            },
        );
    }

    /// Builder form of [`add_rate`](Self::add_rate).
    #[must_use]
    pub fn with_rate(
        mut self,
        date: NaiveDate,
        base: impl Into<String>,
        quote: impl Into<String>,
        price: Decimal,
    ) -> Self {
        self.add_rate(date, base, quote, price);
        self
    }

    /// Whether the table holds no rates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    fn direct(&self, base: &str, quote: &str, date: Option<NaiveDate>) -> Option<Decimal> {
        self.rates
            .get(base)?
            .iter()
            .rev()
            .find(|e| e.currency == quote && date.map_or(true, |d| e.date <= d))
            .map(|e| e.price)
    }

    fn direct_or_inverse(&self, base: &str, quote: &str, date: Option<NaiveDate>) -> Option<Decimal> {
        self.direct(base, quote, date).or_else(|| {
            self.direct(quote, base, date)
                .and_then(|p| Decimal::ONE.checked_div(p))
        })
    }

    // A -> B -> C for any B quoted against A in either direction.
    fn chained(&self, base: &str, quote: &str, date: Option<NaiveDate>) -> Option<Decimal> {
        let mut intermediates: Vec<&str> = self
            .rates
            .get(base)
            .into_iter()
            .flatten()
            .filter(|e| date.map_or(true, |d| e.date <= d))
            .map(|e| e.currency.as_str())
            .collect();
        intermediates.extend(self.rates.iter().filter_map(|(currency, entries)| {
            entries
                .iter()
                .any(|e| e.currency == base && date.map_or(true, |d| e.date <= d))
                .then_some(currency.as_str())
        }));

        intermediates
            .into_iter()
            .filter(|&via| via != quote && via != base)
            .find_map(|via| {
                let first = self.direct_or_inverse(base, via, date)?;
                let second = self.direct_or_inverse(via, quote, date)?;
                first.checked_mul(second)
            })
    }
}

impl RateLookup for RateTable {
    fn rate(&self, base: &str, quote: &str, date: Option<NaiveDate>) -> Option<Decimal> {
        if base == quote {
            return Some(Decimal::ONE);
        }
        self.direct_or_inverse(base, quote, date)
            .or_else(|| self.chained(base, quote, date))
    }
}

impl From<Vec<Quote>> for RateTable {
    fn from(quotes: Vec<Quote>) -> Self {
        let mut table = Self::new();
        for q in quotes {
            table.add_rate(q.date, q.base, q.quote, q.price);
        }
        table
    }
}
