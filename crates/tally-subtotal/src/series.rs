//! Running balances.

use rust_decimal::Decimal;
use serde::Serialize;
use tally_core::{fund_eq, DateRange, NaiveDate};

use crate::bucket::Granularity;
use crate::error::{checked_add, checked_sum, SubtotalError};

/// One point of a running balance: the balance at the end of a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reading {
    /// Bucket start; `None` for the undated bucket.
    pub date: Option<NaiveDate>,
    /// Cumulative balance.
    pub fund: Decimal,
}

/// A dated change of a balance.
pub type Movement = (Option<NaiveDate>, Decimal);

fn sorted(movements: &[Movement]) -> Vec<Movement> {
    let mut sorted = movements.to_vec();
    sorted.sort_by_key(|m| m.0);
    sorted
}

/// Daily running balance, keeping the first day and every day on which the
/// balance differs from the last kept reading.
///
/// Undated movements form the first reading.
///
/// # Errors
///
/// [`SubtotalError::Overflow`] when the balance leaves the decimal range.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tally_core::NaiveDate;
/// use tally_subtotal::series::changed_day;
///
/// let d = |day| Some(NaiveDate::from_ymd_opt(2024, 1, day).unwrap());
/// let readings = changed_day(&[(d(1), dec!(5)), (d(2), dec!(0)), (d(3), dec!(-5))]).unwrap();
///
/// assert_eq!(readings.len(), 2);
/// assert_eq!(readings[1].date, d(3));
/// assert_eq!(readings[1].fund, dec!(0));
/// ```
pub fn changed_day(movements: &[Movement]) -> Result<Vec<Reading>, SubtotalError> {
    let movements = sorted(movements);
    let mut readings: Vec<Reading> = Vec::new();
    let mut balance = Decimal::ZERO;
    let mut iter = movements.iter().peekable();

    while let Some(&(date, amount)) = iter.next() {
        balance = checked_add(balance, amount)?;
        if iter.peek().is_some_and(|next| next.0 == date) {
            continue;
        }
        if readings.last().map_or(true, |last| !fund_eq(last.fund, balance)) {
            readings.push(Reading {
                date,
                fund: balance,
            });
        }
    }

    Ok(readings)
}

/// Running balance read once per bucket across a range.
///
/// Open range ends are closed by the first and last dated movement.
/// Movements before the range and undated movements make up the opening
/// balance; movements after the range are ignored.
///
/// Buckets are walked as contiguous windows: the first starts at the bucket
/// of the range start and each next one is a [`Granularity::step`] later.
/// For billing and financial months this differs from grouping, which puts a
/// date in the cycle [`Granularity::normalize`] assigns it. A grouping bucket
/// may therefore collect dates from both sides of the window that reads it:
/// the 2024-01-09 billing bucket groups 2023-12-10 while its reading covers
/// 2024-01-09 to 2024-02-08 only.
///
/// # Errors
///
/// [`SubtotalError::Overflow`] when the balance leaves the decimal range.
pub fn every_day(
    movements: &[Movement],
    range: &DateRange,
    interval: Granularity,
) -> Result<Vec<Reading>, SubtotalError> {
    let movements = sorted(movements);
    let dated: Vec<(NaiveDate, Decimal)> = movements
        .iter()
        .filter_map(|&(date, amount)| date.map(|d| (d, amount)))
        .collect();

    let (Some(start), Some(end)) = (
        range.start.or_else(|| dated.first().map(|m| m.0)),
        range.end.or_else(|| dated.last().map(|m| m.0)),
    ) else {
        return Ok(Vec::new());
    };
    if end < start {
        return Ok(Vec::new());
    }

    let mut balance = checked_sum(
        movements
            .iter()
            .filter(|m| m.0.map_or(true, |d| d < start))
            .map(|m| m.1),
    )?;
    let mut pending = dated.iter().skip_while(|m| m.0 < start).peekable();
    let mut readings = Vec::new();
    let mut bucket = interval.normalize(start);

    loop {
        let last = interval.last_day(bucket).min(end);
        while let Some(&(_, amount)) = pending.next_if(|m| m.0 <= last) {
            balance = checked_add(balance, amount)?;
        }
        readings.push(Reading {
            date: Some(bucket),
            fund: balance,
        });
        match interval.step(bucket) {
            Some(next) if next <= end => bucket = next,
            _ => break,
        }
    }

    Ok(readings)
}
