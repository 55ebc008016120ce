//! Subtotal error types.

use rust_decimal::Decimal;
use tally_core::NaiveDate;
use tally_query::QueryError;
use thiserror::Error;

/// Error returned when building or presenting a subtotal fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubtotalError {
    /// No exchange rate is known for a required conversion.
    #[error("no rate from {currency} to {target}{}", on_date(.date))]
    MissingRate {
        /// Currency of the amount.
        currency: String,
        /// Currency requested.
        target: String,
        /// Date of the conversion; `None` for the latest rate.
        date: Option<NaiveDate>,
    },
    /// A named query refers back to itself.
    #[error("named query '{0}' refers to itself")]
    CyclicReference(String),
    /// Named queries are nested deeper than allowed.
    #[error("named query nesting exceeds {0} levels")]
    DepthExceeded(usize),
    /// A referenced named query does not exist.
    #[error("unknown named query: '{0}'")]
    UnknownNamedQuery(String),
    /// An amount left the representable range.
    #[error("amount overflow while aggregating")]
    Overflow,
    /// The underlying query is invalid.
    #[error(transparent)]
    Query(#[from] QueryError),
}

fn on_date(date: &Option<NaiveDate>) -> String {
    date.map(|d| format!(" on {d}")).unwrap_or_default()
}

/// Add two amounts, failing instead of overflowing.
pub(crate) fn checked_add(a: Decimal, b: Decimal) -> Result<Decimal, SubtotalError> {
    a.checked_add(b).ok_or(SubtotalError::Overflow)
}

/// Multiply two amounts, failing instead of overflowing.
pub(crate) fn checked_mul(a: Decimal, b: Decimal) -> Result<Decimal, SubtotalError> {
    a.checked_mul(b).ok_or(SubtotalError::Overflow)
}

/// Sum amounts, failing instead of overflowing.
pub(crate) fn checked_sum(
    amounts: impl IntoIterator<Item = Decimal>,
) -> Result<Decimal, SubtotalError> {
    amounts.into_iter().try_fold(Decimal::ZERO, checked_add)
}
