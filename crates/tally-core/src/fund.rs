//! Fund tolerance.
//!
//! Funds are exact decimals, but amounts coming out of currency conversion or
//! user input carry noise far below a cent. Every "is this zero" or "are these
//! equal" question in tally goes through [`TOLERANCE`].

use rust_decimal::Decimal;

/// The canonical fund tolerance, `1e-6`.
pub const TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 6);

/// Check whether a fund is zero, i.e. its magnitude is below [`TOLERANCE`].
///
/// # Example
///
/// ```
/// use tally_core::is_zero;
/// use rust_decimal_macros::dec;
///
/// assert!(is_zero(dec!(0.0000009)));
/// assert!(!is_zero(dec!(0.01)));
/// ```
#[must_use]
pub fn is_zero(fund: Decimal) -> bool {
    fund.abs() < TOLERANCE
}

/// Check whether two funds match, i.e. differ by at most [`TOLERANCE`].
#[must_use]
pub fn fund_eq(lhs: Decimal, rhs: Decimal) -> bool {
    lhs.checked_sub(rhs).is_some_and(|d| d.abs() <= TOLERANCE)
}
