//! Query algebra for the tally ledger.
//!
//! This crate turns ready-made query trees into matching predicates and
//! judges whether a query is safe to run.
//!
//! # Overview
//!
//! - [`Query`] is a tree of set operations (identity, complement, union,
//!   intersection, subtraction) over atoms.
//! - Atoms are [`DetailAtom`] (one line item), [`VoucherAtom`] (a whole
//!   voucher, optionally constrained by a detail query) and
//!   [`DistributedAtom`] (an asset or an amortization).
//! - [`is_dangerous`] tells whether a query has no provable bound.
//! - [`compile`] produces a [`Predicate`] that can be evaluated any number of
//!   times, handed to a [`RecordSource`], or shared across threads.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tally_core::{NaiveDate, Voucher, VoucherDetail};
//! use tally_query::{is_dangerous, select_vouchers, DetailAtom, Query};
//!
//! let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
//! let ledger = vec![
//!     Voucher::dated(day)
//!         .with_detail(VoucherDetail::new(1001, dec!(-12)).with_content("cash"))
//!         .with_detail(VoucherDetail::new(6602, dec!(12)).with_content("lunch")),
//! ];
//!
//! let query = Query::intersect(
//!     Query::atom(DetailAtom::new().with_title(6602)),
//!     Query::atom(DetailAtom::new().with_content("lunch")),
//! );
//!
//! assert!(!is_dangerous(&query));
//! assert_eq!(select_vouchers(&query, &ledger).len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod algebra;
pub mod ast;
pub mod atom;
pub mod error;
pub mod predicate;
pub mod select;
pub mod source;

pub use algebra::{advise, ensure_bounded, is_dangerous, Operator};
pub use ast::*;
pub use atom::Atom;
pub use error::{QueryError, UnboundedQueryWarning};
pub use predicate::{compile, Matcher, Predicate};
pub use select::{filter_vouchers, select_details, select_distributed, select_vouchers, RecordQuery};
pub use source::RecordSource;
