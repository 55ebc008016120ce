//! Core types for tally
//!
//! This crate provides the fundamental types used throughout the tally project:
//!
//! - [`Voucher`] - A dated accounting entry holding line items
//! - [`VoucherDetail`] - One line item: title, sub-title, content, remark, currency, user, fund
//! - [`VoucherType`] - Ordinary vouchers and the generated kinds (carry, depreciation, ...)
//! - [`Distributed`] - The filterable face shared by assets and amortizations
//! - [`DateRange`] - A possibly open date interval with explicit handling of undated records
//! - [`Record`] - A borrowed (voucher, detail) pair, the unit of matching and grouping
//! - [`TOLERANCE`] - The fund tolerance used for every fuzzy comparison
//!
//! # Example
//!
//! ```
//! use tally_core::{DateRange, NaiveDate, Voucher, VoucherDetail};
//! use rust_decimal_macros::dec;
//!
//! let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
//! let voucher = Voucher::dated(date)
//!     .with_detail(VoucherDetail::new(1001, dec!(-25.00)).with_content("cash"))
//!     .with_detail(VoucherDetail::new(6602, dec!(25.00)).with_content("lunch"));
//!
//! assert_eq!(voucher.records().count(), 2);
//! assert!(DateRange::since(date).contains(voucher.date));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod date_range;
pub mod distributed;
pub mod fund;
pub mod record;
pub mod voucher;

pub use date_range::DateRange;
pub use distributed::Distributed;
pub use fund::{fund_eq, is_zero, TOLERANCE};
pub use record::Record;
pub use voucher::{Voucher, VoucherDetail, VoucherType, BASE_CURRENCY, DEFAULT_USER};

// Re-export commonly used external types
pub use chrono::NaiveDate;
pub use rust_decimal::Decimal;
