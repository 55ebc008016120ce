//! Hierarchical subtotals for the tally ledger.
//!
//! Matched `(record, amount)` pairs are grouped level by level into an
//! [`AggregationNode`] tree, optionally converted into one currency and
//! turned into running balances, then rendered by a [`Traversal`].
//!
//! # Overview
//!
//! - [`SubtotalSpec`] names the levels, the [`GatherMode`] and the
//!   [`AggregationMode`].
//! - [`build_aggregation`] builds the tree.
//! - [`present`] walks it; [`render_text`] and [`render_json`] are the stock
//!   presenters, and [`Reporter`] composes weighted reports from
//!   [`NamedQuery`]s.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tally_core::{NaiveDate, Voucher, VoucherDetail};
//! use tally_query::{DetailAtom, Query, RecordQuery};
//! use tally_subtotal::{
//!     build_aggregation, render_text, GroupLevel, PresentOptions, RateTable, SubtotalSpec,
//! };
//!
//! let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
//! let ledger = vec![
//!     Voucher::dated(day)
//!         .with_detail(VoucherDetail::new(1001, dec!(-12)).with_content("cash"))
//!         .with_detail(VoucherDetail::new(6602, dec!(12)).with_content("lunch")),
//! ];
//!
//! let query = RecordQuery::details(Query::atom(DetailAtom::new().with_title(6602)));
//! let spec = SubtotalSpec::new(vec![GroupLevel::Title, GroupLevel::Month]);
//! let tree = build_aggregation(&spec, query.select(ledger.as_slice()), &RateTable::new()).unwrap();
//!
//! let text = render_text(&tree, &spec, &PresentOptions::default(), None);
//! assert_eq!(text, "12\n6602\t12\n\t202406\t12");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bucket;
pub mod error;
pub mod present;
pub mod rates;
pub mod report;
pub mod series;
pub mod spec;
pub mod titles;
pub mod traverse;
pub mod tree;

pub use bucket::{Granularity, BILLING_DAY, FINANCIAL_DAY, UNDATED_LABEL};
pub use error::SubtotalError;
pub use present::{
    format_fund, render_json, render_text, Collation, JsonPresenter, LexicalCollation,
    PresentOptions, TextPresenter,
};
pub use rates::{Quote, RateLookup, RateTable};
pub use report::{
    NamedQuery, NamedQueryBody, NamedQueryLibrary, Report, ReportOptions, Reporter,
    DEFAULT_MAX_DEPTH,
};
pub use series::Reading;
pub use spec::{
    AggregationMode, Equivalence, GatherMode, GroupLevel, GroupedQuery, SubtotalSpec,
    DEFAULT_EQUIVALENT_LEVELS, DEFAULT_LEVELS,
};
pub use titles::{ChartOfAccounts, TitleEntry, TitleLookup};
pub use traverse::{present, present_at, Below, Traversal, Visit};
pub use tree::{build_aggregation, AggregationNode, GroupKey};
