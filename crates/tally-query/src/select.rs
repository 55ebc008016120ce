//! Selecting vouchers, details and distributed items.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_core::{Distributed, Record, Voucher};
use tracing::debug;

use crate::algebra::is_dangerous;
use crate::ast::{DetailAtom, DistributedAtom, Query, VoucherAtom};
use crate::predicate::{compile, Predicate};
use crate::source::RecordSource;

/// Vouchers with at least one detail matching the query.
pub fn select_vouchers<'v>(query: &Query<DetailAtom>, vouchers: &'v [Voucher]) -> Vec<&'v Voucher> {
    let predicate = compile(query);
    vouchers
        .iter()
        .filter(|v| v.details.iter().any(|d| predicate.matches(d)))
        .collect()
}

/// Vouchers matching a voucher-level query.
pub fn filter_vouchers<'v>(query: &Query<VoucherAtom>, vouchers: &'v [Voucher]) -> Vec<&'v Voucher> {
    let predicate = compile(query);
    vouchers.iter().filter(|v| predicate.matches(v)).collect()
}

/// Matching details as `(record, fund)` pairs, ready for aggregation.
pub fn select_details<'v>(
    query: &Query<DetailAtom>,
    vouchers: &'v [Voucher],
) -> Vec<(Record<'v>, Decimal)> {
    vouchers.fetch(&compile(query))
}

/// Assets or amortizations matching the query.
pub fn select_distributed<'d>(
    query: &Query<DistributedAtom>,
    items: &'d [Distributed],
) -> Vec<&'d Distributed> {
    let predicate = compile(query);
    items.iter().filter(|i| predicate.matches(i)).collect()
}

/// A detail query scoped by an optional voucher query.
///
/// Either side may be missing, in which case it matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordQuery {
    /// Voucher-level filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vouchers: Option<Query<VoucherAtom>>,
    /// Detail-level filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Query<DetailAtom>>,
}

impl RecordQuery {
    /// A query over details only.
    #[must_use]
    pub const fn details(details: Query<DetailAtom>) -> Self {
        Self {
            vouchers: None,
            details: Some(details),
        }
    }

    /// Scope the query to matching vouchers.
    #[must_use]
    pub fn within(mut self, vouchers: Query<VoucherAtom>) -> Self {
        self.vouchers = Some(vouchers);
        self
    }

    /// A record query is bounded when either of its filters is.
    #[must_use]
    pub fn is_dangerous(&self) -> bool {
        self.vouchers.as_ref().map_or(true, is_dangerous)
            && self.details.as_ref().map_or(true, is_dangerous)
    }

    /// Run the query against a record source.
    pub fn select<'s, S>(&self, source: &'s S) -> Vec<(Record<'s>, Decimal)>
    where
        S: RecordSource + ?Sized,
    {
        let vouchers = self.vouchers.as_ref().map_or_else(Predicate::always, compile);
        let details = self.details.as_ref().map_or_else(Predicate::always, compile);
        let records = source.fetch_filtered(&vouchers, &details);
        debug!(records = records.len(), "selected records");
        records
    }
}
