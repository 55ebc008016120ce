//! Query error types.

use std::fmt;

use thiserror::Error;

/// Error returned when a query cannot be resolved or run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The tree is structurally invalid.
    #[error("malformed query: {0}")]
    Malformed(String),
    /// An operator symbol has no meaning.
    #[error("unknown operator: '{0}'")]
    UnknownOperator(String),
    /// The query has no provable bound and the caller refused to run it.
    #[error("query is unbounded and would scan the whole ledger")]
    Unbounded,
}

/// Advisory raised for a query with no provable bound.
///
/// Unlike [`QueryError::Unbounded`] this is not a failure: the query is still
/// valid, it just selects whole ledger histories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnboundedQueryWarning;

impl fmt::Display for UnboundedQueryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("query is unbounded; it may match the whole ledger")
    }
}
