//! Operator resolution and dangerousness analysis.
//!
//! A query is *dangerous* when nothing in it provably bounds the records it
//! selects. Complements are always dangerous, a union is as dangerous as its
//! worst side, an intersection is only dangerous when both sides are, and a
//! subtraction inherits the danger of what it subtracts from.
//!
//! Queries can be arbitrarily deep (front ends fold long operator chains into
//! left-leaning spines), so the analysis walks the tree with an explicit
//! worklist instead of recursing.

use tracing::warn;

use crate::ast::{BinaryOperator, Query, UnaryOperator};
use crate::atom::Atom;
use crate::error::{QueryError, UnboundedQueryWarning};

/// An operator resolved from its symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Prefix operator.
    Unary(UnaryOperator),
    /// Infix operator.
    Binary(BinaryOperator),
}

impl Operator {
    /// Resolve an operator symbol.
    ///
    /// `+` and `-` are identity and complement in prefix position, union and
    /// subtraction in infix position. `*` and juxtaposition (an empty symbol)
    /// are intersection and only exist in infix position.
    ///
    /// # Errors
    ///
    /// [`QueryError::UnknownOperator`] for any other symbol and
    /// [`QueryError::Malformed`] for a prefix intersection.
    pub fn resolve(symbol: &str, infix: bool) -> Result<Self, QueryError> {
        match (symbol.trim(), infix) {
            ("+", false) => Ok(Self::Unary(UnaryOperator::Identity)),
            ("-", false) => Ok(Self::Unary(UnaryOperator::Complement)),
            ("+", true) => Ok(Self::Binary(BinaryOperator::Union)),
            ("-", true) => Ok(Self::Binary(BinaryOperator::Subtract)),
            ("*" | "", true) => Ok(Self::Binary(BinaryOperator::Intersect)),
            ("*" | "", false) => Err(QueryError::Malformed(
                "intersection needs a left operand".to_string(),
            )),
            (other, _) => Err(QueryError::UnknownOperator(other.to_string())),
        }
    }
}

enum Frame<'q, A: Default> {
    Visit(&'q Query<A>),
    Combine(BinaryOperator),
}

/// Whether a query has no provable bound.
///
/// # Examples
///
/// ```
/// use tally_query::{is_dangerous, DetailAtom, Query};
///
/// let cash = Query::atom(DetailAtom::new().with_title(1001));
/// let lunch = Query::atom(DetailAtom::new().with_content("lunch"));
///
/// assert!(is_dangerous(&cash));
/// assert!(!is_dangerous(&Query::intersect(cash.clone(), lunch.clone())));
/// assert!(is_dangerous(&Query::complement(lunch)));
/// ```
pub fn is_dangerous<A: Atom>(query: &Query<A>) -> bool {
    let mut work = vec![Frame::Visit(query)];
    let mut values: Vec<bool> = Vec::new();

    while let Some(frame) = work.pop() {
        match frame {
            Frame::Visit(Query::Atom(atom)) => values.push(atom.is_dangerous()),
            Frame::Visit(Query::Unary(node)) => match node.op {
                UnaryOperator::Identity => work.push(Frame::Visit(&node.operand)),
                // The operand is irrelevant, no need to visit it.
                UnaryOperator::Complement => values.push(true),
            },
            Frame::Visit(Query::Binary(node)) => match (node.op, &node.right) {
                (BinaryOperator::Subtract, _) | (_, None) => work.push(Frame::Visit(&node.left)),
                (op, Some(right)) => {
                    work.push(Frame::Combine(op));
                    work.push(Frame::Visit(right));
                    work.push(Frame::Visit(&node.left));
                }
            },
            Frame::Combine(op) => {
                // Both operands were pushed before their combinator.
                let right = values.pop().unwrap_or(true);
                let left = values.pop().unwrap_or(true);
                values.push(match op {
                    BinaryOperator::Intersect => left && right,
                    BinaryOperator::Union | BinaryOperator::Subtract => left || right,
                });
            }
        }
    }

    values.pop().unwrap_or(true)
}

/// Produce an advisory for a dangerous query.
///
/// The query is still usable; callers decide whether to warn the user, ask
/// for confirmation, or go ahead.
pub fn advise<A: Atom>(query: &Query<A>) -> Option<UnboundedQueryWarning> {
    if is_dangerous(query) {
        warn!("{}", UnboundedQueryWarning);
        Some(UnboundedQueryWarning)
    } else {
        None
    }
}

/// Refuse a dangerous query unless explicitly allowed.
///
/// # Errors
///
/// [`QueryError::Unbounded`] when the query is dangerous and `allow_unbounded`
/// is false.
pub fn ensure_bounded<A: Atom>(query: &Query<A>, allow_unbounded: bool) -> Result<(), QueryError> {
    match advise(query) {
        Some(_) if !allow_unbounded => Err(QueryError::Unbounded),
        _ => Ok(()),
    }
}
