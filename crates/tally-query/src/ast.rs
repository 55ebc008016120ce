//! Query abstract syntax tree.
//!
//! A query is a tree of set operations over leaf filters ("atoms"). The tree
//! is generic over the atom type so the same algebra serves detail queries,
//! voucher queries and distributed-item queries. Trees arrive ready-made from
//! a front end; nothing in this crate parses text.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_core::{DateRange, VoucherType};

use crate::algebra::Operator;
use crate::error::QueryError;

/// A compound query over atoms of type `A`.
///
/// Dropping a query walks its nodes with an explicit stack, so arbitrarily
/// deep trees are released without recursion. The default atom fills the
/// slots vacated while unlinking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Query<A: Default> {
    /// A leaf filter.
    Atom(A),
    /// A unary operation.
    Unary(Box<UnaryQuery<A>>),
    /// A binary operation.
    Binary(Box<BinaryQuery<A>>),
}

/// A unary operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnaryQuery<A: Default> {
    /// Operator.
    pub op: UnaryOperator,
    /// Operand.
    pub operand: Query<A>,
}

/// A binary operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryQuery<A: Default> {
    /// Operator.
    pub op: BinaryOperator,
    /// Left operand.
    pub left: Query<A>,
    /// Right operand. A dangling operation without one behaves as its left
    /// operand.
    pub right: Option<Query<A>>,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOperator {
    /// `+x`: the operand itself.
    Identity,
    /// `-x`: everything the operand does not match.
    Complement,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOperator {
    /// `x + y`.
    Union,
    /// `x y` or `x * y`.
    Intersect,
    /// `x - y`.
    Subtract,
}

impl<A: Default> Query<A> {
    /// Create a leaf.
    pub const fn atom(atom: A) -> Self {
        Self::Atom(atom)
    }

    /// Create a unary operation.
    pub fn unary(op: UnaryOperator, operand: Self) -> Self {
        Self::Unary(Box::new(UnaryQuery { op, operand }))
    }

    /// Create a binary operation.
    pub fn binary(left: Self, op: BinaryOperator, right: Self) -> Self {
        Self::Binary(Box::new(BinaryQuery {
            op,
            left,
            right: Some(right),
        }))
    }

    /// Create a binary operation that lacks its right operand.
    pub fn dangling(left: Self, op: BinaryOperator) -> Self {
        Self::Binary(Box::new(BinaryQuery {
            op,
            left,
            right: None,
        }))
    }

    /// `+x`.
    pub fn identity(operand: Self) -> Self {
        Self::unary(UnaryOperator::Identity, operand)
    }

    /// `-x`.
    pub fn complement(operand: Self) -> Self {
        Self::unary(UnaryOperator::Complement, operand)
    }

    /// `x + y`.
    pub fn union(left: Self, right: Self) -> Self {
        Self::binary(left, BinaryOperator::Union, right)
    }

    /// `x y`.
    pub fn intersect(left: Self, right: Self) -> Self {
        Self::binary(left, BinaryOperator::Intersect, right)
    }

    /// `x - y`.
    pub fn subtract(left: Self, right: Self) -> Self {
        Self::binary(left, BinaryOperator::Subtract, right)
    }

    /// Build a node the way a front end hands it over: an operator symbol
    /// with an optional left operand and an optional right operand.
    ///
    /// A prefix symbol (`+x`, `-x`) is unary, an infix one is binary, and an
    /// infix intersection may dangle without its right operand.
    ///
    /// # Errors
    ///
    /// [`QueryError::UnknownOperator`] for a symbol outside `+`, `-`, `*` and
    /// juxtaposition (empty symbol); [`QueryError::Malformed`] when the
    /// operands don't fit the operator.
    pub fn from_parts(
        symbol: &str,
        left: Option<Self>,
        right: Option<Self>,
    ) -> Result<Self, QueryError> {
        match (left, right) {
            (None, Some(operand)) => match Operator::resolve(symbol, false)? {
                Operator::Unary(op) => Ok(Self::unary(op, operand)),
                Operator::Binary(_) => Err(QueryError::Malformed(format!(
                    "operator '{symbol}' has no left operand"
                ))),
            },
            (Some(left), right) => match Operator::resolve(symbol, true)? {
                Operator::Binary(op) => match right {
                    Some(right) => Ok(Self::binary(left, op, right)),
                    None if op == BinaryOperator::Intersect => Ok(Self::dangling(left, op)),
                    None => Err(QueryError::Malformed(format!(
                        "operator '{symbol}' has no right operand"
                    ))),
                },
                Operator::Unary(_) => Err(QueryError::Malformed(format!(
                    "operator '{symbol}' cannot take a left operand"
                ))),
            },
            (None, None) => Err(QueryError::Malformed(format!(
                "operator '{symbol}' has no operands"
            ))),
        }
    }
}

impl<A: Default> From<A> for Query<A> {
    fn from(atom: A) -> Self {
        Self::Atom(atom)
    }
}

impl<A: Default> Drop for Query<A> {
    fn drop(&mut self) {
        if let Self::Atom(_) = self {
            return;
        }
        let mut pending = Vec::new();
        detach_children(self, &mut pending);
        while let Some(mut node) = pending.pop() {
            detach_children(&mut node, &mut pending);
        }
    }
}

/// Move the operands of `query` onto `pending`, leaving leaves behind.
fn detach_children<A: Default>(query: &mut Query<A>, pending: &mut Vec<Query<A>>) {
    match query {
        Query::Atom(_) => {}
        Query::Unary(node) => {
            pending.push(std::mem::replace(&mut node.operand, Query::Atom(A::default())));
        }
        Query::Binary(node) => {
            pending.push(std::mem::replace(&mut node.left, Query::Atom(A::default())));
            if let Some(right) = node.right.take() {
                pending.push(right);
            }
        }
    }
}

// ============================================================================
// Atoms
// ============================================================================

/// Required sign of a detail's fund.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Direction {
    /// No constraint (`0`).
    #[default]
    Any,
    /// Strictly positive fund (`1`).
    Debit,
    /// Strictly negative fund (`-1`).
    Credit,
}

impl TryFrom<i8> for Direction {
    type Error = QueryError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Any),
            1 => Ok(Self::Debit),
            -1 => Ok(Self::Credit),
            other => Err(QueryError::Malformed(format!(
                "direction must be -1, 0 or 1, got {other}"
            ))),
        }
    }
}

impl From<Direction> for i8 {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Any => 0,
            Direction::Debit => 1,
            Direction::Credit => -1,
        }
    }
}

/// Class of an account title, decided by its range in the chart of accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleKind {
    /// Titles `1000..2000`.
    Asset,
    /// Titles `2000..3000`.
    Liability,
    /// Titles `3000..4000`, accounts on either side.
    Mutual,
    /// Titles `4000..5000`.
    Equity,
    /// Titles `5000..6000`.
    Cost,
    /// Titles `6000..6400`.
    Revenue,
    /// Titles `6400..7000`.
    Expense,
}

impl TitleKind {
    /// The kind of a title, or `None` outside the chart.
    ///
    /// # Examples
    ///
    /// ```
    /// use tally_query::TitleKind;
    ///
    /// assert_eq!(TitleKind::of(1001), Some(TitleKind::Asset));
    /// assert_eq!(TitleKind::of(6602), Some(TitleKind::Expense));
    /// assert_eq!(TitleKind::of(9000), None);
    /// ```
    #[must_use]
    pub const fn of(title: i32) -> Option<Self> {
        match title {
            1000..=1999 => Some(Self::Asset),
            2000..=2999 => Some(Self::Liability),
            3000..=3999 => Some(Self::Mutual),
            4000..=4999 => Some(Self::Equity),
            5000..=5999 => Some(Self::Cost),
            6000..=6399 => Some(Self::Revenue),
            6400..=6999 => Some(Self::Expense),
            _ => None,
        }
    }
}

/// Filter over a single voucher detail.
///
/// Missing fields are wildcards. An empty `content` or `remark` and a zero
/// `sub_title` require the field to be absent on the detail.
///
/// # Examples
///
/// ```
/// use tally_query::{DetailAtom, Direction};
///
/// let atom = DetailAtom::new()
///     .with_title(6602)
///     .with_content("lunch")
///     .with_direction(Direction::Debit);
///
/// assert_eq!(atom.title, Some(6602));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailAtom {
    /// Required fund sign.
    #[serde(default, rename = "dir")]
    pub direction: Direction,
    /// Class the title must belong to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TitleKind>,
    /// Account title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<i32>,
    /// Account sub-title; `0` means "no sub-title".
    #[serde(default, rename = "subtitle", skip_serializing_if = "Option::is_none")]
    pub sub_title: Option<i32>,
    /// Content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Remark.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    /// Fund, compared within tolerance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fund: Option<Decimal>,
    /// Currency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Owner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl DetailAtom {
    /// A filter matching every detail.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a fund sign.
    #[must_use]
    pub const fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Require a title class.
    #[must_use]
    pub const fn with_kind(mut self, kind: TitleKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Require a title.
    #[must_use]
    pub const fn with_title(mut self, title: i32) -> Self {
        self.title = Some(title);
        self
    }

    /// Require a sub-title (`0` for none).
    #[must_use]
    pub const fn with_sub_title(mut self, sub_title: i32) -> Self {
        self.sub_title = Some(sub_title);
        self
    }

    /// Require a content (empty for none).
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Require a remark (empty for none).
    #[must_use]
    pub fn with_remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = Some(remark.into());
        self
    }

    /// Require a fund.
    #[must_use]
    pub const fn with_fund(mut self, fund: Decimal) -> Self {
        self.fund = Some(fund);
        self
    }

    /// Require a currency.
    #[must_use]
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    /// Require an owner.
    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }
}

/// Filter over a whole voucher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherAtom {
    /// Date range the voucher date must fall in.
    #[serde(default)]
    pub range: DateRange,
    /// Voucher kind.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub voucher_type: Option<VoucherType>,
    /// Voucher remark (empty for none).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    /// Query the voucher's details must satisfy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Query<DetailAtom>>,
    /// Require every detail to match `details` instead of at least one.
    #[serde(default)]
    pub for_all: bool,
}

impl VoucherAtom {
    /// A filter matching vouchers within a date range.
    #[must_use]
    pub fn within(range: DateRange) -> Self {
        Self {
            range,
            ..Self::default()
        }
    }

    /// Require a voucher kind.
    #[must_use]
    pub const fn with_type(mut self, voucher_type: VoucherType) -> Self {
        self.voucher_type = Some(voucher_type);
        self
    }

    /// Require a remark (empty for none).
    #[must_use]
    pub fn with_remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = Some(remark.into());
        self
    }

    /// Require at least one detail to match.
    #[must_use]
    pub fn with_any_detail(mut self, details: Query<DetailAtom>) -> Self {
        self.details = Some(details);
        self.for_all = false;
        self
    }

    /// Require every detail to match.
    #[must_use]
    pub fn with_all_details(mut self, details: Query<DetailAtom>) -> Self {
        self.details = Some(details);
        self.for_all = true;
        self
    }
}

/// Filter over an asset or an amortization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributedAtom {
    /// Identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Name (empty for none).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Remark (empty for none).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    /// Owner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl DistributedAtom {
    /// A filter on the identifier.
    #[must_use]
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// A filter on the name.
    #[must_use]
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Require a remark (empty for none).
    #[must_use]
    pub fn with_remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = Some(remark.into());
        self
    }

    /// Require an owner.
    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }
}
