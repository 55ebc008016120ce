//! Aggregation trees.
//!
//! Matched records are grouped level by level into a tree whose root holds
//! the grand total. A node's depth tells which level it was grouped by: the
//! children of the root are grouped by the first level, their children by the
//! second, and so on. Every internal node's fund is the sum of its children.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use serde::Serialize;
use tally_core::{is_zero, NaiveDate, Record};
use tracing::{debug, trace};

use crate::bucket::{normalize, Granularity};
use crate::error::{checked_add, checked_sum, SubtotalError};
use crate::rates::RateLookup;
use crate::series::{changed_day, every_day, Movement, Reading};
use crate::spec::{AggregationMode, GatherMode, GroupLevel, SubtotalSpec};

/// Value a node was grouped by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "level", content = "value", rename_all = "snake_case")]
pub enum GroupKey {
    /// The root of the tree.
    Root,
    /// A currency.
    Currency(String),
    /// An account title.
    Title(i32),
    /// An account sub-title, `None` for title-level postings.
    SubTitle(Option<i32>),
    /// A content.
    Content(Option<String>),
    /// A remark.
    Remark(Option<String>),
    /// An owner.
    User(String),
    /// A calendar bucket, `None` for undated vouchers.
    Date(Option<NaiveDate>),
}

impl GroupKey {
    /// Key of a record at a level.
    #[must_use]
    pub fn of(level: GroupLevel, record: &Record<'_>) -> Self {
        let detail = record.detail();
        match level {
            GroupLevel::Currency => Self::Currency(detail.currency.clone()),
            GroupLevel::Title => Self::Title(detail.title),
            GroupLevel::SubTitle => Self::SubTitle(detail.sub_title),
            GroupLevel::Content => Self::Content(detail.content.clone()),
            GroupLevel::Remark => Self::Remark(detail.remark.clone()),
            GroupLevel::User => Self::User(detail.user.clone()),
            GroupLevel::Day
            | GroupLevel::Week
            | GroupLevel::Month
            | GroupLevel::Year
            | GroupLevel::BillingMonth
            | GroupLevel::FinancialMonth => Self::Date(normalize(
                record.date(),
                level.granularity().unwrap_or_default(),
            )),
        }
    }

    /// Display label.
    ///
    /// Titles are four digits and sub-titles two; missing values are empty,
    /// except undated buckets which use the bucketer's label.
    #[must_use]
    pub fn label(&self, granularity: Granularity) -> String {
        match self {
            Self::Root | Self::SubTitle(None) | Self::Content(None) | Self::Remark(None) => {
                String::new()
            }
            Self::Currency(s) | Self::User(s) | Self::Content(Some(s)) | Self::Remark(Some(s)) => {
                s.clone()
            }
            Self::Title(t) => format!("{t:04}"),
            Self::SubTitle(Some(s)) => format!("{s:02}"),
            Self::Date(d) => granularity.label(*d),
        }
    }
}

/// One node of an aggregation tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregationNode {
    /// Value this node was grouped by.
    pub key: GroupKey,
    /// Total of the node, or a count under counting gather modes.
    pub fund: Decimal,
    /// Sub-groups, in insertion order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<AggregationNode>,
    /// Running balance of a last-level node when an aggregation mode is set.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub readings: Vec<Reading>,
}

impl AggregationNode {
    /// An empty node.
    #[must_use]
    pub const fn new(key: GroupKey) -> Self {
        Self {
            key,
            fund: Decimal::ZERO,
            children: Vec::new(),
            readings: Vec::new(),
        }
    }

    /// Whether the node has no sub-groups.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Child grouped by `key`.
    #[must_use]
    pub fn child(&self, key: &GroupKey) -> Option<&Self> {
        self.children.iter().find(|c| &c.key == key)
    }

    /// Follow a path of keys from this node.
    #[must_use]
    pub fn descend(&self, keys: &[GroupKey]) -> Option<&Self> {
        keys.iter().try_fold(self, |node, key| node.child(key))
    }

    /// Number of leaves below (or at) this node.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.is_leaf() {
                count += 1;
            }
            stack.extend(node.children.iter());
        }
        count
    }
}

#[derive(Debug)]
struct Builder {
    key: GroupKey,
    fund: Decimal,
    children: Vec<Builder>,
    index: HashMap<GroupKey, usize>,
    movements: Vec<Movement>,
    vouchers: HashSet<usize>,
}

impl Builder {
    fn new(key: GroupKey) -> Self {
        Self {
            key,
            fund: Decimal::ZERO,
            children: Vec::new(),
            index: HashMap::new(),
            movements: Vec::new(),
            vouchers: HashSet::new(),
        }
    }

    fn child_mut(&mut self, key: &GroupKey) -> &mut Self {
        let at = match self.index.get(key) {
            Some(&at) => at,
            None => {
                self.children.push(Self::new(key.clone()));
                self.index.insert(key.clone(), self.children.len() - 1);
                self.children.len() - 1
            }
        };
        &mut self.children[at]
    }

    /// Add an amount along the path; returns whether the leaf accepted it.
    /// With a voucher identity the leaf only accepts each voucher once.
    fn insert(
        &mut self,
        keys: &[GroupKey],
        movement: Movement,
        voucher: Option<usize>,
    ) -> Result<bool, SubtotalError> {
        let accepted = match keys.split_first() {
            Some((key, rest)) => self.child_mut(key).insert(rest, movement, voucher)?,
            None => {
                if voucher.is_some_and(|id| !self.vouchers.insert(id)) {
                    return Ok(false);
                }
                self.movements.push(movement);
                true
            }
        };
        if accepted {
            self.fund = checked_add(self.fund, movement.1)?;
        }
        Ok(accepted)
    }

    fn finish(
        self,
        depth: usize,
        spec: &SubtotalSpec,
    ) -> Result<Option<AggregationNode>, SubtotalError> {
        let last = depth == spec.levels().len();
        let prune = spec.gather == GatherMode::NonZero
            && !matches!(spec.aggregation, AggregationMode::ChangedDay);

        if last {
            if prune && depth > 0 && is_zero(self.fund) {
                return Ok(None);
            }
            let readings = match &spec.aggregation {
                AggregationMode::None => Vec::new(),
                AggregationMode::ChangedDay => changed_day(&self.movements)?,
                AggregationMode::EveryDay { range, interval } => {
                    every_day(&self.movements, range, *interval)?
                }
            };
            return Ok(Some(AggregationNode {
                key: self.key,
                fund: self.fund,
                children: Vec::new(),
                readings,
            }));
        }

        let mut children = Vec::with_capacity(self.children.len());
        for child in self.children {
            if let Some(node) = child.finish(depth + 1, spec)? {
                children.push(node);
            }
        }
        if prune && depth > 0 && children.is_empty() {
            return Ok(None);
        }
        let fund = if prune {
            checked_sum(children.iter().map(|c| c.fund))?
        } else {
            self.fund
        };
        Ok(Some(AggregationNode {
            key: self.key,
            fund,
            children,
            readings: Vec::new(),
        }))
    }
}

/// Group matched records into a tree.
///
/// With an equivalence set, every amount is converted into the target
/// currency before it is added; a missing rate aborts the whole call.
///
/// # Errors
///
/// [`SubtotalError::MissingRate`] for an amount that cannot be converted;
/// [`SubtotalError::Overflow`] when a total leaves the decimal range.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tally_core::{Voucher, VoucherDetail};
/// use tally_subtotal::{build_aggregation, GroupLevel, RateTable, SubtotalSpec};
///
/// let ledger = [Voucher::undated()
///     .with_detail(VoucherDetail::new(1001, dec!(-30)))
///     .with_detail(VoucherDetail::new(6602, dec!(30)))];
/// let records = ledger.iter().flat_map(Voucher::records).map(|r| (r, r.detail().fund));
///
/// let spec = SubtotalSpec::new(vec![GroupLevel::Title]);
/// let tree = build_aggregation(&spec, records, &RateTable::new()).unwrap();
///
/// assert_eq!(tree.fund, dec!(0));
/// assert_eq!(tree.children.len(), 2);
/// ```
pub fn build_aggregation<'r, I, R>(
    spec: &SubtotalSpec,
    records: I,
    rates: &R,
) -> Result<AggregationNode, SubtotalError>
where
    I: IntoIterator<Item = (Record<'r>, Decimal)>,
    R: RateLookup + ?Sized,
{
    let levels = spec.levels();
    let mut root = Builder::new(GroupKey::Root);
    let mut count = 0usize;

    for (record, amount) in records {
        let amount = match spec.gather {
            GatherMode::Count | GatherMode::VoucherCount => Decimal::ONE,
            GatherMode::All | GatherMode::NonZero => match &spec.equivalence {
                Some(eq) => rates.convert(
                    amount,
                    &record.detail().currency,
                    &eq.currency,
                    eq.date.or_else(|| record.date()),
                )?,
                None => amount,
            },
        };
        let keys: Vec<GroupKey> = levels.iter().map(|&l| GroupKey::of(l, &record)).collect();
        let voucher = (spec.gather == GatherMode::VoucherCount).then(|| record.voucher_identity());

        trace!(?keys, %amount, "inserting record");
        root.insert(&keys, (record.date(), amount), voucher)?;
        count += 1;
    }

    let tree = root
        .finish(0, spec)?
        .unwrap_or_else(|| AggregationNode::new(GroupKey::Root));
    debug!(
        records = count,
        levels = levels.len(),
        leaves = tree.leaf_count(),
        total = %tree.fund,
        "built aggregation tree"
    );
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tally_core::{Voucher, VoucherDetail};

    use crate::rates::RateTable;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn ledger() -> Vec<Voucher> {
        vec![
            Voucher::dated(date(2024, 1, 3))
                .with_detail(VoucherDetail::new(1001, dec!(-30)).with_content("cash"))
                .with_detail(VoucherDetail::new(6602, dec!(30)).with_content("lunch")),
            Voucher::dated(date(2024, 1, 20))
                .with_detail(VoucherDetail::new(1001, dec!(-12)).with_content("cash"))
                .with_detail(VoucherDetail::new(6602, dec!(12)).with_content("lunch")),
            Voucher::dated(date(2024, 2, 1))
                .with_detail(VoucherDetail::new(1002, dec!(-900)).with_sub_title(1))
                .with_detail(VoucherDetail::new(6602, dec!(900)).with_content("rent")),
        ]
    }

    fn build(spec: &SubtotalSpec, vouchers: &[Voucher]) -> AggregationNode {
        let records = vouchers
            .iter()
            .flat_map(Voucher::records)
            .map(|r| (r, r.detail().fund));
        build_aggregation(spec, records, &RateTable::new()).unwrap()
    }

    #[test]
    fn test_group_by_title_and_content() {
        let spec = SubtotalSpec::new(vec![GroupLevel::Title, GroupLevel::Content]);
        let tree = build(&spec, &ledger());

        assert_eq!(tree.key, GroupKey::Root);
        assert_eq!(tree.fund, dec!(0));
        let expenses = tree.child(&GroupKey::Title(6602)).unwrap();
        assert_eq!(expenses.fund, dec!(942));
        assert_eq!(
            expenses.child(&GroupKey::Content(Some("lunch".into()))).unwrap().fund,
            dec!(42)
        );
        let bank = tree
            .descend(&[GroupKey::Title(1002), GroupKey::Content(None)])
            .unwrap();
        assert_eq!(bank.fund, dec!(-900));
    }

    #[test]
    fn test_children_keep_insertion_order() {
        let spec = SubtotalSpec::new(vec![GroupLevel::Title]);
        let tree = build(&spec, &ledger());
        let keys: Vec<_> = tree.children.iter().map(|c| c.key.clone()).collect();
        assert_eq!(
            keys,
            vec![GroupKey::Title(1001), GroupKey::Title(6602), GroupKey::Title(1002)]
        );
    }

    #[test]
    fn test_month_buckets() {
        let spec = SubtotalSpec::new(vec![GroupLevel::Month]);
        let ledger = vec![
            Voucher::dated(date(2024, 1, 3)).with_detail(VoucherDetail::new(6602, dec!(1))),
            Voucher::dated(date(2024, 1, 30)).with_detail(VoucherDetail::new(6602, dec!(2))),
            Voucher::undated().with_detail(VoucherDetail::new(6602, dec!(4))),
        ];
        let tree = build(&spec, &ledger);
        assert_eq!(
            tree.child(&GroupKey::Date(Some(date(2024, 1, 1)))).unwrap().fund,
            dec!(3)
        );
        assert_eq!(tree.child(&GroupKey::Date(None)).unwrap().fund, dec!(4));
    }

    #[test]
    fn test_non_zero_prunes_and_resums() {
        let spec = SubtotalSpec::new(vec![GroupLevel::Title, GroupLevel::Content])
            .with_gather(GatherMode::NonZero);
        let ledger = vec![Voucher::undated()
            .with_detail(VoucherDetail::new(6602, dec!(0.0)).with_content("a"))
            .with_detail(VoucherDetail::new(6602, dec!(0.0000009)).with_content("b"))
            .with_detail(VoucherDetail::new(6602, dec!(5.00)).with_content("c"))
            .with_detail(VoucherDetail::new(1001, dec!(0)).with_content("d"))];
        let tree = build(&spec, &ledger);

        assert_eq!(tree.children.len(), 1);
        let expenses = &tree.children[0];
        assert_eq!(expenses.children.len(), 1);
        assert_eq!(expenses.children[0].key, GroupKey::Content(Some("c".into())));
        assert_eq!(expenses.fund, dec!(5.00));
        assert_eq!(tree.fund, dec!(5.00));
    }

    #[test]
    fn test_count_and_voucher_count() {
        let ledger = vec![
            Voucher::undated()
                .with_detail(VoucherDetail::new(6602, dec!(1)))
                .with_detail(VoucherDetail::new(6602, dec!(2))),
            Voucher::undated().with_detail(VoucherDetail::new(6602, dec!(3))),
        ];

        let spec = SubtotalSpec::new(vec![GroupLevel::Title]).with_gather(GatherMode::Count);
        assert_eq!(build(&spec, &ledger).fund, dec!(3));

        let spec = SubtotalSpec::new(vec![GroupLevel::Title]).with_gather(GatherMode::VoucherCount);
        let tree = build(&spec, &ledger);
        assert_eq!(tree.fund, dec!(2));
        assert_eq!(tree.children[0].fund, dec!(2));
    }

    #[test]
    fn test_equivalence_converts() {
        let ledger = vec![Voucher::dated(date(2024, 1, 5))
            .with_detail(VoucherDetail::new(1001, dec!(10)).with_currency("USD"))
            .with_detail(VoucherDetail::new(1001, dec!(5)))];
        let rates = RateTable::new().with_rate(date(2024, 1, 1), "USD", "CNY", dec!(7));
        let spec = SubtotalSpec::new(vec![GroupLevel::Currency]).with_equivalence("CNY", None);
        let records = ledger.iter().flat_map(Voucher::records).map(|r| (r, r.detail().fund));

        let tree = build_aggregation(&spec, records, &rates).unwrap();
        assert_eq!(tree.fund, dec!(75));
        assert_eq!(tree.child(&GroupKey::Currency("USD".into())).unwrap().fund, dec!(70));
    }

    #[test]
    fn test_missing_rate_aborts() {
        let ledger = vec![Voucher::undated()
            .with_detail(VoucherDetail::new(1001, dec!(10)).with_currency("JPY"))];
        let spec = SubtotalSpec::default().with_equivalence("CNY", None);
        let records = ledger.iter().flat_map(Voucher::records).map(|r| (r, r.detail().fund));

        let err = build_aggregation(&spec, records, &RateTable::new()).unwrap_err();
        assert!(matches!(err, SubtotalError::MissingRate { ref currency, .. } if currency == "JPY"));
    }

    #[test]
    fn test_overflow_is_an_error() {
        let ledger = vec![Voucher::undated()
            .with_detail(VoucherDetail::new(1001, Decimal::MAX).with_content("a"))
            .with_detail(VoucherDetail::new(1001, Decimal::MAX).with_content("b"))];
        let records = || ledger.iter().flat_map(Voucher::records).map(|r| (r, r.detail().fund));

        let spec = SubtotalSpec::new(vec![GroupLevel::Content]);
        let err = build_aggregation(&spec, records(), &RateTable::new()).unwrap_err();
        assert_eq!(err, SubtotalError::Overflow);

        let spec = spec.with_gather(GatherMode::NonZero);
        let err = build_aggregation(&spec, records(), &RateTable::new()).unwrap_err();
        assert_eq!(err, SubtotalError::Overflow);
    }

    #[test]
    fn test_changed_day_readings() {
        let ledger = vec![
            Voucher::dated(date(2024, 1, 1)).with_detail(VoucherDetail::new(1001, dec!(100))),
            Voucher::dated(date(2024, 1, 2)).with_detail(VoucherDetail::new(1001, dec!(0))),
            Voucher::dated(date(2024, 1, 3)).with_detail(VoucherDetail::new(1001, dec!(50))),
            Voucher::dated(date(2024, 1, 5)).with_detail(VoucherDetail::new(1001, dec!(-50))),
        ];
        let spec = SubtotalSpec::new(vec![GroupLevel::Title])
            .with_gather(GatherMode::NonZero)
            .with_aggregation(AggregationMode::ChangedDay);
        let tree = build(&spec, &ledger);
        let cash = &tree.children[0];
        let dates: Vec<_> = cash.readings.iter().map(|r| r.date.unwrap()).collect();
        assert_eq!(dates, vec![date(2024, 1, 1), date(2024, 1, 3), date(2024, 1, 5)]);
        assert_eq!(cash.fund, dec!(100));
    }

    #[test]
    fn test_empty_input() {
        let tree = build(&SubtotalSpec::default(), &[]);
        assert_eq!(tree, AggregationNode::new(GroupKey::Root));
    }

    #[test]
    fn test_key_labels() {
        assert_eq!(GroupKey::Title(6602).label(Granularity::Day), "6602");
        assert_eq!(GroupKey::SubTitle(Some(1)).label(Granularity::Day), "01");
        assert_eq!(GroupKey::Content(None).label(Granularity::Day), "");
        assert_eq!(GroupKey::Date(None).label(Granularity::Month), "[null]");
        assert_eq!(
            GroupKey::Date(Some(date(2024, 3, 1))).label(Granularity::Month),
            "202403"
        );
    }
}
