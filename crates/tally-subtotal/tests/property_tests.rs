//! Property-based tests for tally-subtotal.
//!
//! Run with: cargo test -p tally-subtotal --test `property_tests`

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_core::{Voucher, VoucherDetail};
use tally_subtotal::{
    build_aggregation, AggregationNode, GatherMode, Granularity, GroupLevel, RateTable,
    SubtotalSpec,
};

// ============================================================================
// Arbitrary generators
// ============================================================================

fn arb_fund() -> impl Strategy<Value = Decimal> {
    (-1_000_000i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (2020i32..2026i32, 1u32..13u32, 1u32..29u32)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn arb_detail() -> impl Strategy<Value = VoucherDetail> {
    (
        prop::sample::select(vec![1001, 1002, 6602, 6711]),
        prop::option::of(1i32..4),
        prop::option::of(prop::sample::select(vec!["cash", "lunch", "rent"])),
        prop::sample::select(vec!["CNY", "USD"]),
        arb_fund(),
    )
        .prop_map(|(title, sub_title, content, currency, fund)| {
            let mut detail = VoucherDetail::new(title, fund).with_currency(currency);
            detail.sub_title = sub_title;
            detail.content = content.map(str::to_string);
            detail
        })
}

fn arb_voucher() -> impl Strategy<Value = Voucher> {
    (prop::option::of(arb_date()), prop::collection::vec(arb_detail(), 1..5)).prop_map(
        |(date, details)| {
            let voucher = date.map_or_else(Voucher::undated, Voucher::dated);
            details.into_iter().fold(voucher, Voucher::with_detail)
        },
    )
}

fn arb_levels() -> impl Strategy<Value = Vec<GroupLevel>> {
    prop::collection::vec(
        prop::sample::select(vec![
            GroupLevel::Currency,
            GroupLevel::Title,
            GroupLevel::SubTitle,
            GroupLevel::Content,
            GroupLevel::Month,
            GroupLevel::BillingMonth,
        ]),
        0..4,
    )
}

fn arb_granularity() -> impl Strategy<Value = Granularity> {
    prop_oneof![
        Just(Granularity::Day),
        Just(Granularity::Week),
        Just(Granularity::Month),
        Just(Granularity::Year),
        Just(Granularity::BillingMonth),
        Just(Granularity::FinancialMonth),
    ]
}

fn build(spec: &SubtotalSpec, ledger: &[Voucher]) -> AggregationNode {
    let records = ledger
        .iter()
        .flat_map(Voucher::records)
        .map(|r| (r, r.detail().fund));
    build_aggregation(spec, records, &RateTable::new()).unwrap()
}

fn conserved(node: &AggregationNode) -> bool {
    let mut stack = vec![node];
    while let Some(node) = stack.pop() {
        if !node.is_leaf() && node.children.iter().map(|c| c.fund).sum::<Decimal>() != node.fund {
            return false;
        }
        stack.extend(node.children.iter());
    }
    true
}

fn depth(node: &AggregationNode) -> usize {
    node.children.iter().map(depth).max().map_or(0, |d| d + 1)
}

// ============================================================================
// Aggregation properties
// ============================================================================

proptest! {
    /// Every internal node holds the sum of its children.
    #[test]
    fn prop_fund_conservation(
        ledger in prop::collection::vec(arb_voucher(), 0..12),
        levels in arb_levels(),
        gather in prop_oneof![
            Just(GatherMode::All),
            Just(GatherMode::NonZero),
            Just(GatherMode::Count),
            Just(GatherMode::VoucherCount),
        ],
    ) {
        let spec = SubtotalSpec::new(levels).with_gather(gather);
        prop_assert!(conserved(&build(&spec, &ledger)));
    }

    /// The root total is the sum of all matched funds.
    #[test]
    fn prop_root_total(
        ledger in prop::collection::vec(arb_voucher(), 0..12),
        levels in arb_levels(),
    ) {
        let spec = SubtotalSpec::new(levels);
        let total: Decimal = ledger.iter().flat_map(|v| v.details.iter()).map(|d| d.fund).sum();
        prop_assert_eq!(build(&spec, &ledger).fund, total);
    }

    /// Counting details counts every record once.
    #[test]
    fn prop_count_matches_records(
        ledger in prop::collection::vec(arb_voucher(), 0..12),
        levels in arb_levels(),
    ) {
        let spec = SubtotalSpec::new(levels).with_gather(GatherMode::Count);
        let records = ledger.iter().map(|v| v.details.len()).sum::<usize>();
        prop_assert_eq!(build(&spec, &ledger).fund, Decimal::from(records));
    }

    /// Leaves sit exactly one level per grouping level below the root.
    #[test]
    fn prop_tree_depth_follows_levels(
        ledger in prop::collection::vec(arb_voucher(), 1..12),
        levels in arb_levels(),
    ) {
        let spec = SubtotalSpec::new(levels.clone());
        prop_assert_eq!(depth(&build(&spec, &ledger)), levels.len());
    }

    /// NonZero never keeps a zero leaf below the root.
    #[test]
    fn prop_non_zero_leaves(
        ledger in prop::collection::vec(arb_voucher(), 0..12),
        levels in arb_levels(),
    ) {
        let spec = SubtotalSpec::new(levels).with_gather(GatherMode::NonZero);
        let tree = build(&spec, &ledger);
        let mut stack: Vec<&AggregationNode> = tree.children.iter().collect();
        while let Some(node) = stack.pop() {
            if node.is_leaf() {
                prop_assert!(!tally_core::is_zero(node.fund));
            }
            stack.extend(node.children.iter());
        }
    }
}

// ============================================================================
// Bucket properties
// ============================================================================

proptest! {
    /// Normalizing a bucket start yields the same bucket.
    #[test]
    fn prop_bucket_idempotent(date in arb_date(), granularity in arb_granularity()) {
        let bucket = granularity.normalize(date);
        prop_assert_eq!(granularity.normalize(bucket), bucket);
    }

    /// Calendar buckets start on or before the date and end on or after it.
    #[test]
    fn prop_calendar_bucket_contains_date(
        date in arb_date(),
        granularity in prop_oneof![
            Just(Granularity::Day),
            Just(Granularity::Week),
            Just(Granularity::Month),
            Just(Granularity::Year),
        ],
    ) {
        let bucket = granularity.normalize(date);
        prop_assert!(bucket <= date);
        prop_assert!(granularity.last_day(bucket) >= date);
    }

    /// The next bucket is its own start.
    #[test]
    fn prop_step_lands_on_bucket(date in arb_date(), granularity in arb_granularity()) {
        let bucket = granularity.normalize(date);
        if let Some(next) = granularity.step(bucket) {
            prop_assert!(next > bucket);
            prop_assert_eq!(granularity.normalize(next), next);
        }
    }
}

#[test]
fn test_billing_month_cycles() {
    let d = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
    let cases = [
        (d(2024, 1, 9), d(2024, 1, 9)),
        (d(2024, 1, 8), d(2023, 12, 9)),
        (d(2024, 12, 9), d(2024, 12, 9)),
        (d(2024, 12, 10), d(2025, 1, 9)),
    ];
    for (date, expected) in cases {
        assert_eq!(Granularity::BillingMonth.normalize(date), expected, "{date}");
    }
}
