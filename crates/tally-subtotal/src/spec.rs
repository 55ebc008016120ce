//! Subtotal specifications.

use serde::{Deserialize, Serialize};
use tally_core::{DateRange, NaiveDate, BASE_CURRENCY};
use tally_query::RecordQuery;

use crate::bucket::Granularity;

/// One grouping dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupLevel {
    /// Currency of the detail.
    Currency,
    /// Account title.
    Title,
    /// Account sub-title.
    SubTitle,
    /// Detail content.
    Content,
    /// Detail remark.
    Remark,
    /// Detail owner.
    User,
    /// Voucher day.
    Day,
    /// Voucher week.
    Week,
    /// Voucher month.
    Month,
    /// Voucher year.
    Year,
    /// Voucher billing month.
    BillingMonth,
    /// Voucher financial month.
    FinancialMonth,
}

impl GroupLevel {
    /// Bucket size of a date level.
    #[must_use]
    pub const fn granularity(self) -> Option<Granularity> {
        match self {
            Self::Day => Some(Granularity::Day),
            Self::Week => Some(Granularity::Week),
            Self::Month => Some(Granularity::Month),
            Self::Year => Some(Granularity::Year),
            Self::BillingMonth => Some(Granularity::BillingMonth),
            Self::FinancialMonth => Some(Granularity::FinancialMonth),
            _ => None,
        }
    }

    /// Field name used when nesting children of this level in structured output.
    #[must_use]
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::Currency => "currency",
            Self::Title => "title",
            Self::SubTitle => "subtitle",
            Self::Content => "content",
            Self::Remark => "remark",
            Self::User => "user",
            Self::Day
            | Self::Week
            | Self::Month
            | Self::Year
            | Self::BillingMonth
            | Self::FinancialMonth => "date",
        }
    }
}

/// Levels used when a specification names none.
pub const DEFAULT_LEVELS: &[GroupLevel] = &[
    GroupLevel::Currency,
    GroupLevel::Title,
    GroupLevel::SubTitle,
    GroupLevel::User,
    GroupLevel::Content,
];

/// Levels used when a specification names none but converts currencies.
pub const DEFAULT_EQUIVALENT_LEVELS: &[GroupLevel] = &[
    GroupLevel::Title,
    GroupLevel::SubTitle,
    GroupLevel::User,
    GroupLevel::Content,
];

/// Which quantity a subtotal reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatherMode {
    /// Sum of funds, zero groups included.
    #[default]
    All,
    /// Sum of funds, zero groups dropped.
    NonZero,
    /// Number of matching details.
    Count,
    /// Number of distinct vouchers.
    VoucherCount,
}

impl GatherMode {
    /// Whether the tree holds counts instead of funds.
    #[must_use]
    pub const fn is_count(self) -> bool {
        matches!(self, Self::Count | Self::VoucherCount)
    }
}

/// How the last level is turned into a time series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AggregationMode {
    /// Point totals only.
    #[default]
    None,
    /// Running balance, one reading per day the balance changed.
    ChangedDay,
    /// Running balance, one reading per bucket across a range.
    EveryDay {
        /// Range covered; open ends are closed by the first and last movement.
        #[serde(default)]
        range: DateRange,
        /// Bucket size of the readings.
        #[serde(default)]
        interval: Granularity,
    },
}

impl AggregationMode {
    /// Bucket size of the readings, if any are produced.
    #[must_use]
    pub const fn interval(&self) -> Option<Granularity> {
        match self {
            Self::None => None,
            Self::ChangedDay => Some(Granularity::Day),
            Self::EveryDay { interval, .. } => Some(*interval),
        }
    }
}

/// Currency conversion applied before grouping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equivalence {
    /// Target currency.
    #[serde(default = "base_currency")]
    pub currency: String,
    /// Date of the rates; each record's own date when missing.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

fn base_currency() -> String {
    BASE_CURRENCY.to_string()
}

impl Default for Equivalence {
    fn default() -> Self {
        Self {
            currency: base_currency(),
            date: None,
        }
    }
}

/// A complete subtotal request.
///
/// # Examples
///
/// ```
/// use tally_subtotal::{GatherMode, GroupLevel, SubtotalSpec, DEFAULT_EQUIVALENT_LEVELS};
///
/// let spec = SubtotalSpec::new(vec![GroupLevel::Title, GroupLevel::Month])
///     .with_gather(GatherMode::NonZero);
/// assert_eq!(spec.levels(), [GroupLevel::Title, GroupLevel::Month]);
///
/// let converted = SubtotalSpec::default().with_equivalence("USD", None);
/// assert_eq!(converted.levels(), DEFAULT_EQUIVALENT_LEVELS);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtotalSpec {
    /// Grouping levels, outermost first; the default set when missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub levels: Option<Vec<GroupLevel>>,
    /// Reported quantity.
    #[serde(default)]
    pub gather: GatherMode,
    /// Time series mode.
    #[serde(default)]
    pub aggregation: AggregationMode,
    /// Currency conversion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equivalence: Option<Equivalence>,
}

impl SubtotalSpec {
    /// A specification with explicit levels.
    #[must_use]
    pub const fn new(levels: Vec<GroupLevel>) -> Self {
        Self {
            levels: Some(levels),
            gather: GatherMode::All,
            aggregation: AggregationMode::None,
            equivalence: None,
        }
    }

    /// Set the gather mode.
    #[must_use]
    pub const fn with_gather(mut self, gather: GatherMode) -> Self {
        self.gather = gather;
        self
    }

    /// Set the aggregation mode.
    #[must_use]
    pub const fn with_aggregation(mut self, aggregation: AggregationMode) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Convert every amount into `currency` before grouping.
    #[must_use]
    pub fn with_equivalence(mut self, currency: impl Into<String>, date: Option<NaiveDate>) -> Self {
        self.equivalence = Some(Equivalence {
            currency: currency.into(),
            date,
        });
        self
    }

    /// Effective grouping levels.
    #[must_use]
    pub fn levels(&self) -> &[GroupLevel] {
        match (&self.levels, &self.equivalence) {
            (Some(levels), _) => levels,
            (None, None) => DEFAULT_LEVELS,
            (None, Some(_)) => DEFAULT_EQUIVALENT_LEVELS,
        }
    }
}

/// A record query paired with the subtotal to compute over its result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupedQuery {
    /// Records to aggregate.
    #[serde(default)]
    pub query: RecordQuery,
    /// How to aggregate them.
    #[serde(default)]
    pub subtotal: SubtotalSpec,
}

impl GroupedQuery {
    /// Pair a query with a subtotal.
    #[must_use]
    pub const fn new(query: RecordQuery, subtotal: SubtotalSpec) -> Self {
        Self { query, subtotal }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_levels() {
        assert_eq!(SubtotalSpec::default().levels(), DEFAULT_LEVELS);
        assert_eq!(
            SubtotalSpec::default().with_equivalence("CNY", None).levels(),
            DEFAULT_EQUIVALENT_LEVELS
        );
        assert!(SubtotalSpec::new(Vec::new()).levels().is_empty());
    }

    #[test]
    fn test_deserialize_spec() {
        let json = r#"{
            "levels": ["title", "billing_month"],
            "gather": "non_zero",
            "aggregation": {"mode": "every_day", "interval": "month"},
            "equivalence": {}
        }"#;
        let spec: SubtotalSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.levels(), [GroupLevel::Title, GroupLevel::BillingMonth]);
        assert_eq!(spec.gather, GatherMode::NonZero);
        assert_eq!(spec.aggregation.interval(), Some(Granularity::Month));
        assert_eq!(spec.equivalence.unwrap().currency, BASE_CURRENCY);
    }

    #[test]
    fn test_field_names() {
        assert_eq!(GroupLevel::SubTitle.field_name(), "subtitle");
        assert_eq!(GroupLevel::FinancialMonth.field_name(), "date");
        assert_eq!(GroupLevel::Week.granularity(), Some(Granularity::Week));
        assert_eq!(GroupLevel::User.granularity(), None);
    }
}
