//! Vouchers and their line items.
//!
//! A [`Voucher`] is one accounting entry: an optional date (undated vouchers
//! exist and form their own bucket), a kind, a remark and a list of
//! [`VoucherDetail`]s. Each detail books a signed fund against an account
//! title and optional sub-title, in one currency, for one user.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::record::Record;
use crate::NaiveDate;

/// Currency assumed for details that don't name one.
pub const BASE_CURRENCY: &str = "CNY";

/// User assumed for details that don't name one.
pub const DEFAULT_USER: &str = "anonymous";

/// Kind of a voucher.
///
/// Everything but [`VoucherType::Ordinary`] is generated by schedule
/// computations (carrying, depreciation, amortization) living outside the core.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoucherType {
    /// Regular, hand-entered voucher.
    #[default]
    Ordinary,
    /// Amortization entry.
    Amortization,
    /// Annual carry-forward entry.
    AnnualCarry,
    /// Monthly carry-forward entry.
    Carry,
    /// Depreciation entry.
    Depreciation,
    /// Devaluation entry.
    Devalue,
    /// Entry whose classification is still pending.
    Uncertain,
}

/// One line item of a voucher.
///
/// # Examples
///
/// ```
/// use tally_core::VoucherDetail;
/// use rust_decimal_macros::dec;
///
/// let detail = VoucherDetail::new(1002, dec!(-120.50))
///     .with_sub_title(1)
///     .with_content("bank")
///     .with_currency("USD");
///
/// assert_eq!(detail.title, 1002);
/// assert_eq!(detail.sub_title, Some(1));
/// assert_eq!(detail.currency, "USD");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoucherDetail {
    /// Owner of the line item.
    #[serde(default = "default_user")]
    pub user: String,
    /// Currency code of the fund.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Account title, e.g. `1001`.
    pub title: i32,
    /// Account sub-title, e.g. `01`; absent for title-level postings.
    #[serde(default, rename = "subtitle", skip_serializing_if = "Option::is_none")]
    pub sub_title: Option<i32>,
    /// Free-text content (counterparty, item, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Free-text remark.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    /// Signed amount; debit positive, credit negative.
    pub fund: Decimal,
}

fn default_user() -> String {
    DEFAULT_USER.to_string()
}

fn default_currency() -> String {
    BASE_CURRENCY.to_string()
}

impl VoucherDetail {
    /// Create a detail in the base currency for the default user.
    #[must_use]
    pub fn new(title: i32, fund: Decimal) -> Self {
        Self {
            user: default_user(),
            currency: default_currency(),
            title,
            sub_title: None,
            content: None,
            remark: None,
            fund,
        }
    }

    /// Set the sub-title.
    #[must_use]
    pub const fn with_sub_title(mut self, sub_title: i32) -> Self {
        self.sub_title = Some(sub_title);
        self
    }

    /// Set the content.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set the remark.
    #[must_use]
    pub fn with_remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = Some(remark.into());
        self
    }

    /// Set the currency.
    #[must_use]
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Set the user.
    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }
}

/// An accounting entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voucher {
    /// Storage identifier, if the voucher has been persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Voucher date; `None` for undated vouchers.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Voucher kind.
    #[serde(default, rename = "type")]
    pub voucher_type: VoucherType,
    /// Free-text remark.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    /// Line items.
    #[serde(default, rename = "detail")]
    pub details: Vec<VoucherDetail>,
}

impl Voucher {
    /// Create an undated, ordinary voucher.
    #[must_use]
    pub fn undated() -> Self {
        Self::default()
    }

    /// Create an ordinary voucher on the given date.
    #[must_use]
    pub fn dated(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            ..Self::default()
        }
    }

    /// Set the identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the voucher kind.
    #[must_use]
    pub const fn with_type(mut self, voucher_type: VoucherType) -> Self {
        self.voucher_type = voucher_type;
        self
    }

    /// Set the remark.
    #[must_use]
    pub fn with_remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = Some(remark.into());
        self
    }

    /// Add a line item.
    #[must_use]
    pub fn with_detail(mut self, detail: VoucherDetail) -> Self {
        self.details.push(detail);
        self
    }

    /// Iterate over the line items as [`Record`]s bound to this voucher.
    pub fn records(&self) -> impl Iterator<Item = Record<'_>> + '_ {
        self.details.iter().map(move |d| Record::new(self, d))
    }
}
