//! Presenters: traversals that render an aggregation tree.
//!
//! - [`TextPresenter`] renders one tab-indented line per node.
//! - [`JsonPresenter`] renders nested JSON objects.
//!
//! Both are plain [`Traversal`](crate::Traversal)s; the weighted report in
//! [`crate::report`] is the third.

mod json;
mod text;

pub use json::{render_json, JsonPresenter};
pub use text::{render_text, TextPresenter};

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;
use tally_core::{BASE_CURRENCY, DEFAULT_USER};

use crate::tree::GroupKey;

/// String ordering used for contents, remarks, currencies and users.
pub trait Collation: fmt::Debug + Send + Sync {
    /// Compare two strings.
    fn compare(&self, a: &str, b: &str) -> Ordering;
}

/// Ordering by Unicode code point.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalCollation;

impl Collation for LexicalCollation {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        a.cmp(b)
    }
}

/// Presentation settings.
#[derive(Debug, Clone)]
pub struct PresentOptions {
    /// Currency listed first.
    pub base_currency: String,
    /// User listed first.
    pub client_user: String,
    /// Ordering of contents, remarks, currencies and users.
    pub collation: Arc<dyn Collation>,
}

impl Default for PresentOptions {
    fn default() -> Self {
        Self {
            base_currency: BASE_CURRENCY.to_string(),
            client_user: DEFAULT_USER.to_string(),
            collation: Arc::new(LexicalCollation),
        }
    }
}

impl PresentOptions {
    /// Set the currency listed first.
    #[must_use]
    pub fn with_base_currency(mut self, currency: impl Into<String>) -> Self {
        self.base_currency = currency.into();
        self
    }

    /// Set the user listed first.
    #[must_use]
    pub fn with_client_user(mut self, user: impl Into<String>) -> Self {
        self.client_user = user.into();
        self
    }

    /// Set the collation.
    #[must_use]
    pub fn with_collation(mut self, collation: impl Collation + 'static) -> Self {
        self.collation = Arc::new(collation);
        self
    }

    /// Order two sibling keys.
    ///
    /// Titles and sub-titles are numeric, dates chronological, missing values
    /// first; the base currency and the client user come before the rest.
    #[must_use]
    pub fn compare(&self, a: &GroupKey, b: &GroupKey) -> Ordering {
        match (a, b) {
            (GroupKey::Currency(x), GroupKey::Currency(y)) => self.home_first(x, y, &self.base_currency),
            (GroupKey::User(x), GroupKey::User(y)) => self.home_first(x, y, &self.client_user),
            (GroupKey::Content(x), GroupKey::Content(y))
            | (GroupKey::Remark(x), GroupKey::Remark(y)) => match (x, y) {
                (Some(x), Some(y)) => self.collation.compare(x, y),
                _ => x.is_some().cmp(&y.is_some()),
            },
            _ => a.cmp(b),
        }
    }

    fn home_first(&self, x: &str, y: &str, home: &str) -> Ordering {
        (x != home)
            .cmp(&(y != home))
            .then_with(|| self.collation.compare(x, y))
    }
}

/// Display form of a fund: at most eight decimals, no trailing zeros.
#[must_use]
pub fn format_fund(fund: Decimal) -> String {
    fund.round_dp(8).normalize().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[derive(Debug)]
    struct Reversed;

    impl Collation for Reversed {
        fn compare(&self, a: &str, b: &str) -> Ordering {
            b.cmp(a)
        }
    }

    #[test]
    fn test_home_first() {
        let options = PresentOptions::default();
        let usd = GroupKey::Currency("USD".into());
        let cny = GroupKey::Currency("CNY".into());
        let eur = GroupKey::Currency("EUR".into());
        assert_eq!(options.compare(&cny, &usd), Ordering::Less);
        assert_eq!(options.compare(&usd, &cny), Ordering::Greater);
        assert_eq!(options.compare(&eur, &usd), Ordering::Less);

        let options = options.with_client_user("b");
        assert_eq!(
            options.compare(&GroupKey::User("b".into()), &GroupKey::User("a".into())),
            Ordering::Less
        );
    }

    #[test]
    fn test_collation_is_injected() {
        let options = PresentOptions::default().with_collation(Reversed);
        let a = GroupKey::Content(Some("a".into()));
        let b = GroupKey::Content(Some("b".into()));
        assert_eq!(options.compare(&a, &b), Ordering::Greater);
        assert_eq!(options.compare(&GroupKey::Content(None), &b), Ordering::Less);
    }

    #[test]
    fn test_collation_orders_currencies_and_users() {
        let options = PresentOptions::default()
            .with_collation(Reversed)
            .with_client_user("b");
        let cny = GroupKey::Currency("CNY".into());
        let eur = GroupKey::Currency("EUR".into());
        let usd = GroupKey::Currency("USD".into());
        assert_eq!(options.compare(&usd, &eur), Ordering::Less);
        assert_eq!(options.compare(&cny, &usd), Ordering::Less);
        assert_eq!(options.compare(&eur, &cny), Ordering::Greater);

        let a = GroupKey::User("a".into());
        let b = GroupKey::User("b".into());
        let c = GroupKey::User("c".into());
        assert_eq!(options.compare(&c, &a), Ordering::Less);
        assert_eq!(options.compare(&b, &c), Ordering::Less);
    }

    #[test]
    fn test_format_fund() {
        assert_eq!(format_fund(dec!(5.000)), "5");
        assert_eq!(format_fund(dec!(-0.50)), "-0.5");
        assert_eq!(format_fund(dec!(0.123456789)), "0.12345679");
    }
}
