//! Leaf filters: what each atom matches and whether it bounds a query.

use rust_decimal::Decimal;
use tally_core::{fund_eq, Distributed, Voucher, VoucherDetail};

use crate::algebra::is_dangerous;
use crate::ast::{DetailAtom, Direction, DistributedAtom, TitleKind, VoucherAtom};
use crate::predicate::{compile, Matcher};

/// A leaf filter that can sit in a [`Query`](crate::Query).
///
/// The default value is the wildcard atom.
pub trait Atom: Default {
    /// What the atom is matched against.
    type Target;

    /// Whether the atom alone fails to bound the set it selects.
    fn is_dangerous(&self) -> bool;

    /// Turn the atom into a standalone matching function.
    fn compile(&self) -> Matcher<Self::Target>;
}

/// Optional text filter: `None` matches anything, an empty filter matches an
/// absent (or empty) value, anything else matches exactly.
fn text_matches(filter: Option<&str>, value: Option<&str>) -> bool {
    match filter {
        None => true,
        Some("") => value.map_or(true, str::is_empty),
        Some(f) => value == Some(f),
    }
}

impl DetailAtom {
    /// Check a single detail against the filter.
    #[must_use]
    pub fn matches(&self, detail: &VoucherDetail) -> bool {
        let direction = match self.direction {
            Direction::Any => true,
            Direction::Debit => detail.fund > Decimal::ZERO,
            Direction::Credit => detail.fund < Decimal::ZERO,
        };
        let sub_title = match self.sub_title {
            None => true,
            Some(0) => detail.sub_title.is_none(),
            Some(s) => detail.sub_title == Some(s),
        };

        direction
            && sub_title
            && self.kind.map_or(true, |k| TitleKind::of(detail.title) == Some(k))
            && self.title.map_or(true, |t| detail.title == t)
            && text_matches(self.content.as_deref(), detail.content.as_deref())
            && text_matches(self.remark.as_deref(), detail.remark.as_deref())
            && self.fund.map_or(true, |f| fund_eq(detail.fund, f))
            && self.currency.as_deref().map_or(true, |c| detail.currency == c)
            && self.user.as_deref().map_or(true, |u| detail.user == u)
    }
}

impl Atom for DetailAtom {
    type Target = VoucherDetail;

    // Kinds, titles, currency, user and direction select whole account histories;
    // only an item-level field pins the result down.
    fn is_dangerous(&self) -> bool {
        self.content.is_none() && self.remark.is_none() && self.fund.is_none()
    }

    fn compile(&self) -> Matcher<VoucherDetail> {
        let atom = self.clone();
        Box::new(move |detail| atom.matches(detail))
    }
}

impl Atom for VoucherAtom {
    type Target = Voucher;

    fn is_dangerous(&self) -> bool {
        self.range.is_dangerous()
            && self.voucher_type.is_none()
            && self.remark.is_none()
            && self.details.as_ref().map_or(true, is_dangerous)
    }

    fn compile(&self) -> Matcher<Voucher> {
        let range = self.range;
        let voucher_type = self.voucher_type;
        let remark = self.remark.clone();
        let for_all = self.for_all;
        let details = self.details.as_ref().map(compile);

        Box::new(move |voucher: &Voucher| {
            if !range.contains(voucher.date)
                || voucher_type.is_some_and(|t| voucher.voucher_type != t)
                || !text_matches(remark.as_deref(), voucher.remark.as_deref())
            {
                return false;
            }
            match &details {
                None => true,
                Some(p) if for_all => voucher.details.iter().all(|d| p.matches(d)),
                Some(p) => voucher.details.iter().any(|d| p.matches(d)),
            }
        })
    }
}

impl DistributedAtom {
    /// Check an asset or amortization against the filter.
    #[must_use]
    pub fn matches(&self, item: &Distributed) -> bool {
        self.id
            .as_deref()
            .map_or(true, |id| item.id.as_deref() == Some(id))
            && self
                .user
                .as_deref()
                .map_or(true, |u| item.user.as_deref() == Some(u))
            && text_matches(self.name.as_deref(), item.name.as_deref())
            && text_matches(self.remark.as_deref(), item.remark.as_deref())
    }
}

impl Atom for DistributedAtom {
    type Target = Distributed;

    fn is_dangerous(&self) -> bool {
        self.id.is_none() && self.name.is_none() && self.remark.is_none()
    }

    fn compile(&self) -> Matcher<Distributed> {
        let atom = self.clone();
        Box::new(move |item| atom.matches(item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tally_core::{DateRange, NaiveDate, VoucherType};

    use crate::ast::Query;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_detail_direction() {
        let debit = DetailAtom::new().with_direction(Direction::Debit);
        let credit = DetailAtom::new().with_direction(Direction::Credit);
        let income = VoucherDetail::new(1001, dec!(5));
        let spend = VoucherDetail::new(1001, dec!(-5));
        let nothing = VoucherDetail::new(1001, dec!(0));

        assert!(debit.matches(&income));
        assert!(!debit.matches(&spend));
        assert!(!debit.matches(&nothing));
        assert!(credit.matches(&spend));
        assert!(!credit.matches(&nothing));
        assert!(DetailAtom::new().matches(&nothing));
    }

    #[test]
    fn test_detail_absent_fields() {
        let bare = VoucherDetail::new(1002, dec!(1));
        let full = VoucherDetail::new(1002, dec!(1))
            .with_sub_title(3)
            .with_content("bank")
            .with_remark("memo");

        let no_sub = DetailAtom::new().with_sub_title(0);
        assert!(no_sub.matches(&bare));
        assert!(!no_sub.matches(&full));

        let no_content = DetailAtom::new().with_content("");
        assert!(no_content.matches(&bare));
        assert!(!no_content.matches(&full));

        let no_remark = DetailAtom::new().with_remark("");
        assert!(no_remark.matches(&bare));
        assert!(!no_remark.matches(&full));

        assert!(DetailAtom::new().with_sub_title(3).matches(&full));
        assert!(DetailAtom::new().with_content("bank").matches(&full));
        assert!(!DetailAtom::new().with_content("Bank").matches(&full));
    }

    #[test]
    fn test_detail_fund_tolerance() {
        let detail = VoucherDetail::new(6602, dec!(12.3400001));
        assert!(DetailAtom::new().with_fund(dec!(12.34)).matches(&detail));
        assert!(!DetailAtom::new().with_fund(dec!(12.35)).matches(&detail));
    }

    #[test]
    fn test_detail_currency_user() {
        let detail = VoucherDetail::new(1001, dec!(1))
            .with_currency("USD")
            .with_user("b");
        assert!(DetailAtom::new().with_currency("USD").matches(&detail));
        assert!(!DetailAtom::new().with_currency("CNY").matches(&detail));
        assert!(DetailAtom::new().with_user("b").matches(&detail));
        assert!(!DetailAtom::new().with_user("a").matches(&detail));
    }

    #[test]
    fn test_detail_kind() {
        let ledger = [
            VoucherDetail::new(1001, dec!(-30)),
            VoucherDetail::new(1122, dec!(5)),
            VoucherDetail::new(2202, dec!(-5)),
            VoucherDetail::new(6001, dec!(-40)),
            VoucherDetail::new(6602, dec!(30)),
            VoucherDetail::new(9999, dec!(40)),
        ];
        let titles = |atom: DetailAtom| -> Vec<i32> {
            ledger.iter().filter(|d| atom.matches(d)).map(|d| d.title).collect()
        };

        assert_eq!(titles(DetailAtom::new().with_kind(TitleKind::Asset)), vec![1001, 1122]);
        assert_eq!(titles(DetailAtom::new().with_kind(TitleKind::Liability)), vec![2202]);
        assert_eq!(titles(DetailAtom::new().with_kind(TitleKind::Revenue)), vec![6001]);
        assert_eq!(titles(DetailAtom::new().with_kind(TitleKind::Expense)), vec![6602]);
        assert!(titles(DetailAtom::new().with_kind(TitleKind::Equity)).is_empty());
        assert!(titles(DetailAtom::new().with_kind(TitleKind::Asset).with_title(6602)).is_empty());

        assert!(DetailAtom::new().with_kind(TitleKind::Asset).is_dangerous());
        assert!(!DetailAtom::new()
            .with_kind(TitleKind::Asset)
            .with_content("cash")
            .is_dangerous());
    }

    #[test]
    fn test_detail_danger() {
        assert!(DetailAtom::new().with_title(1001).is_dangerous());
        assert!(DetailAtom::new().with_currency("USD").is_dangerous());
        assert!(!DetailAtom::new().with_content("cash").is_dangerous());
        assert!(!DetailAtom::new().with_remark("").is_dangerous());
        assert!(!DetailAtom::new().with_fund(dec!(1)).is_dangerous());
    }

    #[test]
    fn test_voucher_atom() {
        let voucher = Voucher::dated(date(2024, 3, 5))
            .with_type(VoucherType::Carry)
            .with_detail(VoucherDetail::new(1001, dec!(10)).with_content("a"))
            .with_detail(VoucherDetail::new(6602, dec!(-10)));

        let in_march = VoucherAtom::within(DateRange::between(date(2024, 3, 1), date(2024, 3, 31)));
        assert!((in_march.compile())(&voucher));
        assert!(!in_march.is_dangerous());

        let carry = VoucherAtom::default().with_type(VoucherType::Carry);
        assert!((carry.compile())(&voucher));
        assert!(!(VoucherAtom::default().with_type(VoucherType::Ordinary).compile())(&voucher));

        let cash = Query::atom(DetailAtom::new().with_title(1001));
        assert!((VoucherAtom::default().with_any_detail(cash.clone()).compile())(&voucher));
        assert!(!(VoucherAtom::default().with_all_details(cash).compile())(&voucher));

        let no_remark = VoucherAtom::default().with_remark("");
        assert!((no_remark.compile())(&voucher));
    }

    #[test]
    fn test_voucher_atom_danger() {
        assert!(VoucherAtom::default().is_dangerous());
        assert!(!VoucherAtom::within(DateRange::null_only()).is_dangerous());
        assert!(!VoucherAtom::default().with_remark("x").is_dangerous());

        let titled = Query::atom(DetailAtom::new().with_title(1001));
        assert!(VoucherAtom::default().with_any_detail(titled).is_dangerous());
        let pinned = Query::atom(DetailAtom::new().with_content("x"));
        assert!(!VoucherAtom::default().with_any_detail(pinned).is_dangerous());
    }

    #[test]
    fn test_distributed_atom() {
        let item = Distributed::named("laptop").with_id("a1").with_user("b");
        assert!(DistributedAtom::by_id("a1").matches(&item));
        assert!(!DistributedAtom::by_id("a2").matches(&item));
        assert!(DistributedAtom::by_name("laptop").with_user("b").matches(&item));
        assert!(!DistributedAtom::by_name("").matches(&item));
        assert!(DistributedAtom::default().with_remark("").matches(&item));
        assert!(DistributedAtom::default().is_dangerous());
        assert!(!DistributedAtom::by_name("laptop").is_dangerous());
    }
}
