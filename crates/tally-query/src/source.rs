//! Record sources.

use rust_decimal::Decimal;
use tally_core::{Record, Voucher, VoucherDetail};
use tracing::trace;

use crate::predicate::Predicate;

/// Anything that can hand out matched `(record, amount)` pairs.
///
/// Storage backends translate the compiled predicates into their own filter
/// language; the in-memory implementation on `[Voucher]` simply runs them.
pub trait RecordSource {
    /// Every detail matching `details` inside a voucher matching `vouchers`,
    /// paired with the amount to aggregate.
    fn fetch_filtered<'s>(
        &'s self,
        vouchers: &Predicate<Voucher>,
        details: &Predicate<VoucherDetail>,
    ) -> Vec<(Record<'s>, Decimal)>;

    /// Every detail matching `details`.
    fn fetch<'s>(&'s self, details: &Predicate<VoucherDetail>) -> Vec<(Record<'s>, Decimal)> {
        self.fetch_filtered(&Predicate::always(), details)
    }
}

impl RecordSource for [Voucher] {
    fn fetch_filtered<'s>(
        &'s self,
        vouchers: &Predicate<Voucher>,
        details: &Predicate<VoucherDetail>,
    ) -> Vec<(Record<'s>, Decimal)> {
        let matched: Vec<_> = self
            .iter()
            .filter(|v| vouchers.matches(v))
            .flat_map(Voucher::records)
            .filter(|r| details.matches(r.detail()))
            .map(|r| (r, r.detail().fund))
            .collect();
        trace!(vouchers = self.len(), records = matched.len(), "fetched records");
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tally_core::{DateRange, NaiveDate};

    use crate::ast::{DetailAtom, Query, VoucherAtom};
    use crate::predicate::compile;

    #[test]
    fn test_fetch_pairs_fund() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let ledger = vec![
            Voucher::dated(day)
                .with_detail(VoucherDetail::new(1001, dec!(-8)))
                .with_detail(VoucherDetail::new(6602, dec!(8))),
            Voucher::undated().with_detail(VoucherDetail::new(1001, dec!(50))),
        ];

        let cash = compile(&Query::atom(DetailAtom::new().with_title(1001)));
        let all = ledger.fetch(&cash);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].1, dec!(-8));
        assert_eq!(all[1].0.date(), None);

        let dated = compile(&Query::atom(VoucherAtom::within(DateRange::since(day))));
        let some = ledger.fetch_filtered(&dated, &cash);
        assert_eq!(some.len(), 1);
        assert_eq!(some[0].0.date(), Some(day));
    }
}
