//! Borrowed (voucher, detail) pairs.

use crate::voucher::{Voucher, VoucherDetail};
use crate::NaiveDate;

/// One line item together with the voucher it belongs to.
///
/// Detail filters only look at the detail, but grouping needs the voucher too:
/// the date buckets come from the voucher date and voucher counting needs to
/// know which details share a voucher.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    voucher: &'a Voucher,
    detail: &'a VoucherDetail,
}

impl<'a> Record<'a> {
    /// Bind a detail to its voucher.
    #[must_use]
    pub const fn new(voucher: &'a Voucher, detail: &'a VoucherDetail) -> Self {
        Self { voucher, detail }
    }

    /// The owning voucher.
    #[must_use]
    pub const fn voucher(&self) -> &'a Voucher {
        self.voucher
    }

    /// The line item.
    #[must_use]
    pub const fn detail(&self) -> &'a VoucherDetail {
        self.detail
    }

    /// Date of the owning voucher.
    #[must_use]
    pub const fn date(&self) -> Option<NaiveDate> {
        self.voucher.date
    }

    /// Identity of the owning voucher, stable for the lifetime of the borrow.
    ///
    /// Two records share an identity exactly when they were produced from the
    /// same voucher value.
    #[must_use]
    pub fn voucher_identity(&self) -> usize {
        std::ptr::addr_of!(*self.voucher) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_voucher_identity() {
        let a = Voucher::undated()
            .with_detail(VoucherDetail::new(1001, dec!(1)))
            .with_detail(VoucherDetail::new(1002, dec!(-1)));
        let b = a.clone();

        let ra: Vec<_> = a.records().collect();
        let rb: Vec<_> = b.records().collect();

        assert_eq!(ra[0].voucher_identity(), ra[1].voucher_identity());
        assert_ne!(ra[0].voucher_identity(), rb[0].voucher_identity());
    }
}
