use crate::bucket::Granularity;
use crate::present::{format_fund, PresentOptions};
use crate::series::Reading;
use crate::spec::{GroupLevel, SubtotalSpec};
use crate::titles::TitleLookup;
use crate::traverse::{present, Traversal, Visit};
use crate::tree::{AggregationNode, GroupKey};

/// Renders a tree as tab-indented `label<TAB>fund` lines.
///
/// The root line holds the grand total alone; each level below is indented
/// by one more tab. Title and sub-title labels are followed by their account
/// names when a [`TitleLookup`] is given.
pub struct TextPresenter<'a> {
    options: &'a PresentOptions,
    titles: Option<&'a dyn TitleLookup>,
}

impl<'a> TextPresenter<'a> {
    /// A presenter, naming accounts when `titles` is given.
    #[must_use]
    pub fn new(options: &'a PresentOptions, titles: Option<&'a dyn TitleLookup>) -> Self {
        Self { options, titles }
    }

    fn line(&self, title: Option<i32>, visit: &Visit<'_>) -> String {
        let fund = format_fund(visit.node.fund);
        if visit.depth == 0 {
            return fund;
        }

        let mut label = visit.label();
        let name = match (&visit.node.key, self.titles) {
            (GroupKey::Title(t), Some(titles)) => titles.name(*t, None),
            (GroupKey::SubTitle(Some(s)), Some(titles)) => {
                title.and_then(|t| titles.name(t, Some(*s)))
            }
            _ => None,
        };
        if let Some(name) = name {
            label.push(' ');
            label.push_str(name);
        }
        format!("{}{label}\t{fund}", "\t".repeat(visit.depth - 1))
    }
}

impl Traversal for TextPresenter<'_> {
    /// Title of the closest title-level ancestor.
    type Path = Option<i32>;
    type Output = Vec<String>;

    fn leaf(&mut self, path: &Option<i32>, visit: &Visit<'_>) -> Vec<String> {
        vec![self.line(*path, visit)]
    }

    fn reading(
        &mut self,
        _path: &Option<i32>,
        visit: &Visit<'_>,
        reading: &Reading,
        interval: Granularity,
    ) -> Vec<String> {
        vec![format!(
            "{}{}\t{}",
            "\t".repeat(visit.depth),
            interval.label(reading.date),
            format_fund(reading.fund)
        )]
    }

    fn map(&mut self, path: &Option<i32>, child: &Visit<'_>) -> Option<i32> {
        match child.node.key {
            GroupKey::Title(t) => Some(t),
            _ => *path,
        }
    }

    fn reduce(
        &mut self,
        path: &Option<i32>,
        visit: &Visit<'_>,
        results: Vec<Vec<String>>,
    ) -> Vec<String> {
        let mut lines = vec![self.line(*path, visit)];
        lines.extend(results.into_iter().flatten());
        lines
    }

    fn order(&self, _level: GroupLevel, children: &mut [&AggregationNode]) {
        children.sort_by(|a, b| self.options.compare(&a.key, &b.key));
    }
}

/// Render a tree as text.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tally_core::{Voucher, VoucherDetail};
/// use tally_subtotal::{build_aggregation, render_text, GroupLevel, PresentOptions, RateTable, SubtotalSpec};
///
/// let ledger = [Voucher::undated()
///     .with_detail(VoucherDetail::new(6602, dec!(30)))
///     .with_detail(VoucherDetail::new(1001, dec!(-30)))];
/// let records = ledger.iter().flat_map(Voucher::records).map(|r| (r, r.detail().fund));
/// let spec = SubtotalSpec::new(vec![GroupLevel::Title]);
/// let tree = build_aggregation(&spec, records, &RateTable::new()).unwrap();
///
/// let text = render_text(&tree, &spec, &PresentOptions::default(), None);
/// assert_eq!(text, "0\n1001\t-30\n6602\t30");
/// ```
#[must_use]
pub fn render_text(
    node: &AggregationNode,
    spec: &SubtotalSpec,
    options: &PresentOptions,
    titles: Option<&dyn TitleLookup>,
) -> String {
    let mut presenter = TextPresenter::new(options, titles);
    present(node, spec, &mut presenter).join("\n")
}
