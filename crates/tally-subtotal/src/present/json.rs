use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Number, Value};

use crate::bucket::{Granularity, UNDATED_LABEL};
use crate::series::Reading;
use crate::spec::SubtotalSpec;
use crate::traverse::{present, Below, Traversal, Visit};
use crate::tree::{AggregationNode, GroupKey};

/// Renders a tree as nested JSON objects.
///
/// Every node becomes `{"value": fund}`; a node with children also holds
/// them in an object under the field of the level below, keyed by label.
/// A missing content or remark is keyed `[null]`, apart from an empty one.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPresenter;

fn number(fund: Decimal) -> Value {
    if fund.fract().is_zero() {
        if let Some(n) = fund.to_i64() {
            return Value::Number(n.into());
        }
    }
    fund.to_f64()
        .and_then(Number::from_f64)
        .map_or_else(|| Value::String(fund.normalize().to_string()), Value::Number)
}

fn object(fund: Decimal) -> Map<String, Value> {
    let mut obj = Map::new();
    obj.insert("value".to_string(), number(fund));
    obj
}

fn key(visit: &Visit<'_>) -> String {
    match visit.node.key {
        GroupKey::Content(None) | GroupKey::Remark(None) => UNDATED_LABEL.to_string(),
        _ => visit.label(),
    }
}

impl Traversal for JsonPresenter {
    type Path = ();
    type Output = (String, Value);

    fn leaf(&mut self, _: &(), visit: &Visit<'_>) -> (String, Value) {
        (key(visit), Value::Object(object(visit.node.fund)))
    }

    fn reading(
        &mut self,
        _: &(),
        _: &Visit<'_>,
        reading: &Reading,
        interval: Granularity,
    ) -> (String, Value) {
        (interval.label(reading.date), Value::Object(object(reading.fund)))
    }

    fn map(&mut self, _: &(), _: &Visit<'_>) {}

    fn reduce(
        &mut self,
        _: &(),
        visit: &Visit<'_>,
        results: Vec<(String, Value)>,
    ) -> (String, Value) {
        let mut obj = object(visit.node.fund);
        let field = match visit.below {
            Below::Level(level) => level.field_name(),
            Below::Readings(_) => "aggr",
            Below::Nothing => return (key(visit), Value::Object(obj)),
        };
        obj.insert(field.to_string(), Value::Object(results.into_iter().collect()));
        (key(visit), Value::Object(obj))
    }
}

/// Render a tree as a JSON object.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use serde_json::json;
/// use tally_core::{Voucher, VoucherDetail};
/// use tally_subtotal::{build_aggregation, render_json, GroupLevel, RateTable, SubtotalSpec};
///
/// let ledger = [Voucher::undated()
///     .with_detail(VoucherDetail::new(6602, dec!(30)))
///     .with_detail(VoucherDetail::new(1001, dec!(-30.5)))];
/// let records = ledger.iter().flat_map(Voucher::records).map(|r| (r, r.detail().fund));
/// let spec = SubtotalSpec::new(vec![GroupLevel::Title]);
/// let tree = build_aggregation(&spec, records, &RateTable::new()).unwrap();
///
/// assert_eq!(
///     render_json(&tree, &spec),
///     json!({"value": -0.5, "title": {"6602": {"value": 30}, "1001": {"value": -30.5}}})
/// );
/// ```
#[must_use]
pub fn render_json(node: &AggregationNode, spec: &SubtotalSpec) -> Value {
    present(node, spec, &mut JsonPresenter).1
}
