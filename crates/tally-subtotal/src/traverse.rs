//! Generic traversal of aggregation trees.
//!
//! A [`Traversal`] is a set of callbacks; [`present`] walks a tree and calls
//! them with the grouping level of each node looked up from the
//! specification, so one traversal handles trees of any depth and any level
//! order.
//!
//! For every node the driver either calls [`Traversal::leaf`] (a last-level
//! node without readings), or maps each child to a path, visits it, passes
//! the result through [`Traversal::medium`], and finally combines the
//! results with [`Traversal::reduce`]. Readings of a running balance are
//! visited with [`Traversal::reading`] and reduced the same way.

use tracing::debug;

use crate::bucket::Granularity;
use crate::series::Reading;
use crate::spec::{GroupLevel, SubtotalSpec};
use crate::tree::AggregationNode;

/// What lies below a visited node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Below {
    /// Nothing: the node is a leaf.
    Nothing,
    /// Sub-groups of the given level.
    Level(GroupLevel),
    /// Readings of a running balance with the given bucket size.
    Readings(Granularity),
}

/// A node being visited, with its position in the tree.
#[derive(Debug, Clone, Copy)]
pub struct Visit<'n> {
    /// The node.
    pub node: &'n AggregationNode,
    /// Depth of the node; the root is at depth 0.
    pub depth: usize,
    /// Level the node was grouped by; `None` for the root.
    pub level: Option<GroupLevel>,
    /// What lies below the node.
    pub below: Below,
}

impl Visit<'_> {
    /// Display label of the node's key.
    #[must_use]
    pub fn label(&self) -> String {
        let granularity = self
            .level
            .and_then(GroupLevel::granularity)
            .unwrap_or_default();
        self.node.key.label(granularity)
    }
}

/// Callbacks run over an aggregation tree.
pub trait Traversal {
    /// Context threaded from a node to its children.
    type Path: Clone;
    /// Result of visiting a node.
    type Output;

    /// Visit a last-level node without readings.
    fn leaf(&mut self, path: &Self::Path, visit: &Visit<'_>) -> Self::Output;

    /// Visit one reading of `visit`'s running balance.
    fn reading(
        &mut self,
        path: &Self::Path,
        visit: &Visit<'_>,
        reading: &Reading,
        interval: Granularity,
    ) -> Self::Output;

    /// Path of a child.
    fn map(&mut self, path: &Self::Path, child: &Visit<'_>) -> Self::Path;

    /// Post-process the result of a child before it is reduced.
    fn medium(
        &mut self,
        _path: &Self::Path,
        _child_path: &Self::Path,
        _child: &Visit<'_>,
        output: Self::Output,
    ) -> Self::Output {
        output
    }

    /// Combine the results of a node's children or readings.
    fn reduce(&mut self, path: &Self::Path, visit: &Visit<'_>, results: Vec<Self::Output>)
        -> Self::Output;

    /// Order the children of a node before they are visited.
    fn order(&self, _level: GroupLevel, _children: &mut [&AggregationNode]) {}
}

/// Walk a tree from a given root path.
pub fn present_at<T: Traversal + ?Sized>(
    node: &AggregationNode,
    spec: &SubtotalSpec,
    traversal: &mut T,
    path: &T::Path,
) -> T::Output {
    let levels = spec.levels();
    let interval = spec.aggregation.interval();
    debug!(levels = levels.len(), "presenting aggregation tree");
    visit(node, 0, None, levels, interval, traversal, path)
}

/// Walk a tree from the default root path.
pub fn present<T>(node: &AggregationNode, spec: &SubtotalSpec, traversal: &mut T) -> T::Output
where
    T: Traversal + ?Sized,
    T::Path: Default,
{
    present_at(node, spec, traversal, &T::Path::default())
}

fn below(levels: &[GroupLevel], depth: usize, interval: Option<Granularity>) -> Below {
    match (levels.get(depth), interval) {
        (Some(&next), _) => Below::Level(next),
        (None, Some(interval)) => Below::Readings(interval),
        (None, None) => Below::Nothing,
    }
}

// Depth is bounded by the number of levels.
fn visit<T: Traversal + ?Sized>(
    node: &AggregationNode,
    depth: usize,
    level: Option<GroupLevel>,
    levels: &[GroupLevel],
    interval: Option<Granularity>,
    traversal: &mut T,
    path: &T::Path,
) -> T::Output {
    let beneath = below(levels, depth, interval);
    let here = Visit {
        node,
        depth,
        level,
        below: beneath,
    };

    match beneath {
        Below::Nothing => traversal.leaf(path, &here),
        Below::Readings(interval) => {
            let results = node
                .readings
                .iter()
                .map(|r| traversal.reading(path, &here, r, interval))
                .collect();
            traversal.reduce(path, &here, results)
        }
        Below::Level(next) => {
            let mut children: Vec<&AggregationNode> = node.children.iter().collect();
            traversal.order(next, &mut children);

            let mut results = Vec::with_capacity(children.len());
            for child in children {
                let child_visit = Visit {
                    node: child,
                    depth: depth + 1,
                    level: Some(next),
                    below: below(levels, depth + 1, interval),
                };
                let child_path = traversal.map(path, &child_visit);
                let output = visit(
                    child,
                    depth + 1,
                    Some(next),
                    levels,
                    interval,
                    traversal,
                    &child_path,
                );
                results.push(traversal.medium(path, &child_path, &child_visit, output));
            }
            traversal.reduce(path, &here, results)
        }
    }
}
