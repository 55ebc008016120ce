//! Weighted reports over named queries.
//!
//! A [`NamedQuery`] is a grouped query, a list of named queries, or a
//! reference to an entry of a [`NamedQueryLibrary`], each with a coefficient.
//! [`Reporter::report`] expands the composition, multiplying coefficients
//! along the way, and lists every leaf of every subtotal as
//!
//! ```text
//! path<TAB>value<TAB>coefficient<TAB>weighted
//! ```
//!
//! where `path` is the slash-joined chain of query names and group labels.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_query::{QueryError, RecordSource};
use tracing::{debug, warn};

use crate::bucket::Granularity;
use crate::error::{checked_add, checked_mul, checked_sum, SubtotalError};
use crate::present::format_fund;
use crate::rates::RateLookup;
use crate::series::Reading;
use crate::spec::{GroupLevel, GroupedQuery};
use crate::titles::TitleLookup;
use crate::traverse::{present_at, Traversal, Visit};
use crate::tree::{build_aggregation, AggregationNode, GroupKey};

/// Nesting allowed when expanding named queries.
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// A weighted, named part of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedQuery {
    /// Path segment contributed by this query; empty adds none.
    #[serde(default)]
    pub name: String,
    /// Multiplier applied to everything below.
    #[serde(default = "unit")]
    pub coefficient: Decimal,
    /// What the query reports.
    pub body: NamedQueryBody,
}

fn unit() -> Decimal {
    Decimal::ONE
}

/// Content of a named query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamedQueryBody {
    /// A subtotal over selected records.
    Grouped(GroupedQuery),
    /// Several named queries reported one after another.
    Composite(Vec<NamedQuery>),
    /// The body of a library entry, weighted by the entry's coefficient.
    Reference(String),
}

impl NamedQuery {
    /// A named subtotal with coefficient one.
    #[must_use]
    pub fn grouped(name: impl Into<String>, query: GroupedQuery) -> Self {
        Self::new(name, NamedQueryBody::Grouped(query))
    }

    /// A named list of queries with coefficient one.
    #[must_use]
    pub fn composite(name: impl Into<String>, parts: Vec<Self>) -> Self {
        Self::new(name, NamedQueryBody::Composite(parts))
    }

    /// A named reference to a library entry with coefficient one.
    #[must_use]
    pub fn reference(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, NamedQueryBody::Reference(target.into()))
    }

    fn new(name: impl Into<String>, body: NamedQueryBody) -> Self {
        Self {
            name: name.into(),
            coefficient: Decimal::ONE,
            body,
        }
    }

    /// Set the coefficient.
    #[must_use]
    pub const fn with_coefficient(mut self, coefficient: Decimal) -> Self {
        self.coefficient = coefficient;
        self
    }
}

/// Named queries available to references, keyed by name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "Vec<NamedQuery>")]
pub struct NamedQueryLibrary {
    entries: HashMap<String, NamedQuery>,
}

impl NamedQueryLibrary {
    /// An empty library.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, replacing any entry of the same name.
    pub fn insert(&mut self, query: NamedQuery) {
        self.entries.insert(query.name.clone(), query);
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, query: NamedQuery) -> Self {
        self.insert(query);
        self
    }

    /// Entry by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&NamedQuery> {
        self.entries.get(name)
    }
}

impl From<Vec<NamedQuery>> for NamedQueryLibrary {
    fn from(queries: Vec<NamedQuery>) -> Self {
        queries.into_iter().fold(Self::new(), Self::with)
    }
}

/// Report settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportOptions {
    /// Deepest nesting of named queries.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Whether grouped queries without a bound are run.
    #[serde(default = "allow")]
    pub allow_unbounded: bool,
}

const fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

const fn allow() -> bool {
    true
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            allow_unbounded: true,
        }
    }
}

/// Result of a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Sum of all weighted values.
    pub total: Decimal,
    /// One line per leaf.
    pub text: String,
}

/// Runs reports against a record source.
pub struct Reporter<'a, S: ?Sized, R: ?Sized> {
    source: &'a S,
    rates: &'a R,
    library: &'a NamedQueryLibrary,
    titles: Option<&'a dyn TitleLookup>,
    options: ReportOptions,
}

impl<'a, S, R> Reporter<'a, S, R>
where
    S: RecordSource + ?Sized,
    R: RateLookup + ?Sized,
{
    /// A reporter with default options and no account names.
    #[must_use]
    pub fn new(source: &'a S, rates: &'a R, library: &'a NamedQueryLibrary) -> Self {
        Self {
            source,
            rates,
            library,
            titles: None,
            options: ReportOptions::default(),
        }
    }

    /// Use account names in paths.
    #[must_use]
    pub fn with_titles(mut self, titles: &'a dyn TitleLookup) -> Self {
        self.titles = Some(titles);
        self
    }

    /// Set the options.
    #[must_use]
    pub const fn with_options(mut self, options: ReportOptions) -> Self {
        self.options = options;
        self
    }

    /// Expand a named query and report every subtotal below it.
    ///
    /// # Errors
    ///
    /// - [`SubtotalError::UnknownNamedQuery`] for a reference missing from the library.
    /// - [`SubtotalError::CyclicReference`] when a reference reaches itself.
    /// - [`SubtotalError::DepthExceeded`] past [`ReportOptions::max_depth`].
    /// - Any error of building a subtotal.
    pub fn report(&self, query: &NamedQuery) -> Result<Report, SubtotalError> {
        let mut visiting = HashSet::new();
        let report = self.expand(query, "", Decimal::ONE, 0, &mut visiting)?;
        debug!(name = %query.name, total = %report.total, "report finished");
        Ok(report)
    }

    /// Report a single grouped query with coefficient one.
    pub fn report_grouped(&self, query: &GroupedQuery) -> Result<Report, SubtotalError> {
        self.subtotal(query, "", Decimal::ONE)
    }

    fn expand(
        &self,
        query: &NamedQuery,
        path: &str,
        coefficient: Decimal,
        depth: usize,
        visiting: &mut HashSet<String>,
    ) -> Result<Report, SubtotalError> {
        let path = join_path(path, &query.name);
        let coefficient = checked_mul(coefficient, query.coefficient)?;
        self.expand_body(&query.body, &path, coefficient, depth, visiting)
    }

    fn expand_body(
        &self,
        body: &NamedQueryBody,
        path: &str,
        coefficient: Decimal,
        depth: usize,
        visiting: &mut HashSet<String>,
    ) -> Result<Report, SubtotalError> {
        if depth > self.options.max_depth {
            return Err(SubtotalError::DepthExceeded(self.options.max_depth));
        }

        match body {
            NamedQueryBody::Grouped(grouped) => self.subtotal(grouped, path, coefficient),
            NamedQueryBody::Composite(parts) => {
                let mut total = Decimal::ZERO;
                let mut blocks = Vec::with_capacity(parts.len());
                for part in parts {
                    let report = self.expand(part, path, coefficient, depth + 1, visiting)?;
                    total = checked_add(total, report.total)?;
                    blocks.push(report.text);
                }
                Ok(Report {
                    total,
                    text: join_blocks(blocks),
                })
            }
            NamedQueryBody::Reference(target) => {
                let entry = self
                    .library
                    .get(target)
                    .ok_or_else(|| SubtotalError::UnknownNamedQuery(target.clone()))?;
                if !visiting.insert(target.clone()) {
                    return Err(SubtotalError::CyclicReference(target.clone()));
                }
                let report = checked_mul(coefficient, entry.coefficient).and_then(|coefficient| {
                    self.expand_body(&entry.body, path, coefficient, depth + 1, visiting)
                });
                visiting.remove(target);
                report
            }
        }
    }

    fn subtotal(
        &self,
        query: &GroupedQuery,
        path: &str,
        coefficient: Decimal,
    ) -> Result<Report, SubtotalError> {
        if query.query.is_dangerous() {
            if !self.options.allow_unbounded {
                return Err(QueryError::Unbounded.into());
            }
            warn!(path, "report part has no bound and scans every record");
        }

        let records = query.query.select(self.source);
        let tree = build_aggregation(&query.subtotal, records, self.rates)?;
        let mut traversal = WeightedLines {
            coefficient,
            titles: self.titles,
        };
        let start = ReportPath {
            text: path.to_string(),
            title: None,
        };
        let (total, text) = present_at(&tree, &query.subtotal, &mut traversal, &start)?;
        Ok(Report { total, text })
    }
}

fn join_path(path: &str, segment: &str) -> String {
    match (path.is_empty(), segment.is_empty()) {
        (_, true) => path.to_string(),
        (true, false) => segment.to_string(),
        (false, false) => format!("{path}/{segment}"),
    }
}

fn join_blocks(blocks: Vec<String>) -> String {
    blocks
        .into_iter()
        .filter(|b| !b.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone)]
struct ReportPath {
    text: String,
    title: Option<i32>,
}

struct WeightedLines<'a> {
    coefficient: Decimal,
    titles: Option<&'a dyn TitleLookup>,
}

impl WeightedLines<'_> {
    fn line(&self, path: &str, value: Decimal) -> Result<(Decimal, String), SubtotalError> {
        let weighted = checked_mul(value, self.coefficient)?;
        let line = format!(
            "{path}\t{}\t{}\t{}",
            format_fund(value),
            format_fund(self.coefficient),
            format_fund(weighted)
        );
        Ok((weighted, line))
    }

    fn segment(&self, path: &ReportPath, child: &Visit<'_>) -> String {
        let name = match (&child.node.key, self.titles) {
            (GroupKey::Title(t), Some(titles)) => titles.name(*t, None),
            (GroupKey::SubTitle(Some(s)), Some(titles)) => {
                path.title.and_then(|t| titles.name(t, Some(*s)))
            }
            _ => None,
        };
        name.map_or_else(|| child.label(), str::to_string)
    }
}

impl Traversal for WeightedLines<'_> {
    type Path = ReportPath;
    type Output = Result<(Decimal, String), SubtotalError>;

    fn leaf(&mut self, path: &ReportPath, visit: &Visit<'_>) -> Self::Output {
        self.line(&path.text, visit.node.fund)
    }

    fn reading(
        &mut self,
        path: &ReportPath,
        _: &Visit<'_>,
        reading: &Reading,
        interval: Granularity,
    ) -> Self::Output {
        let path = join_path(&path.text, &interval.label(reading.date));
        self.line(&path, reading.fund)
    }

    fn map(&mut self, path: &ReportPath, child: &Visit<'_>) -> ReportPath {
        let title = match child.node.key {
            GroupKey::Title(t) => Some(t),
            _ => path.title,
        };
        ReportPath {
            text: join_path(&path.text, &self.segment(path, child)),
            title,
        }
    }

    fn reduce(
        &mut self,
        _: &ReportPath,
        _: &Visit<'_>,
        results: Vec<Self::Output>,
    ) -> Self::Output {
        let (totals, blocks): (Vec<Decimal>, Vec<String>) =
            results.into_iter().collect::<Result<Vec<_>, _>>()?.into_iter().unzip();
        Ok((checked_sum(totals)?, join_blocks(blocks)))
    }

    fn order(&self, _: GroupLevel, children: &mut [&AggregationNode]) {
        children.sort_by(|a, b| a.key.cmp(&b.key));
    }
}
