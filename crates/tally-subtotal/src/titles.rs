//! Account title names.

use std::collections::HashMap;

use serde::Deserialize;

/// Source of human-readable account names.
pub trait TitleLookup {
    /// Name of a title, or of a sub-title under it.
    fn name(&self, title: i32, sub_title: Option<i32>) -> Option<&str>;
}

/// One named account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TitleEntry {
    /// Title.
    pub title: i32,
    /// Sub-title, if the entry names one.
    #[serde(default, rename = "subtitle")]
    pub sub_title: Option<i32>,
    /// Display name.
    pub name: String,
}

/// In-memory chart of accounts.
///
/// # Examples
///
/// ```
/// use tally_subtotal::{ChartOfAccounts, TitleLookup};
///
/// let chart = ChartOfAccounts::new()
///     .with_title(1002, "Bank deposits")
///     .with_sub_title(1002, 1, "Checking");
///
/// assert_eq!(chart.name(1002, None), Some("Bank deposits"));
/// assert_eq!(chart.name(1002, Some(1)), Some("Checking"));
/// assert_eq!(chart.name(1002, Some(2)), None);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "Vec<TitleEntry>")]
pub struct ChartOfAccounts {
    names: HashMap<(i32, Option<i32>), String>,
}

impl ChartOfAccounts {
    /// Create an empty chart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Name a title.
    #[must_use]
    pub fn with_title(mut self, title: i32, name: impl Into<String>) -> Self {
        self.names.insert((title, None), name.into());
        self
    }

    /// Name a sub-title.
    #[must_use]
    pub fn with_sub_title(mut self, title: i32, sub_title: i32, name: impl Into<String>) -> Self {
        self.names.insert((title, Some(sub_title)), name.into());
        self
    }

    /// Number of named accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no account is named.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl TitleLookup for ChartOfAccounts {
    fn name(&self, title: i32, sub_title: Option<i32>) -> Option<&str> {
        self.names.get(&(title, sub_title)).map(String::as_str)
    }
}

impl From<Vec<TitleEntry>> for ChartOfAccounts {
    fn from(entries: Vec<TitleEntry>) -> Self {
        Self {
            names: entries
                .into_iter()
                .map(|e| ((e.title, e.sub_title), e.name))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_chart() {
        let json = r#"[
            {"title": 1001, "name": "Cash"},
            {"title": 6602, "subtitle": 3, "name": "Meals"}
        ]"#;
        let chart: ChartOfAccounts = serde_json::from_str(json).unwrap();
        assert_eq!(chart.len(), 2);
        assert_eq!(chart.name(1001, None), Some("Cash"));
        assert_eq!(chart.name(6602, Some(3)), Some("Meals"));
        assert_eq!(chart.name(6602, None), None);
    }
}
