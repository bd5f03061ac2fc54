//! Column discovery for loosely structured sheets.
//!
//! Matching is always case-insensitive. A [`ColumnRule`] tries its matchers in
//! order and, for each matcher, scans columns in source order; the first hit
//! wins.

use std::fmt;
use std::str::FromStr;

/// Patterns are held lowercase. Build through [`ColumnMatcher::exact`],
/// [`ColumnMatcher::contains`] or `parse`; a variant built directly must
/// already carry a lowercase pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnMatcher {
    /// Whole column name equals the pattern.
    Exact(String),
    /// Column name contains the pattern.
    Contains(String),
}

impl ColumnMatcher {
    pub fn exact(name: impl Into<String>) -> Self {
        ColumnMatcher::Exact(name.into().to_lowercase())
    }

    pub fn contains(fragment: impl Into<String>) -> Self {
        ColumnMatcher::Contains(fragment.into().to_lowercase())
    }

    pub fn matches(&self, column: &str) -> bool {
        let column = column.trim().to_lowercase();
        match self {
            ColumnMatcher::Exact(name) => column == *name,
            ColumnMatcher::Contains(fragment) => column.contains(fragment.as_str()),
        }
    }
}

/// Parses `exact:<name>` or `contains:<fragment>`; a bare value is exact.
impl FromStr for ColumnMatcher {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, pattern) = match s.split_once(':') {
            Some((kind, pattern)) if kind.eq_ignore_ascii_case("exact") => ("exact", pattern),
            Some((kind, pattern)) if kind.eq_ignore_ascii_case("contains") => {
                ("contains", pattern)
            }
            _ => ("exact", s),
        };
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(format!("empty column pattern in {s:?}"));
        }
        Ok(match kind {
            "contains" => ColumnMatcher::contains(pattern),
            _ => ColumnMatcher::exact(pattern),
        })
    }
}

impl fmt::Display for ColumnMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnMatcher::Exact(name) => write!(f, "exact:{name}"),
            ColumnMatcher::Contains(fragment) => write!(f, "contains:{fragment}"),
        }
    }
}

/// Locates one logical column (e.g. "fold change") among the sheet's headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRule {
    pub role: String,
    pub matchers: Vec<ColumnMatcher>,
}

impl ColumnRule {
    pub fn new(role: impl Into<String>, matchers: Vec<ColumnMatcher>) -> Self {
        Self {
            role: role.into(),
            matchers,
        }
    }

    /// Index of the resolved column, if any.
    pub fn resolve(&self, columns: &[String]) -> Option<usize> {
        self.matchers
            .iter()
            .find_map(|m| columns.iter().position(|c| m.matches(c)))
    }

    /// Default gene-symbol rule for the per-donor values sheet.
    pub fn values_gene_symbol() -> Self {
        Self::new(
            "gene symbol",
            vec![
                ColumnMatcher::exact("entrezgenesymbol"),
                ColumnMatcher::contains("entrezgenesymbol"),
            ],
        )
    }
}

/// Column rules for the differential-results sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifferentialColumns {
    pub fold_change: ColumnRule,
    pub adj_p_value: ColumnRule,
    pub gene_symbol: ColumnRule,
}

impl Default for DifferentialColumns {
    fn default() -> Self {
        Self {
            fold_change: ColumnRule::new("fold change", vec![ColumnMatcher::exact("logfc")]),
            adj_p_value: ColumnRule::new(
                "adjusted p-value",
                vec![ColumnMatcher::contains("adj.p.val")],
            ),
            gene_symbol: ColumnRule::new(
                "gene symbol",
                vec![ColumnMatcher::contains("entrezgenesymbol")],
            ),
        }
    }
}
