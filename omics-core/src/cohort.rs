use serde::Serialize;
use tracing::debug;

use crate::columns::ColumnRule;
use crate::error::QueryError;
use crate::table::Table;

/// Substring markers encoded in donor column names, e.g. `Set002.YD_1`.
/// Matching is case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CohortMarkers {
    pub set_marker: String,
    pub young_marker: String,
    pub old_marker: String,
}

impl Default for CohortMarkers {
    fn default() -> Self {
        Self {
            set_marker: "Set002".to_string(),
            young_marker: "YD".to_string(),
            old_marker: "OD".to_string(),
        }
    }
}

/// Column indices per age cohort.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CohortColumns {
    pub young: Vec<usize>,
    pub old: Vec<usize>,
}

impl CohortColumns {
    pub fn donor_count(&self) -> usize {
        self.young.len() + self.old.len()
    }
}

impl CohortMarkers {
    /// Columns carrying both age markers, or neither, belong to no cohort.
    pub fn partition(&self, columns: &[String]) -> CohortColumns {
        let mut out = CohortColumns::default();
        for (idx, name) in columns.iter().enumerate() {
            if !name.contains(&self.set_marker) {
                continue;
            }
            let young = name.contains(&self.young_marker);
            let old = name.contains(&self.old_marker);
            match (young, old) {
                (true, false) => out.young.push(idx),
                (false, true) => out.old.push(idx),
                _ => {}
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CohortGroups {
    pub young: Vec<f64>,
    pub old: Vec<f64>,
}

/// Numeric young/old values for the first row whose gene symbol equals `symbol`.
///
/// Non-numeric cells are dropped, so the groups may be shorter than the
/// matching column lists, or empty.
pub fn slice(
    table: &Table,
    gene_rule: &ColumnRule,
    markers: &CohortMarkers,
    symbol: &str,
) -> Result<CohortGroups, QueryError> {
    let gene = gene_rule
        .resolve(table.columns())
        .ok_or_else(|| QueryError::ColumnsMissing {
            missing: vec![gene_rule.role.clone()],
        })?;

    let mut matches = table.rows().filter(|row| row[gene].as_text() == symbol);
    let row = matches.next().ok_or_else(|| QueryError::GeneNotFound {
        symbol: symbol.to_string(),
    })?;
    let extra = matches.count();
    if extra > 0 {
        debug!(symbol, duplicates = extra, "gene symbol matches several rows, using the first");
    }

    let cohorts = markers.partition(table.columns());
    let values = |indices: &[usize]| -> Vec<f64> {
        indices.iter().filter_map(|&i| row[i].as_finite()).collect()
    };
    Ok(CohortGroups {
        young: values(&cohorts.young),
        old: values(&cohorts.old),
    })
}
