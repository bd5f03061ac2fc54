use serde::Serialize;

use crate::columns::DifferentialColumns;
use crate::error::QueryError;
use crate::table::{Cell, Table};

/// Parallel scatter-plot series; index `i` describes the same source row in every field.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SignificanceSeries {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub genes: Vec<String>,
    pub pvals: Vec<f64>,
}

impl SignificanceSeries {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Adjusted p-value used for the transform: anything that is not a finite
/// positive number becomes 1.0.
pub fn coerce_p_value(cell: &Cell) -> f64 {
    match cell.as_finite() {
        Some(p) if p > 0.0 => p,
        _ => 1.0,
    }
}

/// `-log10(p)` for an already-coerced p-value.
pub fn significance(p: f64) -> f64 {
    // 0.0 - x keeps p == 1 at +0.0
    0.0 - p.log10()
}

/// Build volcano-plot series from the differential-results table.
///
/// Rows whose fold change is not numeric are skipped in every series.
pub fn extract(table: &Table, rules: &DifferentialColumns) -> Result<SignificanceSeries, QueryError> {
    let columns = table.columns();
    let fc = rules.fold_change.resolve(columns);
    let pval = rules.adj_p_value.resolve(columns);
    let gene = rules.gene_symbol.resolve(columns);

    let (Some(fc), Some(pval), Some(gene)) = (fc, pval, gene) else {
        let missing = [
            (fc, &rules.fold_change),
            (pval, &rules.adj_p_value),
            (gene, &rules.gene_symbol),
        ]
        .into_iter()
        .filter(|(idx, _)| idx.is_none())
        .map(|(_, rule)| rule.role.clone())
        .collect();
        return Err(QueryError::ColumnsMissing { missing });
    };

    let mut series = SignificanceSeries::default();
    for row in table.rows() {
        let Some(x) = row[fc].as_finite() else {
            continue;
        };
        let p = coerce_p_value(&row[pval]);
        series.x.push(x);
        series.y.push(significance(p));
        series.genes.push(row[gene].as_text());
        series.pvals.push(p);
    }
    Ok(series)
}
