use crate::cohort::{self, CohortGroups, CohortMarkers};
use crate::columns::{ColumnRule, DifferentialColumns};
use crate::error::QueryError;
use crate::table::Table;
use crate::volcano::{self, SignificanceSeries};

/// Where the dashboard finds things inside the two sheets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetLayout {
    pub differential: DifferentialColumns,
    pub values_gene: ColumnRule,
    pub cohorts: CohortMarkers,
}

impl Default for DatasetLayout {
    fn default() -> Self {
        Self {
            differential: DifferentialColumns::default(),
            values_gene: ColumnRule::values_gene_symbol(),
            cohorts: CohortMarkers::default(),
        }
    }
}

/// Read-only store for the differential-results and per-donor values tables.
#[derive(Debug, Clone)]
pub struct ProteomeStore {
    differential: Table,
    values: Table,
    layout: DatasetLayout,
}

impl ProteomeStore {
    pub fn new(differential: Table, values: Table, layout: DatasetLayout) -> Self {
        Self {
            differential,
            values,
            layout,
        }
    }

    pub fn differential(&self) -> &Table {
        &self.differential
    }

    pub fn values(&self) -> &Table {
        &self.values
    }

    pub fn layout(&self) -> &DatasetLayout {
        &self.layout
    }

    pub fn volcano(&self) -> Result<SignificanceSeries, QueryError> {
        volcano::extract(&self.differential, &self.layout.differential)
    }

    pub fn boxplot(&self, symbol: &str) -> Result<CohortGroups, QueryError> {
        cohort::slice(
            &self.values,
            &self.layout.values_gene,
            &self.layout.cohorts,
            symbol,
        )
    }
}
