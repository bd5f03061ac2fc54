use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use mygene_client::MyGeneConfig;
use omics_core::{
    CohortMarkers, ColumnMatcher, ColumnRule, DatasetLayout, DifferentialColumns,
};
use workbook_feed::{
    SheetSpec, WorkbookSpec, DEFAULT_DATA_FILE, DEFAULT_DIFFERENTIAL_SHEET, DEFAULT_VALUES_SHEET,
};

/// Every flag falls back to an environment variable.
/// Column matchers use `exact:<name>` or `contains:<fragment>` and may be repeated
/// or comma separated; earlier matchers take precedence.
#[derive(Debug, Clone, Parser)]
#[command(name = "proteome-dashboard", version, about = "Proteomics volcano/boxplot dashboard")]
pub struct Config {
    /// Workbook holding the differential-results and per-donor values sheets.
    #[arg(long, env = "DASHBOARD_DATA_FILE", default_value = DEFAULT_DATA_FILE)]
    pub data_file: PathBuf,

    #[arg(long, env = "DASHBOARD_DIFFERENTIAL_SHEET", default_value = DEFAULT_DIFFERENTIAL_SHEET)]
    pub differential_sheet: String,

    /// Zero-based header row of the differential sheet; rows above it are skipped.
    #[arg(long, env = "DASHBOARD_DIFFERENTIAL_HEADER_ROW", default_value_t = 0)]
    pub differential_header_row: usize,

    #[arg(long, env = "DASHBOARD_VALUES_SHEET", default_value = DEFAULT_VALUES_SHEET)]
    pub values_sheet: String,

    #[arg(long, env = "DASHBOARD_VALUES_HEADER_ROW", default_value_t = 0)]
    pub values_header_row: usize,

    #[arg(
        long = "fold-change-column",
        env = "DASHBOARD_FOLD_CHANGE_COLUMN",
        value_delimiter = ',',
        default_values_t = [ColumnMatcher::exact("logfc")]
    )]
    pub fold_change_columns: Vec<ColumnMatcher>,

    #[arg(
        long = "adj-p-column",
        env = "DASHBOARD_ADJ_P_COLUMN",
        value_delimiter = ',',
        default_values_t = [ColumnMatcher::contains("adj.p.val")]
    )]
    pub adj_p_columns: Vec<ColumnMatcher>,

    #[arg(
        long = "gene-column",
        env = "DASHBOARD_GENE_COLUMN",
        value_delimiter = ',',
        default_values_t = [ColumnMatcher::contains("entrezgenesymbol")]
    )]
    pub gene_columns: Vec<ColumnMatcher>,

    #[arg(
        long = "values-gene-column",
        env = "DASHBOARD_VALUES_GENE_COLUMN",
        value_delimiter = ',',
        default_values_t = [
            ColumnMatcher::exact("entrezgenesymbol"),
            ColumnMatcher::contains("entrezgenesymbol"),
        ]
    )]
    pub values_gene_columns: Vec<ColumnMatcher>,

    /// Experiment-set tag a donor column must contain.
    #[arg(long, env = "DASHBOARD_SET_MARKER", default_value = "Set002")]
    pub set_marker: String,

    #[arg(long, env = "DASHBOARD_YOUNG_MARKER", default_value = "YD")]
    pub young_marker: String,

    #[arg(long, env = "DASHBOARD_OLD_MARKER", default_value = "OD")]
    pub old_marker: String,

    #[arg(long, env = "DASHBOARD_BIND", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// Directory with index.html and js/main.js.
    #[arg(long, env = "DASHBOARD_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    #[arg(long, env = "MYGENE_API_URL", default_value = "https://mygene.info")]
    pub mygene_url: String,

    #[arg(long, env = "MYGENE_TIMEOUT_SECS", default_value_t = 5)]
    pub mygene_timeout_secs: u64,

    #[arg(long, env = "DASHBOARD_MAX_CITATIONS", default_value_t = 5)]
    pub max_citations: usize,
}

impl Config {
    pub fn workbook_spec(&self) -> WorkbookSpec {
        WorkbookSpec::new(&self.data_file)
            .with_differential(
                SheetSpec::new(&self.differential_sheet).with_header_row(self.differential_header_row),
            )
            .with_values(SheetSpec::new(&self.values_sheet).with_header_row(self.values_header_row))
    }

    pub fn dataset_layout(&self) -> DatasetLayout {
        let defaults = DifferentialColumns::default();
        DatasetLayout {
            differential: DifferentialColumns {
                fold_change: ColumnRule::new(defaults.fold_change.role, self.fold_change_columns.clone()),
                adj_p_value: ColumnRule::new(defaults.adj_p_value.role, self.adj_p_columns.clone()),
                gene_symbol: ColumnRule::new(defaults.gene_symbol.role, self.gene_columns.clone()),
            },
            values_gene: ColumnRule::new(
                ColumnRule::values_gene_symbol().role,
                self.values_gene_columns.clone(),
            ),
            cohorts: CohortMarkers {
                set_marker: self.set_marker.clone(),
                young_marker: self.young_marker.clone(),
                old_marker: self.old_marker.clone(),
            },
        }
    }

    pub fn mygene_config(&self) -> MyGeneConfig {
        MyGeneConfig::default()
            .with_base_url(&self.mygene_url)
            .with_timeout(Duration::from_secs(self.mygene_timeout_secs.max(1)))
            .with_max_citations(self.max_citations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_bundled_dataset() {
        let config = Config::try_parse_from(["proteome-dashboard"]).unwrap();
        assert_eq!(config.dataset_layout(), DatasetLayout::default());
        let spec = config.workbook_spec();
        assert_eq!(spec, WorkbookSpec::default());
        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.mygene_config().max_citations, 5);
    }

    #[test]
    fn column_matchers_and_markers_are_configurable() {
        let config = Config::try_parse_from([
            "proteome-dashboard",
            "--fold-change-column",
            "exact:log2FC,contains:logfc",
            "--gene-column",
            "Symbol",
            "--set-marker",
            "Set001",
            "--values-header-row",
            "3",
        ])
        .unwrap();
        let layout = config.dataset_layout();
        assert_eq!(
            layout.differential.fold_change.matchers,
            vec![ColumnMatcher::exact("log2fc"), ColumnMatcher::contains("logfc")]
        );
        assert_eq!(
            layout.differential.gene_symbol.matchers,
            vec![ColumnMatcher::exact("symbol")]
        );
        assert_eq!(layout.cohorts.set_marker, "Set001");
        assert_eq!(config.workbook_spec().values.header_row, 3);
    }

    #[test]
    fn empty_matcher_is_rejected() {
        assert!(Config::try_parse_from(["proteome-dashboard", "--adj-p-column", "contains:"]).is_err());
    }
}
