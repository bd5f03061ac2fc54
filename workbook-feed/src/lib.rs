//! Spreadsheet loading for the dashboard: two named sheets become
//! [`omics_core::Table`]s, bundled into a [`ProteomeStore`].

use std::io::{Read, Seek};
use std::path::PathBuf;

use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use omics_core::{Cell, DatasetLayout, ProteomeStore, Table, TableError};
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_DATA_FILE: &str = "data/NIHMS1635539-supplement-1635539_Sup_tab_4.xlsx";
pub const DEFAULT_DIFFERENTIAL_SHEET: &str = "S4B limma results";
pub const DEFAULT_VALUES_SHEET: &str = "S4A values";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSpec {
    pub name: String,
    /// Zero-based header row within the sheet's used range; rows above it are skipped.
    pub header_row: usize,
}

impl SheetSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            header_row: 0,
        }
    }

    pub fn with_header_row(mut self, header_row: usize) -> Self {
        self.header_row = header_row;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkbookSpec {
    pub path: PathBuf,
    pub differential: SheetSpec,
    pub values: SheetSpec,
}

impl WorkbookSpec {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            differential: SheetSpec::new(DEFAULT_DIFFERENTIAL_SHEET),
            values: SheetSpec::new(DEFAULT_VALUES_SHEET),
        }
    }

    pub fn with_differential(mut self, sheet: SheetSpec) -> Self {
        self.differential = sheet;
        self
    }

    pub fn with_values(mut self, sheet: SheetSpec) -> Self {
        self.values = sheet;
        self
    }
}

impl Default for WorkbookSpec {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_FILE)
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("data file not found: {}", .0.display())]
    Missing(PathBuf),
    #[error("cannot open workbook {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },
    #[error("sheet {sheet:?} not found (available: {})", available.join(", "))]
    SheetMissing {
        sheet: String,
        available: Vec<String>,
    },
    #[error("cannot read sheet {sheet:?}: {source}")]
    Sheet {
        sheet: String,
        #[source]
        source: calamine::Error,
    },
    #[error("sheet {sheet:?}: {source}")]
    Table {
        sheet: String,
        #[source]
        source: TableError,
    },
}

/// Open the workbook and load both sheets. Intended to run once at startup.
pub fn load_store(spec: &WorkbookSpec, layout: DatasetLayout) -> Result<ProteomeStore, LoadError> {
    if !spec.path.is_file() {
        return Err(LoadError::Missing(spec.path.clone()));
    }
    let mut workbook = open_workbook_auto(&spec.path).map_err(|source| LoadError::Open {
        path: spec.path.clone(),
        source,
    })?;
    let differential = read_sheet(&mut workbook, &spec.differential)?;
    let values = read_sheet(&mut workbook, &spec.values)?;
    info!(
        path = %spec.path.display(),
        differential_rows = differential.len(),
        values_rows = values.len(),
        "workbook loaded"
    );
    Ok(ProteomeStore::new(differential, values, layout))
}

pub fn read_sheet<RS: Read + Seek>(
    workbook: &mut Sheets<RS>,
    sheet: &SheetSpec,
) -> Result<Table, LoadError> {
    let available = workbook.sheet_names();
    if !available.iter().any(|name| name == &sheet.name) {
        return Err(LoadError::SheetMissing {
            sheet: sheet.name.clone(),
            available,
        });
    }
    let range = workbook
        .worksheet_range(&sheet.name)
        .map_err(|source| LoadError::Sheet {
            sheet: sheet.name.clone(),
            source,
        })?;
    let table = table_from_range(&range, sheet.header_row).map_err(|source| LoadError::Table {
        sheet: sheet.name.clone(),
        source,
    })?;
    info!(
        sheet = %sheet.name,
        rows = table.len(),
        columns = table.columns().len(),
        "sheet loaded"
    );
    debug!(sheet = %sheet.name, columns = ?table.columns(), "sheet header");
    Ok(table)
}

pub fn table_from_range(range: &Range<Data>, header_row: usize) -> Result<Table, TableError> {
    let grid = range
        .rows()
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect();
    Table::from_grid(grid, header_row)
}

/// Dates and error cells carry no meaning for the dashboard and load as empty.
pub fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) => Cell::Text(s.clone()),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        _ => Cell::Empty,
    }
}
