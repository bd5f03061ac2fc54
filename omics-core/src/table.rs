use crate::error::TableError;

/// A single raw spreadsheet value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
}

static EMPTY: Cell = Cell::Empty;

impl Cell {
    /// Numeric view of the cell.
    ///
    /// Numbers pass when finite. Text is trimmed and parsed; it must be
    /// non-empty and parse to a finite value. Everything else is non-numeric.
    pub fn as_finite(&self) -> Option<f64> {
        let value = match self {
            Cell::Number(n) => *n,
            Cell::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                trimmed.parse::<f64>().ok()?
            }
            Cell::Empty | Cell::Bool(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    /// Text rendering used for gene symbols and header names.
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(n) => n.to_string(),
            Cell::Text(s) => s.clone(),
            Cell::Bool(b) => b.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

/// Column-named, row-ordered table. Every row holds exactly one cell per column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from a raw sheet grid.
    ///
    /// Rows above `header_row` are metadata and skipped. Blank header cells are
    /// named `Unnamed: <index>`. Rows after the header whose cells are all empty
    /// are dropped.
    pub fn from_grid(grid: Vec<Vec<Cell>>, header_row: usize) -> Result<Self, TableError> {
        if header_row >= grid.len() {
            return Err(TableError::HeaderRowOutOfRange {
                header_row,
                rows: grid.len(),
            });
        }
        let mut rows = grid.into_iter().skip(header_row);
        let header = rows.next().unwrap_or_default();
        let columns = header
            .iter()
            .enumerate()
            .map(|(idx, cell)| {
                let name = cell.as_text().trim().to_string();
                if name.is_empty() {
                    format!("Unnamed: {idx}")
                } else {
                    name
                }
            })
            .collect();

        let mut table = Table::new(columns);
        for row in rows {
            if row.iter().all(Cell::is_empty) {
                continue;
            }
            table.push_row(row);
        }
        Ok(table)
    }

    /// Append a row, padding with `Empty` or truncating to the column count.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Empty);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(Vec::as_slice)
    }

    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&EMPTY)
    }
}
