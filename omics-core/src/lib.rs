//! Proteomics tables loaded once at startup and the shaping logic that turns
//! them into chart-ready series.

pub mod cohort;
pub mod columns;
pub mod error;
pub mod store;
pub mod table;
pub mod volcano;

pub use cohort::{slice, CohortGroups, CohortMarkers};
pub use columns::{ColumnMatcher, ColumnRule, DifferentialColumns};
pub use error::{QueryError, TableError};
pub use store::{DatasetLayout, ProteomeStore};
pub use table::{Cell, Table};
pub use volcano::{coerce_p_value, extract, significance, SignificanceSeries};
