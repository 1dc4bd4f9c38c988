//! Final shaping of the aligned table: fill, sort, date formatting and
//! removal of exact duplicate rows, in that order.

use std::collections::HashSet;

use tracing::debug;

use crate::model::{CellValue, ColumnKind, DATE_COLUMN, REFERENCE_COLUMN};

use super::align::{AlignedRow, AlignedTable};

/// Output format of the unified date column.
pub const DATE_DISPLAY_FORMAT: &str = "%d/%m/%Y";

/// A fully normalized output row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResultRow {
    /// `DD/MM/YYYY`, or empty when the source date was missing or unparsable.
    pub date: String,
    pub reference: String,
    pub cells: Vec<CellValue>,
}

/// The merged report: `date`, `Ref_No`, then every prefixed column.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<ResultRow>,
}

impl ResultTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column in [`ResultTable::columns`].
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Cell of `row` under the named non-key column.
    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        let idx = self.column_index(column)?.checked_sub(2)?;
        self.rows.get(row)?.cells.get(idx)
    }
}

/// Runs the four normalization steps over an aligned table.
pub fn normalize(mut table: AlignedTable) -> ResultTable {
    let kinds = fill_missing(&mut table);
    debug!(
        numeric_columns = kinds.iter().filter(|kind| **kind == ColumnKind::Numeric).count(),
        text_columns = kinds.iter().filter(|kind| **kind == ColumnKind::Text).count(),
        "filled missing values"
    );
    sort_rows(&mut table.rows);
    let rows = deduplicate(format_rows(table.rows));

    let mut columns = Vec::with_capacity(table.columns.len() + 2);
    columns.push(DATE_COLUMN.to_string());
    columns.push(REFERENCE_COLUMN.to_string());
    columns.extend(table.columns);

    ResultTable { columns, rows }
}

/// Classifies every column on the merged rows and replaces absent cells with
/// the column's fill value. Returns the kind chosen for each column.
pub fn fill_missing(table: &mut AlignedTable) -> Vec<ColumnKind> {
    let kinds: Vec<ColumnKind> = (0..table.columns.len())
        .map(|col_idx| ColumnKind::classify(table.rows.iter().map(|row| &row.cells[col_idx])))
        .collect();

    for row in &mut table.rows {
        for (cell, kind) in row.cells.iter_mut().zip(&kinds) {
            if cell.is_empty() {
                *cell = kind.fill_value();
            }
        }
    }

    kinds
}

/// Stable ascending sort by date then reference; missing dates first.
pub fn sort_rows(rows: &mut [AlignedRow]) {
    rows.sort_by(|lhs, rhs| lhs.key.cmp(&rhs.key));
}

/// Renders each row's date as `DD/MM/YYYY`.
pub fn format_rows(rows: Vec<AlignedRow>) -> Vec<ResultRow> {
    rows.into_iter()
        .map(|row| ResultRow {
            date: row
                .key
                .date
                .map(|date| date.format(DATE_DISPLAY_FORMAT).to_string())
                .unwrap_or_default(),
            reference: row.key.reference,
            cells: row.cells,
        })
        .collect()
}

/// Drops rows identical to an earlier row across every column.
pub fn deduplicate(mut rows: Vec<ResultRow>) -> Vec<ResultRow> {
    let mut seen = HashSet::with_capacity(rows.len());
    rows.retain(|row| seen.insert(row.clone()));
    rows
}
