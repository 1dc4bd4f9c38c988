//! Column reconciliation: drops the key columns of a sheet and prefixes the
//! rest with the sheet's origin.

use crate::model::{CellValue, JoinKey, SourceTable};

use super::keys::{KeyColumns, KeyTable};

/// Non-key columns of one sheet, renamed `<Prefix>_<name>`, with each row's
/// key re-attached for matching.
#[derive(Debug, Clone, PartialEq)]
pub struct PrefixedTable {
    pub columns: Vec<String>,
    pub keys: Vec<JoinKey>,
    pub rows: Vec<Vec<CellValue>>,
}

impl PrefixedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Splits `table` into its remaining columns. Row order and row count are
/// preserved; key positions that do not exist are simply not dropped.
pub fn prefix_remaining(
    table: &SourceTable,
    key_columns: KeyColumns,
    keys: &KeyTable,
) -> PrefixedTable {
    let prefix = table.origin.prefix();
    let is_key = |idx: usize| idx == key_columns.date || idx == key_columns.reference;

    let retained: Vec<usize> = (0..table.columns.len()).filter(|idx| !is_key(*idx)).collect();

    let columns = retained
        .iter()
        .map(|idx| format!("{prefix}_{}", table.columns[*idx]))
        .collect();

    let rows = table
        .rows
        .iter()
        .map(|row| {
            retained
                .iter()
                .map(|idx| row.get(*idx).cloned().unwrap_or(CellValue::Empty))
                .collect()
        })
        .collect();

    PrefixedTable {
        columns,
        keys: keys.keys.clone(),
        rows,
    }
}
