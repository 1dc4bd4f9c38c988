//! Alignment of both sheets against the unified key space.
//!
//! Matching is a relational full outer join on `(Ref_No, date)`: when a key
//! repeats on both sides every left row pairs with every right row, so
//! repeated line items never collapse into one.

use std::collections::HashMap;

use crate::model::{CellValue, JoinKey};

use super::keys::KeyTable;
use super::reconcile::PrefixedTable;

/// One row of the aligned table.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRow {
    pub key: JoinKey,
    pub cells: Vec<CellValue>,
}

/// Key plus the non-key columns accumulated so far.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlignedTable {
    pub columns: Vec<String>,
    pub rows: Vec<AlignedRow>,
}

impl AlignedTable {
    /// Concatenates the key rows of both sheets. Duplicates are kept.
    pub fn key_space(custom: &KeyTable, items: &KeyTable) -> Self {
        let rows = custom
            .keys
            .iter()
            .chain(items.keys.iter())
            .map(|key| AlignedRow {
                key: key.clone(),
                cells: Vec::new(),
            })
            .collect();

        Self {
            columns: Vec::new(),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Full outer join of `self` with `right` on the join key.
    ///
    /// Output order: each left row followed by its matches in right order,
    /// then the right rows that matched nothing, in their original order.
    /// Cells of the side without a counterpart are [`CellValue::Empty`].
    pub fn outer_join(self, right: &PrefixedTable) -> AlignedTable {
        let left_width = self.columns.len();
        let right_width = right.columns.len();

        let mut index: HashMap<&JoinKey, Vec<usize>> = HashMap::new();
        for (row_idx, key) in right.keys.iter().enumerate() {
            index.entry(key).or_default().push(row_idx);
        }

        let mut matched = vec![false; right.len()];
        let mut rows = Vec::with_capacity(self.rows.len().max(right.len()));

        for left_row in self.rows {
            match index.get(&left_row.key) {
                Some(partners) => {
                    for &right_idx in partners {
                        matched[right_idx] = true;
                        let mut cells = Vec::with_capacity(left_width + right_width);
                        cells.extend(left_row.cells.iter().cloned());
                        cells.extend(right.rows[right_idx].iter().cloned());
                        rows.push(AlignedRow {
                            key: left_row.key.clone(),
                            cells,
                        });
                    }
                }
                None => {
                    let mut cells = left_row.cells;
                    cells.resize(left_width + right_width, CellValue::Empty);
                    rows.push(AlignedRow {
                        key: left_row.key,
                        cells,
                    });
                }
            }
        }

        for (right_idx, was_matched) in matched.into_iter().enumerate() {
            if was_matched {
                continue;
            }
            let mut cells = vec![CellValue::Empty; left_width];
            cells.extend(right.rows[right_idx].iter().cloned());
            rows.push(AlignedRow {
                key: right.keys[right_idx].clone(),
                cells,
            });
        }

        let mut columns = self.columns;
        columns.extend(right.columns.iter().cloned());

        AlignedTable { columns, rows }
    }
}
