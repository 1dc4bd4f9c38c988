use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{DataType, Range, Reader, Xlsx, open_workbook};
use tracing::debug;

use crate::error::{Result, ToolError};
use crate::model::{CellValue, HEADER_ROW, SheetSpec, SourceTable};

/// Reads the Custom Report and Item Details sheets from the workbook at `path`.
pub fn read_sources(path: &Path) -> Result<(SourceTable, SourceTable)> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    read_sources_from(&mut workbook)
}

/// Reads both source sheets from an in-memory `.xlsx` payload.
pub fn read_sources_from_bytes(bytes: &[u8]) -> Result<(SourceTable, SourceTable)> {
    let mut workbook = Xlsx::new(Cursor::new(bytes))?;
    read_sources_from(&mut workbook)
}

fn read_sources_from<R: Read + Seek>(workbook: &mut Xlsx<R>) -> Result<(SourceTable, SourceTable)> {
    let custom = read_source_sheet(workbook, &SheetSpec::CUSTOM)?;
    let items = read_source_sheet(workbook, &SheetSpec::ITEMS)?;
    Ok((custom, items))
}

/// Loads one sheet, treating physical row 3 as its header.
pub fn read_source_sheet<R: Read + Seek>(
    workbook: &mut Xlsx<R>,
    spec: &SheetSpec,
) -> Result<SourceTable> {
    let range = read_required_sheet(workbook, spec.sheet_name)?;
    let table = table_from_range(spec, &range);
    debug!(
        sheet = spec.sheet_name,
        rows = table.len(),
        columns = table.columns.len(),
        "loaded source sheet"
    );
    Ok(table)
}

fn read_required_sheet<R: Read + Seek>(
    workbook: &mut Xlsx<R>,
    name: &str,
) -> Result<Range<DataType>> {
    let range_result = workbook
        .worksheet_range(name)
        .ok_or_else(|| ToolError::MissingSheet {
            sheet: name.to_string(),
        })?;
    let range = range_result.map_err(ToolError::from)?;
    Ok(range)
}

fn table_from_range(spec: &SheetSpec, range: &Range<DataType>) -> SourceTable {
    // Ranges begin at the first used cell, not at A1.
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let Some(header_offset) = HEADER_ROW.checked_sub(start_row) else {
        return SourceTable::new(spec.origin, spec.sheet_name, Vec::new(), Vec::new());
    };

    let mut rows = range.rows().skip(header_offset as usize);
    let columns = match rows.next() {
        Some(header) => header_names(header, start_col as usize),
        None => Vec::new(),
    };

    let data = rows
        .filter(|row| row.iter().any(|cell| !matches!(cell, DataType::Empty)))
        .map(|row| row.iter().map(cell_value).collect())
        .collect();

    SourceTable::new(spec.origin, spec.sheet_name, columns, data)
}

/// Trims header names, names blank headers `Unnamed: <column>` and suffixes
/// repeats as `name.1`, `name.2`, ...
fn header_names(row: &[DataType], start_col: usize) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();

    row.iter()
        .enumerate()
        .map(|(offset, cell)| {
            let name = cell_value(cell).render().trim().to_string();
            let name = if name.is_empty() {
                format!("Unnamed: {}", start_col + offset)
            } else {
                name
            };

            let count = seen.entry(name.clone()).or_insert(0);
            let unique = if *count == 0 {
                name
            } else {
                format!("{name}.{count}")
            };
            *count += 1;
            unique
        })
        .collect()
}

fn cell_value(cell: &DataType) -> CellValue {
    match cell {
        DataType::Empty => CellValue::Empty,
        DataType::String(value) if value.is_empty() => CellValue::Empty,
        DataType::String(value) => CellValue::Text(value.clone()),
        DataType::Float(value) => CellValue::Number(*value),
        DataType::Int(value) => CellValue::Number(*value as f64),
        DataType::Bool(value) => CellValue::Bool(*value),
        DataType::DateTime(serial) => CellValue::DateTime(*serial),
        other => CellValue::Text(other.to_string()),
    }
}
