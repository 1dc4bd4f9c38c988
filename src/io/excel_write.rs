use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::error::Result;
use crate::merge::ResultTable;
use crate::model::{CellValue, HEADER_ROW};

/// Name of the single sheet in the merged workbook.
pub const OUTPUT_SHEET: &str = "Sheet1";

/// Serialises the merged report to an in-memory `.xlsx` payload.
pub fn report_to_buffer(table: &ResultTable) -> Result<Vec<u8>> {
    let mut workbook = build_workbook(table)?;
    Ok(workbook.save_to_buffer()?)
}

fn build_workbook(table: &ResultTable) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("dd/mm/yyyy");

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(OUTPUT_SHEET)?;

    for (col_idx, header) in table.columns.iter().enumerate() {
        worksheet.write_string(HEADER_ROW, col_idx as u16, header)?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        let excel_row = HEADER_ROW + 1 + row_idx as u32;
        write_text(worksheet, excel_row, 0, &row.date)?;
        write_text(worksheet, excel_row, 1, &row.reference)?;
        for (offset, cell) in row.cells.iter().enumerate() {
            write_cell(worksheet, excel_row, (offset + 2) as u16, cell, &date_format)?;
        }
    }

    Ok(workbook)
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &CellValue,
    date_format: &Format,
) -> Result<()> {
    match cell {
        CellValue::Empty => {}
        CellValue::Text(value) => write_text(worksheet, row, col, value)?,
        CellValue::Number(value) => {
            worksheet.write_number(row, col, *value)?;
        }
        CellValue::Bool(value) => {
            worksheet.write_boolean(row, col, *value)?;
        }
        CellValue::DateTime(serial) => {
            worksheet.write_number_with_format(row, col, *serial, date_format)?;
        }
    }
    Ok(())
}

// Empty strings are left as blank cells.
fn write_text(worksheet: &mut Worksheet, row: u32, col: u16, value: &str) -> Result<()> {
    if !value.is_empty() {
        worksheet.write_string(row, col, value)?;
    }
    Ok(())
}
