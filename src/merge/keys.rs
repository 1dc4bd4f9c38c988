//! Join key extraction and day-first date parsing.

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::error::{Result, ToolError};
use crate::model::{CellValue, JoinKey, SheetSpec, SourceTable, excel_serial_to_date};

/// Date-only layouts, day-first variants ahead of the month-first fallback.
const DATE_FORMATS: &[&str] = &[
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d/%m/%y",
    "%d-%m-%y",
    "%d.%m.%y",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d %b %Y",
    "%d-%b-%Y",
    "%d %B %Y",
    "%d-%B-%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%m/%d/%Y",
    "%m/%d/%y",
];

/// `%Y` also accepts one to three digit years, so `01/02/23` would read as
/// year 23. Such readings are discarded in favour of the `%y` layouts.
const MIN_FOUR_DIGIT_YEAR: i32 = 100;

const DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
];

/// Key columns of one sheet projected to `(date, Ref_No)` pairs.
///
/// Row order follows the source table and repeated keys are kept.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyTable {
    pub keys: Vec<JoinKey>,
    /// Number of non-empty date cells that could not be parsed.
    pub unparsed_dates: usize,
}

/// Positions of a sheet's two key columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyColumns {
    pub date: usize,
    pub reference: usize,
}

/// Resolves the key columns of `table`, failing with the names of every
/// column that is missing.
pub fn locate_key_columns(table: &SourceTable, spec: &SheetSpec) -> Result<KeyColumns> {
    let date = table.column_index(spec.date_column);
    let reference = table.column_index(spec.reference_column);

    match (date, reference) {
        (Some(date), Some(reference)) => Ok(KeyColumns { date, reference }),
        _ => {
            let mut columns = Vec::new();
            if date.is_none() {
                columns.push(spec.date_column.to_string());
            }
            if reference.is_none() {
                columns.push(spec.reference_column.to_string());
            }
            Err(ToolError::MissingColumns {
                sheet: table.sheet_name.clone(),
                columns,
            })
        }
    }
}

/// Extracts the normalized join key of every row.
pub fn extract_keys(table: &SourceTable, spec: &SheetSpec) -> Result<KeyTable> {
    let columns = locate_key_columns(table, spec)?;
    let mut unparsed_dates = 0;

    let keys = table
        .rows
        .iter()
        .map(|row| {
            let date_cell = &row[columns.date];
            let date = parse_date_cell(date_cell);
            if date.is_none() && !date_cell.is_empty() {
                unparsed_dates += 1;
            }
            JoinKey::new(date, row[columns.reference].render())
        })
        .collect();

    Ok(KeyTable {
        keys,
        unparsed_dates,
    })
}

/// Interprets a date cell. Anything that is not a recognizable date becomes
/// `None`.
pub fn parse_date_cell(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::DateTime(serial) => excel_serial_to_date(*serial),
        CellValue::Text(text) => parse_day_first(text),
        CellValue::Empty | CellValue::Number(_) | CellValue::Bool(_) => None,
    }
}

/// Parses textual dates, preferring day-first readings of ambiguous input.
pub fn parse_day_first(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok().filter(plausible_year))
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| {
                    NaiveDateTime::parse_from_str(text, format)
                        .ok()
                        .map(|datetime| datetime.date())
                        .filter(plausible_year)
                })
        })
}

fn plausible_year(date: &NaiveDate) -> bool {
    date.year() >= MIN_FOUR_DIGIT_YEAR
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn ambiguous_dates_read_day_first() {
        assert_eq!(parse_day_first("01/02/2023"), Some(ymd(2023, 2, 1)));
        assert_eq!(parse_day_first("05-06-2024"), Some(ymd(2024, 6, 5)));
    }

    #[test]
    fn impossible_day_first_falls_back_to_month_first() {
        assert_eq!(parse_day_first("12/25/2023"), Some(ymd(2023, 12, 25)));
    }

    #[test]
    fn iso_and_named_months_parse() {
        assert_eq!(parse_day_first("2023-02-01"), Some(ymd(2023, 2, 1)));
        assert_eq!(parse_day_first("1 Feb 2023"), Some(ymd(2023, 2, 1)));
        assert_eq!(parse_day_first("01/02/2023 14:30"), Some(ymd(2023, 2, 1)));
    }

    #[test]
    fn two_digit_years_land_in_the_current_century() {
        assert_eq!(parse_day_first("01/02/23"), Some(ymd(2023, 2, 1)));
        assert_eq!(parse_day_first("01-02-23"), Some(ymd(2023, 2, 1)));
        assert_eq!(parse_day_first("01.02.23"), Some(ymd(2023, 2, 1)));
        assert_eq!(parse_day_first("12/25/23"), Some(ymd(2023, 12, 25)));
    }

    #[test]
    fn garbage_becomes_null() {
        assert_eq!(parse_day_first("N/A"), None);
        assert_eq!(parse_day_first("   "), None);
        assert_eq!(parse_date_cell(&CellValue::Number(5.0)), None);
    }

    #[test]
    fn excel_serials_convert() {
        assert_eq!(parse_date_cell(&CellValue::DateTime(44958.0)), Some(ymd(2023, 2, 1)));
        assert_eq!(parse_date_cell(&CellValue::DateTime(44958.75)), Some(ymd(2023, 2, 1)));
    }
}
