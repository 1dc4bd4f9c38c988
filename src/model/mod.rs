use std::hash::{Hash, Hasher};

use chrono::{Duration, NaiveDate};

/// Zero-based physical row holding the header of every sheet, read and written.
/// Rows above it are reserved.
pub const HEADER_ROW: u32 = 2;

/// Canonical name of the unified date column.
pub const DATE_COLUMN: &str = "date";
/// Canonical name of the unified reference column.
pub const REFERENCE_COLUMN: &str = "Ref_No";

/// Which of the two source sheets a table was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    Custom,
    Items,
}

impl Origin {
    /// Prefix prepended to every non-key column of this origin.
    pub fn prefix(self) -> &'static str {
        match self {
            Origin::Custom => "Custom",
            Origin::Items => "Items",
        }
    }
}

/// Fixed description of one source sheet and its key columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetSpec {
    pub origin: Origin,
    pub sheet_name: &'static str,
    pub date_column: &'static str,
    pub reference_column: &'static str,
}

impl SheetSpec {
    pub const CUSTOM: SheetSpec = SheetSpec {
        origin: Origin::Custom,
        sheet_name: "Custom Report",
        date_column: "Date",
        reference_column: "Reference No",
    };

    pub const ITEMS: SheetSpec = SheetSpec {
        origin: Origin::Items,
        sheet_name: "Item Details",
        date_column: "Date",
        reference_column: "Invoice No./Txn No.",
    };

    /// Returns the sheet description for the given origin.
    pub fn for_origin(origin: Origin) -> SheetSpec {
        match origin {
            Origin::Custom => SheetSpec::CUSTOM,
            Origin::Items => SheetSpec::ITEMS,
        }
    }
}

/// A single cell as read from a worksheet.
#[derive(Debug, Clone)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Date-formatted cell, kept as its 1900-system serial number.
    DateTime(f64),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Renders the cell as plain text. Whole numbers drop their fractional
    /// part so that `1001.0` reads back as `1001`.
    pub fn render(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(value) => value.clone(),
            CellValue::Number(value) => format_number(*value),
            CellValue::Bool(value) => value.to_string(),
            CellValue::DateTime(serial) => excel_serial_to_date(*serial)
                .map(|date| date.format("%d/%m/%Y").to_string())
                .unwrap_or_else(|| format_number(*serial)),
        }
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Empty, CellValue::Empty) => true,
            (CellValue::Text(lhs), CellValue::Text(rhs)) => lhs == rhs,
            (CellValue::Number(lhs), CellValue::Number(rhs))
            | (CellValue::DateTime(lhs), CellValue::DateTime(rhs)) => {
                float_bits(*lhs) == float_bits(*rhs)
            }
            (CellValue::Bool(lhs), CellValue::Bool(rhs)) => lhs == rhs,
            _ => false,
        }
    }
}

// Floats compare by bit pattern, which keeps `Eq` and `Hash` consistent.
impl Eq for CellValue {}

// `-0.0` and `0.0` share one bit pattern.
fn float_bits(value: f64) -> u64 {
    if value == 0.0 { 0.0f64.to_bits() } else { value.to_bits() }
}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Empty => {}
            CellValue::Text(value) => value.hash(state),
            CellValue::Number(value) | CellValue::DateTime(value) => {
                float_bits(*value).hash(state)
            }
            CellValue::Bool(value) => value.hash(state),
        }
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Converts a 1900-system Excel serial into a calendar date, discarding the
/// time of day. Serials before 1900-03-01 account for the phantom 29 Feb 1900.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let days = serial.floor() as i64;
    let epoch = if days < 60 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    epoch.checked_add_signed(Duration::try_days(days)?)
}

/// Fill class of a whole column, decided once from its present cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Numeric,
}

impl ColumnKind {
    /// A column is numeric when every present cell is a number. A column with
    /// no present cells at all counts as numeric.
    pub fn classify<'a>(cells: impl IntoIterator<Item = &'a CellValue>) -> ColumnKind {
        let all_numeric = cells
            .into_iter()
            .filter(|cell| !cell.is_empty())
            .all(|cell| matches!(cell, CellValue::Number(_)));
        if all_numeric {
            ColumnKind::Numeric
        } else {
            ColumnKind::Text
        }
    }

    /// Value substituted for absent cells of this kind.
    pub fn fill_value(self) -> CellValue {
        match self {
            ColumnKind::Text => CellValue::Text(String::new()),
            ColumnKind::Numeric => CellValue::Number(0.0),
        }
    }
}

/// An in-memory sheet: trimmed column names plus rows of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceTable {
    pub origin: Origin,
    pub sheet_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl SourceTable {
    /// Creates a table, stripping surrounding whitespace from column names and
    /// padding short rows with empty cells.
    pub fn new(
        origin: Origin,
        sheet_name: impl Into<String>,
        columns: Vec<String>,
        rows: Vec<Vec<CellValue>>,
    ) -> Self {
        let columns: Vec<String> = columns
            .into_iter()
            .map(|name| name.trim().to_string())
            .collect();
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();

        Self {
            origin,
            sheet_name: sheet_name.into(),
            columns,
            rows,
        }
    }

    /// Looks up a column by name, ignoring surrounding whitespace and case.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let wanted = name.trim();
        self.columns
            .iter()
            .position(|column| column.eq_ignore_ascii_case(wanted))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Transaction identity shared by both sheets.
///
/// Ordering is by date then reference, with null dates first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JoinKey {
    pub date: Option<NaiveDate>,
    pub reference: String,
}

impl JoinKey {
    pub fn new(date: Option<NaiveDate>, reference: impl Into<String>) -> Self {
        Self {
            date,
            reference: reference.into(),
        }
    }
}
