use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering the different failure cases that can occur when the
/// tool ingests, merges, or emits a workbook.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON serialization of a report fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation. Any failure to
    /// open the container lands here.
    #[error("workbook is not a readable spreadsheet: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Raised when the uploaded file fails the extension check.
    #[error("invalid file type: {0} (expected an .xlsx workbook)")]
    InvalidFileType(String),

    /// Raised when a required sheet is absent from the workbook.
    #[error("missing required sheet '{sheet}'")]
    MissingSheet { sheet: String },

    /// Raised when a sheet lacks one or more of its key columns.
    #[error("sheet '{sheet}' is missing required column(s): {}", .columns.join(", "))]
    MissingColumns { sheet: String, columns: Vec<String> },

    /// Raised when a required sheet has a header but no data rows.
    #[error("sheet '{sheet}' contains no data rows")]
    EmptySheet { sheet: String },

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

/// Caller-facing classification of a [`ToolError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    SchemaError,
    EmptySheetError,
    FormatError,
    ProcessingError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::SchemaError => write!(f, "SchemaError"),
            ErrorKind::EmptySheetError => write!(f, "EmptySheetError"),
            ErrorKind::FormatError => write!(f, "FormatError"),
            ErrorKind::ProcessingError => write!(f, "ProcessingError"),
        }
    }
}

impl ToolError {
    /// Classifies the error into one of the kinds reported to callers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolError::MissingSheet { .. } | ToolError::MissingColumns { .. } => {
                ErrorKind::SchemaError
            }
            ToolError::EmptySheet { .. } => ErrorKind::EmptySheetError,
            ToolError::ExcelRead(_) | ToolError::InvalidFileType(_) => ErrorKind::FormatError,
            ToolError::Io(_)
            | ToolError::Json(_)
            | ToolError::ExcelWrite(_)
            | ToolError::MissingInput(_)
            | ToolError::Logging(_) => ErrorKind::ProcessingError,
        }
    }

    /// Builds the structured report handed back to callers.
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            error: self.to_string(),
        }
    }
}

/// Error kind plus the human-readable message, without any internal detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub error: String,
}
