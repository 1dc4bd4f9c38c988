//! Core library for the ledger-merge command line application.
//!
//! The library merges the "Custom Report" and "Item Details" sheets of a
//! workbook into one report keyed by transaction date and reference. IO
//! adapters live under [`io`], table representations inside [`model`], the
//! merge engine in [`merge`], and the upload-style orchestration (file naming,
//! temporary files, error reports) under [`process`].

pub mod error;
pub mod io;
pub mod merge;
pub mod model;
pub mod process;

pub use error::{ErrorKind, ErrorReport, Result, ToolError};
