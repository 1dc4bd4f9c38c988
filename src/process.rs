use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

use crate::error::{Result, ToolError};
use crate::io::{excel_read, excel_write};
use crate::merge::{ResultTable, merge_sources};
use crate::model::SourceTable;

/// Extensions accepted for uploaded workbooks.
pub const ALLOWED_EXTENSIONS: &[&str] = &["xlsx"];

const PROCESSED_PREFIX: &str = "processed_";
const FALLBACK_NAME: &str = "upload.xlsx";

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedFile {
    pub message: String,
    /// File name of the merged workbook inside the output directory.
    pub processed_file: String,
    #[serde(skip)]
    pub path: PathBuf,
    #[serde(skip)]
    pub rows: usize,
}

/// Merges the workbook at `input` and writes `processed_<name>` into
/// `output_dir`.
#[instrument(
    level = "info",
    skip_all,
    fields(input = %input.display(), output_dir = %output_dir.display())
)]
pub fn process_workbook(input: &Path, output_dir: &Path) -> Result<ProcessedFile> {
    if !input.exists() {
        return Err(ToolError::MissingInput(input.to_path_buf()));
    }
    let upload_name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    ensure_allowed(&upload_name)?;

    let (custom, items) = excel_read::read_sources(input)?;
    merge_and_persist(&custom, &items, output_dir, &upload_name)
}

/// Same as [`process_workbook`] for a workbook received as raw bytes. Nothing
/// but the merged output is written to disk.
#[instrument(
    level = "info",
    skip_all,
    fields(file_name = %file_name, bytes = contents.len(), output_dir = %output_dir.display())
)]
pub fn process_upload(file_name: &str, contents: &[u8], output_dir: &Path) -> Result<ProcessedFile> {
    ensure_allowed(file_name)?;
    let (custom, items) = excel_read::read_sources_from_bytes(contents)?;
    merge_and_persist(&custom, &items, output_dir, file_name)
}

fn merge_and_persist(
    custom: &SourceTable,
    items: &SourceTable,
    output_dir: &Path,
    upload_name: &str,
) -> Result<ProcessedFile> {
    let report = merge_sources(custom, items)?;
    let processed_file = processed_file_name(upload_name);
    let path = persist_report(&report, output_dir, &processed_file)?;
    info!(path = %path.display(), rows = report.len(), "processed workbook written");

    Ok(ProcessedFile {
        message: "File successfully processed".to_string(),
        processed_file,
        path,
        rows: report.len(),
    })
}

/// Writes the report through a temporary file in `output_dir` that is only
/// renamed into place once fully written. On any failure the temporary file
/// is dropped and removed.
pub fn persist_report(report: &ResultTable, output_dir: &Path, file_name: &str) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)?;
    let buffer = excel_write::report_to_buffer(report)?;

    let mut temp = NamedTempFile::new_in(output_dir)?;
    debug!(temp = %temp.path().display(), "writing report to temporary file");
    temp.write_all(&buffer)?;
    temp.flush()?;

    let target = output_dir.join(file_name);
    temp.persist(&target).map_err(|err| ToolError::Io(err.error))?;
    Ok(target)
}

fn ensure_allowed(file_name: &str) -> Result<()> {
    if is_allowed_file(file_name) {
        Ok(())
    } else {
        Err(ToolError::InvalidFileType(file_name.to_string()))
    }
}

/// Returns whether the file name carries an accepted workbook extension.
pub fn is_allowed_file(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .is_some_and(|(_, extension)| {
            ALLOWED_EXTENSIONS
                .iter()
                .any(|allowed| extension.eq_ignore_ascii_case(allowed))
        })
}

/// Name under which the merged workbook for `upload_name` is stored.
pub fn processed_file_name(upload_name: &str) -> String {
    let secure = secure_filename(upload_name);
    if secure.is_empty() {
        format!("{PROCESSED_PREFIX}{FALLBACK_NAME}")
    } else {
        format!("{PROCESSED_PREFIX}{secure}")
    }
}

/// Reduces a user supplied file name to a safe, flat ASCII name.
///
/// Path separators become spaces, whitespace runs become `_`, anything outside
/// `[A-Za-z0-9_.-]` is dropped and leading or trailing `.`/`_` are trimmed.
pub fn secure_filename(name: &str) -> String {
    let flattened: String = name
        .chars()
        .map(|ch| if ch == '/' || ch == '\\' { ' ' } else { ch })
        .collect();

    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-'))
        .collect();

    kept.trim_matches(|ch| ch == '.' || ch == '_').to_string()
}
