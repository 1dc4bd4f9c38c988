//! The merge engine: key extraction, column reconciliation, alignment and
//! normalization, run strictly in that order.

pub mod align;
pub mod keys;
pub mod normalize;
pub mod reconcile;

use tracing::{debug, info, instrument};

use crate::error::{Result, ToolError};
use crate::model::{SheetSpec, SourceTable};

pub use align::{AlignedRow, AlignedTable};
pub use keys::KeyTable;
pub use normalize::{ResultRow, ResultTable};
pub use reconcile::PrefixedTable;

/// Merges the Custom Report and Item Details tables into one report.
///
/// Both sheets are validated before any alignment happens: missing key
/// columns fail with [`ToolError::MissingColumns`], a sheet without data rows
/// with [`ToolError::EmptySheet`].
#[instrument(
    level = "info",
    skip_all,
    fields(custom_rows = custom.len(), items_rows = items.len())
)]
pub fn merge_sources(custom: &SourceTable, items: &SourceTable) -> Result<ResultTable> {
    let custom_spec = SheetSpec::for_origin(custom.origin);
    let items_spec = SheetSpec::for_origin(items.origin);

    let custom_columns = keys::locate_key_columns(custom, &custom_spec)?;
    let items_columns = keys::locate_key_columns(items, &items_spec)?;

    for table in [custom, items] {
        if table.is_empty() {
            return Err(ToolError::EmptySheet {
                sheet: table.sheet_name.clone(),
            });
        }
    }

    let custom_keys = keys::extract_keys(custom, &custom_spec)?;
    let items_keys = keys::extract_keys(items, &items_spec)?;
    let unparsed = custom_keys.unparsed_dates + items_keys.unparsed_dates;
    if unparsed > 0 {
        debug!(unparsed, "unparsable date cells treated as missing");
    }

    let custom_remaining = reconcile::prefix_remaining(custom, custom_columns, &custom_keys);
    let items_remaining = reconcile::prefix_remaining(items, items_columns, &items_keys);

    let key_space = AlignedTable::key_space(&custom_keys, &items_keys);
    debug!(key_rows = key_space.len(), "unified key space built");
    let with_custom = key_space.outer_join(&custom_remaining);
    debug!(rows = with_custom.len(), "joined custom columns");
    let aligned = with_custom.outer_join(&items_remaining);
    debug!(rows = aligned.len(), "joined item columns");

    let aligned_rows = aligned.len();
    let result = normalize::normalize(aligned);
    info!(
        rows = result.len(),
        columns = result.columns.len(),
        duplicates_removed = aligned_rows - result.len(),
        "merged report ready"
    );
    Ok(result)
}
