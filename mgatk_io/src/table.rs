//! Variant statistics tables.

use anyhow::{Context, Result};
use mito_variant::VariantSummary;
use std::path::Path;

/// Write one CSV row per record, named by variant, with every statistic of
/// [`VariantSummary`] as a column. Undefined strand correlations are written
/// as `NaN`.
pub fn write_variant_table<T: AsRef<VariantSummary>>(path: &Path, records: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| path.display().to_string())?;
    for record in records {
        writer.serialize(record.as_ref())?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a table written by [`write_variant_table`].
pub fn read_variant_table(path: &Path) -> Result<Vec<VariantSummary>> {
    let mut reader = csv::Reader::from_path(path).with_context(|| path.display().to_string())?;
    reader
        .deserialize()
        .map(|row| row.with_context(|| path.display().to_string()))
        .collect()
}
