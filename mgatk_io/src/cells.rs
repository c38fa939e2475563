//! Reference cell sets.

use crate::error::MgatkError;
use crate::io_utils::open_with_gz;
use anyhow::{Context, Result, bail};
use itertools::Itertools;
use log::info;
use std::path::Path;

const BARCODE_COLUMN: &str = "barcode";
const IS_CELL_COLUMN: &str = "is__cell_barcode";

/// Read the set of cell barcodes that passed an upstream cell-calling step.
///
/// Two layouts are accepted, either of them optionally gzipped:
/// - a CSV whose header names a `barcode` column. If an `is__cell_barcode`
///   column is present, only rows where it equals `1` are kept.
/// - a plain list with one barcode per line and no header.
///
/// Barcodes are returned in file order with repeats removed.
pub fn read_cell_set(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(open_with_gz(path)?);
    let mut records = reader.records();
    let Some(first) = records
        .next()
        .transpose()
        .with_context(|| path.display().to_string())?
    else {
        return Ok(Vec::new());
    };

    let barcode_col = first.iter().position(|field| field == BARCODE_COLUMN);
    let is_cell_col = first.iter().position(|field| field == IS_CELL_COLUMN);
    let cells: Vec<String> = match barcode_col {
        Some(barcode_col) => records
            .map(|record| record.with_context(|| path.display().to_string()))
            .filter_map_ok(|record| {
                let is_cell = is_cell_col.map_or(true, |col| record.get(col) == Some("1"));
                match record.get(barcode_col) {
                    Some(barcode) if is_cell && !barcode.is_empty() => Some(barcode.to_string()),
                    _ => None,
                }
            })
            .collect::<Result<_>>()?,
        None if first.len() > 1 => bail!(MgatkError::MissingBarcodeColumn {
            path: path.to_path_buf(),
        }),
        None => std::iter::once(Ok(first))
            .chain(records)
            .map_ok(|record| record.get(0).unwrap_or_default().to_string())
            .filter_ok(|barcode| !barcode.is_empty())
            .collect::<Result<_, _>>()
            .with_context(|| path.display().to_string())?,
    };
    let cells: Vec<String> = cells.into_iter().unique().collect();
    info!("read {} cell barcodes from {}", cells.len(), path.display());
    Ok(cells)
}
