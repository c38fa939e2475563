//! Reader for the per-base, per-strand count files mgatk writes for a sample.

use crate::error::MgatkError;
use crate::io_utils::open_with_gz;
use anyhow::{Context, Result, bail};
use fxhash::FxHashMap;
use itertools::Itertools;
use log::info;
use mito_variant::{Nucleotide, ReferenceSequence, Strand, StrandedBaseCounts, StrandedCountsBuilder};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const DEPTH_TABLE_SUFFIX: &str = ".depthTable.txt";
const DEFAULT_REFERENCE: &str = "chrM_refAllele.txt";

/// Paths of the files making up one sample in an mgatk output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MgatkFiles {
    /// Sample prefix shared by the file names.
    pub prefix: String,
    /// `<prefix>.depthTable.txt`
    pub depth_table: PathBuf,
    /// `<prefix>_refAllele.txt`, or `chrM_refAllele.txt` when absent.
    pub reference: PathBuf,
    /// `<prefix>.<base>.txt.gz` (or uncompressed), in `Nucleotide::ALL` order.
    pub counts: [PathBuf; 4],
}

impl MgatkFiles {
    /// Find the files of the single sample in `dir`.
    pub fn locate(dir: &Path) -> Result<Self> {
        let prefixes: Vec<String> = std::fs::read_dir(dir)
            .with_context(|| dir.display().to_string())?
            .map(|entry| -> Result<String> {
                Ok(entry?.file_name().to_string_lossy().into_owned())
            })
            .filter_map_ok(|name| name.strip_suffix(DEPTH_TABLE_SUFFIX).map(str::to_string))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .sorted()
            .collect();
        let prefix = match prefixes.as_slice() {
            [] => bail!(MgatkError::MissingFile {
                dir: dir.to_path_buf(),
                what: format!("depth table (<sample>{DEPTH_TABLE_SUFFIX})"),
            }),
            [prefix] => prefix.clone(),
            _ => bail!(MgatkError::AmbiguousPrefix {
                dir: dir.to_path_buf(),
                prefixes,
            }),
        };

        let reference = [format!("{prefix}_refAllele.txt"), DEFAULT_REFERENCE.to_string()]
            .into_iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
            .ok_or_else(|| MgatkError::MissingFile {
                dir: dir.to_path_buf(),
                what: format!("reference alleles ({prefix}_refAllele.txt or {DEFAULT_REFERENCE})"),
            })?;

        let [a, c, g, t] = Nucleotide::ALL.map(|base| {
            [
                format!("{prefix}.{base}.txt.gz"),
                format!("{prefix}.{base}.txt"),
            ]
            .into_iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
            .ok_or_else(|| MgatkError::MissingFile {
                dir: dir.to_path_buf(),
                what: format!("{base} counts ({prefix}.{base}.txt.gz)"),
            })
        });
        let counts = [a?, c?, g?, t?];

        Ok(MgatkFiles {
            depth_table: dir.join(format!("{prefix}{DEPTH_TABLE_SUFFIX}")),
            prefix,
            reference,
            counts,
        })
    }
}

/// Count tables of one sample plus the per-cell mtDNA depth from its depth
/// table.
#[derive(Debug, Clone)]
pub struct MgatkData {
    /// Validated count tables. Cell order is the depth table's row order.
    pub counts: StrandedBaseCounts,
    /// Mean mtDNA depth per cell, aligned with `counts.cell_barcodes()`.
    pub cell_depth: Vec<f64>,
}

impl MgatkData {
    /// Depth-table depth of a cell.
    pub fn depth_of(&self, barcode: &str) -> Option<f64> {
        let idx = self
            .counts
            .cell_barcodes()
            .iter()
            .position(|bc| bc == barcode)?;
        Some(self.cell_depth[idx])
    }
}

/// Load the sample in an mgatk output directory.
pub fn read_mgatk_dir(dir: &Path) -> Result<MgatkData> {
    let files = MgatkFiles::locate(dir)?;
    read_mgatk_files(&files).with_context(|| format!("reading mgatk output {}", dir.display()))
}

fn read_mgatk_files(files: &MgatkFiles) -> Result<MgatkData> {
    let reference = read_reference(&files.reference)?;
    let (barcodes, cell_depth) = read_depth_table(&files.depth_table)?;
    let cell_index: FxHashMap<String, usize> = barcodes
        .iter()
        .enumerate()
        .map(|(i, bc)| (bc.clone(), i))
        .collect();

    let mut builder = StrandedCountsBuilder::new(reference, barcodes)?;
    for (base, path) in Nucleotide::ALL.into_iter().zip(&files.counts) {
        for_each_record(path, b',', 4, |line, record| {
            let position: u32 = parse_field(path, line, "position", &record[0])?;
            let barcode = &record[1];
            let Some(&cell) = cell_index.get(barcode) else {
                bail!(MgatkError::UnknownBarcode {
                    path: path.clone(),
                    line,
                    barcode: barcode.to_string(),
                });
            };
            for (strand, field) in Strand::BOTH.into_iter().zip([&record[2], &record[3]]) {
                let count: u32 = parse_field(path, line, "count", field)?;
                builder
                    .add(base, strand, position, cell, count)
                    .with_context(|| format!("{}:{line}", path.display()))?;
            }
            Ok(())
        })?;
    }
    let counts = builder.build();
    info!(
        "read mgatk sample {}: {} cells over {} positions",
        files.prefix,
        counts.n_cells(),
        counts.n_positions()
    );
    Ok(MgatkData { counts, cell_depth })
}

/// `position<TAB>base` lines with strictly increasing positions. Gaps read as `N`.
fn read_reference(path: &Path) -> Result<ReferenceSequence> {
    let mut bases = Vec::new();
    for_each_record(path, b'\t', 2, |line, record| {
        let position: usize = parse_field(path, line, "position", &record[0])?;
        if position <= bases.len() {
            bail!(malformed(path, line, "positions must be increasing and start at 1"));
        }
        let &[base] = record[1].as_bytes() else {
            bail!(malformed(path, line, format!("invalid base {:?}", &record[1])));
        };
        bases.resize(position - 1, b'N');
        bases.push(base);
        Ok(())
    })?;
    Ok(ReferenceSequence::new(bases))
}

/// `barcode<TAB>depth` lines, one per cell.
fn read_depth_table(path: &Path) -> Result<(Vec<String>, Vec<f64>)> {
    let mut barcodes = Vec::new();
    let mut depths = Vec::new();
    let mut seen = FxHashMap::default();
    for_each_record(path, b'\t', 2, |line, record| {
        let barcode = record[0].to_string();
        let depth: f64 = parse_field(path, line, "depth", &record[1])?;
        if seen.insert(barcode.clone(), line).is_some() {
            bail!(MgatkError::DuplicateBarcode {
                path: path.to_path_buf(),
                line,
                barcode,
            });
        }
        barcodes.push(barcode);
        depths.push(depth);
        Ok(())
    })?;
    Ok((barcodes, depths))
}

fn malformed(path: &Path, line: u64, reason: impl Into<String>) -> MgatkError {
    MgatkError::MalformedLine {
        path: path.to_path_buf(),
        line,
        reason: reason.into(),
    }
}

fn parse_field<T: FromStr>(path: &Path, line: u64, name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| malformed(path, line, format!("invalid {name} {value:?}")).into())
}

/// Call `f` with the line number and fields of every record of a headerless,
/// possibly gzipped, delimited file.
fn for_each_record(
    path: &Path,
    delimiter: u8,
    n_fields: usize,
    mut f: impl FnMut(u64, &csv::StringRecord) -> Result<()>,
) -> Result<()> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(open_with_gz(path)?);
    let mut record = csv::StringRecord::new();
    while reader
        .read_record(&mut record)
        .with_context(|| path.display().to_string())?
    {
        let line = record.position().map_or(0, csv::Position::line);
        if record.len() != n_fields {
            bail!(malformed(
                path,
                line,
                format!("expected {n_fields} fields but found {}", record.len())
            ));
        }
        f(line, &record)?;
    }
    Ok(())
}
