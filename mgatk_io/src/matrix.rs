//! Writers for the cells x variants allele-frequency matrix.

use anyhow::{Context, Result};
use mito_variant::CellAlleleFrequencyMatrix;
use sprs::TriMat;
use sprs::io::write_matrix_market;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Write the matrix as a dense CSV: a `Barcode,<variant>...` header and one
/// row per cell.
pub fn write_frequency_csv(path: &Path, matrix: &CellAlleleFrequencyMatrix) -> Result<()> {
    let mut file = BufWriter::new(File::create(path).with_context(|| path.display().to_string())?);
    write!(file, "Barcode")?;
    for variant in matrix.variants() {
        write!(file, ",{variant}")?;
    }
    writeln!(file)?;
    for (barcode, row) in matrix
        .cell_barcodes()
        .iter()
        .zip(matrix.frequencies().rows())
    {
        write!(file, "{barcode}")?;
        for freq in row {
            write!(file, ",{freq}")?;
        }
        writeln!(file)?;
    }
    file.flush()?;
    Ok(())
}

/// Writes the matrix as a Matrix Market folder: `matrix.mtx` with variants as
/// rows and cells as columns, holding only the non-zero fractions, plus
/// `barcodes.tsv` and `variants.tsv` naming the columns and rows.
pub struct MtxWriter {
    folder: PathBuf,
}

impl MtxWriter {
    /// Create the output folder if needed.
    pub fn new(folder: &Path) -> Result<Self> {
        std::fs::create_dir_all(folder).with_context(|| folder.display().to_string())?;
        Ok(MtxWriter {
            folder: folder.to_path_buf(),
        })
    }

    /// Write all three files.
    pub fn write_files(&self, matrix: &CellAlleleFrequencyMatrix) -> Result<()> {
        self.write_matrix_mtx(matrix)?;
        self.write_lines("barcodes.tsv", matrix.cell_barcodes())?;
        self.write_lines("variants.tsv", matrix.variants())
    }

    fn write_matrix_mtx(&self, matrix: &CellAlleleFrequencyMatrix) -> Result<()> {
        let frequencies = matrix.frequencies();
        let (n_cells, n_variants) = frequencies.dim();
        let mut tri = TriMat::new((n_variants, n_cells));
        for ((cell, variant), &freq) in frequencies.indexed_iter() {
            if freq != 0.0 {
                tri.add_triplet(variant, cell, freq);
            }
        }
        let path = self.folder.join("matrix.mtx");
        write_matrix_market(&path, &tri)
            .with_context(|| format!("failed to write allele frequencies to {path:?}"))
    }

    fn write_lines<T: std::fmt::Display>(&self, name: &str, items: &[T]) -> Result<()> {
        let path = self.folder.join(name);
        let mut writer = BufWriter::new(File::create(&path).with_context(|| path.display().to_string())?);
        for item in items {
            writeln!(writer, "{item}")?;
        }
        writer.flush()?;
        Ok(())
    }
}
