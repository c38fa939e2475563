//! Errors raised while validating count tables and variants.

/// Input-validation failures. All of these are fatal: no partial result is
/// produced once one is raised, since every downstream statistic depends on
/// the cell and position alignment of the inputs.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum MitoVariantError {
    /// A count table does not have the same shape as the others.
    #[error("{base}-{strand} count table has shape {actual:?} but expected {expected:?}")]
    CountTableShapeMismatch {
        /// Base of the offending table.
        base: char,
        /// Strand of the offending table.
        strand: String,
        /// Shape (positions, cells) shared by the other tables.
        expected: (usize, usize),
        /// Shape of the offending table.
        actual: (usize, usize),
    },
    /// The cell barcode list and the count table columns disagree.
    #[error("{n_barcodes} cell barcodes were given for count tables with {n_cells} cells")]
    CellCountMismatch {
        /// Number of cell barcodes.
        n_barcodes: usize,
        /// Number of columns in the count tables.
        n_cells: usize,
    },
    /// A cell barcode was listed twice.
    #[error("cell barcode {barcode} appears more than once")]
    DuplicateCell {
        /// The repeated barcode.
        barcode: String,
    },
    /// A cell index beyond the cell barcode list.
    #[error("cell index {cell_idx} is out of range for {n_cells} cells")]
    CellIndexOutOfRange {
        /// The offending index.
        cell_idx: usize,
        /// Number of cells.
        n_cells: usize,
    },
    /// Counts were given for a position the reference does not cover.
    #[error("position {position} has counts but is absent from the reference sequence")]
    PositionMissingFromReference {
        /// 1-based position.
        position: u32,
    },
    /// A variant was requested at a position the count tables do not cover.
    #[error("variant {variant} lies outside the {n_positions} positions of the count tables")]
    VariantOutOfRange {
        /// Variant name.
        variant: String,
        /// Number of positions in the count tables.
        n_positions: usize,
    },
    /// A variant's reference base disagrees with the reference sequence.
    #[error("variant {variant} does not match reference base {reference} at its position")]
    ReferenceMismatch {
        /// Variant name.
        variant: String,
        /// Base found in the reference.
        reference: char,
    },
    /// A variant name could not be parsed.
    #[error("invalid variant name {name:?}: {reason}")]
    InvalidVariantName {
        /// The unparseable name.
        name: String,
        /// What was wrong with it.
        reason: &'static str,
    },
    /// A character that is not one of A, C, G, T.
    #[error("invalid nucleotide {0:?}")]
    InvalidNucleotide(char),
}
