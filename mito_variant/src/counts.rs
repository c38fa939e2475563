//! Per-base, per-strand read count tables over mitochondrial positions and cells.

use crate::error::MitoVariantError;
use crate::nucleotide::{Nucleotide, Strand};
use anyhow::{Result, bail};
use fxhash::FxHashSet;
use sprs::{CsMat, CsVecView, TriMat};

/// Sparse count table. Rows are positions (row `i` is position `i + 1`),
/// columns are cells. Stored row-major so a single position can be read
/// without touching the rest of the genome.
pub type CountMatrix = CsMat<u32>;

/// Reference sequence of the mitochondrial genome, addressed by 1-based position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSequence {
    bases: Vec<u8>,
}

impl ReferenceSequence {
    /// Wrap a sequence of ASCII bases. Position 1 is the first byte. Bases are
    /// upper-cased; anything other than A, C, G or T is kept but yields no
    /// alternate alleles.
    pub fn new(bases: impl Into<Vec<u8>>) -> Self {
        let mut bases = bases.into();
        bases.make_ascii_uppercase();
        ReferenceSequence { bases }
    }

    /// Number of positions.
    pub fn len(&self) -> usize {
        self.bases.len()
    }

    /// True if the sequence has no positions.
    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    /// Raw upper case base at a 1-based position, None when out of range.
    pub fn base(&self, position: u32) -> Option<u8> {
        let idx = (position as usize).checked_sub(1)?;
        self.bases.get(idx).copied()
    }

    /// Reference nucleotide at a 1-based position. None when out of range or
    /// when the reference base is ambiguous.
    pub fn nucleotide(&self, position: u32) -> Option<Nucleotide> {
        self.base(position).and_then(Nucleotide::from_ascii)
    }
}

/// Accumulates count triplets and validates them against the reference and
/// the cell list as they arrive.
pub struct StrandedCountsBuilder {
    reference: ReferenceSequence,
    cell_barcodes: Vec<String>,
    tables: [[TriMat<u32>; 2]; 4],
}

impl StrandedCountsBuilder {
    /// Start an empty set of tables with one row per reference position and
    /// one column per cell barcode.
    pub fn new(reference: ReferenceSequence, cell_barcodes: Vec<String>) -> Result<Self> {
        check_unique(&cell_barcodes)?;
        let shape = (reference.len(), cell_barcodes.len());
        Ok(StrandedCountsBuilder {
            tables: std::array::from_fn(|_| std::array::from_fn(|_| TriMat::new(shape))),
            reference,
            cell_barcodes,
        })
    }

    /// Add `count` reads supporting `base` on `strand` at `position` in cell
    /// `cell_idx`. Repeated entries for the same cell and position are summed.
    pub fn add(
        &mut self,
        base: Nucleotide,
        strand: Strand,
        position: u32,
        cell_idx: usize,
        count: u32,
    ) -> Result<()> {
        if position == 0 || position as usize > self.reference.len() {
            bail!(MitoVariantError::PositionMissingFromReference { position });
        }
        if cell_idx >= self.cell_barcodes.len() {
            bail!(MitoVariantError::CellIndexOutOfRange {
                cell_idx,
                n_cells: self.cell_barcodes.len(),
            });
        }
        if count > 0 {
            self.tables[base.index()][strand.index()].add_triplet(
                position as usize - 1,
                cell_idx,
                count,
            );
        }
        Ok(())
    }

    /// Finish the tables.
    pub fn build(self) -> StrandedBaseCounts {
        let counts = self.tables.map(|strands| strands.map(|t| t.to_csr()));
        StrandedBaseCounts {
            counts,
            cell_barcodes: self.cell_barcodes,
            reference: self.reference,
        }
    }
}

/// The eight (4 bases x 2 strands) count tables of a dataset, the cell
/// barcodes their columns refer to, and the reference sequence their rows
/// refer to.
///
/// A value of this type has passed input validation: all tables share one
/// shape, there is one unique barcode per column, and no table holds counts
/// at a position the reference does not cover.
#[derive(Debug, Clone)]
pub struct StrandedBaseCounts {
    counts: [[CountMatrix; 2]; 4],
    cell_barcodes: Vec<String>,
    reference: ReferenceSequence,
}

impl StrandedBaseCounts {
    /// Validate and assemble pre-built count tables, indexed
    /// `counts[base.index()][strand.index()]`.
    pub fn new(
        reference: ReferenceSequence,
        cell_barcodes: Vec<String>,
        counts: [[CountMatrix; 2]; 4],
    ) -> Result<Self> {
        let expected = counts[0][0].shape();
        for base in Nucleotide::ALL {
            for strand in Strand::BOTH {
                let actual = counts[base.index()][strand.index()].shape();
                if actual != expected {
                    bail!(MitoVariantError::CountTableShapeMismatch {
                        base: base.as_char(),
                        strand: strand.to_string(),
                        expected,
                        actual,
                    });
                }
            }
        }
        if cell_barcodes.len() != expected.1 {
            bail!(MitoVariantError::CellCountMismatch {
                n_barcodes: cell_barcodes.len(),
                n_cells: expected.1,
            });
        }
        check_unique(&cell_barcodes)?;

        let counts = counts.map(|strands| {
            strands.map(|m| if m.is_csr() { m } else { m.to_other_storage() })
        });
        for table in counts.iter().flatten() {
            let beyond_reference = table
                .outer_iterator()
                .enumerate()
                .skip(reference.len())
                .find(|(_, row)| row.iter().any(|(_, &x)| x > 0));
            if let Some((row, _)) = beyond_reference {
                bail!(MitoVariantError::PositionMissingFromReference {
                    position: row as u32 + 1,
                });
            }
        }
        Ok(StrandedBaseCounts {
            counts,
            cell_barcodes,
            reference,
        })
    }

    /// Number of cells (table columns).
    pub fn n_cells(&self) -> usize {
        self.cell_barcodes.len()
    }

    /// Number of positions (table rows).
    pub fn n_positions(&self) -> usize {
        self.counts[0][0].rows()
    }

    /// Cell barcodes in column order.
    pub fn cell_barcodes(&self) -> &[String] {
        &self.cell_barcodes
    }

    /// The reference sequence.
    pub fn reference(&self) -> &ReferenceSequence {
        &self.reference
    }

    /// The count table for one base and strand.
    pub fn table(&self, base: Nucleotide, strand: Strand) -> &CountMatrix {
        &self.counts[base.index()][strand.index()]
    }

    /// Sparse per-cell counts of one base on one strand at a 1-based position.
    pub fn allele_counts(
        &self,
        base: Nucleotide,
        strand: Strand,
        position: u32,
    ) -> Option<CsVecView<'_, u32>> {
        let row = (position as usize).checked_sub(1)?;
        self.table(base, strand).outer_view(row)
    }

    /// Dense per-cell counts of every base and strand at a 1-based position.
    /// Positions outside the tables read as all zero.
    pub fn position(&self, position: u32) -> PositionCounts {
        let n_cells = self.n_cells();
        let counts = std::array::from_fn(|b| {
            std::array::from_fn(|s| {
                let mut dense = vec![0u32; n_cells];
                if let Some(row) =
                    self.allele_counts(Nucleotide::ALL[b], Strand::BOTH[s], position)
                {
                    for (cell, &x) in row.iter() {
                        dense[cell] += x;
                    }
                }
                dense
            })
        });
        PositionCounts { counts }
    }
}

/// Dense counts for every base, strand and cell at a single position.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionCounts {
    counts: [[Vec<u32>; 2]; 4],
}

impl PositionCounts {
    /// Per-cell counts of `base` on `strand`.
    pub fn allele(&self, base: Nucleotide, strand: Strand) -> &[u32] {
        &self.counts[base.index()][strand.index()]
    }

    /// Per-cell depth on one strand, summed over the four bases.
    pub fn strand_depth(&self, strand: Strand) -> Vec<u32> {
        let mut depth = vec![0u32; self.counts[0][0].len()];
        for base in Nucleotide::ALL {
            for (d, &x) in depth.iter_mut().zip(self.allele(base, strand)) {
                *d += x;
            }
        }
        depth
    }
}

fn check_unique(cell_barcodes: &[String]) -> Result<()> {
    let mut seen = FxHashSet::default();
    for bc in cell_barcodes {
        if !seen.insert(bc.as_str()) {
            bail!(MitoVariantError::DuplicateCell {
                barcode: bc.clone()
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use Nucleotide::{A, C, G, T};
    use Strand::{Forward, Reverse};

    fn barcodes(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("CELL-{i}")).collect()
    }

    #[test]
    fn test_reference_lookup() {
        let reference = ReferenceSequence::new(*b"acgN");
        assert_eq!(reference.len(), 4);
        assert_eq!(reference.nucleotide(1), Some(A));
        assert_eq!(reference.nucleotide(3), Some(G));
        assert_eq!(reference.base(4), Some(b'N'));
        assert_eq!(reference.nucleotide(4), None);
        assert_eq!(reference.nucleotide(0), None);
        assert_eq!(reference.nucleotide(5), None);
    }

    #[test]
    fn test_builder_sums_and_densifies() {
        let mut builder =
            StrandedCountsBuilder::new(ReferenceSequence::new(*b"ACGT"), barcodes(3)).unwrap();
        builder.add(C, Forward, 2, 0, 4).unwrap();
        builder.add(C, Forward, 2, 0, 1).unwrap();
        builder.add(T, Forward, 2, 2, 3).unwrap();
        builder.add(T, Reverse, 2, 2, 7).unwrap();
        let counts = builder.build();
        assert_eq!(counts.n_cells(), 3);
        assert_eq!(counts.n_positions(), 4);

        let pos = counts.position(2);
        assert_eq!(pos.allele(C, Forward), &[5, 0, 0]);
        assert_eq!(pos.allele(T, Reverse), &[0, 0, 7]);
        assert_eq!(pos.strand_depth(Forward), vec![5, 0, 3]);
        assert_eq!(pos.strand_depth(Reverse), vec![0, 0, 7]);
        assert_eq!(counts.position(1).strand_depth(Forward), vec![0, 0, 0]);
    }

    #[test]
    fn test_builder_rejects_bad_input() {
        let mut builder =
            StrandedCountsBuilder::new(ReferenceSequence::new(*b"ACGT"), barcodes(2)).unwrap();
        let err = builder.add(A, Forward, 5, 0, 1).unwrap_err();
        assert_eq!(
            err.downcast::<MitoVariantError>().unwrap(),
            MitoVariantError::PositionMissingFromReference { position: 5 }
        );
        assert!(builder.add(A, Forward, 0, 0, 1).is_err());
        let err = builder.add(A, Forward, 1, 2, 1).unwrap_err();
        assert_eq!(
            err.downcast::<MitoVariantError>().unwrap(),
            MitoVariantError::CellIndexOutOfRange {
                cell_idx: 2,
                n_cells: 2
            }
        );

        let dup = vec!["X".to_string(), "X".to_string()];
        let err = StrandedCountsBuilder::new(ReferenceSequence::new(*b"A"), dup)
            .err()
            .unwrap();
        assert_eq!(
            err.downcast::<MitoVariantError>().unwrap(),
            MitoVariantError::DuplicateCell {
                barcode: "X".to_string()
            }
        );
    }

    fn tables(shape: (usize, usize)) -> [[CountMatrix; 2]; 4] {
        std::array::from_fn(|_| std::array::from_fn(|_| CountMatrix::zero(shape)))
    }

    #[test]
    fn test_new_validates_shapes() {
        let reference = ReferenceSequence::new(*b"ACG");
        let mut counts = tables((3, 2));
        counts[G.index()][Reverse.index()] = CountMatrix::zero((3, 4));
        let err = StrandedBaseCounts::new(reference.clone(), barcodes(2), counts).unwrap_err();
        assert_eq!(
            err.downcast::<MitoVariantError>().unwrap(),
            MitoVariantError::CountTableShapeMismatch {
                base: 'G',
                strand: "rev".to_string(),
                expected: (3, 2),
                actual: (3, 4),
            }
        );

        let err = StrandedBaseCounts::new(reference.clone(), barcodes(3), tables((3, 2)))
            .unwrap_err();
        assert_eq!(
            err.downcast::<MitoVariantError>().unwrap(),
            MitoVariantError::CellCountMismatch {
                n_barcodes: 3,
                n_cells: 2
            }
        );

        assert!(StrandedBaseCounts::new(reference, barcodes(2), tables((3, 2))).is_ok());
    }

    #[test]
    fn test_new_rejects_counts_beyond_reference() {
        let reference = ReferenceSequence::new(*b"AC");
        let mut counts = tables((4, 2));
        let mut tri = TriMat::new((4, 2));
        tri.add_triplet(3, 1, 9u32);
        counts[A.index()][Forward.index()] = tri.to_csr();
        let err = StrandedBaseCounts::new(reference.clone(), barcodes(2), counts).unwrap_err();
        assert_eq!(
            err.downcast::<MitoVariantError>().unwrap(),
            MitoVariantError::PositionMissingFromReference { position: 4 }
        );

        // empty rows past the end of the reference are harmless
        assert!(StrandedBaseCounts::new(reference, barcodes(2), tables((4, 2))).is_ok());
    }

    #[test]
    fn test_csc_input_is_converted() {
        let reference = ReferenceSequence::new(*b"AC");
        let mut counts = tables((2, 2));
        let mut tri = TriMat::new((2, 2));
        tri.add_triplet(1, 1, 6u32);
        counts[C.index()][Reverse.index()] = tri.to_csc();
        let counts = StrandedBaseCounts::new(reference, barcodes(2), counts).unwrap();
        assert!(counts.table(C, Reverse).is_csr());
        assert_eq!(counts.position(2).allele(C, Reverse), &[0, 6]);
    }
}
