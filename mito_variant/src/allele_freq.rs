//! Per-cell, strand-collapsed allele frequencies for a chosen set of variants.

use crate::counts::StrandedBaseCounts;
use crate::error::MitoVariantError;
use crate::nucleotide::{Nucleotide, Strand};
use crate::variant::Variant;
use anyhow::{Result, bail};
use fxhash::FxHashSet;
use log::{info, warn};
use ndarray::Array2;

/// Cells x variants matrix of alternate allele fractions.
#[derive(Debug, Clone, PartialEq)]
pub struct CellAlleleFrequencyMatrix {
    cell_barcodes: Vec<String>,
    variants: Vec<Variant>,
    frequencies: Array2<f64>,
}

impl CellAlleleFrequencyMatrix {
    /// Row labels, in the cell order of the allele data.
    pub fn cell_barcodes(&self) -> &[String] {
        &self.cell_barcodes
    }

    /// Column labels, in the order the variants were requested.
    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    /// The fractions, `[[cell, variant]]`. Cells without coverage hold 0.
    pub fn frequencies(&self) -> &Array2<f64> {
        &self.frequencies
    }

    /// Fraction for one cell barcode and variant, if both are present.
    pub fn get(&self, barcode: &str, variant: &Variant) -> Option<f64> {
        let row = self.cell_barcodes.iter().position(|bc| bc == barcode)?;
        let col = self.variants.iter().position(|v| v == variant)?;
        Some(self.frequencies[[row, col]])
    }
}

/// Result of deriving allele frequencies. The two empty outcomes are valid
/// terminal states rather than errors, and no zero-sized matrix is built for
/// them.
#[derive(Debug, Clone, PartialEq)]
pub enum AlleleFrequencyOutcome {
    /// The derived matrix.
    Matrix(CellAlleleFrequencyMatrix),
    /// No variants were given.
    NoInformativeVariants,
    /// No cell of the allele data is in the reference cell set.
    NoSharedCells,
}

/// Compute the strand-collapsed allele frequency of each variant in each cell
/// shared by the allele data and `reference_cells`:
///
/// `(fwd_alt + rev_alt) / (fwd_depth + rev_depth)`
///
/// where depths sum all four bases. Counts are summed before dividing, so a
/// strand with low depth does not get the same weight as a well covered one.
/// Cells present in only one of the two sets are dropped.
pub fn allele_frequencies<S: AsRef<str>>(
    counts: &StrandedBaseCounts,
    variants: &[Variant],
    reference_cells: impl IntoIterator<Item = S>,
) -> Result<AlleleFrequencyOutcome> {
    for v in variants {
        if v.position == 0 || v.position as usize > counts.n_positions() {
            bail!(MitoVariantError::VariantOutOfRange {
                variant: v.to_string(),
                n_positions: counts.n_positions(),
            });
        }
        if let Some(reference) = counts.reference().base(v.position) {
            if Nucleotide::from_ascii(reference) != Some(v.reference_base) {
                bail!(MitoVariantError::ReferenceMismatch {
                    variant: v.to_string(),
                    reference: char::from(reference),
                });
            }
        }
    }
    if variants.is_empty() {
        warn!("no informative variants found");
        return Ok(AlleleFrequencyOutcome::NoInformativeVariants);
    }

    let reference_cells: Vec<S> = reference_cells.into_iter().collect();
    let wanted: FxHashSet<&str> = reference_cells.iter().map(|c| c.as_ref()).collect();
    let kept: Vec<usize> = counts
        .cell_barcodes()
        .iter()
        .enumerate()
        .filter(|(_, bc)| wanted.contains(bc.as_str()))
        .map(|(i, _)| i)
        .collect();
    if kept.is_empty() {
        warn!(
            "none of the {} cells with allele data are among the {} reference cells",
            counts.n_cells(),
            wanted.len()
        );
        return Ok(AlleleFrequencyOutcome::NoSharedCells);
    }

    let mut frequencies = Array2::zeros((kept.len(), variants.len()));
    for (col, v) in variants.iter().enumerate() {
        let pos = counts.position(v.position);
        let fwd_depth = pos.strand_depth(Strand::Forward);
        let rev_depth = pos.strand_depth(Strand::Reverse);
        let fwd_alt = pos.allele(v.alternate_base, Strand::Forward);
        let rev_alt = pos.allele(v.alternate_base, Strand::Reverse);
        for (row, &cell) in kept.iter().enumerate() {
            let depth = fwd_depth[cell] + rev_depth[cell];
            if depth > 0 {
                frequencies[[row, col]] =
                    f64::from(fwd_alt[cell] + rev_alt[cell]) / f64::from(depth);
            }
        }
    }
    info!(
        "computed allele frequencies of {} variants in {} cells ({} cells without allele data dropped)",
        variants.len(),
        kept.len(),
        wanted.len().saturating_sub(kept.len())
    );
    Ok(AlleleFrequencyOutcome::Matrix(CellAlleleFrequencyMatrix {
        cell_barcodes: kept
            .iter()
            .map(|&i| counts.cell_barcodes()[i].clone())
            .collect(),
        variants: variants.to_vec(),
        frequencies,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counts::{ReferenceSequence, StrandedCountsBuilder};
    use Nucleotide::{A, C, G, T};
    use Strand::{Forward, Reverse};
    use fxhash::FxHashMap;
    use pretty_assertions::assert_eq;
    use proptest::collection::{btree_set, vec};
    use proptest::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-12;

    fn barcodes(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("BC{i}")).collect()
    }

    fn unwrap_matrix(outcome: AlleleFrequencyOutcome) -> CellAlleleFrequencyMatrix {
        match outcome {
            AlleleFrequencyOutcome::Matrix(m) => m,
            other => panic!("expected a matrix, got {other:?}"),
        }
    }

    /// Reference `CA`; three cells.
    fn counts() -> StrandedBaseCounts {
        let mut b = StrandedCountsBuilder::new(ReferenceSequence::new(*b"CA"), barcodes(3)).unwrap();
        // cell 0: 1C>T forward 3/10, reverse 1/2 -> (3 + 1) / 12
        b.add(T, Forward, 1, 0, 3).unwrap();
        b.add(C, Forward, 1, 0, 7).unwrap();
        b.add(T, Reverse, 1, 0, 1).unwrap();
        b.add(C, Reverse, 1, 0, 1).unwrap();
        // cell 1: no coverage at position 1
        // cell 2: 1C>T all reads, plus reads at position 2
        b.add(T, Reverse, 1, 2, 4).unwrap();
        b.add(G, Forward, 2, 2, 2).unwrap();
        b.add(A, Reverse, 2, 2, 6).unwrap();
        b.build()
    }

    #[test]
    fn test_counts_are_summed_before_dividing() {
        let v = Variant::new(1, C, T).unwrap();
        let m = unwrap_matrix(allele_frequencies(&counts(), &[v], barcodes(3)).unwrap());
        assert_eq!(m.frequencies().dim(), (3, 1));
        assert!((m.get("BC0", &v).unwrap() - 4.0 / 12.0).abs() < EPS);
        // averaging the strand fractions would have given 0.4
        assert!((m.get("BC0", &v).unwrap() - 0.4).abs() > 0.01);
        assert_eq!(m.get("BC1", &v), Some(0.0));
        assert_eq!(m.get("BC2", &v), Some(1.0));
    }

    #[test]
    fn test_rows_are_intersection_in_allele_order() {
        let variants = [
            Variant::new(2, A, G).unwrap(),
            Variant::new(1, C, T).unwrap(),
        ];
        let reference_cells = ["BC2", "OTHER", "BC0"];
        let m = unwrap_matrix(allele_frequencies(&counts(), &variants, reference_cells).unwrap());
        assert_eq!(m.cell_barcodes(), &["BC0".to_string(), "BC2".to_string()]);
        assert_eq!(m.variants(), &variants);
        assert!((m.frequencies()[[1, 0]] - 0.25).abs() < EPS);
        assert_eq!(m.frequencies()[[0, 0]], 0.0);
    }

    #[test]
    fn test_empty_outcomes() {
        let v = Variant::new(1, C, T).unwrap();
        assert_eq!(
            allele_frequencies(&counts(), &[], barcodes(3)).unwrap(),
            AlleleFrequencyOutcome::NoInformativeVariants
        );
        assert_eq!(
            allele_frequencies(&counts(), &[v], ["X", "Y"]).unwrap(),
            AlleleFrequencyOutcome::NoSharedCells
        );
        assert_eq!(
            allele_frequencies(&counts(), &[v], Vec::<String>::new()).unwrap(),
            AlleleFrequencyOutcome::NoSharedCells
        );
    }

    #[test]
    fn test_invalid_variants() {
        let err = allele_frequencies(&counts(), &[Variant::new(3, A, T).unwrap()], barcodes(3))
            .unwrap_err();
        assert_eq!(
            err.downcast::<MitoVariantError>().unwrap(),
            MitoVariantError::VariantOutOfRange {
                variant: "3A>T".to_string(),
                n_positions: 2
            }
        );
        let err = allele_frequencies(&counts(), &[Variant::new(1, G, T).unwrap()], barcodes(3))
            .unwrap_err();
        assert_eq!(
            err.downcast::<MitoVariantError>().unwrap(),
            MitoVariantError::ReferenceMismatch {
                variant: "1G>T".to_string(),
                reference: 'C'
            }
        );
    }

    proptest! {
        #[test]
        fn prop_test_matches_brute_force(
            entries in vec((0usize..4, 0usize..2, 1u32..4, 0usize..6, 1u32..20), 0..80),
            reference_cells in btree_set(0usize..10, 0..10),
        ) {
            let reference = ReferenceSequence::new(*b"ACG");
            let mut builder = StrandedCountsBuilder::new(reference.clone(), barcodes(6)).unwrap();
            let mut raw: FxHashMap<(u32, usize), [u32; 4]> = FxHashMap::default();
            for &(b, s, pos, cell, n) in &entries {
                builder.add(Nucleotide::ALL[b], Strand::BOTH[s], pos, cell, n).unwrap();
                raw.entry((pos, cell)).or_default()[b] += n;
            }
            let counts = builder.build();
            let variants: Vec<Variant> = (1..=3u32)
                .flat_map(|pos| {
                    let r = reference.nucleotide(pos).unwrap();
                    r.others().map(move |alt| Variant::new(pos, r, alt).unwrap())
                })
                .collect();
            // cell names BC6..BC9 have no allele data
            let reference_names = barcodes(10);
            let reference_names: Vec<&String> =
                reference_cells.iter().map(|&i| &reference_names[i]).collect();

            let outcome = allele_frequencies(&counts, &variants, &reference_names).unwrap();
            let expected_rows: Vec<String> = reference_cells
                .iter()
                .filter(|&&i| i < 6)
                .map(|i| format!("BC{i}"))
                .collect();
            if expected_rows.is_empty() {
                prop_assert_eq!(outcome, AlleleFrequencyOutcome::NoSharedCells);
                return Ok(());
            }
            let m = unwrap_matrix(outcome);
            prop_assert_eq!(m.cell_barcodes(), expected_rows.as_slice());
            for (row, bc) in m.cell_barcodes().iter().enumerate() {
                let cell: usize = bc[2..].parse().unwrap();
                for (col, v) in variants.iter().enumerate() {
                    let by_base = raw.get(&(v.position, cell)).copied().unwrap_or_default();
                    let depth: u32 = by_base.iter().sum();
                    let expected = if depth == 0 {
                        0.0
                    } else {
                        f64::from(by_base[v.alternate_base.index()]) / f64::from(depth)
                    };
                    let actual = m.frequencies()[[row, col]];
                    prop_assert!((actual - expected).abs() < EPS);
                    prop_assert!((0.0..=1.0).contains(&actual));
                }
            }
        }
    }
}
