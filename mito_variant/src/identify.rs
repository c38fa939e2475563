//! Population statistics for every possible substitution at every position.

use crate::counts::StrandedBaseCounts;
use crate::nucleotide::Strand;
use crate::variant::Variant;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use sprs::CsVec;
use stats::{MeanVariance, pearson};

/// Allele fraction cutoffs reported as `n_cells_over_*`.
const FRACTION_CUTOFFS: [f64; 3] = [0.05, 0.10, 0.20];

/// How cells with no reads at a position enter the mean and variance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroDepthPolicy {
    /// The mean is taken over covered cells; the variance over all cells,
    /// zero-depth cells contributing a fraction of 0.
    #[default]
    IncludeAsZero,
    /// Both the mean and the variance are taken over covered cells only.
    Exclude,
}

/// Settings for computing variant statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdentifySettings {
    /// Minimum total depth for a cell to count towards
    /// `n_cells_confidently_detected`. Also the low coverage threshold used
    /// by variance stabilization.
    pub min_coverage: u32,
    /// Treatment of zero-depth cells.
    pub zero_depth_policy: ZeroDepthPolicy,
    /// Replace the allele fraction of cells below `min_coverage` with the
    /// mean allele frequency before taking the variance.
    pub stabilize_variance: bool,
}

impl Default for IdentifySettings {
    fn default() -> Self {
        IdentifySettings {
            min_coverage: 10,
            zero_depth_policy: ZeroDepthPolicy::IncludeAsZero,
            stabilize_variance: false,
        }
    }
}

/// Population statistics for one (position, alternate base) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantSummary {
    /// The substitution.
    pub variant: Variant,
    /// Mean per-cell alternate allele fraction, in [0, 1].
    pub mean_allele_frequency: f64,
    /// Population variance of the per-cell alternate allele fraction.
    pub variance: f64,
    /// `variance / mean_allele_frequency`, 0 when the mean is 0.
    pub variance_to_mean_ratio: f64,
    /// Pearson correlation of forward and reverse strand allele fractions
    /// across cells covered on both strands. NaN when undefined.
    pub strand_correlation: f64,
    /// Cells with at least the minimum coverage and any alternate read.
    pub n_cells_confidently_detected: usize,
    /// Cells with an allele fraction of at least 0.05.
    pub n_cells_over_5: usize,
    /// Cells with an allele fraction of at least 0.10.
    pub n_cells_over_10: usize,
    /// Cells with an allele fraction of at least 0.20.
    pub n_cells_over_20: usize,
    /// Mean total depth at the position over all cells.
    pub mean_coverage: f64,
}

impl AsRef<VariantSummary> for VariantSummary {
    fn as_ref(&self) -> &VariantSummary {
        self
    }
}

/// Statistics for one (position, alternate base) pair together with the
/// per-cell alternate read counts they were computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionAlleleRecord {
    /// Population statistics.
    pub summary: VariantSummary,
    /// Forward strand reads supporting the alternate base, one entry per cell.
    pub forward_counts: CsVec<u32>,
    /// Reverse strand reads supporting the alternate base, one entry per cell.
    pub reverse_counts: CsVec<u32>,
}

impl AsRef<VariantSummary> for PositionAlleleRecord {
    fn as_ref(&self) -> &VariantSummary {
        &self.summary
    }
}

/// Compute a record for every position with an unambiguous reference base
/// and each of the three alternate bases there, in position then alternate
/// base order.
pub fn identify_variants(
    counts: &StrandedBaseCounts,
    settings: &IdentifySettings,
) -> Vec<PositionAlleleRecord> {
    let n_cells = counts.n_cells();
    let mut records = Vec::new();
    for position in 1..=counts.n_positions() as u32 {
        let Some(reference_base) = counts.reference().nucleotide(position) else {
            debug!("skipping position {position} with ambiguous reference");
            continue;
        };
        let pos = counts.position(position);
        let fwd_depth = pos.strand_depth(Strand::Forward);
        let rev_depth = pos.strand_depth(Strand::Reverse);
        for alternate_base in reference_base.others() {
            let variant = Variant {
                position,
                reference_base,
                alternate_base,
            };
            let summary = summarize(
                variant,
                &AlleleObservations {
                    fwd_alt: pos.allele(alternate_base, Strand::Forward),
                    rev_alt: pos.allele(alternate_base, Strand::Reverse),
                    fwd_depth: &fwd_depth,
                    rev_depth: &rev_depth,
                },
                settings,
            );
            let sparse = |strand| {
                counts
                    .allele_counts(alternate_base, strand, position)
                    .map_or_else(|| CsVec::empty(n_cells), |row| row.to_owned())
            };
            records.push(PositionAlleleRecord {
                summary,
                forward_counts: sparse(Strand::Forward),
                reverse_counts: sparse(Strand::Reverse),
            });
        }
    }
    info!(
        "computed statistics for {} variants over {} cells",
        records.len(),
        n_cells
    );
    records
}

/// Per-cell read counts for one alternate allele at one position.
#[derive(Debug, Clone, Copy)]
pub struct AlleleObservations<'a> {
    /// Forward strand alternate reads.
    pub fwd_alt: &'a [u32],
    /// Reverse strand alternate reads.
    pub rev_alt: &'a [u32],
    /// Forward strand depth over all four bases.
    pub fwd_depth: &'a [u32],
    /// Reverse strand depth over all four bases.
    pub rev_depth: &'a [u32],
}

impl AlleleObservations<'_> {
    /// Number of cells observed.
    pub fn n_cells(&self) -> usize {
        self.fwd_alt.len()
    }

    /// Total depth of a cell, both strands.
    pub fn depth(&self, cell: usize) -> u32 {
        self.fwd_depth[cell] + self.rev_depth[cell]
    }

    /// Strand-collapsed alternate reads of a cell.
    pub fn alt(&self, cell: usize) -> u32 {
        self.fwd_alt[cell] + self.rev_alt[cell]
    }

    /// Strand-collapsed alternate allele fraction of a cell, 0 without coverage.
    pub fn fraction(&self, cell: usize) -> f64 {
        ratio(self.alt(cell), self.depth(cell))
    }
}

/// Compute the statistics of one variant from its per-cell observations.
pub fn summarize(
    variant: Variant,
    obs: &AlleleObservations<'_>,
    settings: &IdentifySettings,
) -> VariantSummary {
    let n_cells = obs.n_cells();
    let covered = |cell: &usize| obs.depth(*cell) > 0;

    let mean_allele_frequency = (0..n_cells)
        .filter(covered)
        .map(|c| obs.fraction(c))
        .collect::<MeanVariance>()
        .mean();

    let variance_input = |cell: usize| {
        if settings.stabilize_variance && obs.depth(cell) < settings.min_coverage {
            mean_allele_frequency
        } else {
            obs.fraction(cell)
        }
    };
    let variance = match settings.zero_depth_policy {
        ZeroDepthPolicy::IncludeAsZero => {
            (0..n_cells).map(variance_input).collect::<MeanVariance>()
        }
        ZeroDepthPolicy::Exclude => (0..n_cells)
            .filter(covered)
            .map(variance_input)
            .collect::<MeanVariance>(),
    }
    .population_variance();

    let variance_to_mean_ratio = if mean_allele_frequency > 0.0 {
        variance / mean_allele_frequency
    } else {
        0.0
    };

    let strand_correlation = pearson(
        (0..n_cells)
            .filter(|&c| obs.fwd_depth[c] > 0 && obs.rev_depth[c] > 0)
            .map(|c| {
                (
                    ratio(obs.fwd_alt[c], obs.fwd_depth[c]),
                    ratio(obs.rev_alt[c], obs.rev_depth[c]),
                )
            }),
    );

    let n_cells_confidently_detected = (0..n_cells)
        .filter(|&c| obs.depth(c) >= settings.min_coverage && obs.alt(c) > 0)
        .count();
    let [n_cells_over_5, n_cells_over_10, n_cells_over_20] = FRACTION_CUTOFFS
        .map(|cutoff| (0..n_cells).filter(|&c| obs.fraction(c) >= cutoff).count());

    let mean_coverage = (0..n_cells)
        .map(|c| obs.depth(c))
        .collect::<MeanVariance>()
        .mean();

    VariantSummary {
        variant,
        mean_allele_frequency,
        variance,
        variance_to_mean_ratio,
        strand_correlation,
        n_cells_confidently_detected,
        n_cells_over_5,
        n_cells_over_10,
        n_cells_over_20,
        mean_coverage,
    }
}

fn ratio(numerator: u32, denominator: u32) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        f64::from(numerator) / f64::from(denominator)
    }
}
