//! Selection of informative variants.
//!
//! Variants with a near-zero VMR and near-perfect strand correlation are
//! homoplasmic: present at a uniform level in every cell. They identify a
//! donor but cannot separate subclones, so the default VMR floor removes
//! them. Callers after donor identity can lower `min_vmr` to keep them.

use crate::identify::VariantSummary;
use log::info;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Lower bounds (inclusive) a variant must meet on all three statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VariantFilter {
    /// Minimum `n_cells_confidently_detected`.
    pub min_cells_conf_detected: usize,
    /// Minimum strand correlation. A NaN correlation never passes.
    pub min_strand_correlation: f64,
    /// Minimum variance-to-mean ratio.
    pub min_vmr: f64,
}

impl Default for VariantFilter {
    fn default() -> Self {
        VariantFilter {
            min_cells_conf_detected: 5,
            min_strand_correlation: 0.65,
            min_vmr: 0.01,
        }
    }
}

impl VariantFilter {
    /// Whether one variant meets every threshold.
    pub fn passes(&self, summary: &VariantSummary) -> bool {
        summary.n_cells_confidently_detected >= self.min_cells_conf_detected
            && summary.strand_correlation >= self.min_strand_correlation
            && summary.variance_to_mean_ratio >= self.min_vmr
    }

    /// The records meeting every threshold, in input order. An empty result is
    /// valid; callers decide how to proceed without informative variants.
    pub fn apply<T: AsRef<VariantSummary> + Clone>(&self, records: &[T]) -> Vec<T> {
        let passing: Vec<T> = records
            .iter()
            .filter(|r| self.passes(r.as_ref()))
            .cloned()
            .collect();
        info!(
            "{} of {} variants pass filters (cells >= {}, strand correlation >= {}, vmr >= {})",
            passing.len(),
            records.len(),
            self.min_cells_conf_detected,
            self.min_strand_correlation,
            self.min_vmr
        );
        passing
    }
}

/// Statistic to order variants by for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum SortKey {
    /// Variance-to-mean ratio.
    Vmr,
    /// Mean allele frequency.
    MeanAlleleFrequency,
    /// Strand correlation.
    StrandCorrelation,
    /// Cells confidently detected.
    CellsConfDetected,
}

impl SortKey {
    fn value(self, s: &VariantSummary) -> f64 {
        match self {
            SortKey::Vmr => s.variance_to_mean_ratio,
            SortKey::MeanAlleleFrequency => s.mean_allele_frequency,
            SortKey::StrandCorrelation => s.strand_correlation,
            SortKey::CellsConfDetected => s.n_cells_confidently_detected as f64,
        }
    }
}

/// A view of `records` in descending order of `key`. NaN values go last and
/// ties keep their input order. `records` itself is left as is.
pub fn sorted_by<T: AsRef<VariantSummary>>(records: &[T], key: SortKey) -> Vec<&T> {
    let mut sorted: Vec<&T> = records.iter().collect();
    sorted.sort_by(|a, b| {
        let (a, b) = (key.value((*a).as_ref()), key.value((*b).as_ref()));
        match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => b.total_cmp(&a),
        }
    });
    sorted
}
