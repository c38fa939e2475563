//! Crate for calling informative mitochondrial variants from per-cell,
//! per-strand base counts and deriving per-cell allele frequencies.
#![deny(missing_docs)]

mod allele_freq;
mod counts;
mod error;
mod filter;
mod identify;
mod nucleotide;
mod variant;

pub use allele_freq::{AlleleFrequencyOutcome, CellAlleleFrequencyMatrix, allele_frequencies};
pub use counts::{
    CountMatrix, PositionCounts, ReferenceSequence, StrandedBaseCounts, StrandedCountsBuilder,
};
pub use error::MitoVariantError;
pub use filter::{SortKey, VariantFilter, sorted_by};
pub use identify::{
    AlleleObservations, IdentifySettings, PositionAlleleRecord, VariantSummary, ZeroDepthPolicy,
    identify_variants, summarize,
};
pub use nucleotide::{Nucleotide, Strand};
pub use variant::{Variant, parse_variants};
