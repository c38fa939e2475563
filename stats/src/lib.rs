//! stats
//!
//! Scalar summaries over per-cell observations.
#![deny(missing_docs)]

mod correlation;
mod moments;
pub use correlation::pearson;
pub use moments::{MeanVariance, mean, population_variance};
