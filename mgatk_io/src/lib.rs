//! Crate for reading mgatk allele count directories and cell sets, and for
//! writing variant tables and allele-frequency matrices.
#![deny(missing_docs)]

mod cells;
mod error;
mod io_utils;
mod matrix;
mod mgatk;
mod table;

pub use cells::read_cell_set;
pub use error::MgatkError;
pub use matrix::{MtxWriter, write_frequency_csv};
pub use mgatk::{MgatkData, MgatkFiles, read_mgatk_dir};
pub use table::{read_variant_table, write_variant_table};
