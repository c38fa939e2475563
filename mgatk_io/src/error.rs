use std::path::PathBuf;

/// Problems with the layout or contents of input files.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum MgatkError {
    /// A required file is not in the mgatk directory.
    #[error("no {what} found in {}", dir.display())]
    MissingFile {
        /// The directory searched.
        dir: PathBuf,
        /// Description of the file, including its expected name.
        what: String,
    },
    /// More than one sample prefix in one mgatk directory.
    #[error("{} holds depth tables for several samples: {}", dir.display(), prefixes.join(", "))]
    AmbiguousPrefix {
        /// The directory searched.
        dir: PathBuf,
        /// The sample prefixes found.
        prefixes: Vec<String>,
    },
    /// A line that does not have the expected format.
    #[error("{}:{line}: {reason}", path.display())]
    MalformedLine {
        /// File being read.
        path: PathBuf,
        /// 1-based line number.
        line: u64,
        /// What was wrong with the line.
        reason: String,
    },
    /// A count line for a barcode absent from the depth table.
    #[error("{}:{line}: barcode {barcode} is not in the depth table", path.display())]
    UnknownBarcode {
        /// File being read.
        path: PathBuf,
        /// 1-based line number.
        line: u64,
        /// The unknown barcode.
        barcode: String,
    },
    /// A barcode listed twice in a depth table.
    #[error("{}:{line}: barcode {barcode} is listed more than once", path.display())]
    DuplicateBarcode {
        /// File being read.
        path: PathBuf,
        /// 1-based line number.
        line: u64,
        /// The repeated barcode.
        barcode: String,
    },
    /// A cell set CSV without a `barcode` column.
    #[error("{} has a header but no barcode column", path.display())]
    MissingBarcodeColumn {
        /// File being read.
        path: PathBuf,
    },
}
