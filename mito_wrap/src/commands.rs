//! Subcommands of `mitoclone`.

use anyhow::{Context, Result, bail};
use clap::Args;
use log::{info, warn};
use mgatk_io::{
    MtxWriter, read_cell_set, read_mgatk_dir, read_variant_table, write_frequency_csv,
    write_variant_table,
};
use mito_variant::{
    AlleleFrequencyOutcome, SortKey, Variant, VariantSummary, ZeroDepthPolicy,
    allele_frequencies, identify_variants, sorted_by,
};
use parameters_toml::Parameters;
use std::path::{Path, PathBuf};

const VARIANTS_CSV: &str = "variants.csv";
const INFORMATIVE_VARIANTS_CSV: &str = "informative_variants.csv";
const FREQUENCY_CSV: &str = "allele_frequencies.csv";
const FREQUENCY_MTX: &str = "allele_frequencies_mex";

fn parse_zero_depth_policy(s: &str) -> Result<ZeroDepthPolicy> {
    match s {
        "include_as_zero" => Ok(ZeroDepthPolicy::IncludeAsZero),
        "exclude" => Ok(ZeroDepthPolicy::Exclude),
        _ => bail!("expected include_as_zero or exclude"),
    }
}

/// Thresholds and policies. Values given here override those of the
/// parameters file.
#[derive(Args, Debug, Clone, Default)]
pub struct ParameterArgs {
    /// TOML file of parameters. Defaults to parameters.toml beside the
    /// executable, then to built-in defaults.
    #[clap(long, value_name = "TOML")]
    pub params: Option<PathBuf>,

    /// Minimum number of cells confidently detecting an informative variant.
    #[clap(long, value_name = "NUM")]
    pub min_cells_conf_detected: Option<usize>,

    /// Minimum forward/reverse strand correlation of an informative variant.
    #[clap(long, value_name = "FLOAT")]
    pub min_strand_correlation: Option<f64>,

    /// Minimum variance-to-mean ratio of an informative variant.
    #[clap(long, value_name = "FLOAT")]
    pub min_vmr: Option<f64>,

    /// Depth a cell needs at a position to confidently detect a variant.
    #[clap(long, value_name = "NUM")]
    pub min_coverage: Option<u32>,

    /// Replace fractions of cells below --min-coverage by the mean before
    /// taking the variance.
    #[clap(long, value_name = "true|false")]
    pub stabilize_variance: Option<bool>,

    /// How cells without reads at a position enter mean and variance.
    #[clap(long, value_name = "include_as_zero|exclude", value_parser = parse_zero_depth_policy)]
    pub zero_depth_policy: Option<ZeroDepthPolicy>,
}

impl ParameterArgs {
    /// Load the parameters file and apply the overrides.
    pub fn load(&self) -> Result<Parameters> {
        let mut params = Parameters::load(self.params.as_deref())?;
        if let Some(x) = self.min_cells_conf_detected {
            params.min_cells_conf_detected = x;
        }
        if let Some(x) = self.min_strand_correlation {
            params.min_strand_correlation = x;
        }
        if let Some(x) = self.min_vmr {
            params.min_vmr = x;
        }
        if let Some(x) = self.min_coverage {
            params.min_coverage = x;
        }
        if let Some(x) = self.stabilize_variance {
            params.stabilize_variance = x;
        }
        if let Some(x) = self.zero_depth_policy {
            params.zero_depth_policy = x;
        }
        params.warn_non_default();
        Ok(params)
    }
}

/// Compute statistics for every candidate variant of an mgatk sample.
#[derive(Args, Debug, Clone)]
pub struct Identify {
    /// mgatk output directory.
    #[clap(long, value_name = "DIR")]
    pub mgatk: PathBuf,

    /// Variant table to write.
    #[clap(long, value_name = "CSV")]
    pub out: PathBuf,

    #[clap(flatten)]
    pub parameters: ParameterArgs,
}

impl Identify {
    /// Run the subcommand.
    pub fn execute(&self) -> Result<()> {
        let params = self.parameters.load()?;
        let data = read_mgatk_dir(&self.mgatk)?;
        let records = identify_variants(&data.counts, &params.identify_settings());
        write_variant_table(&self.out, &records)?;
        info!("wrote {} variants to {}", records.len(), self.out.display());
        Ok(())
    }
}

/// Select the informative variants of a variant table.
#[derive(Args, Debug, Clone)]
pub struct Filter {
    /// Variant table written by `identify`.
    #[clap(long, value_name = "CSV")]
    pub variants: PathBuf,

    /// Order the output by this statistic, highest first.
    #[clap(long, value_name = "vmr|mean_allele_frequency|strand_correlation|cells_conf_detected")]
    pub sort_by: Option<SortKey>,

    /// Table of informative variants to write.
    #[clap(long, value_name = "CSV")]
    pub out: PathBuf,

    #[clap(flatten)]
    pub parameters: ParameterArgs,
}

impl Filter {
    /// Run the subcommand.
    pub fn execute(&self) -> Result<()> {
        let params = self.parameters.load()?;
        let records = read_variant_table(&self.variants)?;
        let informative = select_informative(&params, &records, self.sort_by);
        write_variant_table(&self.out, &informative)?;
        Ok(())
    }
}

/// Per-cell allele frequencies of the variants in a table.
#[derive(Args, Debug, Clone)]
pub struct AlleleFreq {
    /// mgatk output directory.
    #[clap(long, value_name = "DIR")]
    pub mgatk: PathBuf,

    /// Variant table, usually written by `filter`. Every variant in it is used.
    #[clap(long, value_name = "CSV")]
    pub variants: PathBuf,

    /// Cell barcodes to report: a CSV with a barcode column or one barcode
    /// per line.
    #[clap(long, value_name = "FILE")]
    pub cells: PathBuf,

    /// Directory for the allele frequency CSV and Matrix Market outputs.
    #[clap(long, value_name = "DIR")]
    pub out_dir: PathBuf,
}

impl AlleleFreq {
    /// Run the subcommand.
    pub fn execute(&self) -> Result<()> {
        let data = read_mgatk_dir(&self.mgatk)?;
        let variants: Vec<Variant> = read_variant_table(&self.variants)?
            .into_iter()
            .map(|summary| summary.variant)
            .collect();
        let cells = read_cell_set(&self.cells)?;
        let outcome = allele_frequencies(&data.counts, &variants, &cells)?;
        write_frequencies(&self.out_dir, &outcome)?;
        Ok(())
    }
}

/// Identify, filter and compute allele frequencies in one go.
#[derive(Args, Debug, Clone)]
pub struct Run {
    /// mgatk output directory.
    #[clap(long, value_name = "DIR")]
    pub mgatk: PathBuf,

    /// Cell barcodes to report: a CSV with a barcode column or one barcode
    /// per line.
    #[clap(long, value_name = "FILE")]
    pub cells: PathBuf,

    /// Output directory.
    #[clap(long, value_name = "DIR")]
    pub out_dir: PathBuf,

    /// Order the informative variants by this statistic, highest first.
    #[clap(long, value_name = "vmr|mean_allele_frequency|strand_correlation|cells_conf_detected")]
    pub sort_by: Option<SortKey>,

    #[clap(flatten)]
    pub parameters: ParameterArgs,
}

impl Run {
    /// Run the subcommand.
    pub fn execute(&self) -> Result<()> {
        let params = self.parameters.load()?;
        std::fs::create_dir_all(&self.out_dir)
            .with_context(|| self.out_dir.display().to_string())?;

        let data = read_mgatk_dir(&self.mgatk)?;
        let records = identify_variants(&data.counts, &params.identify_settings());
        write_variant_table(&self.out_dir.join(VARIANTS_CSV), &records)?;

        let informative = select_informative(&params, &records, self.sort_by);
        write_variant_table(&self.out_dir.join(INFORMATIVE_VARIANTS_CSV), &informative)?;

        let variants: Vec<Variant> = informative.iter().map(|r| r.summary.variant).collect();
        let cells = read_cell_set(&self.cells)?;
        let outcome = allele_frequencies(&data.counts, &variants, &cells)?;
        write_frequencies(&self.out_dir, &outcome)?;
        Ok(())
    }
}

/// Apply the filter, then the requested order.
fn select_informative<T: AsRef<VariantSummary> + Clone>(
    params: &Parameters,
    records: &[T],
    sort_by: Option<SortKey>,
) -> Vec<T> {
    let informative = params.variant_filter().apply(records);
    match sort_by {
        Some(key) => sorted_by(&informative, key).into_iter().cloned().collect(),
        None => informative,
    }
}

/// Write the CSV and Matrix Market outputs. Returns false, having written
/// nothing, for the empty outcomes.
fn write_frequencies(out_dir: &Path, outcome: &AlleleFrequencyOutcome) -> Result<bool> {
    let matrix = match outcome {
        AlleleFrequencyOutcome::Matrix(matrix) => matrix,
        AlleleFrequencyOutcome::NoInformativeVariants => {
            warn!("no variant passed the filters; no allele frequency matrix written");
            return Ok(false);
        }
        AlleleFrequencyOutcome::NoSharedCells => {
            warn!("no cell with allele data is in the cell set; no allele frequency matrix written");
            return Ok(false);
        }
    };
    std::fs::create_dir_all(out_dir).with_context(|| out_dir.display().to_string())?;
    write_frequency_csv(&out_dir.join(FREQUENCY_CSV), matrix)?;
    MtxWriter::new(&out_dir.join(FREQUENCY_MTX))?.write_files(matrix)?;
    info!(
        "wrote allele frequencies of {} variants in {} cells to {}",
        matrix.variants().len(),
        matrix.cell_barcodes().len(),
        out_dir.display()
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fmt::Write;
    use tempfile::TempDir;

    const CELLS: [&str; 6] = ["c0-1", "c1-1", "c2-1", "c3-1", "c4-1", "c5-1"];

    /// Reference `ACGT`. Every cell has 20 A reads at position 1. At position
    /// 2, cells 0 to 2 carry `2C>T` at half their reads on both strands and
    /// the others are pure reference.
    fn write_mgatk(dir: &Path) {
        std::fs::write(dir.join("s_refAllele.txt"), "1\tA\n2\tC\n3\tG\n4\tT\n").unwrap();
        let mut depth = String::new();
        let (mut a, mut c, mut t) = (String::new(), String::new(), String::new());
        for (i, bc) in CELLS.iter().enumerate() {
            writeln!(depth, "{bc}\t20").unwrap();
            writeln!(a, "1,{bc},10,10").unwrap();
            if i < 3 {
                writeln!(c, "2,{bc},5,5").unwrap();
                writeln!(t, "2,{bc},5,5").unwrap();
            } else {
                writeln!(c, "2,{bc},10,10").unwrap();
            }
        }
        std::fs::write(dir.join("s.depthTable.txt"), depth).unwrap();
        std::fs::write(dir.join("s.A.txt"), a).unwrap();
        std::fs::write(dir.join("s.C.txt"), c).unwrap();
        std::fs::write(dir.join("s.G.txt"), "").unwrap();
        std::fs::write(dir.join("s.T.txt"), t).unwrap();
    }

    fn params() -> ParameterArgs {
        ParameterArgs {
            min_cells_conf_detected: Some(3),
            ..Default::default()
        }
    }

    #[test]
    fn test_run() {
        let dir = TempDir::new().unwrap();
        let mgatk = dir.path().join("mgatk");
        std::fs::create_dir(&mgatk).unwrap();
        write_mgatk(&mgatk);
        let cells = dir.path().join("cells.txt");
        std::fs::write(&cells, "c3-1\nc1-1\nnot_in_mgatk\nc2-1\n").unwrap();
        let out_dir = dir.path().join("out");

        Run {
            mgatk,
            cells,
            out_dir: out_dir.clone(),
            sort_by: Some(SortKey::Vmr),
            parameters: params(),
        }
        .execute()
        .unwrap();

        let all = read_variant_table(&out_dir.join(VARIANTS_CSV)).unwrap();
        assert_eq!(all.len(), 12);
        let informative = read_variant_table(&out_dir.join(INFORMATIVE_VARIANTS_CSV)).unwrap();
        let names: Vec<_> = informative.iter().map(|s| s.variant.to_string()).collect();
        assert_eq!(names, vec!["2C>T"]);
        assert_eq!(informative[0].n_cells_confidently_detected, 3);
        assert!((informative[0].strand_correlation - 1.0).abs() < 1e-12);

        assert_eq!(
            std::fs::read_to_string(out_dir.join(FREQUENCY_CSV)).unwrap(),
            "Barcode,2C>T\nc1-1,0.5\nc2-1,0.5\nc3-1,0\n"
        );
        assert_eq!(
            std::fs::read_to_string(out_dir.join(FREQUENCY_MTX).join("variants.tsv")).unwrap(),
            "2C>T\n"
        );
    }

    #[test]
    fn test_run_without_informative_variants() {
        let dir = TempDir::new().unwrap();
        write_mgatk(dir.path());
        let cells = dir.path().join("cells.txt");
        std::fs::write(&cells, "c0-1\n").unwrap();
        let out_dir = dir.path().join("out");
        Run {
            mgatk: dir.path().to_path_buf(),
            cells,
            out_dir: out_dir.clone(),
            sort_by: None,
            parameters: ParameterArgs {
                min_cells_conf_detected: Some(4),
                ..Default::default()
            },
        }
        .execute()
        .unwrap();
        assert!(out_dir.join(VARIANTS_CSV).exists());
        assert!(!out_dir.join(FREQUENCY_CSV).exists());
    }

    #[test]
    fn test_subcommands_in_sequence() {
        let dir = TempDir::new().unwrap();
        write_mgatk(dir.path());
        let variants = dir.path().join("variants.csv");
        let informative = dir.path().join("informative.csv");
        Identify {
            mgatk: dir.path().to_path_buf(),
            out: variants.clone(),
            parameters: params(),
        }
        .execute()
        .unwrap();
        Filter {
            variants,
            sort_by: None,
            out: informative.clone(),
            parameters: params(),
        }
        .execute()
        .unwrap();

        let cells = dir.path().join("cells.csv");
        std::fs::write(&cells, "barcode,is__cell_barcode\nc5-1,1\nc0-1,1\nc1-1,0\n").unwrap();
        let out_dir = dir.path().join("af");
        AlleleFreq {
            mgatk: dir.path().to_path_buf(),
            variants: informative,
            cells,
            out_dir: out_dir.clone(),
        }
        .execute()
        .unwrap();
        assert_eq!(
            std::fs::read_to_string(out_dir.join(FREQUENCY_CSV)).unwrap(),
            "Barcode,2C>T\nc0-1,0.5\nc5-1,0\n"
        );
    }

    #[test]
    fn test_no_shared_cells() {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().join("mgatk");
        std::fs::create_dir(&data_dir).unwrap();
        write_mgatk(&data_dir);
        let data = read_mgatk_dir(&data_dir).unwrap();
        let variant: Variant = "2C>T".parse().unwrap();
        let outcome = allele_frequencies(&data.counts, &[variant], ["x-1"]).unwrap();
        let out_dir = dir.path().join("out");
        assert!(!write_frequencies(&out_dir, &outcome).unwrap());
        assert!(!out_dir.exists());
    }

    #[test]
    fn test_parameter_overrides() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("parameters.toml");
        std::fs::write(&path, "min_vmr = 0.5\nmin_coverage = 30\n").unwrap();
        let params = ParameterArgs {
            params: Some(path),
            min_coverage: Some(5),
            zero_depth_policy: Some(ZeroDepthPolicy::Exclude),
            ..Default::default()
        }
        .load()
        .unwrap();
        assert_eq!(params.min_vmr, 0.5);
        assert_eq!(params.min_coverage, 5);
        assert_eq!(params.zero_depth_policy, ZeroDepthPolicy::Exclude);
        assert!(parse_zero_depth_policy("drop").is_err());
    }
}
