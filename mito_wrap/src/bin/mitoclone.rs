//! mitoclone
#![deny(missing_docs)]

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::LevelFilter;
use mito_wrap::commands::{AlleleFreq, Filter, Identify, Run};
use mito_wrap::logging::init_logging;
use mito_wrap::utils::print_error_chain;
use std::process::ExitCode;

const CMD: &str = "mitoclone";

/// Call informative mitochondrial variants from mgatk allele counts and
/// derive per-cell allele frequencies for lineage tracing
#[derive(Parser, Debug)]
#[clap(name = CMD, version)]
struct MitoClone {
    #[clap(subcommand)]
    subcmd: SubCommand,

    /// Log level: off, error, warn, info, debug or trace.
    #[clap(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: LevelFilter,
}

#[derive(Subcommand, Debug)]
enum SubCommand {
    /// Compute per-variant statistics from an mgatk output directory
    #[clap(name = "identify")]
    Identify(Identify),

    /// Keep the informative variants of a variant table
    #[clap(name = "filter")]
    Filter(Filter),

    /// Compute per-cell allele frequencies of the variants in a table
    #[clap(name = "allele-freq")]
    AlleleFreq(AlleleFreq),

    /// Run identify, filter and allele-freq in one go
    #[clap(name = "run")]
    Run(Run),
}

fn inner_main() -> Result<ExitCode> {
    let opts = MitoClone::parse();
    init_logging(opts.log_level);
    match opts.subcmd {
        SubCommand::Identify(c) => c.execute()?,
        SubCommand::Filter(c) => c.execute()?,
        SubCommand::AlleleFreq(c) => c.execute()?,
        SubCommand::Run(c) => c.execute()?,
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    match inner_main() {
        Ok(exit_code) => exit_code,
        Err(err) => {
            print_error_chain(&err);
            ExitCode::FAILURE
        }
    }
}
