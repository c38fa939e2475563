// Warning groups (as of rust 1.55)
#![deny(
    future_incompatible,
    nonstandard_style,
    rust_2018_compatibility,
    rust_2021_compatibility,
    rust_2018_idioms,
    unused
)]
// Other warnings (as of rust 1.55)
#![deny(
    asm_sub_register,
    bad_asm_style,
    bindings_with_variant_name,
    clashing_extern_declarations,
    confusable_idents,
    const_item_mutation,
    deprecated,
    deref_nullptr,
    drop_bounds,
    dyn_drop,
    elided_lifetimes_in_paths,
    exported_private_dependencies,
    function_item_references,
    improper_ctypes,
    improper_ctypes_definitions,
    incomplete_features,
    inline_no_sanitize,
    invalid_value,
    irrefutable_let_patterns,
    large_assignments,
    mixed_script_confusables,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overlapping_range_endpoints,
    renamed_and_removed_lints,
    stable_features,
    dangling_pointers_from_temporaries,
    trivial_bounds,
    type_alias_bounds,
    uncommon_codepoints,
    unconditional_recursion,
    unknown_lints,
    unnameable_test_items,
    unused_comparisons,
    while_true
)]

//! Crate for the thresholds and policies of the variant calling pipeline,
//! read from a `parameters.toml` with built-in defaults.

use anyhow::{Context, Result};
use log::warn;
use mito_variant::{IdentifySettings, VariantFilter, ZeroDepthPolicy};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const PARAMETERS_FILE: &str = "parameters.toml";

/// Every tunable value. Fields missing from the TOML file take their default.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Parameters {
    /// Minimum number of confidently detecting cells for an informative variant.
    pub min_cells_conf_detected: usize,
    /// Minimum forward/reverse strand correlation for an informative variant.
    pub min_strand_correlation: f64,
    /// Minimum variance-to-mean ratio for an informative variant.
    pub min_vmr: f64,
    /// Depth a cell needs at a position to count as confidently detecting a
    /// variant there.
    pub min_coverage: u32,
    /// Replace the fraction of low coverage cells by the mean before taking
    /// the variance.
    pub stabilize_variance: bool,
    /// How cells without reads at a position enter the statistics.
    pub zero_depth_policy: ZeroDepthPolicy,
}

const DEFAULT_PARAMETERS: Parameters = Parameters {
    min_cells_conf_detected: 5,
    min_strand_correlation: 0.65,
    min_vmr: 0.01,
    min_coverage: 10,
    stabilize_variance: false,
    zero_depth_policy: ZeroDepthPolicy::IncludeAsZero,
};

impl Default for Parameters {
    fn default() -> Self {
        DEFAULT_PARAMETERS
    }
}

macro_rules! warn_if_non_default {
    ($params:expr, $($a:ident),+) => {
        $(
            if DEFAULT_PARAMETERS.$a != $params.$a {
                warn!("using non-default {} = {:?}", stringify!($a), $params.$a);
            }
        )+
    };
}

impl Parameters {
    /// Load parameters from `path`, or from a `parameters.toml` beside the
    /// running executable when no path is given. Falls back to the defaults
    /// if neither exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match default_path() {
                Some(path) if path.exists() => path,
                _ => {
                    warn!("could not find {PARAMETERS_FILE}, falling back to defaults");
                    return Ok(DEFAULT_PARAMETERS);
                }
            },
        };
        let s = std::fs::read_to_string(&path).with_context(|| path.display().to_string())?;
        Self::from_toml(&s).with_context(|| path.display().to_string())
    }

    /// Parse parameters from TOML text.
    pub fn from_toml(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Log every value that differs from its default.
    pub fn warn_non_default(&self) {
        warn_if_non_default!(
            self,
            min_cells_conf_detected,
            min_strand_correlation,
            min_vmr,
            min_coverage,
            stabilize_variance,
            zero_depth_policy
        );
    }

    /// Thresholds for selecting informative variants.
    pub fn variant_filter(&self) -> VariantFilter {
        VariantFilter {
            min_cells_conf_detected: self.min_cells_conf_detected,
            min_strand_correlation: self.min_strand_correlation,
            min_vmr: self.min_vmr,
        }
    }

    /// Settings for computing per-variant statistics.
    pub fn identify_settings(&self) -> IdentifySettings {
        IdentifySettings {
            min_coverage: self.min_coverage,
            zero_depth_policy: self.zero_depth_policy,
            stabilize_variance: self.stabilize_variance,
        }
    }
}

fn default_path() -> Option<PathBuf> {
    Some(std::env::current_exe().ok()?.with_file_name(PARAMETERS_FILE))
}
