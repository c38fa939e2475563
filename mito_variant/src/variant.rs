use crate::error::MitoVariantError;
use crate::nucleotide::Nucleotide;
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A single-base substitution on the mitochondrial genome.
///
/// Ordering is by position, then reference base, then alternate base. Since
/// the reference base is fixed per position this is the position-then-alternate
/// traversal order used throughout the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Variant {
    /// 1-based coordinate on the reference.
    pub position: u32,
    /// Base found in the reference at `position`.
    pub reference_base: Nucleotide,
    /// Substituted base.
    pub alternate_base: Nucleotide,
}

impl Variant {
    /// Create a variant, rejecting a substitution of a base by itself.
    pub fn new(
        position: u32,
        reference_base: Nucleotide,
        alternate_base: Nucleotide,
    ) -> Result<Self> {
        let variant = Variant {
            position,
            reference_base,
            alternate_base,
        };
        if reference_base == alternate_base {
            bail!(MitoVariantError::InvalidVariantName {
                name: variant.to_string(),
                reason: "alternate base equals reference base",
            });
        }
        Ok(variant)
    }

    /// The base change without its position, e.g. `C>T`.
    pub fn nucleotide_change(&self) -> String {
        format!("{}>{}", self.reference_base, self.alternate_base)
    }
}

/// Formats as `<position><ref>><alt>`, e.g. `16147C>T`.
impl Display for Variant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}>{}",
            self.position, self.reference_base, self.alternate_base
        )
    }
}

impl FromStr for Variant {
    type Err = MitoVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| MitoVariantError::InvalidVariantName {
            name: s.to_string(),
            reason,
        };
        let digits = s.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return Err(invalid("missing position"));
        }
        let position: u32 = s[..digits]
            .parse()
            .map_err(|_| invalid("position out of range"))?;
        if position == 0 {
            return Err(invalid("positions are 1-based"));
        }
        let &[r, b'>', a] = &s.as_bytes()[digits..] else {
            return Err(invalid("expected <position><ref>><alt>"));
        };
        let base = |b: u8| Nucleotide::from_ascii(b).ok_or(invalid("bases must be A, C, G or T"));
        let (reference_base, alternate_base) = (base(r)?, base(a)?);
        if reference_base == alternate_base {
            return Err(invalid("alternate base equals reference base"));
        }
        Ok(Variant {
            position,
            reference_base,
            alternate_base,
        })
    }
}

impl TryFrom<String> for Variant {
    type Error = MitoVariantError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Variant> for String {
    fn from(v: Variant) -> String {
        v.to_string()
    }
}

/// Parse a list of variant names such as `16147C>T`, failing on the first
/// invalid one.
pub fn parse_variants<S: AsRef<str>>(names: impl IntoIterator<Item = S>) -> Result<Vec<Variant>> {
    names
        .into_iter()
        .map(|name| Ok(name.as_ref().trim().parse::<Variant>()?))
        .collect()
}
