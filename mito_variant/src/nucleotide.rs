use crate::error::MitoVariantError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// One of the four DNA bases.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Nucleotide {
    /// Adenine
    A,
    /// Cytosine
    C,
    /// Guanine
    G,
    /// Thymine
    T,
}

impl Nucleotide {
    /// All four bases, in the order used to index count tables.
    pub const ALL: [Nucleotide; 4] = [Nucleotide::A, Nucleotide::C, Nucleotide::G, Nucleotide::T];

    /// Index of the base within `ALL`.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Upper case character for the base.
    pub fn as_char(self) -> char {
        match self {
            Nucleotide::A => 'A',
            Nucleotide::C => 'C',
            Nucleotide::G => 'G',
            Nucleotide::T => 'T',
        }
    }

    /// Parse an ASCII base, case-insensitively. Returns None for anything else,
    /// including `N`.
    pub fn from_ascii(b: u8) -> Option<Self> {
        match b.to_ascii_uppercase() {
            b'A' => Some(Nucleotide::A),
            b'C' => Some(Nucleotide::C),
            b'G' => Some(Nucleotide::G),
            b'T' => Some(Nucleotide::T),
            _ => None,
        }
    }

    /// The three bases other than this one, in `ALL` order.
    pub fn others(self) -> impl Iterator<Item = Nucleotide> {
        Nucleotide::ALL.into_iter().filter(move |&n| n != self)
    }
}

impl TryFrom<char> for Nucleotide {
    type Error = MitoVariantError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        u8::try_from(c)
            .ok()
            .and_then(Nucleotide::from_ascii)
            .ok_or(MitoVariantError::InvalidNucleotide(c))
    }
}

impl FromStr for Nucleotide {
    type Err = MitoVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Nucleotide::try_from(c),
            (Some(c), Some(_)) => Err(MitoVariantError::InvalidNucleotide(c)),
            (None, _) => Err(MitoVariantError::InvalidNucleotide(' ')),
        }
    }
}

impl Display for Nucleotide {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Sequencing strand a read was observed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum Strand {
    /// Forward strand
    #[strum(to_string = "fwd")]
    Forward,
    /// Reverse strand
    #[strum(to_string = "rev")]
    Reverse,
}

impl Strand {
    /// Both strands, in the order used to index count tables.
    pub const BOTH: [Strand; 2] = [Strand::Forward, Strand::Reverse];

    /// Index of the strand within `BOTH`.
    pub fn index(self) -> usize {
        self as usize
    }
}
