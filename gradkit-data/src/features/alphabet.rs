use gradkit_core::GradKitError;
use std::fmt;
use std::str::FromStr;

/// Symbol set a byte feature matrix is drawn from.
///
/// Printable alphabets accept both upper- and lower-case letters; the `Raw*`
/// variants hold already-encoded symbol indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alphabet {
    /// `A C G T`
    Dna,
    /// Encoded nucleotides `0..4`.
    RawDna,
    /// `A C G U`
    Rna,
    /// Letters `A..Z`.
    Protein,
    /// `0 1`
    Binary,
    /// Letters and decimal digits.
    Alphanum,
    /// Dice faces `1..6`.
    Cube,
    /// Any byte.
    RawByte,
    /// `0..9` as ASCII.
    Digit,
    /// Encoded digits `0..10`.
    RawDigit,
    /// No restriction.
    None,
}

const ALL: [Alphabet; 11] = [
    Alphabet::Dna,
    Alphabet::RawDna,
    Alphabet::Rna,
    Alphabet::Protein,
    Alphabet::Binary,
    Alphabet::Alphanum,
    Alphabet::Cube,
    Alphabet::RawByte,
    Alphabet::Digit,
    Alphabet::RawDigit,
    Alphabet::None,
];

impl Alphabet {
    /// Number of distinct symbols.
    pub fn num_symbols(&self) -> usize {
        match self {
            Alphabet::Dna | Alphabet::RawDna | Alphabet::Rna => 4,
            Alphabet::Protein => 26,
            Alphabet::Binary => 2,
            Alphabet::Alphanum => 36,
            Alphabet::Cube => 6,
            Alphabet::Digit | Alphabet::RawDigit => 10,
            Alphabet::RawByte | Alphabet::None => 256,
        }
    }

    /// Returns true if `byte` is a symbol of this alphabet.
    pub fn is_valid(&self, byte: u8) -> bool {
        let upper = byte.to_ascii_uppercase();
        match self {
            Alphabet::Dna => matches!(upper, b'A' | b'C' | b'G' | b'T'),
            Alphabet::Rna => matches!(upper, b'A' | b'C' | b'G' | b'U'),
            Alphabet::RawDna => byte < 4,
            Alphabet::Protein => upper.is_ascii_uppercase(),
            Alphabet::Binary => matches!(byte, b'0' | b'1'),
            Alphabet::Alphanum => byte.is_ascii_alphanumeric(),
            Alphabet::Cube => (b'1'..=b'6').contains(&byte),
            Alphabet::Digit => byte.is_ascii_digit(),
            Alphabet::RawDigit => byte < 10,
            Alphabet::RawByte | Alphabet::None => true,
        }
    }

    /// Position of the first byte of `data` that is not a symbol, if any.
    pub fn first_invalid(&self, data: &[u8]) -> Option<usize> {
        data.iter().position(|&b| !self.is_valid(b))
    }

    /// Canonical upper-case name, as stored in feature files.
    pub fn name(&self) -> &'static str {
        match self {
            Alphabet::Dna => "DNA",
            Alphabet::RawDna => "RAWDNA",
            Alphabet::Rna => "RNA",
            Alphabet::Protein => "PROTEIN",
            Alphabet::Binary => "BINARY",
            Alphabet::Alphanum => "ALPHANUM",
            Alphabet::Cube => "CUBE",
            Alphabet::RawByte => "RAWBYTE",
            Alphabet::Digit => "DIGIT",
            Alphabet::RawDigit => "RAWDIGIT",
            Alphabet::None => "NONE",
        }
    }

    /// Looks an alphabet up by name, case-insensitively.
    pub fn from_name(name: &str) -> Result<Self, GradKitError> {
        ALL.iter()
            .copied()
            .find(|a| a.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| GradKitError::InvalidArgument(format!("Unknown alphabet: {}", name)))
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Alphabet {
    type Err = GradKitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Alphabet::from_name(s)
    }
}
