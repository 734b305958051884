//! Crate errors.

use thiserror::Error;

#[derive(Debug, Error)]
/// Errors of which majority are related to I/O issues, invalid settings or incorrect file formats
pub enum Error {
    #[error("Could not read input")]
    /// Could not read an entry in a fasta or frequency file
    ReadError(#[from] std::io::Error),
    #[error("Could not open input file")]
    /// Read (possibly compressed) input error
    InputError(#[from] niffler::Error),
    #[error("Oligomer length must be between 1 and {} but got {0}", crate::MAX_OLIGO_LENGTH)]
    /// Oligomer length does not fit the index space
    InvalidOligoLength(usize),
    #[error("Markov order must be between 0 and {} but got {0}", crate::MAX_OLIGO_LENGTH - 1)]
    /// Markov order does not fit the index space
    InvalidMarkovOrder(usize),
    #[error("Pseudocount must be a finite non-negative number but got {0}")]
    /// Negative, infinite or NaN pseudocount
    InvalidPseudocount(f64),
    #[error("Only A, G, C and T nucleotides are allowed but got {0}")]
    /// Incorrect nucleotide supplied
    IncorrectNuc(String),
    #[error("Background model does not contain any frequencies")]
    /// Background file has no data lines
    EmptyBackground,
    #[error("Could not read frequency entry at line {0}")]
    /// Frequency line does not have the `<id> <field> <frequency>` layout
    MalformedFrequencyLine(usize),
    #[error("Invalid frequency `{value}` at line {line}")]
    /// Frequency is not a finite non-negative number
    InvalidFrequency {
        /// Line number of the entry
        line: usize,
        /// The offending value
        value: String,
    },
    #[error("Oligomer at line {line} has length {found} but the background expects {expected}")]
    /// Oligomer identifiers of different lengths in the same background file
    InconsistentOrder {
        /// Line number of the entry
        line: usize,
        /// Length implied by the first entry
        expected: usize,
        /// Length of this entry
        found: usize,
    },
}
