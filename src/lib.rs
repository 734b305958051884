#![warn(missing_debug_implementations, rust_2018_idioms, missing_docs)]

//! Crate for counting oligomers (`k-mers`) in nucleotide sequences and testing them for
//! over-representation.  Occurrences are compared to the expectation of a Markov chain
//! background model with a binomial test, and the resulting p-values are corrected for the
//! number of oligomers tested.
//!

pub mod binomial;
pub mod count;
pub mod enrichment;
pub mod error;
pub mod fasta;
pub mod kmer;
pub mod markov;
pub mod matrix;

pub use error::Error;

/// Nucleotide alphabet used
pub const NUCLEOTIDES: [u8; 4] = [b'A', b'C', b'G', b'T'];
/// Size of the nucleotide alphabet
pub const ALPHABET_SIZE: usize = NUCLEOTIDES.len();
/// Longest oligomer supported, `4^14` counters already take 2GB
pub const MAX_OLIGO_LENGTH: usize = 14;

/// Result type used across the crate
pub type Result<T> = std::result::Result<T, crate::error::Error>;
