//! Occurrence table of fixed length oligomers, filled one sequence at a time.

use crate::error::Error;
use crate::kmer::{encode_forward, is_palindromic, oligo_count, reverse_complement_index};
use crate::{Result, MAX_OLIGO_LENGTH};
use log::debug;

/// How sequences are scanned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CountOptions {
    /// Fold every occurrence onto its reverse complement as well
    pub add_reverse_complement: bool,
    /// Jump over an oligomer after counting it instead of sliding by one
    pub no_overlap: bool,
}

/// What the finished table is reported as, decides the number of tests performed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportMode {
    /// Only observed frequencies are reported
    CountOnly,
    /// Occurrences are tested against a background model
    Enrichment,
}

/// Occurrence counts of all oligomers of a fixed length, indexed by `kmer::encode_forward`
#[derive(Debug)]
pub struct CountTable {
    length: usize,
    options: CountOptions,
    counts: Vec<u64>,
    palindromic: Vec<bool>,
    position_count: u64,
}

impl CountTable {
    /// Creates an empty table for oligomers of `length`
    pub fn new(length: usize, options: CountOptions) -> Result<Self> {
        if length < 1 || length > MAX_OLIGO_LENGTH {
            return Err(Error::InvalidOligoLength(length));
        }
        let size = oligo_count(length);
        let palindromic = (0..size).map(|i| is_palindromic(i, length)).collect();

        Ok(Self {
            length,
            options,
            counts: vec![0; size],
            palindromic,
            position_count: 0,
        })
    }

    /// Adds all oligomers of `seq` to the table.  Windows containing anything other than
    /// `ACGT` are skipped and do not count as a position.
    pub fn count_occurrences(&mut self, seq: &[u8]) {
        let length = self.length;
        let mut counted = 0;
        let mut offset = 0;

        while offset + length <= seq.len() {
            let index = match encode_forward(seq, offset, length) {
                Some(index) => index,
                None => {
                    offset += 1;
                    continue;
                }
            };

            self.counts[index] += 1;
            self.position_count += 1;
            if self.options.add_reverse_complement && !self.palindromic[index] {
                self.counts[reverse_complement_index(index, length)] += 1;
                self.position_count += 1;
            }
            counted += 1;

            offset += if self.options.no_overlap { length } else { 1 };
        }
        debug!(
            "Counted {} oligomers of length {} in a sequence of length {}",
            counted,
            length,
            seq.len()
        );
    }

    /// Oligomer length
    pub fn length(&self) -> usize {
        self.length
    }

    /// Occurrences of the oligomer at `index`
    pub fn count(&self, index: usize) -> u64 {
        self.counts[index]
    }

    /// All occurrence counters ordered by index
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Number of counted positions, each strand counting once when folding
    pub fn position_count(&self) -> u64 {
        self.position_count
    }

    /// Freezes the table and computes the number of tests used for multiple testing
    /// correction: the observed oligomers when only counting, otherwise every oligomer or
    /// every reverse complement pair when folding
    pub fn finalize(self, mode: ReportMode) -> FinalizedCounts {
        let test_count = match mode {
            ReportMode::CountOnly => self.counts.iter().filter(|n| **n > 0).count() as u64,
            ReportMode::Enrichment if self.options.add_reverse_complement => {
                oligo_count(self.length) as u64 / 2
            }
            ReportMode::Enrichment => oligo_count(self.length) as u64,
        };
        debug!(
            "Finalized counts over {} positions with {} tests",
            self.position_count, test_count
        );

        FinalizedCounts {
            table: self,
            mode,
            test_count,
        }
    }
}

/// A count table that no longer accepts sequences
#[derive(Debug)]
pub struct FinalizedCounts {
    table: CountTable,
    mode: ReportMode,
    test_count: u64,
}

impl FinalizedCounts {
    /// Oligomer length
    pub fn length(&self) -> usize {
        self.table.length
    }

    /// Options the sequences were scanned with
    pub fn options(&self) -> CountOptions {
        self.table.options
    }

    /// Mode the table was finalized for
    pub fn mode(&self) -> ReportMode {
        self.mode
    }

    /// Number of counted positions
    pub fn position_count(&self) -> u64 {
        self.table.position_count
    }

    /// Number of tests performed, the Bonferroni factor
    pub fn test_count(&self) -> u64 {
        self.test_count
    }

    /// Checks if the oligomer at `index` is its own reverse complement
    pub fn is_palindromic(&self, index: usize) -> bool {
        self.table.palindromic[index]
    }

    /// Iterates over `(index, occurrences)` of every observed oligomer in ascending index
    pub fn observed(&self) -> impl Iterator<Item = (usize, u64)> + '_ {
        self.table
            .counts
            .iter()
            .enumerate()
            .filter(|(_, n)| **n > 0)
            .map(|(i, n)| (i, *n))
    }
}
