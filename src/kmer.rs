//! Conversion between oligomers and their positional base-4 index.
//!
//! Each nucleotide takes two bits (`A=0, C=1, G=2, T=3`) with the first nucleotide of the
//! window in the most significant position, so the index of an oligomer of length `L` lies
//! in `0..4^L` and ascending indices sort oligomers alphabetically.  Complementing a code is
//! `3 - code`, which lets the reverse complement be computed on the index directly.

use crate::NUCLEOTIDES;

const CODE_MASK: usize = 0b11;

/// Returns the 2-bit code of a nucleotide (case-insensitive) or `None` for anything
/// outside `ACGT`
#[inline]
pub fn nuc_to_code(nuc: u8) -> Option<usize> {
    match nuc {
        b'A' | b'a' => Some(0),
        b'C' | b'c' => Some(1),
        b'G' | b'g' => Some(2),
        b'T' | b't' => Some(3),
        _ => None,
    }
}

/// Number of distinct oligomers of the given length, `4^length`
#[inline]
pub fn oligo_count(length: usize) -> usize {
    1 << (2 * length)
}

/// Index of the `length` nucleotides starting at `offset`.  Returns `None` if the window
/// runs past the end of the sequence or contains a symbol outside `ACGT`.
#[inline]
pub fn encode_forward(seq: &[u8], offset: usize, length: usize) -> Option<usize> {
    seq.get(offset..offset.checked_add(length)?)?
        .iter()
        .try_fold(0, |index, nuc| Some((index << 2) | nuc_to_code(*nuc)?))
}

/// Index of the reverse complement of the `length` nucleotides starting at `offset`, i.e.
/// the same value `encode_forward` gives for the reverse complemented window
#[inline]
pub fn encode_reverse_complement(seq: &[u8], offset: usize, length: usize) -> Option<usize> {
    seq.get(offset..offset.checked_add(length)?)?
        .iter()
        .rev()
        .try_fold(0, |index, nuc| {
            Some((index << 2) | (CODE_MASK - nuc_to_code(*nuc)?))
        })
}

/// Upper case oligomer of the given length encoded by `index`
pub fn decode(index: usize, length: usize) -> Vec<u8> {
    (0..length)
        .rev()
        .map(|shift| NUCLEOTIDES[(index >> (2 * shift)) & CODE_MASK])
        .collect()
}

/// Index of the reverse complement of the oligomer encoded by `index`
#[inline]
pub fn reverse_complement_index(mut index: usize, length: usize) -> usize {
    let mut rc = 0;
    for _ in 0..length {
        rc = (rc << 2) | (CODE_MASK - (index & CODE_MASK));
        index >>= 2;
    }
    rc
}

/// Checks if the oligomer encoded by `index` is its own reverse complement.  Only even
/// lengths can be palindromic as the middle nucleotide of an odd oligomer would have to be
/// its own complement.
#[inline]
pub fn is_palindromic(index: usize, length: usize) -> bool {
    reverse_complement_index(index, length) == index
}
