//! Markov chain background models: uniform, loaded from a frequency table or estimated
//! from sequences.

use crate::error::Error;
use crate::kmer::{encode_forward, nuc_to_code, oligo_count};
use crate::matrix::Matrix;
use crate::{Result, ALPHABET_SIZE, MAX_OLIGO_LENGTH};
use log::{debug, info};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Initial value of every cell of a loaded model, keeps unseen transitions away from zero
const PROBABILITY_FLOOR: f64 = 1e-100;

/// Markov chain background model over `ACGT`.
///
/// A model of order `k` stores the probability of every `k`-long prefix and, for every
/// prefix, the probability of each following nucleotide.  An order 0 model has a single
/// empty prefix and its transitions are the nucleotide priors.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkovModel {
    order: usize,
    prefix: Vec<f64>,
    transition: Matrix,
    priori: [f64; ALPHABET_SIZE],
    log_priori: [f64; ALPHABET_SIZE],
}

impl MarkovModel {
    /// Order 0 model with every nucleotide equally likely
    pub fn uniform() -> Self {
        let p = 1.0 / ALPHABET_SIZE as f64;
        Self {
            order: 0,
            prefix: vec![1.0],
            transition: Matrix::filled(1, ALPHABET_SIZE, p),
            priori: [p; ALPHABET_SIZE],
            log_priori: [p.ln(); ALPHABET_SIZE],
        }
    }

    /// Loads a model from a table of oligomer frequencies (see `from_frequency_reader`)
    pub fn from_frequency_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        info!("Loading background model from {}...", path.as_ref().display());
        let reader = BufReader::new(File::open(path)?);
        Self::from_frequency_reader(reader)
    }

    /// Reads lines of `<oligomer> <ignored> <frequency>` separated by whitespace, skipping
    /// empty lines and comments starting with `;` or `#`.  The order of the model is the
    /// length of the first oligomer minus one and every following oligomer must have the
    /// same length.
    pub fn from_frequency_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut tables: Option<(usize, Vec<f64>, Matrix)> = None;

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let line_nr = i + 1;
            let entry = line.trim();
            if entry.is_empty() || entry.starts_with(';') || entry.starts_with('#') {
                continue;
            }

            let fields = entry.split_whitespace().collect::<Vec<&str>>();
            if fields.len() < 3 {
                return Err(Error::MalformedFrequencyLine(line_nr));
            }
            let oligo = fields[0].as_bytes();
            let freq = fields[2]
                .parse::<f64>()
                .ok()
                .filter(|freq| freq.is_finite() && *freq >= 0.0)
                .ok_or_else(|| Error::InvalidFrequency {
                    line: line_nr,
                    value: fields[2].to_string(),
                })?;

            let order = match &tables {
                Some((order, _, _)) => *order,
                None => {
                    let order = oligo.len() - 1;
                    if order >= MAX_OLIGO_LENGTH {
                        return Err(Error::InvalidMarkovOrder(order));
                    }
                    debug!("Background oligomers have length {}", oligo.len());
                    order
                }
            };
            if oligo.len() != order + 1 {
                return Err(Error::InconsistentOrder {
                    line: line_nr,
                    expected: order + 1,
                    found: oligo.len(),
                });
            }

            let incorrect_nuc = || Error::IncorrectNuc(fields[0].to_string());
            let context = encode_forward(oligo, 0, order).ok_or_else(incorrect_nuc)?;
            let suffix = nuc_to_code(oligo[order]).ok_or_else(incorrect_nuc)?;

            let (_, prefix, transition) = tables.get_or_insert_with(|| {
                let size = oligo_count(order);
                (
                    order,
                    vec![PROBABILITY_FLOOR; size],
                    Matrix::filled(size, ALPHABET_SIZE, PROBABILITY_FLOOR),
                )
            });
            prefix[context] += freq;
            transition[(context, suffix)] += freq;
        }

        let (order, mut prefix, mut transition) = tables.ok_or(Error::EmptyBackground)?;
        normalize(&mut prefix, 0.0);
        transition.iter_rows_mut().for_each(|row| normalize(row, 0.0));
        debug!("Loaded background model of order {}", order);

        Ok(Self::from_tables(order, prefix, transition))
    }

    /// Estimates a model of `order` from the prefixes and transitions observed in
    /// `sequences`.  Every `order`-long window counts as a prefix, including the last one of
    /// a sequence which has no successor.  Every prefix and transition count is smoothed
    /// with `pseudocount`; windows containing anything other than `ACGT` are skipped.
    pub fn estimate<I, S>(order: usize, sequences: I, pseudocount: f64) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        if order >= MAX_OLIGO_LENGTH {
            return Err(Error::InvalidMarkovOrder(order));
        }
        if !pseudocount.is_finite() || pseudocount < 0.0 {
            return Err(Error::InvalidPseudocount(pseudocount));
        }

        let size = oligo_count(order);
        let mut prefix = vec![0.0; size];
        let mut transition = Matrix::filled(size, ALPHABET_SIZE, 0.0);
        let mut observed = 0;

        for seq in sequences {
            let seq = seq.as_ref();
            if seq.len() < order {
                continue;
            }
            for offset in 0..=seq.len() - order {
                if let Some(context) = encode_forward(seq, offset, order) {
                    prefix[context] += 1.0;
                    let next = seq.get(offset + order).and_then(|nuc| nuc_to_code(*nuc));
                    if let Some(code) = next {
                        transition[(context, code)] += 1.0;
                        observed += 1;
                    }
                }
            }
        }
        debug!(
            "Estimating order {} model from {} transitions with pseudocount {}",
            order, observed, pseudocount
        );

        normalize(&mut prefix, pseudocount);
        transition
            .iter_rows_mut()
            .for_each(|row| normalize(row, pseudocount));

        Ok(Self::from_tables(order, prefix, transition))
    }

    fn from_tables(order: usize, prefix: Vec<f64>, transition: Matrix) -> Self {
        // stationary nucleotide frequencies, for order 0 the single transition row
        let mut priori = [0.0; ALPHABET_SIZE];
        for (p_prefix, row) in prefix.iter().zip(transition.iter_rows()) {
            for (prior, p_next) in priori.iter_mut().zip(row) {
                *prior += p_prefix * p_next;
            }
        }
        let mut log_priori = [0.0; ALPHABET_SIZE];
        for (log_prior, prior) in log_priori.iter_mut().zip(&priori) {
            *log_prior = prior.ln();
        }

        Self {
            order,
            prefix,
            transition,
            priori,
            log_priori,
        }
    }

    /// Order of the chain
    pub fn order(&self) -> usize {
        self.order
    }

    /// Probability of every prefix of length `order`, indexed like `kmer::encode_forward`
    pub fn prefix_probabilities(&self) -> &[f64] {
        &self.prefix
    }

    /// Probability of the next nucleotide (column) given a prefix (row)
    pub fn transitions(&self) -> &Matrix {
        &self.transition
    }

    /// Nucleotide probabilities in `ACGT` order
    pub fn priori(&self) -> &[f64; ALPHABET_SIZE] {
        &self.priori
    }

    /// Probability of the model generating `seq`, zero if it contains anything other than
    /// `ACGT`
    pub fn likelihood(&self, seq: &[u8]) -> f64 {
        if self.order == 0 {
            return seq
                .iter()
                .try_fold(1.0, |p, nuc| Some(p * self.priori[nuc_to_code(*nuc)?]))
                .unwrap_or(0.0);
        }
        if seq.len() < self.order {
            return self.prefix_marginal(seq).unwrap_or(0.0);
        }

        let mask = oligo_count(self.order) - 1;
        let mut context = match encode_forward(seq, 0, self.order) {
            Some(context) => context,
            None => return 0.0,
        };
        let mut p = self.prefix[context];
        for nuc in &seq[self.order..] {
            let code = match nuc_to_code(*nuc) {
                Some(code) => code,
                None => return 0.0,
            };
            p *= self.transition[(context, code)];
            context = ((context << 2) | code) & mask;
        }
        p
    }

    /// Natural logarithm of `likelihood`, `None` if `seq` contains anything other than
    /// `ACGT`
    pub fn log_likelihood(&self, seq: &[u8]) -> Option<f64> {
        if self.order == 0 {
            return seq
                .iter()
                .try_fold(0.0, |p, nuc| Some(p + self.log_priori[nuc_to_code(*nuc)?]));
        }
        if seq.len() < self.order {
            return self.prefix_marginal(seq).map(f64::ln);
        }

        let mask = oligo_count(self.order) - 1;
        let mut context = encode_forward(seq, 0, self.order)?;
        let mut p = self.prefix[context].ln();
        for nuc in &seq[self.order..] {
            let code = nuc_to_code(*nuc)?;
            p += self.transition[(context, code)].ln();
            context = ((context << 2) | code) & mask;
        }
        Some(p)
    }

    /// Total probability of the prefixes starting with `seq`, which is shorter than the
    /// order
    fn prefix_marginal(&self, seq: &[u8]) -> Option<f64> {
        let shift = 2 * (self.order - seq.len());
        let start = encode_forward(seq, 0, seq.len())? << shift;
        let end = start + (1 << shift);
        Some(self.prefix[start..end].iter().sum())
    }
}

/// Turns counts into probabilities after adding `pseudocount` to each.  A slice without
/// any mass becomes uniform.
fn normalize(values: &mut [f64], pseudocount: f64) {
    let total = values.iter().sum::<f64>() + pseudocount * values.len() as f64;
    if total > 0.0 {
        values
            .iter_mut()
            .for_each(|value| *value = (*value + pseudocount) / total);
    } else {
        let p = 1.0 / values.len() as f64;
        values.iter_mut().for_each(|value| *value = p);
    }
}
