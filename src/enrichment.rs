//! Report rows: observed frequencies or binomial over-representation statistics.

use crate::binomial::ln_binomial_tail;
use crate::count::{FinalizedCounts, ReportMode};
use crate::kmer::{decode, reverse_complement_index};
use crate::markov::MarkovModel;
use log::info;
use std::f64::consts::LN_10;

/// Column headers of the count-only report
pub const COUNT_HEADER: &str = "#seq\tid\tobserved_freq\tocc";
/// Column headers of the enrichment report
pub const ENRICHMENT_HEADER: &str = "#seq\tid\texp_freq\tocc\texp_occ\tocc_P\tocc_E\tocc_sig";

/// Observed occurrences of an oligomer
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence {
    /// Index of the oligomer
    pub index: usize,
    /// Oligomer sequence
    pub name: String,
    /// Oligomer sequence, followed by `|` and its reverse complement when folding
    pub id: String,
    /// Occurrences per counted position
    pub frequency: f64,
    /// Number of occurrences
    pub occurrences: u64,
}

impl Occurrence {
    /// Tab separated report row
    pub fn to_row(&self) -> String {
        format!(
            "{}\t{}\t{:.13}\t{}",
            self.name, self.id, self.frequency, self.occurrences
        )
    }
}

/// Binomial over-representation test of an oligomer against a background model
#[derive(Debug, Clone, PartialEq)]
pub struct Enrichment {
    /// Index of the oligomer
    pub index: usize,
    /// Oligomer sequence
    pub name: String,
    /// Oligomer sequence, followed by `|` and its reverse complement when folding
    pub id: String,
    /// Background probability of the oligomer at a position
    pub probability: f64,
    /// Number of occurrences
    pub occurrences: u64,
    /// Expected number of occurrences
    pub expected: f64,
    /// Probability of at least as many occurrences under the background
    pub p_value: f64,
    /// P-value multiplied by the number of tests
    pub e_value: f64,
    /// `-log10` of the E-value
    pub significance: f64,
}

impl Enrichment {
    /// Tab separated report row
    pub fn to_row(&self) -> String {
        format!(
            "{}\t{}\t{:.13}\t{}\t{:.2}\t{:.2e}\t{:.2e}\t{:.3}",
            self.name,
            self.id,
            self.probability,
            self.occurrences,
            self.expected,
            self.p_value,
            self.e_value,
            self.significance
        )
    }
}

/// A report row of either mode
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    /// Count-only row
    Count(Occurrence),
    /// Enrichment row
    Enrichment(Enrichment),
}

impl Report {
    /// Column headers for `mode`
    pub fn header(mode: ReportMode) -> &'static str {
        match mode {
            ReportMode::CountOnly => COUNT_HEADER,
            ReportMode::Enrichment => ENRICHMENT_HEADER,
        }
    }

    /// Tab separated report row
    pub fn to_row(&self) -> String {
        match self {
            Report::Count(occurrence) => occurrence.to_row(),
            Report::Enrichment(enrichment) => enrichment.to_row(),
        }
    }
}

/// Oligomers with at least one occurrence in ascending index.  With `group_rc` and folded
/// counts only the smaller index of every reverse complement pair is kept.
fn reported(counts: &FinalizedCounts, group_rc: bool) -> impl Iterator<Item = (usize, u64)> + '_ {
    let length = counts.length();
    let grouped = group_rc && counts.options().add_reverse_complement;
    counts
        .observed()
        .filter(move |(index, _)| !grouped || *index <= reverse_complement_index(*index, length))
}

fn labels(counts: &FinalizedCounts, index: usize) -> (String, String) {
    let length = counts.length();
    let name = String::from_utf8_lossy(&decode(index, length)).into_owned();
    let id = if counts.options().add_reverse_complement {
        let rc = decode(reverse_complement_index(index, length), length);
        format!("{}|{}", name, String::from_utf8_lossy(&rc))
    } else {
        name.clone()
    };
    (name, id)
}

/// Observed frequency of every reported oligomer
pub fn occurrences(counts: &FinalizedCounts, group_rc: bool) -> Vec<Occurrence> {
    let trials = counts.position_count();
    reported(counts, group_rc)
        .map(|(index, n)| {
            let (name, id) = labels(counts, index);
            Occurrence {
                index,
                name,
                id,
                frequency: n as f64 / trials as f64,
                occurrences: n,
            }
        })
        .collect()
}

/// Tests every reported oligomer for over-representation.  Every counted position is a
/// trial, a folded oligomer other than a palindrome can be hit from either strand and
/// doubles its background probability.  The statistics are derived from the log tail so
/// the significance of extreme counts stays finite and ordered.
pub fn score(
    counts: &FinalizedCounts,
    background: &MarkovModel,
    group_rc: bool,
) -> Vec<Enrichment> {
    info!(
        "Scoring oligomers against an order {} background with {} tests...",
        background.order(),
        counts.test_count()
    );
    let trials = counts.position_count();
    let ln_tests = (counts.test_count() as f64).ln();
    let folded = counts.options().add_reverse_complement;

    reported(counts, group_rc)
        .map(|(index, n)| {
            let (name, id) = labels(counts, index);
            let mut probability = background.likelihood(name.as_bytes());
            if folded && !counts.is_palindromic(index) {
                probability *= 2.0;
            }
            let ln_e_value = ln_binomial_tail(n, trials, probability) + ln_tests;

            Enrichment {
                index,
                name,
                id,
                probability,
                occurrences: n,
                expected: trials as f64 * probability,
                p_value: (ln_e_value - ln_tests).exp(),
                e_value: ln_e_value.exp(),
                significance: -ln_e_value / LN_10,
            }
        })
        .collect()
}

/// Rows for the mode the counts were finalized for
pub fn report(counts: &FinalizedCounts, background: &MarkovModel, group_rc: bool) -> Vec<Report> {
    match counts.mode() {
        ReportMode::CountOnly => occurrences(counts, group_rc)
            .into_iter()
            .map(Report::Count)
            .collect(),
        ReportMode::Enrichment => score(counts, background, group_rc)
            .into_iter()
            .map(Report::Enrichment)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::count::{CountOptions, CountTable};

    const EPS: f64 = 1.0e-9;

    fn finalized(seq: &[u8], length: usize, options: CountOptions, mode: ReportMode) -> FinalizedCounts {
        let mut table = CountTable::new(length, options).unwrap();
        table.count_occurrences(seq);
        table.finalize(mode)
    }

    fn folding() -> CountOptions {
        CountOptions {
            add_reverse_complement: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_count_only_rows() {
        let counts = finalized(b"ACGTACGT", 2, CountOptions::default(), ReportMode::CountOnly);
        let rows = report(&counts, &MarkovModel::uniform(), false)
            .iter()
            .map(Report::to_row)
            .collect::<Vec<_>>();

        assert_eq!(
            rows,
            vec![
                "AC\tAC\t0.2857142857143\t2",
                "CG\tCG\t0.2857142857143\t2",
                "GT\tGT\t0.2857142857143\t2",
                "TA\tTA\t0.1428571428571\t1",
            ]
        );
    }

    #[test]
    fn test_enrichment_uniform_background() {
        let counts = finalized(b"ACGTACGT", 2, CountOptions::default(), ReportMode::Enrichment);
        let scores = score(&counts, &MarkovModel::uniform(), false);

        assert_eq!(scores.len(), 4);
        let ac = &scores[0];
        assert_eq!(ac.name, "AC");
        assert_eq!(ac.occurrences, 2);
        assert!((ac.probability - 1.0 / 16.0).abs() < EPS);
        assert!((ac.expected - 7.0 / 16.0).abs() < EPS);

        let (p, q) = (1.0 / 16.0, 15.0 / 16.0f64);
        let p_value = 1.0 - q.powi(7) - 7.0 * p * q.powi(6);
        assert!((ac.p_value - p_value).abs() < EPS);
        assert!((ac.e_value - 16.0 * p_value).abs() < EPS);
        assert!((ac.significance + (16.0 * p_value).log10()).abs() < EPS);
    }

    #[test]
    fn test_enrichment_folded() {
        let counts = finalized(b"ACGT", 2, folding(), ReportMode::Enrichment);
        let scores = score(&counts, &MarkovModel::uniform(), false);

        let names = scores.iter().map(|s| s.id.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["AC|GT", "CG|CG", "GT|AC"]);

        // five trials, AC seen twice with doubled probability
        let (p, q) = (1.0 / 8.0, 7.0 / 8.0f64);
        let p_value = 1.0 - q.powi(5) - 5.0 * p * q.powi(4);
        assert!((scores[0].probability - 0.125).abs() < EPS);
        assert!((scores[0].p_value - p_value).abs() < EPS);
        assert!((scores[0].e_value - 8.0 * p_value).abs() < EPS);

        // palindromes keep their probability
        assert!((scores[1].probability - 1.0 / 16.0).abs() < EPS);
        assert!((scores[1].p_value - (1.0 - (15.0 / 16.0f64).powi(5))).abs() < EPS);
    }

    #[test]
    fn test_group_reverse_complements() {
        let counts = finalized(b"ACGT", 2, folding(), ReportMode::CountOnly);
        let ids = occurrences(&counts, true)
            .into_iter()
            .map(|o| o.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["AC|GT", "CG|CG"]);

        // grouping has no effect without folding
        let counts = finalized(b"ACGT", 2, CountOptions::default(), ReportMode::CountOnly);
        assert_eq!(occurrences(&counts, true).len(), 3);
    }

    #[test]
    fn test_no_positions() {
        let counts = finalized(b"NNNN", 2, CountOptions::default(), ReportMode::Enrichment);
        assert!(report(&counts, &MarkovModel::uniform(), false).is_empty());
    }

    #[test]
    fn test_enrichment_row() {
        let counts = finalized(b"AAAAAAAAAA", 1, CountOptions::default(), ReportMode::Enrichment);
        let row = report(&counts, &MarkovModel::uniform(), false)[0].to_row();

        // P[X >= 10] = 0.25^10, times four tests
        assert!(row.starts_with("A\tA\t0.2500000000000\t10\t2.50\t9.54e-7\t3.81e-6\t5.419"));
        assert_eq!(Report::header(ReportMode::Enrichment), ENRICHMENT_HEADER);
    }

    #[test]
    fn test_zero_background_probability() {
        // trained on the given strand only, the folded TT bin has no background mass
        let seq = b"AAAAAAAAAA";
        let counts = finalized(seq, 2, folding(), ReportMode::Enrichment);
        let background = MarkovModel::estimate(1, &[seq], 0.0).unwrap();
        let scores = score(&counts, &background, false);

        let tt = scores.iter().find(|s| s.name == "TT").unwrap();
        assert_eq!(tt.occurrences, 9);
        assert_eq!(tt.probability, 0.0);
        assert_eq!(tt.p_value, 1.0);
        assert!((tt.e_value - 8.0).abs() < EPS);
        assert!(scores.iter().all(|s| s.significance.is_finite()));
        assert!(!tt.to_row().contains("inf"));
    }

    #[test]
    fn test_extreme_enrichment_stays_ranked() {
        let counts = finalized(&[b'A'; 2_000], 1, CountOptions::default(), ReportMode::Enrichment);
        let seq = [b"ACGT".repeat(250), vec![b'A'; 1_000]].concat();
        let background = MarkovModel::estimate(0, &[seq], 0.0).unwrap();
        let a = &score(&counts, &background, false)[0];

        // P[X >= 2000] = 0.625^2000 is far below the smallest positive f64
        assert_eq!(a.p_value, 0.0);
        assert!(a.significance.is_finite());
        let expected = -(2_000.0 * 0.625f64.ln() + 4f64.ln()) / LN_10;
        assert!((a.significance - expected).abs() < 1e-6);
    }
}
