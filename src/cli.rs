use rustyword::count::{CountOptions, ReportMode};
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "rustyword",
    about = "Calculates oligomer frequencies in a set of sequences and detects over-represented oligomers"
)]
pub(crate) struct Opt {
    #[structopt(short, long, help = "Oligomer length (1-14)")]
    pub length: usize,
    #[structopt(
        short,
        long,
        help = "FASTA sequences, plain or compressed [default: stdin]",
        parse(from_os_str)
    )]
    pub input: Option<PathBuf>,
    #[structopt(short, long, help = "Output file [default: stdout]", parse(from_os_str))]
    pub output: Option<PathBuf>,
    #[structopt(
        long,
        help = "Background model as a table of oligomer frequencies (`<oligo> <id> <freq>`)",
        parse(from_os_str)
    )]
    pub expfreq: Option<PathBuf>,
    #[structopt(
        long,
        help = "Estimate a background model of this order from the input sequences",
        conflicts_with = "expfreq"
    )]
    pub markov: Option<usize>,
    #[structopt(
        long,
        help = "Pseudocount used when estimating the background model",
        default_value = "1.0"
    )]
    pub pseudo: f64,
    #[structopt(
        short = "1",
        long,
        help = "Count the given strand only instead of adding reverse complements"
    )]
    pub single_strand: bool,
    #[structopt(long, help = "Do not allow overlapping occurrences")]
    pub noov: bool,
    #[structopt(long, help = "Only report oligomer counts and frequencies")]
    pub count: bool,
    #[structopt(
        long,
        help = "Report each reverse complement pair once when adding reverse complements"
    )]
    pub group_rc: bool,
    #[structopt(
        short,
        long,
        help = "Verbosity, repeat for more detail (-v info, -vv debug)",
        parse(from_occurrences)
    )]
    pub verbose: u8,
}

impl Opt {
    /// Initialises logging at the requested verbosity unless `RUST_LOG` is set
    pub fn set_logging(&self) {
        let level = match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    }

    pub fn count_options(&self) -> CountOptions {
        CountOptions {
            add_reverse_complement: !self.single_strand,
            no_overlap: self.noov,
        }
    }

    pub fn report_mode(&self) -> ReportMode {
        if self.count {
            ReportMode::CountOnly
        } else {
            ReportMode::Enrichment
        }
    }
}
