#![warn(missing_debug_implementations, rust_2018_idioms)]

//! Counts oligomers in FASTA sequences and tests them for over-representation.
mod cli;

use log::info;
use rustyword::count::CountTable;
use rustyword::enrichment::{self, Report};
use rustyword::fasta;
use rustyword::markov::MarkovModel;
use rustyword::Result;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use structopt::StructOpt;

fn main() -> Result<()> {
    let opt = cli::Opt::from_args();
    opt.set_logging();

    let mut table = CountTable::new(opt.length, opt.count_options())?;
    let background = match opt.expfreq {
        Some(ref path) => Some(MarkovModel::from_frequency_file(path)?),
        None => None,
    };

    let rdr = fasta::open_input(opt.input.as_ref())?;
    let background = match (background, opt.markov) {
        (None, Some(order)) => {
            // sequences are needed twice, for the background and for counting
            let records = fasta::read_sequences(rdr)?;
            for record in &records {
                table.count_occurrences(&record.seq);
            }
            info!("Estimating order {} background model...", order);
            MarkovModel::estimate(order, records.iter().map(|r| &r.seq), opt.pseudo)?
        }
        (background, _) => {
            for record in fasta::records(rdr) {
                table.count_occurrences(&record?.seq);
            }
            background.unwrap_or_else(MarkovModel::uniform)
        }
    };

    let counts = table.finalize(opt.report_mode());
    info!(
        "Counted {} positions for oligomers of length {}",
        counts.position_count(),
        counts.length()
    );

    let mut out: Box<dyn Write> = match opt.output {
        Some(ref path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    };
    writeln!(out, "{}", Report::header(counts.mode()))?;
    for row in enrichment::report(&counts, &background, opt.group_rc) {
        writeln!(out, "{}", row.to_row())?;
    }
    out.flush()?;

    Ok(())
}
