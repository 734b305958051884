//! FASTA input.

use crate::Result;
use bio::io::fasta;
use log::{debug, info};
use std::io;
use std::path::Path;

/// Sequence read from a FASTA record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    /// Identifier of the record
    pub id: String,
    /// Residues of the record, lines concatenated
    pub seq: Vec<u8>,
}

/// Opens `path` for reading or stdin when no path is given.  Compressed input is detected
/// and decompressed transparently.
pub fn open_input<P: AsRef<Path>>(path: Option<P>) -> Result<Box<dyn io::Read>> {
    let (rdr, format) = match path {
        Some(path) => {
            info!("Reading sequences from {}...", path.as_ref().display());
            niffler::from_path(path)?
        }
        None => {
            info!("Reading sequences from stdin...");
            niffler::get_reader(Box::new(io::stdin()))?
        }
    };
    debug!("Input compression detected as {:?}", format);
    Ok(rdr)
}

/// Lazily yields the records of a FASTA stream
pub fn records<T: io::Read>(rdr: T) -> impl Iterator<Item = Result<SequenceRecord>> {
    fasta::Reader::new(rdr).records().map(|record| {
        let record = record?;
        debug!(
            "Read sequence {} of length {}",
            record.id(),
            record.seq().len()
        );
        Ok(SequenceRecord {
            id: record.id().to_string(),
            seq: record.seq().to_vec(),
        })
    })
}

/// Reads every record of a FASTA stream into memory
pub fn read_sequences<T: io::Read>(rdr: T) -> Result<Vec<SequenceRecord>> {
    records(rdr).collect()
}
