//! Building echograms from one or more RAW streams
//!
//! Each stream is read with its own [`CalibrationContext`]: a CON0
//! datagram only calibrates the RAW0 datagrams that follow it in the
//! same stream.
use crate::calibration::CalibrationContext;
use crate::error::Result;
use crate::model::{Echogram, EchogramOptions, Ping};
use crate::parser::{self, Datagram};
use std::io::Read;
use std::path::Path;
use std::thread;

/// Reads one stream and yields its selected pings
pub struct Session<T: Read> {
    file: parser::File<T>,
    context: CalibrationContext,
    options: EchogramOptions,
}

impl<T: Read> Session<T> {
    /// Start a session over a stream positioned at its first record
    pub fn new(reader: T, options: EchogramOptions) -> Self {
        Session {
            file: parser::File::new(reader),
            context: CalibrationContext::new(),
            options,
        }
    }

    /// The calibration context as of the last record read
    pub fn context(&self) -> &CalibrationContext {
        &self.context
    }
}

impl<T: Read> Iterator for Session<T> {
    type Item = Result<Ping>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.file.next()? {
                Ok(record) => record,
                Err(e) => return Some(Err(e)),
            };
            let timestamp = record.timestamp();
            match record.datagram {
                Datagram::Configuration(configuration) => self.context.update(configuration),
                Datagram::Sample0(sample) if self.options.selects(sample.frequency, timestamp) => {
                    return Some(
                        self.context
                            .calibrate(timestamp, &sample, self.options.angles)
                            .map_err(Into::into),
                    );
                }
                _ => {}
            }
        }
    }
}

/// Calibrate the selected pings of one stream
pub fn pings<T: Read>(reader: T, options: &EchogramOptions) -> Result<Vec<Ping>> {
    Session::new(reader, options.clone()).collect()
}

/// Build an echogram from streams read one after the other
///
/// Rows follow stream order, then record order within each stream.
pub fn echogram<I, T>(readers: I, options: &EchogramOptions) -> Result<Echogram>
where
    I: IntoIterator<Item = T>,
    T: Read,
{
    let mut rows = Vec::new();
    for reader in readers {
        rows.extend(pings(reader, options)?);
    }
    Echogram::from_pings(rows)
}

/// Build an echogram from files, decoding each file on its own thread
///
/// The result is the same as [`echogram`] over the files in the given
/// order.
pub fn echogram_from_files<P>(paths: &[P], options: &EchogramOptions) -> Result<Echogram>
where
    P: AsRef<Path> + Sync,
{
    let per_file = thread::scope(|s| {
        let handles = paths
            .iter()
            .map(|path| {
                s.spawn(move || -> Result<Vec<Ping>> {
                    let file = std::fs::File::open(path.as_ref())?;
                    pings(std::io::BufReader::new(file), options)
                })
            })
            .collect::<Vec<_>>();

        // Join in the order given so rows keep file order
        handles
            .into_iter()
            .map(|h| match h.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect::<Vec<_>>()
    });

    let mut rows = Vec::new();
    for result in per_file {
        rows.extend(result?);
    }
    Echogram::from_pings(rows)
}
