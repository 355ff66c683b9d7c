//! Whole-file passes that do not need calibration
use crate::error::{Error, Result};
use crate::filetime::Filetime;
use crate::frame::{write_frame, FrameReader};
use crate::parser::{self, Datagram, DatagramKind, Headers};
use std::collections::BTreeMap;
use std::io::{Read, Write};

/// What a header-only pass finds in a stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    /// Total number of datagrams
    pub total: usize,
    /// Datagrams per raw type tag
    pub counts: BTreeMap<String, usize>,
    /// Datagrams per kind; every unrecognized tag counts as unknown
    pub kinds: BTreeMap<DatagramKind, usize>,
    /// Earliest timestamp seen
    pub first: Option<Filetime>,
    /// Latest timestamp seen
    pub last: Option<Filetime>,
}

impl Inventory {
    /// The number of datagrams of a kind
    pub fn count(&self, kind: DatagramKind) -> usize {
        self.kinds.get(&kind).copied().unwrap_or(0)
    }
}

/// Count the datagrams of a stream by type, reading only their headers
pub fn inventory<T: Read>(reader: T) -> Result<Inventory> {
    let mut inv = Inventory::default();
    for header in Headers::new(reader) {
        let header = header?;
        inv.total += 1;
        *inv.counts.entry(header.tag()).or_insert(0) += 1;
        *inv.kinds.entry(header.kind()).or_insert(0) += 1;
        let t = header.timestamp;
        inv.first = Some(inv.first.map_or(t, |f| f.min(t)));
        inv.last = Some(inv.last.map_or(t, |l| l.max(t)));
    }
    Ok(inv)
}

/// Outcome of [`repair`]
#[derive(Debug, Default)]
pub struct RepairReport {
    /// Datagrams copied to the output
    pub copied: usize,
    /// Bytes of input consumed by the copied datagrams
    pub good_bytes: u64,
    /// The framing error that stopped the copy, if any
    pub error: Option<Error>,
}

/// Copy the intact leading datagrams of a possibly damaged stream
///
/// Frames are copied until the input ends or its envelope breaks. Only
/// I/O errors on the output are returned as errors; a broken input is
/// reported in [`RepairReport::error`].
pub fn repair<R: Read, W: Write>(reader: R, writer: &mut W) -> Result<RepairReport> {
    let mut frames = FrameReader::new(reader);
    let mut report = RepairReport::default();
    while let Some(body) = frames.next_body() {
        match body {
            Ok(body) => {
                write_frame(writer, &body)?;
                report.copied += 1;
                report.good_bytes = frames.position();
            }
            Err(e) => {
                log::warn!(
                    "stopping after {} datagrams at offset {}: {}",
                    report.copied,
                    report.good_bytes,
                    e
                );
                report.error = Some(e);
                break;
            }
        }
    }
    Ok(report)
}

/// The NMEA sentences of a stream, in order
pub fn nmea_sentences<T: Read>(reader: T) -> impl Iterator<Item = Result<String>> {
    parser::File::new(reader).filter_map(|record| match record {
        Ok(record) => match (record.kind(), record.datagram) {
            (DatagramKind::Nmea, Datagram::Text(text)) => Some(Ok(text)),
            _ => None,
        },
        Err(e) => Some(Err(e)),
    })
}
