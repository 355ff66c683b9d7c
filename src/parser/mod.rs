//! Parsing Simrad RAW files
//!
//! A RAW file is a sequence of framed datagrams (see [`crate::frame`]).
//! Each body starts with a 12 byte header: a four character type tag
//! and a [`Filetime`] split into two little-endian words. The rest of
//! the body depends on the tag.
pub mod configuration;
pub mod sample;

pub use configuration::{ConfigurationDatagram, ConfigurationHeader, ConfigurationTransducer};
pub use sample::{ComplexSample, SampleDatagram0, SampleDatagram3};

use crate::error::Result;
use crate::filetime::Filetime;
use crate::frame::{FrameReader, FrameState};
use crate::primitive::fixed_string;
use binrw::{binread, BinRead};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;

/// Size of the common datagram header
pub const HEADER_LENGTH: usize = 12;

/// The header shared by every datagram
#[binread]
#[br(little)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatagramHeader {
    /// The raw type tag, e.g. `b"RAW0"`
    pub datagram_type: [u8; 4],
    #[br(temp)]
    low_date_time: u32,
    #[br(temp)]
    high_date_time: u32,
    /// Time of the datagram
    #[br(calc = Filetime::from_parts(low_date_time, high_date_time))]
    pub timestamp: Filetime,
}

impl DatagramHeader {
    /// Create a header from a tag and a timestamp
    pub fn new(datagram_type: [u8; 4], timestamp: Filetime) -> Self {
        DatagramHeader {
            datagram_type,
            timestamp,
        }
    }

    /// The kind of datagram announced by the tag
    pub fn kind(&self) -> DatagramKind {
        DatagramKind::from_tag(&self.datagram_type)
    }

    /// The tag as text, with non-UTF-8 bytes replaced
    pub fn tag(&self) -> String {
        String::from_utf8_lossy(&self.datagram_type).into_owned()
    }
}

/// The datagram types this crate knows about
///
/// Three characters name the type and the fourth its version. Tags are
/// matched exactly and case-sensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Deserialize, Serialize)]
pub enum DatagramKind {
    /// XML0, EK80 XML configuration, environment and parameters
    Xml,
    /// FIL1, EK80 filter coefficients, kept as bytes
    Filter,
    /// CON0, EK60 configuration
    Configuration,
    /// NME0, NMEA sentences
    Nmea,
    /// TAG0, annotations
    Annotation,
    /// RAW0, EK60 power and angle samples
    Sample0,
    /// RAW3, EK80 complex samples
    Sample3,
    /// MRU0, motion sensor data
    Motion,
    /// Any other tag
    Unknown,
}

impl DatagramKind {
    /// Look up the kind for a raw tag
    pub fn from_tag(tag: &[u8; 4]) -> Self {
        match tag {
            b"XML0" => DatagramKind::Xml,
            b"FIL1" => DatagramKind::Filter,
            b"CON0" => DatagramKind::Configuration,
            b"NME0" => DatagramKind::Nmea,
            b"TAG0" => DatagramKind::Annotation,
            b"RAW0" => DatagramKind::Sample0,
            b"RAW3" => DatagramKind::Sample3,
            b"MRU0" => DatagramKind::Motion,
            _ => DatagramKind::Unknown,
        }
    }
}

impl fmt::Display for DatagramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DatagramKind::Xml => "XML0",
            DatagramKind::Filter => "FIL1",
            DatagramKind::Configuration => "CON0",
            DatagramKind::Nmea => "NME0",
            DatagramKind::Annotation => "TAG0",
            DatagramKind::Sample0 => "RAW0",
            DatagramKind::Sample3 => "RAW3",
            DatagramKind::Motion => "MRU0",
            DatagramKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Motion sensor data, MRU0
#[binread]
#[br(little)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionDatagram {
    /// Heave in meters
    pub heave: f32,
    /// Roll in degrees
    pub roll: f32,
    /// Pitch in degrees
    pub pitch: f32,
    /// Heading in degrees
    pub heading: f32,
}

/// The decoded body of a datagram
#[derive(Debug, Clone, PartialEq)]
pub enum Datagram {
    /// Bytes of a datagram without a decoder (FIL1 or an unknown tag)
    Binary(Vec<u8>),
    /// XML0 text
    Xml(String),
    /// NME0 or TAG0 text
    Text(String),
    /// MRU0 motion data
    Motion(MotionDatagram),
    /// RAW0 EK60 samples
    Sample0(SampleDatagram0),
    /// RAW3 EK80 samples
    Sample3(SampleDatagram3),
    /// CON0 EK60 configuration
    Configuration(ConfigurationDatagram),
}

/// A datagram together with its header
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// The common header
    pub header: DatagramHeader,
    /// The decoded body
    pub datagram: Datagram,
}

impl Record {
    /// Decode a record from a complete frame body
    pub fn from_body(body: &[u8]) -> Result<Record> {
        let mut cursor = Cursor::new(body);
        let header = DatagramHeader::read(&mut cursor)?;
        let payload = &body[HEADER_LENGTH..];
        let mut cursor = Cursor::new(payload);

        let datagram = match header.kind() {
            DatagramKind::Xml => Datagram::Xml(text(payload)?),
            DatagramKind::Nmea | DatagramKind::Annotation => Datagram::Text(text(payload)?),
            DatagramKind::Filter => Datagram::Binary(payload.to_vec()),
            DatagramKind::Configuration => {
                Datagram::Configuration(ConfigurationDatagram::read(&mut cursor)?)
            }
            DatagramKind::Sample0 => {
                Datagram::Sample0(SampleDatagram0::read_args(&mut cursor, (payload.len(),))?)
            }
            DatagramKind::Sample3 => {
                let sample = SampleDatagram3::read(&mut cursor)?;
                if !sample.is_supported() {
                    log::warn!(
                        "RAW3 datatype {} on {} is not decoded, samples unavailable",
                        sample.datatype,
                        sample.channel_id
                    );
                }
                Datagram::Sample3(sample)
            }
            DatagramKind::Motion => Datagram::Motion(MotionDatagram::read(&mut cursor)?),
            DatagramKind::Unknown => {
                log::warn!(
                    "unsupported datagram type {:?}, keeping {} bytes",
                    header.tag(),
                    payload.len()
                );
                Datagram::Binary(payload.to_vec())
            }
        };

        Ok(Record { header, datagram })
    }

    /// The kind of datagram
    pub fn kind(&self) -> DatagramKind {
        self.header.kind()
    }

    /// The datagram timestamp
    pub fn timestamp(&self) -> Filetime {
        self.header.timestamp
    }
}

fn text(payload: &[u8]) -> Result<String> {
    fixed_string(payload.to_vec()).map_err(|e| {
        binrw::Error::Custom {
            pos: HEADER_LENGTH as u64 + e.utf8_error().valid_up_to() as u64,
            err: Box::new(e),
        }
        .into()
    })
}

/// An iterator over the records of a RAW stream
///
/// Iteration ends at a clean end of stream or after the first framing
/// error. A record whose body fails to decode is reported and iteration
/// continues with the next record.
pub struct File<T: Read> {
    frames: FrameReader<T>,
}

impl<T: Read> File<T> {
    /// Create a RAW file from a reader
    pub fn new(reader: T) -> Self {
        File {
            frames: FrameReader::new(reader),
        }
    }

    /// The state of the underlying frame reader
    pub fn state(&self) -> FrameState {
        self.frames.state()
    }

    /// The byte offset of the next record
    pub fn position(&self) -> u64 {
        self.frames.position()
    }
}

impl File<BufReader<std::fs::File>> {
    /// Open a RAW file on disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = std::fs::File::open(path)?;
        Ok(File::new(BufReader::new(f)))
    }
}

impl<T: Read> Iterator for File<T> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.frames.next_with(Record::from_body)
    }
}

/// An iterator over the headers of a RAW stream, skipping bodies
pub struct Headers<T: Read> {
    frames: FrameReader<T>,
}

impl<T: Read> Headers<T> {
    /// Create a header iterator from a reader
    pub fn new(reader: T) -> Self {
        Headers {
            frames: FrameReader::new(reader),
        }
    }

    /// The byte offset of the next record
    pub fn position(&self) -> u64 {
        self.frames.position()
    }
}

impl<T: Read> Iterator for Headers<T> {
    type Item = Result<DatagramHeader>;

    fn next(&mut self) -> Option<Self::Item> {
        self.frames.next_header()
    }
}
