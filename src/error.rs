//! Error types
use thiserror::Error;

/// The result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Any failure while reading, calibrating or exporting RAW data
#[derive(Debug, Error)]
pub enum Error {
    /// The record envelope is broken; the stream cannot continue
    #[error(transparent)]
    Framing(#[from] FramingError),

    /// A ping could not be converted to Sv
    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    /// Pings could not be assembled into a matrix
    #[error(transparent)]
    Aggregation(#[from] AggregationError),

    /// A RAW3 payload was requested whose datatype is not decoded
    #[error("unsupported sample datatype {0}")]
    UnsupportedSampleDatatype(i16),

    /// A datagram body did not match its declared layout
    #[error("failed to decode datagram: {0}")]
    Decode(#[from] binrw::Error),

    /// I/O errors from the underlying stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A filetime or calendar date outside the representable range
    #[error("timestamp out of range")]
    TimestampOutOfRange,

    /// Avro export failed
    #[error("avro error: {0}")]
    Avro(#[from] apache_avro::Error),
}

/// Violations of the length envelope around each datagram
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FramingError {
    /// The leading length field was cut short
    #[error("truncated length field: {read} of 4 bytes")]
    TruncatedLength {
        /// Bytes available before the end of the stream
        read: usize,
    },

    /// The leading length is negative
    #[error("invalid datagram length {0}")]
    InvalidLength(i32),

    /// The stream ended inside a datagram body
    #[error("truncated datagram body: expected {expected} bytes, found {found}")]
    TruncatedBody {
        /// Declared body length
        expected: usize,
        /// Bytes actually available
        found: usize,
    },

    /// The stream ended before the trailing length
    #[error("missing trailing length for datagram of {0} bytes")]
    MissingTrailer(i32),

    /// The trailing length disagrees with the leading one
    #[error("length mismatch: leading {leading}, trailing {trailing}")]
    LengthMismatch {
        /// Length before the body
        leading: i32,
        /// Length after the body
        trailing: i32,
    },

    /// The body is too long to be described by a 32 bit length
    #[error("datagram body of {0} bytes is too long to frame")]
    BodyTooLong(usize),
}

/// Failures in the sonar equation inputs
#[derive(Debug, Error, PartialEq)]
pub enum CalibrationError {
    /// A sample datagram arrived before any configuration datagram
    #[error("sample datagram seen before any configuration datagram")]
    NoConfiguration,

    /// The active configuration has no transducer for the channel
    #[error("channel {channel} not present in configuration with {transducers} transducers")]
    UnknownChannel {
        /// 1-based channel number from the sample datagram
        channel: i16,
        /// Transducers in the active configuration
        transducers: usize,
    },

    /// The pulse length is not an entry of the transducer's table
    #[error("pulse length {pulse_length} not found in pulse length table {table:?}")]
    PulseLengthNotInTable {
        /// Pulse length of the ping in seconds
        pulse_length: f32,
        /// The transducer's pulse length table
        table: [f32; 5],
    },
}

/// Failures while assembling pings into a matrix
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregationError {
    /// A ping has a different number of samples from the first one
    #[error("ping {row} has {found} samples, expected {expected}")]
    RowLengthMismatch {
        /// Index of the offending ping
        row: usize,
        /// Samples in the first ping
        expected: usize,
        /// Samples in the offending ping
        found: usize,
    },
}
