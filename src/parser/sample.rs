//! Sample datagrams: EK60 RAW0 and EK80 RAW3
use crate::error::{Error, Result};
use crate::primitive::fixed_string;
use binrw::binread;

/// Bytes of a RAW0 body before the power samples
pub const SAMPLE0_PREAMBLE: usize = 72;

/// The RAW3 datatype for four-quadrant complex float32 samples
pub const COMPLEX_FLOAT32: i16 = 1032;

/// An EK60 sample datagram, RAW0
///
/// Holds one ping of one channel: power samples and, for split beam
/// transducers, electrical angle samples.
#[binread]
#[br(little, import(body_length: usize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SampleDatagram0 {
    /// 1-based channel number
    pub channel: i16,
    /// Sample content flags as recorded
    pub mode: i16,
    /// Meters
    pub transducer_depth: f32,
    /// Hz
    pub frequency: f32,
    /// W
    pub transmit_power: f32,
    /// Seconds
    pub pulse_length: f32,
    /// Hz
    pub bandwidth: f32,
    /// Seconds
    pub sample_interval: f32,
    /// m/s
    pub sound_velocity: f32,
    /// dB/m
    pub absorption_coefficient: f32,
    /// Meters
    pub heave: f32,
    /// Degrees
    pub tx_roll: f32,
    /// Degrees
    pub tx_pitch: f32,
    /// Celsius
    #[br(pad_after = 4)]
    pub temperature: f32,
    /// Degrees
    pub rx_roll: f32,
    /// Degrees
    pub rx_pitch: f32,
    /// Index of the first sample
    pub offset: i32,
    /// Number of samples
    #[br(assert(count >= 0, "negative sample count {}", count))]
    pub count: i32,
    /// Compressed power, 10 log10(2) / 256 dB per unit
    #[br(count = count)]
    pub power: Vec<i16>,
    /// Electrical angles, alongship in the high byte and athwartship in
    /// the low byte; empty for power-only records
    #[br(count = if body_length >= SAMPLE0_PREAMBLE + 4 * (count as usize) { count } else { 0 })]
    pub angle: Vec<i16>,
}

impl SampleDatagram0 {
    /// Whether the record carries angle samples
    pub fn has_angles(&self) -> bool {
        !self.angle.is_empty()
    }
}

/// One complex sample of one transducer quadrant
#[binread]
#[br(little)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComplexSample {
    /// Real part
    pub re: f32,
    /// Imaginary part
    pub im: f32,
}

/// An EK80 sample datagram, RAW3
///
/// Only [`COMPLEX_FLOAT32`] payloads are decoded. Other datatypes parse
/// the preamble and leave the payload unread; [`SampleDatagram3::samples`]
/// then reports [`Error::UnsupportedSampleDatatype`].
#[binread]
#[br(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct SampleDatagram3 {
    /// Channel identification
    #[br(count = 128, try_map = |x: Vec<u8>| fixed_string(x))]
    pub channel_id: String,
    /// Payload layout code
    #[br(pad_after = 2)]
    pub datatype: i16,
    /// Index of the first sample
    pub offset: i32,
    /// Number of samples
    #[br(assert(count >= 0, "negative sample count {}", count))]
    pub count: i32,
    #[br(count = if datatype == COMPLEX_FLOAT32 { count } else { 0 })]
    quadrants: Vec<[ComplexSample; 4]>,
}

impl SampleDatagram3 {
    /// Whether the payload was decoded
    pub fn is_supported(&self) -> bool {
        self.datatype == COMPLEX_FLOAT32
    }

    /// The samples, four quadrants each
    pub fn samples(&self) -> Result<&[[ComplexSample; 4]]> {
        if self.is_supported() {
            Ok(&self.quadrants)
        } else {
            Err(Error::UnsupportedSampleDatatype(self.datatype))
        }
    }
}
