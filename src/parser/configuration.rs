//! The EK60 configuration datagram, CON0
use crate::primitive::fixed_string;
use binrw::binread;

/// A CON0 datagram: a header followed by one record per transducer
#[binread]
#[br(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationDatagram {
    /// Survey, transect and sounder description
    pub header: ConfigurationHeader,
    /// One entry per transducer; channel `n` of a sample datagram
    /// refers to entry `n - 1`
    #[br(count = header.transducer_count)]
    pub transducers: Vec<ConfigurationTransducer>,
}

impl ConfigurationDatagram {
    /// Look up a transducer by its 1-based channel number
    pub fn transducer(&self, channel: i16) -> Option<&ConfigurationTransducer> {
        let index = usize::try_from(channel).ok()?.checked_sub(1)?;
        self.transducers.get(index)
    }
}

/// The fixed part of a CON0 datagram
#[binread]
#[br(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationHeader {
    /// e.g. "Loch Ness"
    #[br(count = 128, try_map = |x: Vec<u8>| fixed_string(x))]
    pub survey_name: String,
    /// Transect description
    #[br(count = 128, try_map = |x: Vec<u8>| fixed_string(x))]
    pub transect_name: String,
    /// e.g. "ER60"
    #[br(count = 128, try_map = |x: Vec<u8>| fixed_string(x))]
    pub sounder_name: String,
    /// Sounder software version
    #[br(count = 30, try_map = |x: Vec<u8>| fixed_string(x))]
    #[br(pad_after = 98)]
    pub version: String,
    /// Number of transducer records that follow
    #[br(assert(transducer_count >= 0, "negative transducer count {}", transducer_count))]
    pub transducer_count: i32,
}

/// Calibration and geometry of one transducer
///
/// `pulse_length_table`, `gain_table` and `sa_correction_table` are
/// index aligned: entry `i` of each describes the same pulse length.
#[binread]
#[br(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationTransducer {
    /// Channel identification
    #[br(count = 128, try_map = |x: Vec<u8>| fixed_string(x))]
    pub channel_id: String,
    /// 0 for single beam, 1 for split beam
    pub beam_type: i32,
    /// Hz
    pub frequency: f32,
    /// dB
    pub gain: f32,
    /// dB
    pub equivalent_beam_angle: f32,
    /// Degrees
    pub beam_width_alongship: f32,
    /// Degrees
    pub beam_width_athwartship: f32,
    /// Electrical to mechanical angle ratio
    pub angle_sensitivity_alongship: f32,
    /// Electrical to mechanical angle ratio
    pub angle_sensitivity_athwartship: f32,
    /// Degrees
    pub angle_offset_alongship: f32,
    /// Degrees
    pub angle_offset_athwartship: f32,
    /// Reserved
    pub position: [f32; 3],
    /// Reserved
    pub direction: [f32; 3],
    /// Available pulse lengths in seconds
    #[br(pad_after = 8)]
    pub pulse_length_table: [f32; 5],
    /// Gain in dB for each pulse length
    #[br(pad_after = 8)]
    pub gain_table: [f32; 5],
    /// Sa correction in dB for each pulse length
    #[br(pad_after = 8)]
    pub sa_correction_table: [f32; 5],
    /// General purpose transceiver software version
    #[br(count = 16, try_map = |x: Vec<u8>| fixed_string(x))]
    #[br(pad_after = 28)]
    pub gpt_software_version: String,
}

impl ConfigurationTransducer {
    /// Position of `pulse_length` in the pulse length table
    ///
    /// Only an exact match counts.
    pub fn pulse_length_index(&self, pulse_length: f32) -> Option<usize> {
        self.pulse_length_table.iter().position(|&p| p == pulse_length)
    }
}
