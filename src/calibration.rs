//! Conversion of EK60 power samples to volume backscattering strength
//!
//! The sonar equation follows the Echoview description of EK60
//! calibration:
//!
//! ```text
//! Sv = Pr + 20 log10(R) + 2 alpha R - CSv - 2 Sa
//! CSv = 10 log10(Pt G^2 lambda^2 c tau psi / (32 pi^2))
//! ```
//!
//! with `R` the range corrected for the TVG offset.
use crate::error::CalibrationError;
use crate::filetime::Filetime;
use crate::model::Ping;
use crate::parser::{ConfigurationDatagram, ConfigurationTransducer, SampleDatagram0};
use std::f64::consts::PI;

/// Samples subtracted from the range before applying TVG
pub const TVG_RANGE_CORRECTION_OFFSET: f64 = 2.0;

/// dB per unit of the compressed power format
pub const POWER_DB_PER_UNIT: f64 = 10.0 * std::f64::consts::LOG10_2 / 256.0;

/// Degrees per step of an electrical angle byte
const ELECTRICAL_ANGLE_STEP: f64 = 180.0 / 128.0;

/// log10 with `log10(0) = -inf`
fn log10(x: f64) -> f64 {
    if x == 0.0 {
        f64::NEG_INFINITY
    } else {
        x.log10()
    }
}

/// Convert compressed power samples to dB
pub fn power_to_db(power: &[i16]) -> Vec<f64> {
    power
        .iter()
        .map(|&p| f64::from(p) * POWER_DB_PER_UNIT)
        .collect()
}

/// The inputs of the sonar equation that are constant over a ping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SonarEquation {
    /// Hz
    pub frequency: f64,
    /// Transducer gain in dB
    pub gain: f64,
    /// Equivalent beam angle in dB
    pub equivalent_beam_angle: f64,
    /// m/s
    pub sound_velocity: f64,
    /// dB/m
    pub absorption_coefficient: f64,
    /// W
    pub transmit_power: f64,
    /// Seconds
    pub pulse_length: f64,
    /// Sa correction in dB
    pub sa_correction: f64,
}

impl SonarEquation {
    /// Gather the parameters for one ping
    ///
    /// # Errors
    ///
    /// Fails when the ping's pulse length is not an exact entry of the
    /// transducer's pulse length table.
    pub fn new(
        transducer: &ConfigurationTransducer,
        sample: &SampleDatagram0,
    ) -> Result<Self, CalibrationError> {
        let index = transducer.pulse_length_index(sample.pulse_length).ok_or(
            CalibrationError::PulseLengthNotInTable {
                pulse_length: sample.pulse_length,
                table: transducer.pulse_length_table,
            },
        )?;

        Ok(SonarEquation {
            frequency: f64::from(sample.frequency),
            gain: f64::from(transducer.gain),
            equivalent_beam_angle: f64::from(transducer.equivalent_beam_angle),
            sound_velocity: f64::from(sample.sound_velocity),
            absorption_coefficient: f64::from(sample.absorption_coefficient),
            transmit_power: f64::from(sample.transmit_power),
            pulse_length: f64::from(sample.pulse_length),
            sa_correction: f64::from(transducer.sa_correction_table[index]),
        })
    }

    /// The calibration constant CSv in dB
    pub fn calibration_constant(&self) -> f64 {
        let wavelength = self.sound_velocity / self.frequency;
        10.0 * log10(
            self.transmit_power
                * 10f64.powf(2.0 * self.gain / 10.0)
                * wavelength.powi(2)
                * self.sound_velocity
                * self.pulse_length
                * 10f64.powf(self.equivalent_beam_angle / 10.0)
                / (32.0 * PI.powi(2)),
        )
    }

    /// Sv for one sample, given its power in dB and its corrected range
    pub fn volume_backscatter(&self, power_db: f64, range_corrected: f64) -> f64 {
        self.volume_backscatter_with(self.calibration_constant(), power_db, range_corrected)
    }

    fn volume_backscatter_with(&self, csv: f64, power_db: f64, range_corrected: f64) -> f64 {
        let tvg = (20.0 * log10(range_corrected)).max(0.0);
        power_db + tvg + 2.0 * self.absorption_coefficient * range_corrected
            - csv
            - 2.0 * self.sa_correction
    }
}

/// Sv for a whole ping
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeBackscatter {
    /// dB re 1 m^-1, one value per sample
    pub sv: Vec<f64>,
    /// Corrected range of the last sample in meters, 0 for an empty ping
    pub range: f64,
}

/// Apply the sonar equation to every sample of a RAW0 datagram
pub fn volume_backscatter(
    transducer: &ConfigurationTransducer,
    sample: &SampleDatagram0,
) -> Result<VolumeBackscatter, CalibrationError> {
    let equation = SonarEquation::new(transducer, sample)?;
    let csv = equation.calibration_constant();

    let thickness = f64::from(sample.sound_velocity) * f64::from(sample.sample_interval) / 2.0;
    let range_corrected =
        |i: usize| ((i + 1) as f64 * thickness - TVG_RANGE_CORRECTION_OFFSET * thickness).max(0.0);

    let sv = power_to_db(&sample.power)
        .into_iter()
        .enumerate()
        .map(|(i, pr)| equation.volume_backscatter_with(csv, pr, range_corrected(i)))
        .collect::<Vec<_>>();

    let range = match sample.power.len() {
        0 => 0.0,
        n => range_corrected(n - 1),
    };

    Ok(VolumeBackscatter { sv, range })
}

/// Mechanical alongship and athwartship angles in degrees
///
/// `None` when the datagram holds no angle samples.
pub fn angles(
    transducer: &ConfigurationTransducer,
    sample: &SampleDatagram0,
) -> Option<(Vec<f64>, Vec<f64>)> {
    if !sample.has_angles() {
        return None;
    }
    let convert = |electrical: i8, sensitivity: f32, offset: f32| {
        f64::from(electrical) * ELECTRICAL_ANGLE_STEP / f64::from(sensitivity) - f64::from(offset)
    };

    let (alongship, athwartship) = sample
        .angle
        .iter()
        .map(|&a| {
            let [low, high] = a.to_le_bytes();
            (
                convert(
                    high as i8,
                    transducer.angle_sensitivity_alongship,
                    transducer.angle_offset_alongship,
                ),
                convert(
                    low as i8,
                    transducer.angle_sensitivity_athwartship,
                    transducer.angle_offset_athwartship,
                ),
            )
        })
        .unzip();
    Some((alongship, athwartship))
}

/// The configuration in force while reading one stream
///
/// Each CON0 datagram replaces the previous one. A context belongs to a
/// single stream; streams decoded in parallel each carry their own.
#[derive(Debug, Clone, Default)]
pub struct CalibrationContext {
    configuration: Option<ConfigurationDatagram>,
}

impl CalibrationContext {
    /// A context with no configuration yet
    pub fn new() -> Self {
        CalibrationContext::default()
    }

    /// Make `configuration` the active one
    pub fn update(&mut self, configuration: ConfigurationDatagram) {
        log::debug!(
            "configuration {:?} with {} transducers now active",
            configuration.header.survey_name,
            configuration.transducers.len()
        );
        self.configuration = Some(configuration);
    }

    /// The active configuration, if any
    pub fn configuration(&self) -> Option<&ConfigurationDatagram> {
        self.configuration.as_ref()
    }

    /// The transducer for a 1-based channel number
    pub fn transducer(&self, channel: i16) -> Result<&ConfigurationTransducer, CalibrationError> {
        let configuration = self
            .configuration
            .as_ref()
            .ok_or(CalibrationError::NoConfiguration)?;
        configuration
            .transducer(channel)
            .ok_or(CalibrationError::UnknownChannel {
                channel,
                transducers: configuration.transducers.len(),
            })
    }

    /// Calibrate a RAW0 datagram into a [`Ping`]
    pub fn calibrate(
        &self,
        timestamp: Filetime,
        sample: &SampleDatagram0,
        with_angles: bool,
    ) -> Result<Ping, CalibrationError> {
        let transducer = self.transducer(sample.channel)?;
        let VolumeBackscatter { sv, range } = volume_backscatter(transducer, sample)?;
        let (alongship, athwartship) = match angles(transducer, sample) {
            Some((along, athwart)) if with_angles => (Some(along), Some(athwart)),
            _ => (None, None),
        };

        Ok(Ping {
            timestamp,
            channel: sample.channel,
            frequency: f64::from(sample.frequency),
            range,
            sv,
            alongship,
            athwartship,
        })
    }
}
