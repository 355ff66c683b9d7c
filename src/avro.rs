//! Exporting calibrated pings to Avro
use crate::error::{Error, Result};
use crate::model::Ping;
use apache_avro::{Schema, Writer};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// The schema of exported pings
pub const PING_SCHEMA: &str = r#"{"type": "record","namespace": "echoraw","name": "ping","fields": [{"name": "timestamp", "type": "long"},{"name": "channel", "type": "int"},{"name": "frequency", "type" : "double"},{"name": "range", "type" : "double"},{"name": "sv", "type": {"type": "array", "items": "double"}}]}"#;

/// A ping as stored in Avro
///
/// `timestamp` is the filetime tick count.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AvroPing {
    /// Filetime ticks
    pub timestamp: i64,
    /// 1-based channel number
    pub channel: i32,
    /// Hz
    pub frequency: f64,
    /// Meters
    pub range: f64,
    /// dB re 1 m^-1
    pub sv: Vec<f64>,
}

impl TryFrom<&Ping> for AvroPing {
    type Error = Error;

    fn try_from(ping: &Ping) -> Result<Self> {
        let timestamp =
            i64::try_from(ping.timestamp.ticks()).map_err(|_| Error::TimestampOutOfRange)?;
        Ok(AvroPing {
            timestamp,
            channel: i32::from(ping.channel),
            frequency: ping.frequency,
            range: ping.range,
            sv: ping.sv.clone(),
        })
    }
}

/// Write pings to an Avro object container
///
/// Returns the number of pings written.
pub fn write_pings<'a, I, W>(pings: I, output: W) -> Result<usize>
where
    I: IntoIterator<Item = &'a Ping>,
    W: Write,
{
    let schema = Schema::parse_str(PING_SCHEMA)?;
    let rows = pings
        .into_iter()
        .map(AvroPing::try_from)
        .collect::<Result<Vec<_>>>()?;

    let mut writer = Writer::new(&schema, output);
    writer.extend_ser(rows.iter())?;
    writer.into_inner()?;
    Ok(rows.len())
}
