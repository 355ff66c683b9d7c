//! The echoraw output model
use crate::error::{AggregationError, Result};
use crate::filetime::Filetime;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// One calibrated ping of one channel
///
/// Pings are transient: [`crate::echogram`] folds them into matrix rows
/// as they are produced.
#[derive(Debug, Clone, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Ping {
    /// Time of the sample datagram
    pub timestamp: Filetime,
    /// 1-based channel number
    pub channel: i16,
    /// Frequency of the channel in Hz
    pub frequency: f64,
    /// Corrected range of the last sample in meters
    pub range: f64,
    /// Volume backscattering strength in dB re 1 m^-1
    pub sv: Vec<f64>,
    /// Alongship angles in degrees, when requested and recorded
    pub alongship: Option<Vec<f64>>,
    /// Athwartship angles in degrees, when requested and recorded
    pub athwartship: Option<Vec<f64>>,
}

/// A time window, inclusive at both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(Deserialize, Serialize)]
pub struct TimeWindow {
    /// Earliest timestamp kept
    pub start: Filetime,
    /// Latest timestamp kept
    pub end: Filetime,
}

impl TimeWindow {
    /// Create a window from its bounds
    pub fn new(start: Filetime, end: Filetime) -> Self {
        TimeWindow { start, end }
    }

    /// Whether `t` lies inside the window
    pub fn contains(&self, t: Filetime) -> bool {
        self.start <= t && t <= self.end
    }
}

/// Which pings go into an echogram
#[derive(Debug, Clone, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct EchogramOptions {
    /// Channel frequency in Hz, matched exactly
    pub frequency: f64,
    /// Keep only pings inside this window
    #[serde(default)]
    pub window: Option<TimeWindow>,
    /// Also produce angle matrices
    #[serde(default)]
    pub angles: bool,
}

impl EchogramOptions {
    /// Select every ping at `frequency`
    pub fn new(frequency: f64) -> Self {
        EchogramOptions {
            frequency,
            window: None,
            angles: false,
        }
    }

    /// Restrict to a time window
    pub fn window(mut self, window: TimeWindow) -> Self {
        self.window = Some(window);
        self
    }

    /// Request angle matrices
    pub fn angles(mut self, angles: bool) -> Self {
        self.angles = angles;
        self
    }

    /// Whether a sample datagram is selected
    pub fn selects(&self, frequency: f32, timestamp: Filetime) -> bool {
        f64::from(frequency) == self.frequency
            && self.window.map_or(true, |w| w.contains(timestamp))
    }
}

/// Calibrated pings stacked into matrices
///
/// Rows are pings in stream order, columns are samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Echogram {
    /// Timestamp of each row
    pub timestamps: Vec<Filetime>,
    /// Sv in dB, pings by samples
    pub sv: Array2<f64>,
    /// Corrected range of the last sample of the last ping, in meters
    pub range: f64,
    /// Alongship angles in degrees, when requested and present in every ping
    pub alongship: Option<Array2<f64>>,
    /// Athwartship angles in degrees, when requested and present in every ping
    pub athwartship: Option<Array2<f64>>,
}

impl Echogram {
    /// Stack pings into an echogram
    ///
    /// # Errors
    ///
    /// All pings must have the same number of samples.
    pub fn from_pings(pings: Vec<Ping>) -> Result<Self> {
        let cols = pings.first().map_or(0, |p| p.sv.len());
        for (row, ping) in pings.iter().enumerate() {
            if ping.sv.len() != cols {
                return Err(AggregationError::RowLengthMismatch {
                    row,
                    expected: cols,
                    found: ping.sv.len(),
                }
                .into());
            }
        }

        let range = pings.last().map_or(0.0, |p| p.range);
        let timestamps = pings.iter().map(|p| p.timestamp).collect();
        let alongship = stack(&pings, cols, |p| p.alongship.as_deref());
        let athwartship = stack(&pings, cols, |p| p.athwartship.as_deref());
        let sv = stack(&pings, cols, |p| Some(p.sv.as_slice())).unwrap_or_else(|| Array2::zeros((0, 0)));

        Ok(Echogram {
            timestamps,
            sv,
            range,
            alongship,
            athwartship,
        })
    }

    /// Number of pings
    pub fn pings(&self) -> usize {
        self.sv.nrows()
    }

    /// Number of samples per ping
    pub fn samples(&self) -> usize {
        self.sv.ncols()
    }

    /// The displayed range as (top, bottom) in meters
    pub fn range_bounds(&self) -> (f64, f64) {
        (0.0, self.range)
    }
}

fn stack<F>(pings: &[Ping], cols: usize, row: F) -> Option<Array2<f64>>
where
    F: Fn(&Ping) -> Option<&[f64]>,
{
    let mut data = Vec::with_capacity(pings.len() * cols);
    for ping in pings {
        let values = row(ping)?;
        if values.len() != cols {
            return None;
        }
        data.extend_from_slice(values);
    }
    if pings.is_empty() {
        return None;
    }
    Array2::from_shape_vec((pings.len(), cols), data).ok()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Error;

    fn ping(t: u64, n: usize) -> Ping {
        Ping {
            timestamp: Filetime(t),
            channel: 1,
            frequency: 38000.0,
            range: n as f64,
            sv: (0..n).map(|i| i as f64).collect(),
            alongship: None,
            athwartship: None,
        }
    }

    #[test]
    fn stacks_rows() {
        let e = Echogram::from_pings(vec![ping(1, 3), ping(2, 3)]).unwrap();
        assert_eq!(e.sv.shape(), &[2, 3]);
        assert_eq!(e.sv[[1, 2]], 2.0);
        assert_eq!(e.timestamps, vec![Filetime(1), Filetime(2)]);
        assert!(e.alongship.is_none());
    }

    #[test]
    fn empty() {
        let e = Echogram::from_pings(Vec::new()).unwrap();
        assert_eq!(e.pings(), 0);
        assert_eq!(e.range, 0.0);
    }

    #[test]
    fn ragged_rows() {
        match Echogram::from_pings(vec![ping(1, 3), ping(2, 4)]) {
            Err(Error::Aggregation(AggregationError::RowLengthMismatch {
                row: 1,
                expected: 3,
                found: 4,
            })) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn window_is_inclusive() {
        let w = TimeWindow::new(Filetime(10), Filetime(20));
        assert!(w.contains(Filetime(10)));
        assert!(w.contains(Filetime(20)));
        assert!(!w.contains(Filetime(21)));
    }
}
