//! Windows NT filetime stamps
//!
//! Every RAW datagram is stamped with the number of 100 nanosecond
//! intervals since 1601-01-01 UTC, split into two 32 bit words.
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

const TICKS_PER_SECOND: u64 = 10_000_000;
const NANOS_PER_TICK: u64 = 100;

/// The filetime epoch, 1601-01-01 00:00:00 UTC
pub const EPOCH: OffsetDateTime = datetime!(1601-01-01 0:00 UTC);

/// An absolute timestamp in 100 ns ticks since [`EPOCH`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Deserialize, Serialize)]
#[serde(transparent)]
pub struct Filetime(pub u64);

impl Filetime {
    /// Combine the low and high words of a datagram header
    pub fn from_parts(low: u32, high: u32) -> Filetime {
        Filetime((u64::from(high) << 32) | u64::from(low))
    }

    /// The raw tick count
    pub fn ticks(self) -> u64 {
        self.0
    }

    /// The low and high 32 bit words
    pub fn parts(self) -> (u32, u32) {
        (self.0 as u32, (self.0 >> 32) as u32)
    }

    /// Convert to a calendar date-time in UTC
    ///
    /// All 100 ns ticks are kept, the conversion is exact. It fails only
    /// for stamps beyond the year 9999.
    pub fn to_datetime(self) -> Result<OffsetDateTime> {
        let secs = i64::try_from(self.0 / TICKS_PER_SECOND).map_err(|_| Error::TimestampOutOfRange)?;
        let nanos = ((self.0 % TICKS_PER_SECOND) * NANOS_PER_TICK) as i32;
        EPOCH
            .checked_add(Duration::new(secs, nanos))
            .ok_or(Error::TimestampOutOfRange)
    }

    /// Convert a calendar date-time to ticks
    ///
    /// Lossy below 100 ns: the remainder is truncated. Date-times before
    /// [`EPOCH`] cannot be represented.
    pub fn from_datetime(dt: OffsetDateTime) -> Result<Filetime> {
        let elapsed = dt - EPOCH;
        if elapsed.is_negative() {
            return Err(Error::TimestampOutOfRange);
        }
        let secs = u64::try_from(elapsed.whole_seconds()).map_err(|_| Error::TimestampOutOfRange)?;
        let subsec = elapsed.subsec_nanoseconds() as u64 / NANOS_PER_TICK;
        secs.checked_mul(TICKS_PER_SECOND)
            .and_then(|t| t.checked_add(subsec))
            .map(Filetime)
            .ok_or(Error::TimestampOutOfRange)
    }
}

impl From<u64> for Filetime {
    fn from(ticks: u64) -> Self {
        Filetime(ticks)
    }
}

impl From<Filetime> for u64 {
    fn from(t: Filetime) -> Self {
        t.0
    }
}

impl fmt::Display for Filetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Ok(dt) => write!(f, "{}", dt),
            Err(_) => write!(f, "{} ticks", self.0),
        }
    }
}
