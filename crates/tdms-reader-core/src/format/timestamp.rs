//! 128-bit TDMS timestamps.
//!
//! A timestamp is a signed count of whole seconds since 1904-01-01 00:00:00
//! UTC plus an unsigned fraction of a second in units of 2^-64 s. On disk a
//! little-endian segment stores the fraction first; a big-endian segment
//! stores the seconds first.

use std::fmt;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use chrono::{DateTime, Utc};

/// Seconds between the TDMS epoch (1904-01-01) and the Unix epoch.
pub const TDMS_EPOCH_OFFSET_SECONDS: i64 = 2_082_844_800;

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// A TDMS timestamp.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp {
    seconds: i64,
    fractions: u64,
}

impl Timestamp {
    /// Build a timestamp from seconds since 1904 and 2^-64 s fractions.
    pub fn new(seconds: i64, fractions: u64) -> Self {
        Self { seconds, fractions }
    }

    /// Decode the little-endian wire layout (fractions, then seconds).
    pub fn from_le_bytes(bytes: [u8; 16]) -> Self {
        Self {
            fractions: LittleEndian::read_u64(&bytes[..8]),
            seconds: LittleEndian::read_i64(&bytes[8..]),
        }
    }

    /// Decode the big-endian wire layout (seconds, then fractions).
    pub fn from_be_bytes(bytes: [u8; 16]) -> Self {
        Self {
            seconds: BigEndian::read_i64(&bytes[..8]),
            fractions: BigEndian::read_u64(&bytes[8..]),
        }
    }

    /// Encode in the little-endian wire layout.
    pub fn to_le_bytes(self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[..8].copy_from_slice(&self.fractions.to_le_bytes());
        out[8..].copy_from_slice(&self.seconds.to_le_bytes());
        out
    }

    /// Whole seconds since 1904-01-01 UTC.
    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    /// Fraction of a second in units of 2^-64 s.
    pub fn fractions(&self) -> u64 {
        self.fractions
    }

    /// Fraction of a second truncated to nanoseconds.
    pub fn subsec_nanos(&self) -> u32 {
        ((u128::from(self.fractions) * NANOS_PER_SECOND as u128) >> 64) as u32
    }

    /// Whole seconds since the Unix epoch.
    pub fn unix_seconds(&self) -> i64 {
        self.seconds.saturating_sub(TDMS_EPOCH_OFFSET_SECONDS)
    }

    /// Nanoseconds since the Unix epoch, or `None` if that overflows `i64`.
    pub fn to_unix_nanos(&self) -> Option<i64> {
        self.unix_seconds()
            .checked_mul(NANOS_PER_SECOND)?
            .checked_add(i64::from(self.subsec_nanos()))
    }

    /// Convert to a `chrono` UTC datetime, or `None` if out of its range.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.unix_seconds(), self.subsec_nanos())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.9fZ")),
            None => write!(f, "{}s+{}/2^64 after 1904-01-01", self.seconds, self.fractions),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    #[test]
    fn converts_to_calendar_time() {
        let ts = Timestamp::new(3_524_551_547, 1_234_567_890 * 10_000_000_000);
        let dt = ts.to_datetime().unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2015, 9, 8));
        assert_eq!((dt.hour(), dt.minute(), dt.second()), (10, 5, 47));
        assert_eq!(dt.nanosecond(), 669_260_594);
    }

    #[test]
    fn tdms_epoch_maps_to_negative_unix_time() {
        let ts = Timestamp::new(0, 0);
        assert_eq!(ts.unix_seconds(), -TDMS_EPOCH_OFFSET_SECONDS);
        assert_eq!(
            ts.to_unix_nanos(),
            Some(-TDMS_EPOCH_OFFSET_SECONDS * 1_000_000_000)
        );
    }

    #[test]
    fn half_second_fraction() {
        let ts = Timestamp::new(TDMS_EPOCH_OFFSET_SECONDS, 1 << 63);
        assert_eq!(ts.to_unix_nanos(), Some(500_000_000));
    }

    #[test]
    fn wire_layouts_differ_only_in_field_order() {
        let ts = Timestamp::new(3_600_000_000, 42);
        assert_eq!(Timestamp::from_le_bytes(ts.to_le_bytes()), ts);

        let mut be = [0u8; 16];
        be[..8].copy_from_slice(&3_600_000_000i64.to_be_bytes());
        be[8..].copy_from_slice(&42u64.to_be_bytes());
        assert_eq!(Timestamp::from_be_bytes(be), ts);
    }

    #[test]
    fn far_future_overflows_nanos() {
        let ts = Timestamp::new(i64::MAX / 2, 0);
        assert_eq!(ts.to_unix_nanos(), None);
    }
}
