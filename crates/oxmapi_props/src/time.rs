//! Protocol timestamp handling.
//!
//! The protocol's native timestamp is a 64-bit count of 100-nanosecond
//! ticks since 1601-01-01 UTC, carried as two 32-bit words. Conversion
//! to and from POSIX time applies the fixed epoch delta.

use chrono::{DateTime, Utc};

use crate::row::Row;
use crate::tag::PropertyTag;
use crate::value::PropertyValue;

/// Seconds between 1601-01-01 and 1970-01-01.
pub const EPOCH_DELTA_SECS: i64 = 11_644_473_600;

/// 100-ns ticks per second.
pub const TICKS_PER_SECOND: u64 = 10_000_000;

/// A 64-bit tick count split into two 32-bit words, low word first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FileTime {
    /// Low 32 bits of the tick count.
    pub low: u32,
    /// High 32 bits of the tick count.
    pub high: u32,
}

impl FileTime {
    /// Builds a timestamp from its two words.
    #[must_use]
    pub const fn new(low: u32, high: u32) -> Self {
        Self { low, high }
    }

    /// Builds a timestamp from a 64-bit tick count.
    #[must_use]
    pub const fn from_ticks(ticks: u64) -> Self {
        Self {
            low: (ticks & 0xFFFF_FFFF) as u32,
            high: (ticks >> 32) as u32,
        }
    }

    /// Combines the two words into the 64-bit tick count.
    #[must_use]
    pub const fn ticks(self) -> u64 {
        ((self.high as u64) << 32) | self.low as u64
    }

    /// Converts to POSIX seconds and microseconds.
    ///
    /// Dates before 1970 come back with negative seconds; the
    /// microsecond part is always the positive sub-second remainder of
    /// the tick count.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn to_unix(self) -> (i64, u32) {
        let ticks = self.ticks();
        let secs = (ticks / TICKS_PER_SECOND) as i64 - EPOCH_DELTA_SECS;
        let micros = ((ticks % TICKS_PER_SECOND) / 10) as u32;
        (secs, micros)
    }

    /// Builds a timestamp from POSIX seconds and microseconds.
    ///
    /// Returns `None` for instants before 1601-01-01, which the tick
    /// count cannot represent.
    #[must_use]
    pub fn from_unix(secs: i64, micros: u32) -> Option<Self> {
        let since_1601 = secs.checked_add(EPOCH_DELTA_SECS)?;
        if since_1601 < 0 {
            return None;
        }
        let ticks = (since_1601 as u64)
            .checked_mul(TICKS_PER_SECOND)?
            .checked_add(u64::from(micros) * 10)?;
        Some(Self::from_ticks(ticks))
    }

    /// Converts to a UTC datetime.
    #[must_use]
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        let (secs, micros) = self.to_unix();
        DateTime::from_timestamp(secs, micros * 1_000)
    }

    /// Builds a timestamp from a UTC datetime.
    #[must_use]
    pub fn from_datetime(dt: &DateTime<Utc>) -> Option<Self> {
        Self::from_unix(dt.timestamp(), dt.timestamp_subsec_micros())
    }
}

impl Row {
    /// Reads a timestamp property.
    ///
    /// Absence of the property is `None`, never a zero timestamp.
    #[must_use]
    pub fn filetime(&self, tag: PropertyTag) -> Option<FileTime> {
        match self.get(tag)? {
            PropertyValue::SysTime(ft) => Some(*ft),
            _ => None,
        }
    }

    /// Reads a timestamp property as a UTC datetime.
    #[must_use]
    pub fn datetime(&self, tag: PropertyTag) -> Option<DateTime<Utc>> {
        self.filetime(tag)?.to_datetime()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::PropType;
    use crate::value::Property;

    // 2009-07-08 00:00:00 UTC expressed in ticks since 1601.
    const REFERENCE_TICKS: u64 = (1_247_011_200 + EPOCH_DELTA_SECS as u64) * TICKS_PER_SECOND;

    #[test]
    fn words_round_trip_through_ticks() {
        let ft = FileTime::from_ticks(REFERENCE_TICKS);
        assert_eq!(ft.ticks(), REFERENCE_TICKS);
        let rebuilt = FileTime::new(ft.low, ft.high);
        assert_eq!(rebuilt, ft);
    }

    #[test]
    fn reference_date_to_unix() {
        let ft = FileTime::from_ticks(REFERENCE_TICKS);
        let (secs, micros) = ft.to_unix();
        assert_eq!(secs, 1_247_011_200);
        assert_eq!(micros, 0);
    }

    #[test]
    fn unix_round_trip_is_exact() {
        let ft = FileTime::from_unix(1_247_011_200, 123_456).unwrap();
        assert_eq!(ft.to_unix(), (1_247_011_200, 123_456));
    }

    #[test]
    fn posix_epoch_is_the_documented_delta() {
        let ft = FileTime::from_unix(0, 0).unwrap();
        assert_eq!(ft.ticks(), EPOCH_DELTA_SECS as u64 * TICKS_PER_SECOND);
    }

    #[test]
    fn before_1601_is_unrepresentable() {
        assert!(FileTime::from_unix(-EPOCH_DELTA_SECS - 1, 0).is_none());
    }

    #[test]
    fn datetime_round_trip() {
        let dt = DateTime::from_timestamp(1_247_011_200, 0).unwrap();
        let ft = FileTime::from_datetime(&dt).unwrap();
        assert_eq!(ft.to_datetime().unwrap(), dt);
    }

    #[test]
    fn missing_timestamp_property_is_none() {
        let row = Row::new();
        assert_eq!(row.filetime(PropertyTag::new(0x0E06, PropType::SysTime)), None);
    }

    #[test]
    fn present_timestamp_property_is_read() {
        let mut row = Row::new();
        let ft = FileTime::from_ticks(REFERENCE_TICKS);
        row.upsert(Property::new(0x0E06, ft));
        assert_eq!(row.filetime(PropertyTag::new(0x0E06, PropType::SysTime)), Some(ft));
        assert_eq!(
            row.datetime(PropertyTag::new(0x0E06, PropType::SysTime)),
            DateTime::from_timestamp(1_247_011_200, 0)
        );
    }
}
