//! Timezone definition blob decoding.

use super::reader::BlobReader;
use crate::error::CodecResult;

/// A calendar date-time rule inside a timezone definition: either an
/// absolute date (year set) or a recurring "Nth weekday of month" rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TzSystemTime {
    /// Year, zero for recurring rules.
    pub year: u16,
    /// Month, 1-12, zero when the rule is unused.
    pub month: u16,
    /// Day of week, Sunday = 0.
    pub day_of_week: u16,
    /// Day of month, or occurrence ordinal for recurring rules.
    pub day: u16,
    /// Hour of day.
    pub hour: u16,
    /// Minute.
    pub minute: u16,
    /// Second.
    pub second: u16,
    /// Milliseconds.
    pub milliseconds: u16,
}

/// A decoded timezone definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeZoneStruct {
    /// Offset from UTC in minutes.
    pub bias: i32,
    /// Additional offset while standard time is active.
    pub standard_bias: i32,
    /// Additional offset while daylight time is active.
    pub daylight_bias: i32,
    /// Year of the standard-time rule, zero for recurring rules.
    pub standard_year: u16,
    /// When standard time begins.
    pub standard_date: TzSystemTime,
    /// Year of the daylight-time rule, zero for recurring rules.
    pub daylight_year: u16,
    /// When daylight time begins.
    pub daylight_date: TzSystemTime,
}

/// Decodes a timezone definition blob.
///
/// An empty or structurally invalid blob is "no result".
#[must_use]
pub fn decode_timezone_struct(blob: &[u8]) -> Option<TimeZoneStruct> {
    if blob.is_empty() {
        return None;
    }
    let mut reader = BlobReader::new(blob);
    parse_timezone(&mut reader).ok()
}

fn parse_timezone(r: &mut BlobReader<'_>) -> CodecResult<TimeZoneStruct> {
    Ok(TimeZoneStruct {
        bias: r.read_i32()?,
        standard_bias: r.read_i32()?,
        daylight_bias: r.read_i32()?,
        standard_year: r.read_u16()?,
        standard_date: parse_system_time(r)?,
        daylight_year: r.read_u16()?,
        daylight_date: parse_system_time(r)?,
    })
}

fn parse_system_time(r: &mut BlobReader<'_>) -> CodecResult<TzSystemTime> {
    Ok(TzSystemTime {
        year: r.read_u16()?,
        month: r.read_u16()?,
        day_of_week: r.read_u16()?,
        day: r.read_u16()?,
        hour: r.read_u16()?,
        minute: r.read_u16()?,
        second: r.read_u16()?,
        milliseconds: r.read_u16()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn central_european_blob() -> Vec<u8> {
        let mut blob = Vec::new();
        blob.extend_from_slice(&(-60i32).to_le_bytes()); // UTC+1
        blob.extend_from_slice(&0i32.to_le_bytes());
        blob.extend_from_slice(&(-60i32).to_le_bytes()); // DST adds an hour
        blob.extend_from_slice(&0u16.to_le_bytes()); // recurring standard rule
        for w in [0u16, 10, 0, 5, 3, 0, 0, 0] {
            // last Sunday of October, 03:00
            blob.extend_from_slice(&w.to_le_bytes());
        }
        blob.extend_from_slice(&0u16.to_le_bytes()); // recurring daylight rule
        for w in [0u16, 3, 0, 5, 2, 0, 0, 0] {
            // last Sunday of March, 02:00
            blob.extend_from_slice(&w.to_le_bytes());
        }
        blob
    }

    #[test]
    fn empty_blob_is_no_result() {
        assert!(decode_timezone_struct(&[]).is_none());
    }

    #[test]
    fn fixed_layout_decodes() {
        let tz = decode_timezone_struct(&central_european_blob()).unwrap();
        assert_eq!(tz.bias, -60);
        assert_eq!(tz.daylight_bias, -60);
        assert_eq!(tz.standard_date.month, 10);
        assert_eq!(tz.standard_date.day, 5);
        assert_eq!(tz.standard_date.hour, 3);
        assert_eq!(tz.daylight_date.month, 3);
    }

    #[test]
    fn truncated_blob_is_no_result() {
        let blob = central_european_blob();
        assert!(decode_timezone_struct(&blob[..blob.len() - 1]).is_none());
    }
}
