//! Recurrence pattern blob decoding.
//!
//! Appointment recurrence data travels as an opaque binary property.
//! These decoders turn the blob into a self-contained record: the
//! trailing instance-date and exception arrays are copied into the
//! record, so it stays valid after the source blob is gone.

use super::reader::BlobReader;
use crate::error::{CodecError, CodecResult};

/// Pattern-type-specific portion of a recurrence pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternTypeSpecific {
    /// Daily pattern; no extra data.
    Daily,
    /// Weekly pattern: bitmask of weekdays.
    Weekly {
        /// Day-of-week bitmask, Sunday = bit 0.
        day_mask: u32,
    },
    /// Monthly pattern on a fixed day.
    MonthlyDay {
        /// Day of the month, 31 meaning the last day.
        day: u32,
    },
    /// Monthly pattern on the Nth occurrence of given weekdays.
    MonthlyNth {
        /// Day-of-week bitmask.
        day_mask: u32,
        /// Occurrence ordinal, 5 meaning the last occurrence.
        ordinal: u32,
    },
}

/// A decoded recurrence pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrencePattern {
    /// Format reader version.
    pub reader_version: u16,
    /// Format writer version.
    pub writer_version: u16,
    /// Recurrence frequency code (daily/weekly/monthly/yearly).
    pub frequency: u16,
    /// Pattern type code.
    pub pattern_type: u16,
    /// Calendar system code.
    pub calendar_type: u16,
    /// First-date-time offset in minutes.
    pub first_date_time: u32,
    /// Interval between occurrences, in frequency units.
    pub period: u32,
    /// Sliding flag for task recurrences.
    pub sliding_flag: u32,
    /// Pattern-type-specific data.
    pub specific: PatternTypeSpecific,
    /// End type code (by date, by count, never).
    pub end_type: u32,
    /// Occurrence count, meaningful for count-terminated patterns.
    pub occurrence_count: u32,
    /// First day of the week, Sunday = 0.
    pub first_day_of_week: u32,
    /// Deleted instance start dates, in minutes since 1601.
    pub deleted_instance_dates: Vec<u32>,
    /// Modified instance start dates, in minutes since 1601.
    pub modified_instance_dates: Vec<u32>,
    /// Pattern start date in minutes since 1601.
    pub start_date: u32,
    /// Pattern end date in minutes since 1601.
    pub end_date: u32,
}

/// One overridden occurrence of a recurring appointment.
///
/// Optional fields are present only when the corresponding override
/// flag bit is set in the blob.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExceptionInfo {
    /// Occurrence start, in minutes since 1601.
    pub start_date_time: u32,
    /// Occurrence end, in minutes since 1601.
    pub end_date_time: u32,
    /// Original occurrence start, in minutes since 1601.
    pub original_start_date: u32,
    /// Bitmask of overridden fields.
    pub override_flags: u16,
    /// Overridden subject.
    pub subject: Option<String>,
    /// Overridden meeting type.
    pub meeting_type: Option<u32>,
    /// Overridden reminder lead time in minutes.
    pub reminder_delta: Option<u32>,
    /// Overridden reminder-set flag.
    pub reminder_set: Option<u32>,
    /// Overridden location.
    pub location: Option<String>,
    /// Overridden busy status.
    pub busy_status: Option<u32>,
    /// Overridden has-attachment flag.
    pub attachment: Option<u32>,
    /// Overridden all-day flag.
    pub sub_type: Option<u32>,
    /// Overridden appointment color.
    pub appointment_color: Option<u32>,
}

/// Override flag bits for [`ExceptionInfo`].
mod override_flag {
    pub const SUBJECT: u16 = 0x0001;
    pub const MEETING_TYPE: u16 = 0x0002;
    pub const REMINDER_DELTA: u16 = 0x0004;
    pub const REMINDER_SET: u16 = 0x0008;
    pub const LOCATION: u16 = 0x0010;
    pub const BUSY_STATUS: u16 = 0x0020;
    pub const ATTACHMENT: u16 = 0x0040;
    pub const SUB_TYPE: u16 = 0x0080;
    pub const APPOINTMENT_COLOR: u16 = 0x0100;
}

/// A decoded appointment recurrence pattern: the base pattern plus
/// per-appointment timing and exception records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentRecurrencePattern {
    /// The embedded base pattern.
    pub pattern: RecurrencePattern,
    /// Format reader version of the appointment extension.
    pub reader_version2: u32,
    /// Format writer version of the appointment extension.
    pub writer_version2: u32,
    /// Occurrence start offset in minutes past midnight.
    pub start_time_offset: u32,
    /// Occurrence end offset in minutes past midnight.
    pub end_time_offset: u32,
    /// Exception records, owned outright.
    pub exceptions: Vec<ExceptionInfo>,
}

/// Decodes a recurrence pattern blob.
///
/// An empty blob is "no result", a normal outcome; so is any
/// structurally invalid blob — nothing partial is ever returned.
#[must_use]
pub fn decode_recurrence_pattern(blob: &[u8]) -> Option<RecurrencePattern> {
    if blob.is_empty() {
        return None;
    }
    let mut reader = BlobReader::new(blob);
    parse_pattern(&mut reader).ok()
}

/// Decodes an appointment recurrence pattern blob.
///
/// Same contract as [`decode_recurrence_pattern`]. Extended exception
/// data past the reserved block is not decoded.
#[must_use]
pub fn decode_appointment_recurrence_pattern(blob: &[u8]) -> Option<AppointmentRecurrencePattern> {
    if blob.is_empty() {
        return None;
    }
    let mut reader = BlobReader::new(blob);
    parse_appointment_pattern(&mut reader).ok()
}

fn parse_pattern(r: &mut BlobReader<'_>) -> CodecResult<RecurrencePattern> {
    let reader_version = r.read_u16()?;
    let writer_version = r.read_u16()?;
    let frequency = r.read_u16()?;
    let pattern_type = r.read_u16()?;
    let calendar_type = r.read_u16()?;
    let first_date_time = r.read_u32()?;
    let period = r.read_u32()?;
    let sliding_flag = r.read_u32()?;

    let specific = match pattern_type {
        0x0000 => PatternTypeSpecific::Daily,
        0x0001 => PatternTypeSpecific::Weekly {
            day_mask: r.read_u32()?,
        },
        0x0002 | 0x0004 | 0x000A | 0x000C => PatternTypeSpecific::MonthlyDay {
            day: r.read_u32()?,
        },
        0x0003 | 0x000B => PatternTypeSpecific::MonthlyNth {
            day_mask: r.read_u32()?,
            ordinal: r.read_u32()?,
        },
        other => {
            return Err(CodecError::invalid_parameter(format!(
                "unknown recurrence pattern type 0x{other:04x}"
            )))
        }
    };

    let end_type = r.read_u32()?;
    let occurrence_count = r.read_u32()?;
    let first_day_of_week = r.read_u32()?;

    let deleted_count = r.read_u32()? as usize;
    let deleted_instance_dates = r.read_u32_array(deleted_count)?;
    let modified_count = r.read_u32()? as usize;
    let modified_instance_dates = r.read_u32_array(modified_count)?;

    let start_date = r.read_u32()?;
    let end_date = r.read_u32()?;

    Ok(RecurrencePattern {
        reader_version,
        writer_version,
        frequency,
        pattern_type,
        calendar_type,
        first_date_time,
        period,
        sliding_flag,
        specific,
        end_type,
        occurrence_count,
        first_day_of_week,
        deleted_instance_dates,
        modified_instance_dates,
        start_date,
        end_date,
    })
}

fn parse_appointment_pattern(
    r: &mut BlobReader<'_>,
) -> CodecResult<AppointmentRecurrencePattern> {
    let pattern = parse_pattern(r)?;
    let reader_version2 = r.read_u32()?;
    let writer_version2 = r.read_u32()?;
    let start_time_offset = r.read_u32()?;
    let end_time_offset = r.read_u32()?;

    let exception_count = usize::from(r.read_u16()?);
    // Each exception is at least the three date words plus the flags.
    if exception_count > r.remaining() / 14 {
        return Err(CodecError::SizeLimitExceeded {
            claimed: exception_count as u64,
            max_allowed: (r.remaining() / 14) as u64,
        });
    }
    let mut exceptions = Vec::with_capacity(exception_count);
    for _ in 0..exception_count {
        exceptions.push(parse_exception(r)?);
    }

    Ok(AppointmentRecurrencePattern {
        pattern,
        reader_version2,
        writer_version2,
        start_time_offset,
        end_time_offset,
        exceptions,
    })
}

fn parse_exception(r: &mut BlobReader<'_>) -> CodecResult<ExceptionInfo> {
    let mut exception = ExceptionInfo {
        start_date_time: r.read_u32()?,
        end_date_time: r.read_u32()?,
        original_start_date: r.read_u32()?,
        override_flags: r.read_u16()?,
        ..ExceptionInfo::default()
    };
    let flags = exception.override_flags;

    if flags & override_flag::SUBJECT != 0 {
        exception.subject = Some(parse_exception_string(r)?);
    }
    if flags & override_flag::MEETING_TYPE != 0 {
        exception.meeting_type = Some(r.read_u32()?);
    }
    if flags & override_flag::REMINDER_DELTA != 0 {
        exception.reminder_delta = Some(r.read_u32()?);
    }
    if flags & override_flag::REMINDER_SET != 0 {
        exception.reminder_set = Some(r.read_u32()?);
    }
    if flags & override_flag::LOCATION != 0 {
        exception.location = Some(parse_exception_string(r)?);
    }
    if flags & override_flag::BUSY_STATUS != 0 {
        exception.busy_status = Some(r.read_u32()?);
    }
    if flags & override_flag::ATTACHMENT != 0 {
        exception.attachment = Some(r.read_u32()?);
    }
    if flags & override_flag::SUB_TYPE != 0 {
        exception.sub_type = Some(r.read_u32()?);
    }
    if flags & override_flag::APPOINTMENT_COLOR != 0 {
        exception.appointment_color = Some(r.read_u32()?);
    }

    Ok(exception)
}

/// Exception strings carry two length words: the character count plus
/// one, then the character count, then the narrow characters.
fn parse_exception_string(r: &mut BlobReader<'_>) -> CodecResult<String> {
    let len_plus_one = usize::from(r.read_u16()?);
    let len = usize::from(r.read_u16()?);
    if len_plus_one != len + 1 {
        return Err(CodecError::invalid_parameter(
            "exception string length words disagree",
        ));
    }
    let bytes = r.read_bytes(len)?;
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| CodecError::InvalidUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weekly_pattern_blob(deleted: &[u32], modified: &[u32]) -> Vec<u8> {
        let mut blob = Vec::new();
        blob.extend_from_slice(&0x3004u16.to_le_bytes()); // reader version
        blob.extend_from_slice(&0x3004u16.to_le_bytes()); // writer version
        blob.extend_from_slice(&0x200Bu16.to_le_bytes()); // weekly frequency
        blob.extend_from_slice(&0x0001u16.to_le_bytes()); // weekly pattern
        blob.extend_from_slice(&0x0001u16.to_le_bytes()); // gregorian
        blob.extend_from_slice(&0u32.to_le_bytes()); // first date time
        blob.extend_from_slice(&1u32.to_le_bytes()); // period
        blob.extend_from_slice(&0u32.to_le_bytes()); // sliding flag
        blob.extend_from_slice(&0x0000_0010u32.to_le_bytes()); // thursdays
        blob.extend_from_slice(&0x2021u32.to_le_bytes()); // end by date
        blob.extend_from_slice(&10u32.to_le_bytes()); // occurrence count
        blob.extend_from_slice(&0u32.to_le_bytes()); // first dow
        blob.extend_from_slice(&(deleted.len() as u32).to_le_bytes());
        for d in deleted {
            blob.extend_from_slice(&d.to_le_bytes());
        }
        blob.extend_from_slice(&(modified.len() as u32).to_le_bytes());
        for m in modified {
            blob.extend_from_slice(&m.to_le_bytes());
        }
        blob.extend_from_slice(&0x00CB_2E20u32.to_le_bytes()); // start date
        blob.extend_from_slice(&0x00CC_0E40u32.to_le_bytes()); // end date
        blob
    }

    #[test]
    fn empty_blob_is_no_result() {
        assert!(decode_recurrence_pattern(&[]).is_none());
        assert!(decode_appointment_recurrence_pattern(&[]).is_none());
    }

    #[test]
    fn weekly_pattern_decodes() {
        let blob = weekly_pattern_blob(&[100, 200], &[200]);
        let pattern = decode_recurrence_pattern(&blob).unwrap();
        assert_eq!(pattern.frequency, 0x200B);
        assert_eq!(
            pattern.specific,
            PatternTypeSpecific::Weekly { day_mask: 0x10 }
        );
        assert_eq!(pattern.deleted_instance_dates, vec![100, 200]);
        assert_eq!(pattern.modified_instance_dates, vec![200]);
        assert_eq!(pattern.start_date, 0x00CB_2E20);
    }

    #[test]
    fn instance_dates_are_owned_copies() {
        let blob = weekly_pattern_blob(&[1, 2, 3], &[]);
        let pattern = decode_recurrence_pattern(&blob).unwrap();
        drop(blob);
        assert_eq!(pattern.deleted_instance_dates, vec![1, 2, 3]);
    }

    #[test]
    fn truncated_blob_is_no_result() {
        let blob = weekly_pattern_blob(&[], &[]);
        assert!(decode_recurrence_pattern(&blob[..10]).is_none());
    }

    #[test]
    fn hostile_instance_count_is_no_result() {
        let mut blob = weekly_pattern_blob(&[], &[]);
        // Overwrite the deleted-instance count (offset 38) with a huge value.
        blob[38..42].copy_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
        assert!(decode_recurrence_pattern(&blob).is_none());
    }

    #[test]
    fn unknown_pattern_type_is_no_result() {
        let mut blob = weekly_pattern_blob(&[], &[]);
        blob[6..8].copy_from_slice(&0x00FFu16.to_le_bytes());
        assert!(decode_recurrence_pattern(&blob).is_none());
    }

    fn appointment_blob(exception_flags: u16) -> Vec<u8> {
        let mut blob = weekly_pattern_blob(&[], &[50_000]);
        blob.extend_from_slice(&0x3006u32.to_le_bytes()); // reader version 2
        blob.extend_from_slice(&0x3008u32.to_le_bytes()); // writer version 2
        blob.extend_from_slice(&540u32.to_le_bytes()); // 09:00
        blob.extend_from_slice(&600u32.to_le_bytes()); // 10:00
        blob.extend_from_slice(&1u16.to_le_bytes()); // one exception
        blob.extend_from_slice(&50_100u32.to_le_bytes()); // start
        blob.extend_from_slice(&50_160u32.to_le_bytes()); // end
        blob.extend_from_slice(&50_000u32.to_le_bytes()); // original start
        blob.extend_from_slice(&exception_flags.to_le_bytes());
        if exception_flags & override_flag::SUBJECT != 0 {
            blob.extend_from_slice(&6u16.to_le_bytes());
            blob.extend_from_slice(&5u16.to_le_bytes());
            blob.extend_from_slice(b"Moved");
        }
        if exception_flags & override_flag::BUSY_STATUS != 0 {
            blob.extend_from_slice(&2u32.to_le_bytes());
        }
        blob
    }

    #[test]
    fn appointment_pattern_with_overridden_subject() {
        let blob = appointment_blob(override_flag::SUBJECT | override_flag::BUSY_STATUS);
        let arp = decode_appointment_recurrence_pattern(&blob).unwrap();
        assert_eq!(arp.start_time_offset, 540);
        assert_eq!(arp.exceptions.len(), 1);

        let exc = &arp.exceptions[0];
        assert_eq!(exc.original_start_date, 50_000);
        assert_eq!(exc.subject.as_deref(), Some("Moved"));
        assert_eq!(exc.busy_status, Some(2));
        assert_eq!(exc.location, None);
    }

    #[test]
    fn appointment_pattern_without_overrides() {
        let blob = appointment_blob(0);
        let arp = decode_appointment_recurrence_pattern(&blob).unwrap();
        assert_eq!(arp.exceptions[0].subject, None);
    }

    #[test]
    fn disagreeing_exception_length_words_are_no_result() {
        let mut blob = appointment_blob(override_flag::SUBJECT);
        let len = blob.len();
        // The two length words live just before the 5 subject bytes.
        blob[len - 9..len - 7].copy_from_slice(&9u16.to_le_bytes());
        assert!(decode_appointment_recurrence_pattern(&blob).is_none());
    }
}
