//! Golden binary vectors for the blob decoders and the wire codec.
//!
//! Hand-assembled little-endian blobs with known decodings, so decoder
//! changes that shift field offsets fail loudly.

use oxmapi_props::blob::GLOBAL_OBJECT_CLASS_ID;

/// A weekly recurrence (every Thursday, end by date) with two deleted
/// and one modified instance.
#[must_use]
pub fn weekly_recurrence_blob() -> Vec<u8> {
    let mut blob = Vec::new();
    blob.extend_from_slice(&0x3004u16.to_le_bytes()); // ReaderVersion
    blob.extend_from_slice(&0x3004u16.to_le_bytes()); // WriterVersion
    blob.extend_from_slice(&0x200Bu16.to_le_bytes()); // weekly
    blob.extend_from_slice(&0x0001u16.to_le_bytes()); // week pattern
    blob.extend_from_slice(&0x0001u16.to_le_bytes()); // gregorian
    blob.extend_from_slice(&0u32.to_le_bytes()); // FirstDateTime
    blob.extend_from_slice(&1u32.to_le_bytes()); // Period
    blob.extend_from_slice(&0u32.to_le_bytes()); // SlidingFlag
    blob.extend_from_slice(&0x0000_0010u32.to_le_bytes()); // Thursday
    blob.extend_from_slice(&0x2021u32.to_le_bytes()); // end by date
    blob.extend_from_slice(&0x0000_000Au32.to_le_bytes()); // OccurrenceCount
    blob.extend_from_slice(&0u32.to_le_bytes()); // FirstDOW
    blob.extend_from_slice(&2u32.to_le_bytes()); // DeletedInstanceCount
    blob.extend_from_slice(&0x00CB_3000u32.to_le_bytes());
    blob.extend_from_slice(&0x00CB_5760u32.to_le_bytes());
    blob.extend_from_slice(&1u32.to_le_bytes()); // ModifiedInstanceCount
    blob.extend_from_slice(&0x00CB_5760u32.to_le_bytes());
    blob.extend_from_slice(&0x00CB_2E20u32.to_le_bytes()); // StartDate
    blob.extend_from_slice(&0x00CC_0E40u32.to_le_bytes()); // EndDate
    blob
}

/// A central-European timezone definition (UTC+1, DST rules).
#[must_use]
pub fn cet_timezone_blob() -> Vec<u8> {
    let mut blob = Vec::new();
    blob.extend_from_slice(&(-60i32).to_le_bytes());
    blob.extend_from_slice(&0i32.to_le_bytes());
    blob.extend_from_slice(&(-60i32).to_le_bytes());
    blob.extend_from_slice(&0u16.to_le_bytes());
    for w in [0u16, 10, 0, 5, 3, 0, 0, 0] {
        blob.extend_from_slice(&w.to_le_bytes());
    }
    blob.extend_from_slice(&0u16.to_le_bytes());
    for w in [0u16, 3, 0, 5, 2, 0, 0, 0] {
        blob.extend_from_slice(&w.to_le_bytes());
    }
    blob
}

/// A global object id for an instance on 2009-07-08 with a 3-byte
/// payload.
#[must_use]
pub fn instance_global_object_id_blob() -> Vec<u8> {
    let mut blob = Vec::new();
    blob.extend_from_slice(&GLOBAL_OBJECT_CLASS_ID);
    blob.extend_from_slice(&[0x07, 0xD9]); // 2009, big-endian
    blob.push(7);
    blob.push(8);
    blob.extend_from_slice(&0x8A5C_D800u32.to_le_bytes()); // creation low
    blob.extend_from_slice(&0x01C9_FF60u32.to_le_bytes()); // creation high
    blob.extend_from_slice(&[0u8; 8]);
    blob.extend_from_slice(&3u32.to_le_bytes());
    blob.extend_from_slice(&[0xAA, 0xBB, 0xCC]);
    blob
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxmapi_props::blob::{
        decode_global_object_id, decode_recurrence_pattern, decode_timezone_struct,
        PatternTypeSpecific,
    };
    use oxmapi_props::FileTime;

    #[test]
    fn weekly_vector_decodes_to_known_fields() {
        let pattern = decode_recurrence_pattern(&weekly_recurrence_blob()).unwrap();
        assert_eq!(pattern.reader_version, 0x3004);
        assert_eq!(pattern.period, 1);
        assert_eq!(
            pattern.specific,
            PatternTypeSpecific::Weekly { day_mask: 0x10 }
        );
        assert_eq!(pattern.deleted_instance_dates.len(), 2);
        assert_eq!(pattern.modified_instance_dates, vec![0x00CB_5760]);
        assert_eq!(pattern.end_date, 0x00CC_0E40);
    }

    #[test]
    fn timezone_vector_decodes_to_known_fields() {
        let tz = decode_timezone_struct(&cet_timezone_blob()).unwrap();
        assert_eq!(tz.bias, -60);
        assert_eq!(tz.standard_date.month, 10);
        assert_eq!(tz.daylight_date.hour, 2);
    }

    #[test]
    fn global_object_id_vector_decodes_to_known_fields() {
        let goid = decode_global_object_id(&instance_global_object_id_blob()).unwrap();
        assert!(goid.has_expected_class_id());
        assert_eq!((goid.year, goid.month, goid.day), (2009, 7, 8));
        assert_eq!(
            goid.creation_time,
            FileTime::new(0x8A5C_D800, 0x01C9_FF60)
        );
        assert_eq!(goid.data, vec![0xAA, 0xBB, 0xCC]);
    }
}
