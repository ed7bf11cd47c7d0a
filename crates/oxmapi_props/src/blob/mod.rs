//! Structured decoders for opaque binary properties.
//!
//! Several calendar-related properties travel as binary blobs with
//! fixed little-endian layouts. Each decoder here accepts the raw blob
//! and returns an owned record, or `None` for empty or structurally
//! invalid input — "no result" is a normal outcome, not an error.

mod globalid;
mod reader;
mod recurrence;
mod timezone;

pub use globalid::{decode_global_object_id, GlobalObjectId, GLOBAL_OBJECT_CLASS_ID};
pub use reader::BlobReader;
pub use recurrence::{
    decode_appointment_recurrence_pattern, decode_recurrence_pattern,
    AppointmentRecurrencePattern, ExceptionInfo, PatternTypeSpecific, RecurrencePattern,
};
pub use timezone::{decode_timezone_struct, TimeZoneStruct, TzSystemTime};
