//! Global object identifier blob decoding.

use super::reader::BlobReader;
use crate::error::{CodecError, CodecResult};
use crate::time::FileTime;

/// The fixed class-identifier prefix every global object id carries.
pub const GLOBAL_OBJECT_CLASS_ID: [u8; 16] = [
    0x04, 0x00, 0x00, 0x00, 0x82, 0x00, 0xE0, 0x00, 0x74, 0xC5, 0xB7, 0x10, 0x1A, 0x82, 0xE0,
    0x08,
];

/// A decoded global object identifier, correlating meeting objects
/// across mailboxes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalObjectId {
    /// The 16-byte class identifier prefix.
    pub class_id: [u8; 16],
    /// Original instance year, zero for the series itself.
    pub year: u16,
    /// Original instance month, zero for the series itself.
    pub month: u8,
    /// Original instance day, zero for the series itself.
    pub day: u8,
    /// When the identifier was created.
    pub creation_time: FileTime,
    /// Trailing payload bytes, owned outright.
    pub data: Vec<u8>,
}

impl GlobalObjectId {
    /// Whether the class identifier matches the well-known prefix.
    #[must_use]
    pub fn has_expected_class_id(&self) -> bool {
        self.class_id == GLOBAL_OBJECT_CLASS_ID
    }
}

/// Decodes a global object identifier blob.
///
/// An empty or structurally invalid blob is "no result".
#[must_use]
pub fn decode_global_object_id(blob: &[u8]) -> Option<GlobalObjectId> {
    if blob.is_empty() {
        return None;
    }
    let mut reader = BlobReader::new(blob);
    parse_global_object_id(&mut reader).ok()
}

fn parse_global_object_id(r: &mut BlobReader<'_>) -> CodecResult<GlobalObjectId> {
    let mut class_id = [0u8; 16];
    class_id.copy_from_slice(r.read_bytes(16)?);

    // The year travels big-endian, unlike everything else in the blob.
    let year_high = r.read_u8()?;
    let year_low = r.read_u8()?;
    let year = (u16::from(year_high) << 8) | u16::from(year_low);
    let month = r.read_u8()?;
    let day = r.read_u8()?;

    let low = r.read_u32()?;
    let high = r.read_u32()?;
    let creation_time = FileTime::new(low, high);

    // Reserved.
    r.skip(8)?;

    let size = r.read_u32()? as usize;
    if size > r.remaining() {
        return Err(CodecError::SizeLimitExceeded {
            claimed: size as u64,
            max_allowed: r.remaining() as u64,
        });
    }
    let data = r.read_bytes(size)?.to_vec();

    Ok(GlobalObjectId {
        class_id,
        year,
        month,
        day,
        creation_time,
        data,
    })
}
