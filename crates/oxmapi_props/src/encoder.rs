//! Wire-form encoding of property values.
//!
//! The wire form is little-endian and unaligned: fixed scalars at their
//! exact widths, strings null-terminated, binary values behind a 16-bit
//! length prefix, multi-value sequences behind a 32-bit element count.

use bytes::{BufMut, Bytes, BytesMut};
use uuid::Uuid;

use crate::error::{CodecError, CodecResult};
use crate::tag::PropType;
use crate::text::utf16_wire_len_str;
use crate::time::FileTime;
use crate::value::PropertyValue;

/// Largest length a 16-bit-prefixed binary value can carry.
const MAX_BINARY_LEN: usize = u16::MAX as usize;

/// Computes the exact number of bytes a value occupies on the wire.
///
/// # Errors
///
/// Returns [`CodecError::UnsupportedType`] for values that cannot cross
/// the wire (object references) and [`CodecError::SizeLimitExceeded`]
/// when a binary element exceeds its 16-bit length prefix.
pub fn wire_size(value: &PropertyValue) -> CodecResult<u32> {
    let size = match value {
        PropertyValue::Null => 0,
        PropertyValue::Boolean(_) => 1,
        PropertyValue::Short(_) => 2,
        PropertyValue::Long(_) | PropertyValue::ErrorCode(_) => 4,
        PropertyValue::Double(_) | PropertyValue::I8(_) | PropertyValue::SysTime(_) => 8,
        PropertyValue::Guid(_) => 16,
        PropertyValue::String8(s) => s.len() + 1,
        PropertyValue::Unicode(s) => utf16_wire_len_str(s),
        PropertyValue::Binary(b) | PropertyValue::ServerId(b) => binary_size(b)?,
        PropertyValue::Object(_) => {
            return Err(CodecError::unsupported_type(PropType::Object.code()))
        }
        PropertyValue::MvShort(v) => 4 + v.len() * 2,
        PropertyValue::MvLong(v) => 4 + v.len() * 4,
        PropertyValue::MvSysTime(v) => 4 + v.len() * 8,
        PropertyValue::MvGuid(v) => 4 + v.len() * 16,
        PropertyValue::MvString8(v) => 4 + v.iter().map(|s| s.len() + 1).sum::<usize>(),
        PropertyValue::MvUnicode(v) => {
            4 + v.iter().map(|s| utf16_wire_len_str(s)).sum::<usize>()
        }
        PropertyValue::MvBinary(v) => {
            let mut total = 4usize;
            for b in v {
                total += binary_size(b)?;
            }
            total
        }
    };
    u32::try_from(size).map_err(|_| CodecError::SizeLimitExceeded {
        claimed: size as u64,
        max_allowed: u64::from(u32::MAX),
    })
}

fn binary_size(b: &[u8]) -> CodecResult<usize> {
    if b.len() > MAX_BINARY_LEN {
        return Err(CodecError::SizeLimitExceeded {
            claimed: b.len() as u64,
            max_allowed: MAX_BINARY_LEN as u64,
        });
    }
    Ok(b.len() + 2)
}

/// Encodes a value to its wire form.
///
/// # Errors
///
/// Same conditions as [`wire_size`].
pub fn to_wire(value: &PropertyValue) -> CodecResult<Bytes> {
    let mut encoder = WireEncoder::new();
    encoder.encode(value)?;
    Ok(encoder.into_bytes())
}

/// An appending wire-form encoder.
///
/// Multi-value elements are deep-copied into the buffer; nothing in the
/// output aliases the source value.
#[derive(Debug, Default)]
pub struct WireEncoder {
    buf: BytesMut,
}

impl WireEncoder {
    /// Creates an empty encoder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: BytesMut::new(),
        }
    }

    /// Creates an encoder with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Appends a value's wire form, returning the number of bytes
    /// written. The count always equals [`wire_size`] for the value.
    ///
    /// # Errors
    ///
    /// Same conditions as [`wire_size`].
    pub fn encode(&mut self, value: &PropertyValue) -> CodecResult<u32> {
        // Reject oversized elements before any partial write lands.
        let size = wire_size(value)?;

        match value {
            PropertyValue::Null => {}
            PropertyValue::Boolean(b) => self.buf.put_u8(u8::from(*b)),
            PropertyValue::Short(n) => self.buf.put_u16_le(*n),
            PropertyValue::Long(n) | PropertyValue::ErrorCode(n) => {
                self.buf.put_u32_le(*n);
            }
            PropertyValue::Object(_) => {
                return Err(CodecError::unsupported_type(PropType::Object.code()))
            }
            PropertyValue::Double(d) => self.buf.put_f64_le(*d),
            PropertyValue::I8(n) => self.buf.put_u64_le(*n),
            PropertyValue::SysTime(ft) => self.put_filetime(*ft),
            PropertyValue::Guid(g) => self.put_guid(*g),
            PropertyValue::String8(s) => self.put_cstring(s),
            PropertyValue::Unicode(s) => self.put_wstring(s),
            PropertyValue::Binary(b) | PropertyValue::ServerId(b) => self.put_binary(b),
            PropertyValue::MvShort(v) => {
                self.buf.put_u32_le(v.len() as u32);
                for n in v {
                    self.buf.put_u16_le(*n);
                }
            }
            PropertyValue::MvLong(v) => {
                self.buf.put_u32_le(v.len() as u32);
                for n in v {
                    self.buf.put_u32_le(*n);
                }
            }
            PropertyValue::MvSysTime(v) => {
                self.buf.put_u32_le(v.len() as u32);
                for ft in v {
                    self.put_filetime(*ft);
                }
            }
            PropertyValue::MvGuid(v) => {
                self.buf.put_u32_le(v.len() as u32);
                for g in v {
                    self.put_guid(*g);
                }
            }
            PropertyValue::MvString8(v) => {
                self.buf.put_u32_le(v.len() as u32);
                for s in v {
                    self.put_cstring(s);
                }
            }
            PropertyValue::MvUnicode(v) => {
                self.buf.put_u32_le(v.len() as u32);
                for s in v {
                    self.put_wstring(s);
                }
            }
            PropertyValue::MvBinary(v) => {
                self.buf.put_u32_le(v.len() as u32);
                for b in v {
                    self.put_binary(b);
                }
            }
        }

        Ok(size)
    }

    /// Total bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consumes the encoder and returns the encoded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }

    /// The encoded bytes so far.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    fn put_filetime(&mut self, ft: FileTime) {
        self.buf.put_u32_le(ft.low);
        self.buf.put_u32_le(ft.high);
    }

    fn put_guid(&mut self, guid: Uuid) {
        // Little-endian field layout, not a byte-for-byte copy of the
        // canonical form.
        self.buf.put_slice(&guid.to_bytes_le());
    }

    fn put_cstring(&mut self, s: &str) {
        self.buf.put_slice(s.as_bytes());
        self.buf.put_u8(0);
    }

    fn put_wstring(&mut self, s: &str) {
        for unit in s.encode_utf16() {
            self.buf.put_u16_le(unit);
        }
        self.buf.put_u16_le(0);
    }

    fn put_binary(&mut self, b: &[u8]) {
        self.buf.put_u16_le(b.len() as u16);
        self.buf.put_slice(b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_scalar_sizes_match_the_documented_table() {
        assert_eq!(wire_size(&PropertyValue::Null).unwrap(), 0);
        assert_eq!(wire_size(&PropertyValue::Boolean(true)).unwrap(), 1);
        assert_eq!(wire_size(&PropertyValue::Short(1)).unwrap(), 2);
        assert_eq!(wire_size(&PropertyValue::Long(1)).unwrap(), 4);
        assert_eq!(wire_size(&PropertyValue::ErrorCode(1)).unwrap(), 4);
        assert_eq!(wire_size(&PropertyValue::Double(1.0)).unwrap(), 8);
        assert_eq!(wire_size(&PropertyValue::I8(1)).unwrap(), 8);
        assert_eq!(
            wire_size(&PropertyValue::SysTime(FileTime::from_ticks(1))).unwrap(),
            8
        );
        assert_eq!(wire_size(&PropertyValue::Guid(Uuid::nil())).unwrap(), 16);
    }

    #[test]
    fn variable_sizes_match_the_documented_table() {
        assert_eq!(wire_size(&PropertyValue::String8("Alice".into())).unwrap(), 6);
        assert_eq!(wire_size(&PropertyValue::Unicode("Alice".into())).unwrap(), 12);
        assert_eq!(wire_size(&PropertyValue::Binary(vec![1, 2, 3])).unwrap(), 5);
        assert_eq!(wire_size(&PropertyValue::Binary(vec![])).unwrap(), 2);
    }

    #[test]
    fn multi_value_sizes_include_the_count_prefix() {
        assert_eq!(wire_size(&PropertyValue::MvLong(vec![1, 2])).unwrap(), 12);
        assert_eq!(
            wire_size(&PropertyValue::MvString8(vec!["ab".into(), "c".into()])).unwrap(),
            4 + 3 + 2
        );
        assert_eq!(
            wire_size(&PropertyValue::MvBinary(vec![vec![1], vec![2, 3]])).unwrap(),
            4 + 3 + 4
        );
        assert_eq!(wire_size(&PropertyValue::MvShort(vec![])).unwrap(), 4);
    }

    #[test]
    fn encode_reports_the_same_size_it_writes() {
        let values = [
            PropertyValue::Boolean(true),
            PropertyValue::Long(0xDEAD_BEEF),
            PropertyValue::String8("hello".into()),
            PropertyValue::Unicode("héllo".into()),
            PropertyValue::Binary(vec![0, 1, 2, 3]),
            PropertyValue::MvLong(vec![1, 2, 3]),
            PropertyValue::MvUnicode(vec!["a".into(), "😀".into()]),
        ];
        for value in &values {
            let mut enc = WireEncoder::new();
            let reported = enc.encode(value).unwrap();
            assert_eq!(reported as usize, enc.len(), "size mismatch for {value:?}");
            assert_eq!(reported, wire_size(value).unwrap());
        }
    }

    #[test]
    fn scalars_are_little_endian() {
        assert_eq!(to_wire(&PropertyValue::Short(0x0102)).unwrap().as_ref(), &[0x02, 0x01]);
        assert_eq!(
            to_wire(&PropertyValue::Long(0x0102_0304)).unwrap().as_ref(),
            &[0x04, 0x03, 0x02, 0x01]
        );
    }

    #[test]
    fn strings_carry_their_terminators() {
        assert_eq!(to_wire(&PropertyValue::String8("ab".into())).unwrap().as_ref(), b"ab\0");
        assert_eq!(
            to_wire(&PropertyValue::Unicode("ab".into())).unwrap().as_ref(),
            &[b'a', 0, b'b', 0, 0, 0]
        );
    }

    #[test]
    fn binary_has_a_16_bit_length_prefix() {
        assert_eq!(
            to_wire(&PropertyValue::Binary(vec![9, 8])).unwrap().as_ref(),
            &[0x02, 0x00, 9, 8]
        );
    }

    #[test]
    fn filetime_words_are_low_then_high() {
        let ft = FileTime::new(0x0102_0304, 0x0506_0708);
        assert_eq!(
            to_wire(&PropertyValue::SysTime(ft)).unwrap().as_ref(),
            &[0x04, 0x03, 0x02, 0x01, 0x08, 0x07, 0x06, 0x05]
        );
    }

    #[test]
    fn guid_uses_the_little_endian_field_transform() {
        let guid = Uuid::parse_str("00112233-4455-6677-8899-aabbccddeeff").unwrap();
        let wire = to_wire(&PropertyValue::Guid(guid)).unwrap();
        // First three fields are byte-swapped, the trailing eight copied.
        assert_eq!(
            wire.as_ref(),
            &[
                0x33, 0x22, 0x11, 0x00, 0x55, 0x44, 0x77, 0x66, 0x88, 0x99, 0xAA, 0xBB, 0xCC,
                0xDD, 0xEE, 0xFF
            ]
        );
    }

    #[test]
    fn object_references_never_cross_the_wire() {
        assert!(matches!(
            wire_size(&PropertyValue::Object(1)),
            Err(CodecError::UnsupportedType { .. })
        ));
        let mut enc = WireEncoder::new();
        assert!(enc.encode(&PropertyValue::Object(1)).is_err());
        assert!(enc.is_empty());
    }

    #[test]
    fn oversized_binary_is_rejected_before_writing() {
        let big = PropertyValue::Binary(vec![0u8; MAX_BINARY_LEN + 1]);
        let mut enc = WireEncoder::new();
        assert!(matches!(
            enc.encode(&big),
            Err(CodecError::SizeLimitExceeded { .. })
        ));
        assert!(enc.is_empty());
    }
}
