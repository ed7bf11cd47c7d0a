//! Wire-form decoding of property values.

use uuid::Uuid;

use crate::error::{CodecError, CodecResult};
use crate::tag::{PropType, PropertyTag};
use crate::time::FileTime;
use crate::value::{Property, PropertyValue};

/// Decodes one value of the given type from a buffer, requiring the
/// buffer to be fully consumed.
///
/// # Errors
///
/// Returns [`CodecError::TrailingInput`] if bytes remain after the
/// value, plus any error [`WireDecoder::decode`] can produce.
pub fn from_wire(ptype: PropType, data: &[u8]) -> CodecResult<PropertyValue> {
    let mut decoder = WireDecoder::new(data);
    let value = decoder.decode(ptype)?;
    if !decoder.is_empty() {
        return Err(CodecError::TrailingInput);
    }
    Ok(value)
}

/// Decodes a full property from a tag and its wire payload.
///
/// Callers that must keep going on bad input can substitute
/// [`Property::write_failed`] for the failed entry.
///
/// # Errors
///
/// [`CodecError::UnsupportedType`] for an unknown tag type code, plus
/// any error [`from_wire`] can produce.
pub fn from_wire_tagged(tag: PropertyTag, data: &[u8]) -> CodecResult<Property> {
    let ptype = tag.prop_type()?;
    let value = from_wire(ptype, data)?;
    Property::with_tag(tag, value)
}

/// A bounds-checked wire-form decoder.
///
/// Every multi-value element is copied out of the input; decoded values
/// never alias the source buffer.
pub struct WireDecoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> WireDecoder<'a> {
    /// Creates a decoder over the given bytes.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Whether all input has been consumed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Bytes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Decodes the next value as the given type.
    ///
    /// # Errors
    ///
    /// - [`CodecError::UnsupportedType`] for type codes a value cannot
    ///   be decoded as (including object references).
    /// - [`CodecError::UnexpectedEof`] on truncated input.
    /// - [`CodecError::InvalidUtf8`] / [`CodecError::InvalidUtf16`] on
    ///   malformed string payloads.
    /// - [`CodecError::SizeLimitExceeded`] when a declared element count
    ///   exceeds what the remaining input can hold.
    pub fn decode(&mut self, ptype: PropType) -> CodecResult<PropertyValue> {
        match ptype {
            PropType::Null => Ok(PropertyValue::Null),
            PropType::Boolean => Ok(PropertyValue::Boolean(self.read_u8()? != 0)),
            PropType::Short => Ok(PropertyValue::Short(self.read_u16()?)),
            PropType::Long => Ok(PropertyValue::Long(self.read_u32()?)),
            PropType::Error => Ok(PropertyValue::ErrorCode(self.read_u32()?)),
            PropType::Double => Ok(PropertyValue::Double(f64::from_bits(self.read_u64()?))),
            PropType::I8 => Ok(PropertyValue::I8(self.read_u64()?)),
            PropType::SysTime => Ok(PropertyValue::SysTime(self.read_filetime()?)),
            PropType::Guid => Ok(PropertyValue::Guid(self.read_guid()?)),
            PropType::String8 => Ok(PropertyValue::String8(self.read_cstring()?)),
            PropType::Unicode => Ok(PropertyValue::Unicode(self.read_wstring()?)),
            PropType::Binary => Ok(PropertyValue::Binary(self.read_binary()?)),
            PropType::ServerId => Ok(PropertyValue::ServerId(self.read_binary()?)),
            PropType::MvShort => {
                let count = self.read_count(2)?;
                let mut out = Vec::with_capacity(count);
                for _ in 0..count {
                    out.push(self.read_u16()?);
                }
                Ok(PropertyValue::MvShort(out))
            }
            PropType::MvLong => {
                let count = self.read_count(4)?;
                let mut out = Vec::with_capacity(count);
                for _ in 0..count {
                    out.push(self.read_u32()?);
                }
                Ok(PropertyValue::MvLong(out))
            }
            PropType::MvSysTime => {
                let count = self.read_count(8)?;
                let mut out = Vec::with_capacity(count);
                for _ in 0..count {
                    out.push(self.read_filetime()?);
                }
                Ok(PropertyValue::MvSysTime(out))
            }
            PropType::MvGuid => {
                let count = self.read_count(16)?;
                let mut out = Vec::with_capacity(count);
                for _ in 0..count {
                    out.push(self.read_guid()?);
                }
                Ok(PropertyValue::MvGuid(out))
            }
            PropType::MvString8 => {
                let count = self.read_count(1)?;
                let mut out = Vec::with_capacity(count);
                for _ in 0..count {
                    out.push(self.read_cstring()?);
                }
                Ok(PropertyValue::MvString8(out))
            }
            PropType::MvUnicode => {
                let count = self.read_count(2)?;
                let mut out = Vec::with_capacity(count);
                for _ in 0..count {
                    out.push(self.read_wstring()?);
                }
                Ok(PropertyValue::MvUnicode(out))
            }
            PropType::MvBinary => {
                let count = self.read_count(2)?;
                let mut out = Vec::with_capacity(count);
                for _ in 0..count {
                    out.push(self.read_binary()?);
                }
                Ok(PropertyValue::MvBinary(out))
            }
            PropType::Unspecified | PropType::Object => {
                Err(CodecError::unsupported_type(ptype.code()))
            }
        }
    }

    #[inline]
    fn read_u8(&mut self) -> CodecResult<u8> {
        if self.pos >= self.data.len() {
            return Err(CodecError::UnexpectedEof);
        }
        let byte = self.data[self.pos];
        self.pos += 1;
        Ok(byte)
    }

    #[inline]
    fn read_bytes(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        if self.pos + len > self.data.len() {
            return Err(CodecError::UnexpectedEof);
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    #[inline]
    fn read_u16(&mut self) -> CodecResult<u16> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    #[inline]
    fn read_u32(&mut self) -> CodecResult<u32> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    #[inline]
    fn read_u64(&mut self) -> CodecResult<u64> {
        let b = self.read_bytes(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    fn read_filetime(&mut self) -> CodecResult<FileTime> {
        let low = self.read_u32()?;
        let high = self.read_u32()?;
        Ok(FileTime::new(low, high))
    }

    fn read_guid(&mut self) -> CodecResult<Uuid> {
        let bytes = self.read_bytes(16)?;
        let mut arr = [0u8; 16];
        arr.copy_from_slice(bytes);
        Ok(Uuid::from_bytes_le(arr))
    }

    fn read_cstring(&mut self) -> CodecResult<String> {
        let rest = &self.data[self.pos..];
        let nul = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(CodecError::UnexpectedEof)?;
        let s = std::str::from_utf8(&rest[..nul]).map_err(|_| CodecError::InvalidUtf8)?;
        self.pos += nul + 1;
        Ok(s.to_string())
    }

    fn read_wstring(&mut self) -> CodecResult<String> {
        let mut units = Vec::new();
        loop {
            let unit = self.read_u16()?;
            if unit == 0 {
                break;
            }
            units.push(unit);
        }
        String::from_utf16(&units).map_err(|_| CodecError::InvalidUtf16)
    }

    fn read_binary(&mut self) -> CodecResult<Vec<u8>> {
        let len = usize::from(self.read_u16()?);
        Ok(self.read_bytes(len)?.to_vec())
    }

    /// Reads a 32-bit element count and validates it against the
    /// remaining input, so a hostile count cannot drive allocation.
    fn read_count(&mut self, min_element_size: usize) -> CodecResult<usize> {
        let count = self.read_u32()? as usize;
        let max_allowed = self.remaining() / min_element_size;
        if count > max_allowed {
            return Err(CodecError::SizeLimitExceeded {
                claimed: count as u64,
                max_allowed: max_allowed as u64,
            });
        }
        Ok(count)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::encoder::{to_wire, wire_size};
    use proptest::prelude::*;

    fn fixed_scalar_strategy() -> impl Strategy<Value = PropertyValue> {
        prop_oneof![
            Just(PropertyValue::Null),
            any::<bool>().prop_map(PropertyValue::Boolean),
            any::<u16>().prop_map(PropertyValue::Short),
            any::<u32>().prop_map(PropertyValue::Long),
            any::<u32>().prop_map(PropertyValue::ErrorCode),
            any::<u64>().prop_map(PropertyValue::I8),
            any::<u64>().prop_map(|t| PropertyValue::SysTime(FileTime::from_ticks(t))),
            prop::array::uniform16(any::<u8>())
                .prop_map(|b| PropertyValue::Guid(Uuid::from_bytes(b))),
        ]
    }

    fn variable_scalar_strategy() -> impl Strategy<Value = PropertyValue> {
        prop_oneof![
            "[a-zA-Z0-9 ]{0,32}".prop_map(PropertyValue::String8),
            "\\PC{0,16}".prop_map(PropertyValue::Unicode),
            prop::collection::vec(any::<u8>(), 0..256).prop_map(PropertyValue::Binary),
        ]
    }

    fn multi_value_strategy() -> impl Strategy<Value = PropertyValue> {
        prop_oneof![
            prop::collection::vec(any::<u16>(), 0..16).prop_map(PropertyValue::MvShort),
            prop::collection::vec(any::<u32>(), 0..16).prop_map(PropertyValue::MvLong),
            prop::collection::vec("[a-z]{0,8}", 0..8).prop_map(PropertyValue::MvString8),
            prop::collection::vec("\\PC{0,8}", 0..8).prop_map(PropertyValue::MvUnicode),
            prop::collection::vec(prop::collection::vec(any::<u8>(), 0..32), 0..8)
                .prop_map(PropertyValue::MvBinary),
        ]
    }

    fn value_strategy() -> impl Strategy<Value = PropertyValue> {
        prop_oneof![
            fixed_scalar_strategy(),
            variable_scalar_strategy(),
            multi_value_strategy(),
        ]
    }

    proptest! {
        #[test]
        fn wire_round_trip_preserves_value_and_size(value in value_strategy()) {
            let wire = to_wire(&value).unwrap();
            prop_assert_eq!(wire.len() as u32, wire_size(&value).unwrap());
            let decoded = from_wire(value.prop_type(), &wire).unwrap();
            prop_assert_eq!(decoded, value);
        }

        #[test]
        fn truncated_wire_never_panics(value in value_strategy(), cut in 0usize..8) {
            let wire = to_wire(&value).unwrap();
            if wire.len() >= cut && cut > 0 {
                let truncated = &wire[..wire.len() - cut];
                // Any outcome but a panic is acceptable; most truncations
                // must surface as EOF.
                let _ = from_wire(value.prop_type(), truncated);
            }
        }
    }
}
