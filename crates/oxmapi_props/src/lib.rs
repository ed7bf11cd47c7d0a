//! # OXMAPI Properties
//!
//! Property data model and wire codec for the OXMAPI messaging core.
//!
//! This crate provides:
//! - Property tags and type codes ([`PropertyTag`], [`PropType`])
//! - The typed value union ([`PropertyValue`]) with a little-endian
//!   wire codec and exact size accounting
//! - Ordered property containers ([`Row`], [`RowSet`], [`TagList`])
//! - Named-property resolution through an injected [`NameResolver`]
//! - Protocol timestamp conversion ([`FileTime`])
//! - UTF-16 transfer-length prediction without transcoding
//! - Structured decoders for recurrence, timezone and global-id blobs
//!
//! Unknown type codes are always a recoverable
//! [`CodecError::UnsupportedType`]; a malformed or newer wire value
//! never takes the process down.
//!
//! ## Example
//!
//! ```rust
//! use oxmapi_props::{Property, PropertyTag, PropType, Row};
//!
//! let mut row = Row::new();
//! row.upsert(Property::new(0x3001, "Alice"));
//!
//! let tag = PropertyTag::new(0x3001, PropType::String8);
//! assert_eq!(row.get(tag).unwrap().as_str(), Some("Alice"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod blob;
mod decoder;
mod encoder;
mod error;
mod named;
mod row;
mod tag;
mod text;
mod time;
mod value;

pub use decoder::{from_wire, from_wire_tagged, WireDecoder};
pub use encoder::{to_wire, wire_size, WireEncoder};
pub use error::{CodecError, CodecResult};
pub use named::{NameResolver, PropertyName};
pub use row::{find_value, Row, RowSet, TagList};
pub use tag::{PropType, PropertyTag, MV_FLAG, NAMED_PROPERTY_MIN};
pub use text::{utf16_wire_len, utf16_wire_len_str};
pub use time::{FileTime, EPOCH_DELTA_SECS, TICKS_PER_SECOND};
pub use value::{Property, PropertyValue, TypedString, STATUS_NOT_FOUND};
