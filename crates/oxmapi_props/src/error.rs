//! Error types for the property codec.

use thiserror::Error;

use crate::tag::PropType;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding property values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The type code is not one this codec understands.
    ///
    /// A malformed or newer wire value must never crash a long-lived
    /// service; unknown codes always surface here.
    #[error("unsupported property type code: 0x{code:04x}")]
    UnsupportedType {
        /// The unrecognized 16-bit type code.
        code: u16,
    },

    /// A required argument was missing or malformed.
    #[error("invalid parameter: {message}")]
    InvalidParameter {
        /// Description of the offending parameter.
        message: String,
    },

    /// A tag's type code disagrees with the value it was paired with.
    #[error("type mismatch: tag says {tag}, value is {value}")]
    TypeMismatch {
        /// Type code carried by the tag.
        tag: PropType,
        /// Type code of the actual value.
        value: PropType,
    },

    /// Ran out of input mid-value.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// Input remained after the value was fully decoded.
    #[error("trailing input after decoded value")]
    TrailingInput,

    /// A narrow string was not valid UTF-8.
    #[error("invalid UTF-8 string")]
    InvalidUtf8,

    /// A wide string was not valid UTF-16.
    #[error("invalid UTF-16 string")]
    InvalidUtf16,

    /// A declared count or length exceeds what the input can hold.
    #[error("size limit exceeded: claimed {claimed}, max allowed {max_allowed}")]
    SizeLimitExceeded {
        /// The count or length the input claimed.
        claimed: u64,
        /// The largest value the remaining input permits.
        max_allowed: u64,
    },
}

impl CodecError {
    /// Create an invalid parameter error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    /// Create an unsupported type error.
    pub fn unsupported_type(code: u16) -> Self {
        Self::UnsupportedType { code }
    }
}
