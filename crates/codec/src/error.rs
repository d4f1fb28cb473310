//! Decode and encode error types.

use thiserror::Error;

use bwn_buffers::BufferError;

/// Error type for stream decoding.
///
/// Every variant that can occur mid-stream carries the byte offset at which
/// it was detected, so callers can report the failure position and dump
/// whatever decoded before it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unexpected end of input at offset {offset:#x}")]
    Truncated { offset: usize },
    #[error("bad stream header (magic {magic:#06x}, version {version:#06x})")]
    HeaderMismatch { magic: u16, version: u16 },
    #[error("unknown type code {code:#04x} at offset {offset:#x}")]
    UnknownTypeCode { code: u8, offset: usize },
    #[error("type code {code:#04x} at offset {offset:#x} cannot start a class descriptor")]
    BadClassDescCode { code: u8, offset: usize },
    #[error("back-reference at offset {offset:#x} does not resolve to a class descriptor")]
    BadClassReference { offset: usize },
    #[error("field type string at offset {offset:#x} is neither a string nor a string back-reference")]
    BadTypeString { offset: usize },
    #[error("unknown field type {code:#04x} at offset {offset:#x}")]
    UnknownFieldType { code: u8, offset: usize },
    #[error("enum constant at offset {offset:#x} does not resolve to a string")]
    BadEnumConstant { offset: usize },
    #[error("end-of-block sentinel in a value position at offset {offset:#x}")]
    StrayEndBlock { offset: usize },
    #[error("exception marker at offset {offset:#x}")]
    ExceptionInStream { offset: usize },
    #[error("externalizable instance without block-data framing at offset {offset:#x}")]
    RawExternalContents { offset: usize },
    #[error("negative length {len} at offset {offset:#x}")]
    NegativeLength { len: i64, offset: usize },
}

impl From<BufferError> for DecodeError {
    fn from(err: BufferError) -> Self {
        DecodeError::Truncated {
            offset: err.offset(),
        }
    }
}

impl DecodeError {
    /// The byte offset at which the failure was detected, when the failure
    /// happened mid-stream.
    pub fn offset(&self) -> Option<usize> {
        match self {
            DecodeError::Truncated { offset }
            | DecodeError::UnknownTypeCode { offset, .. }
            | DecodeError::BadClassDescCode { offset, .. }
            | DecodeError::BadClassReference { offset }
            | DecodeError::BadTypeString { offset }
            | DecodeError::UnknownFieldType { offset, .. }
            | DecodeError::BadEnumConstant { offset }
            | DecodeError::StrayEndBlock { offset }
            | DecodeError::ExceptionInStream { offset }
            | DecodeError::RawExternalContents { offset }
            | DecodeError::NegativeLength { offset, .. } => Some(*offset),
            DecodeError::HeaderMismatch { .. } => None,
        }
    }
}

/// Error type for stream encoding.
///
/// Encoding either serializes the whole graph or fails without partial
/// output; all variants describe a graph shape the wire format cannot carry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("class `{class}` has no value for field `{field}`")]
    MissingField { class: String, field: String },
    #[error("field `{field}` of class `{class}` expects {expected}, got {found}")]
    FieldTypeMismatch {
        class: String,
        field: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("reference-typed field `{field}` of class `{class}` has no type name")]
    MissingTypeName { class: String, field: String },
    #[error("array of class `{class}` expects {expected} elements, got {found}")]
    ElementTypeMismatch {
        class: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("back-reference to handle {0:#x}, which has not been emitted")]
    UnknownHandle(u32),
    #[error("unresolved-reference placeholder for handle {0:#x} cannot be encoded")]
    UnresolvedPlaceholder(u32),
    #[error("string record of {0} bytes exceeds the 2-byte length prefix")]
    NameTooLong(usize),
    #[error("{0} cannot be encoded here")]
    Unsupported(&'static str),
}
