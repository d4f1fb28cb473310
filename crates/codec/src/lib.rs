//! Bidirectional codec for the `.bwn` object serialization stream format.
//!
//! `.bwn` script files are object serialization streams produced by a
//! foreign runtime: a self-describing, handle-addressed graph grammar
//! carrying polymorphic class hierarchies, cyclic back-references, and
//! custom per-class annotation blocks. This crate decodes such a stream
//! into a generic, inspectable [`Value`] graph and re-encodes a graph back
//! into wire format the foreign runtime loads unmodified.
//!
//! The two core entry points are [`decode`] and [`encode`]; everything else
//! operates on the [`Value`] tree ([`dump`], [`export`]) or on the raw byte
//! buffer ([`patch`]).
//!
//! # Example
//!
//! ```
//! use bwn_codec::{decode, encode, Value};
//!
//! let bytes = encode(&Value::Str("projectName".into())).unwrap();
//! let value = decode(&bytes).unwrap();
//! assert_eq!(value, Value::Str("projectName".into()));
//! assert_eq!(encode(&value).unwrap(), bytes);
//! ```

pub mod constants;
pub mod desc;
pub mod dump;
pub mod error;
pub mod export;
pub mod handles;
pub mod patch;
pub mod value;

mod decoder;
mod encoder;

pub use constants::{TypeCode, BASE_HANDLE, STREAM_MAGIC, STREAM_VERSION};
pub use decoder::ObjectStreamDecoder;
pub use desc::{ClassDesc, FieldDesc, FieldType};
pub use dump::dump;
pub use encoder::ObjectStreamEncoder;
pub use error::{DecodeError, EncodeError};
pub use export::to_json;
pub use handles::{AliasTable, Entity, HandleTable};
pub use value::{ArrayValue, EnumValue, InstanceAnnotation, ObjectValue, Value};

/// Decodes one stream (header plus a single root content element).
pub fn decode(data: &[u8]) -> Result<Value, DecodeError> {
    ObjectStreamDecoder::new(data).decode()
}

/// Encodes one value graph as a complete stream.
pub fn encode(value: &Value) -> Result<Vec<u8>, EncodeError> {
    ObjectStreamEncoder::new().encode(value)
}
