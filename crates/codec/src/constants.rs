//! Stream protocol constants.

/// First header field of every stream.
pub const STREAM_MAGIC: u16 = 0xACED;
/// Second header field of every stream.
pub const STREAM_VERSION: u16 = 0x0005;
/// First handle assigned in a fresh stream (or after a reset).
pub const BASE_HANDLE: u32 = 0x7E_0000;

/// The closed set of content type codes.
///
/// Every content element starts with one of these bytes; anything else is a
/// malformed stream. Keeping the set as an enum makes the decoder's dispatch
/// exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TypeCode {
    Null = 0x70,
    Reference = 0x71,
    ClassDesc = 0x72,
    Object = 0x73,
    String = 0x74,
    Array = 0x75,
    Class = 0x76,
    BlockData = 0x77,
    EndBlockData = 0x78,
    Reset = 0x79,
    BlockDataLong = 0x7A,
    Exception = 0x7B,
    LongString = 0x7C,
    ProxyClassDesc = 0x7D,
    Enum = 0x7E,
}

impl TypeCode {
    pub fn from_u8(byte: u8) -> Option<TypeCode> {
        Some(match byte {
            0x70 => TypeCode::Null,
            0x71 => TypeCode::Reference,
            0x72 => TypeCode::ClassDesc,
            0x73 => TypeCode::Object,
            0x74 => TypeCode::String,
            0x75 => TypeCode::Array,
            0x76 => TypeCode::Class,
            0x77 => TypeCode::BlockData,
            0x78 => TypeCode::EndBlockData,
            0x79 => TypeCode::Reset,
            0x7A => TypeCode::BlockDataLong,
            0x7B => TypeCode::Exception,
            0x7C => TypeCode::LongString,
            0x7D => TypeCode::ProxyClassDesc,
            0x7E => TypeCode::Enum,
            _ => return None,
        })
    }

    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Class descriptor flag bits.
pub mod flags {
    /// The class writes a custom annotation block after its fields.
    pub const WRITE_METHOD: u8 = 0x01;
    pub const SERIALIZABLE: u8 = 0x02;
    pub const EXTERNALIZABLE: u8 = 0x04;
    /// Externalizable contents are framed as block data (protocol 2).
    pub const BLOCK_DATA: u8 = 0x08;
    pub const IS_ENUM: u8 = 0x10;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_codes_round_trip() {
        for byte in 0x70..=0x7E {
            let tc = TypeCode::from_u8(byte).unwrap();
            assert_eq!(tc.as_u8(), byte);
        }
        assert_eq!(TypeCode::from_u8(0x6F), None);
        assert_eq!(TypeCode::from_u8(0x7F), None);
    }
}
