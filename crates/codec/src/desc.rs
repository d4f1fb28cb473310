//! Class descriptor model.

use crate::constants::flags;
use crate::value::Value;

/// One of the ten field type tags a class descriptor can declare.
///
/// The wire encodes these as the ASCII bytes of the foreign runtime's type
/// descriptor characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
    Object,
    Array,
}

impl FieldType {
    pub fn from_u8(byte: u8) -> Option<FieldType> {
        Some(match byte {
            b'B' => FieldType::Byte,
            b'C' => FieldType::Char,
            b'D' => FieldType::Double,
            b'F' => FieldType::Float,
            b'I' => FieldType::Int,
            b'J' => FieldType::Long,
            b'S' => FieldType::Short,
            b'Z' => FieldType::Boolean,
            b'L' => FieldType::Object,
            b'[' => FieldType::Array,
            _ => return None,
        })
    }

    pub fn as_u8(self) -> u8 {
        match self {
            FieldType::Byte => b'B',
            FieldType::Char => b'C',
            FieldType::Double => b'D',
            FieldType::Float => b'F',
            FieldType::Int => b'I',
            FieldType::Long => b'J',
            FieldType::Short => b'S',
            FieldType::Boolean => b'Z',
            FieldType::Object => b'L',
            FieldType::Array => b'[',
        }
    }

    /// Object and array fields carry a type-name string and their values are
    /// full content elements; everything else is a fixed-width primitive.
    pub fn is_reference(self) -> bool {
        matches!(self, FieldType::Object | FieldType::Array)
    }
}

/// A single field declaration inside a class descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDesc {
    pub ty: FieldType,
    pub name: String,
    /// Declared type descriptor string, present only for object/array
    /// fields (e.g. `Ljava/lang/String;`).
    pub type_name: Option<String>,
}

impl FieldDesc {
    /// A primitive field declaration.
    pub fn prim(ty: FieldType, name: &str) -> FieldDesc {
        FieldDesc {
            ty,
            name: name.to_owned(),
            type_name: None,
        }
    }

    /// An object or array field declaration with its type descriptor string.
    pub fn reference(ty: FieldType, name: &str, type_name: &str) -> FieldDesc {
        FieldDesc {
            ty,
            name: name.to_owned(),
            type_name: Some(type_name.to_owned()),
        }
    }
}

/// A class descriptor: the schema half of the stream.
///
/// Descriptors own their superclass by value, so a hierarchy is a finite
/// chain. Field type names and back-references into the stream are resolved
/// through the handle table instead, which is what keeps the model acyclic.
///
/// Proxy descriptors (`interfaces` is `Some`) have no declared name on the
/// wire; the stored name is synthesized from the interface list and the
/// serializable flag is forced, matching how the foreign runtime treats
/// them.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDesc {
    pub name: String,
    pub serial_uid: i64,
    pub flags: u8,
    pub fields: Vec<FieldDesc>,
    /// Class annotation: content elements between the field table and the
    /// superclass, always terminated by the end-of-block sentinel.
    pub annotation: Vec<Value>,
    pub super_desc: Option<Box<ClassDesc>>,
    /// Interface names of a proxy descriptor; `None` for plain classes.
    pub interfaces: Option<Vec<String>>,
}

impl ClassDesc {
    pub fn new(name: &str, serial_uid: i64, flags: u8) -> ClassDesc {
        ClassDesc {
            name: name.to_owned(),
            serial_uid,
            flags,
            fields: Vec::new(),
            annotation: Vec::new(),
            super_desc: None,
            interfaces: None,
        }
    }

    /// Builds a proxy descriptor from its interface list.
    pub fn proxy(interfaces: Vec<String>) -> ClassDesc {
        ClassDesc {
            name: format!("$Proxy[{}]", interfaces.join(",")),
            serial_uid: 0,
            flags: flags::SERIALIZABLE,
            fields: Vec::new(),
            annotation: Vec::new(),
            super_desc: None,
            interfaces: Some(interfaces),
        }
    }

    pub fn with_fields(mut self, fields: Vec<FieldDesc>) -> ClassDesc {
        self.fields = fields;
        self
    }

    pub fn with_super(mut self, super_desc: ClassDesc) -> ClassDesc {
        self.super_desc = Some(Box::new(super_desc));
        self
    }

    pub fn is_proxy(&self) -> bool {
        self.interfaces.is_some()
    }

    pub fn has_write_method(&self) -> bool {
        self.flags & flags::WRITE_METHOD != 0
    }

    pub fn is_serializable(&self) -> bool {
        self.flags & flags::SERIALIZABLE != 0
    }

    pub fn is_externalizable(&self) -> bool {
        self.flags & flags::EXTERNALIZABLE != 0
    }

    pub fn has_block_data(&self) -> bool {
        self.flags & flags::BLOCK_DATA != 0
    }

    pub fn is_enum(&self) -> bool {
        self.flags & flags::IS_ENUM != 0
    }

    /// The full hierarchy in field I/O order: root-most superclass first,
    /// this descriptor last.
    pub fn hierarchy(&self) -> Vec<&ClassDesc> {
        let mut chain = Vec::new();
        let mut current = Some(self);
        while let Some(desc) = current {
            chain.push(desc);
            current = desc.super_desc.as_deref();
        }
        chain.reverse();
        chain
    }

    /// Element type of an array class, taken from the character after the
    /// leading `[` of its name. A name without the array marker falls back
    /// to object elements, matching the lenient behavior of the original
    /// stream readers.
    pub fn element_type(&self) -> FieldType {
        let bytes = self.name.as_bytes();
        if bytes.first() == Some(&b'[') {
            if let Some(&tag) = bytes.get(1) {
                if let Some(ty) = FieldType::from_u8(tag) {
                    return ty;
                }
            }
        }
        FieldType::Object
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hierarchy_is_super_first() {
        let desc = ClassDesc::new("Leaf", 1, flags::SERIALIZABLE)
            .with_super(ClassDesc::new("Mid", 1, flags::SERIALIZABLE).with_super(
                ClassDesc::new("Root", 1, flags::SERIALIZABLE),
            ));
        let names: Vec<&str> = desc.hierarchy().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["Root", "Mid", "Leaf"]);
    }

    #[test]
    fn proxy_synthesizes_name_and_flags() {
        let desc = ClassDesc::proxy(vec!["a.A".into(), "b.B".into()]);
        assert_eq!(desc.name, "$Proxy[a.A,b.B]");
        assert!(desc.is_proxy());
        assert!(desc.is_serializable());
        assert!(desc.fields.is_empty());
    }

    #[test]
    fn array_element_types() {
        assert_eq!(ClassDesc::new("[I", 0, 0).element_type(), FieldType::Int);
        assert_eq!(ClassDesc::new("[[I", 0, 0).element_type(), FieldType::Array);
        assert_eq!(
            ClassDesc::new("[Ljava.lang.String;", 0, 0).element_type(),
            FieldType::Object
        );
        assert_eq!(
            ClassDesc::new("NotAnArray", 0, 0).element_type(),
            FieldType::Object
        );
    }
}
