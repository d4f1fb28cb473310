//! Stream encoder: value graph to bytes.

use bwn_buffers::Writer;

use crate::constants::{TypeCode, STREAM_MAGIC, STREAM_VERSION};
use crate::desc::{ClassDesc, FieldDesc, FieldType};
use crate::error::EncodeError;
use crate::handles::AliasTable;
use crate::value::{ArrayValue, EnumValue, ObjectValue, Value};

/// Encoder for one serialization stream.
///
/// The structural mirror of [`ObjectStreamDecoder`]: a graph that came out
/// of a decode re-encodes to the identical byte sequence, because strings
/// and class descriptors deduplicate (by content and by name respectively)
/// into the same back-references the original stream carried, and handle
/// assignment follows the same allocation order.
///
/// Encoding is all-or-nothing; on error the partial output is discarded.
///
/// [`ObjectStreamDecoder`]: crate::ObjectStreamDecoder
///
/// # Example
///
/// ```
/// use bwn_codec::{ObjectStreamEncoder, Value};
///
/// let mut encoder = ObjectStreamEncoder::new();
/// let bytes = encoder.encode(&Value::Str("hi".into())).unwrap();
/// assert_eq!(bytes, [0xAC, 0xED, 0x00, 0x05, 0x74, 0x00, 0x02, b'h', b'i']);
/// ```
pub struct ObjectStreamEncoder {
    writer: Writer,
    aliases: AliasTable,
    /// When `false`, every class descriptor is written in full instead of
    /// deduplicating by name. The foreign writer always deduplicates; this
    /// exists for producing test vectors.
    pub dedup_classes: bool,
}

impl Default for ObjectStreamEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStreamEncoder {
    pub fn new() -> Self {
        Self {
            writer: Writer::new(),
            aliases: AliasTable::new(),
            dedup_classes: true,
        }
    }

    /// Serializes one root value behind a stream header and returns the
    /// bytes. The encoder is left reusable for another stream.
    pub fn encode(&mut self, value: &Value) -> Result<Vec<u8>, EncodeError> {
        self.writer.reset();
        self.aliases.reset();
        self.writer.u16(STREAM_MAGIC);
        self.writer.u16(STREAM_VERSION);
        match self.write_content(value) {
            Ok(()) => Ok(self.writer.flush()),
            Err(err) => {
                self.writer.reset();
                Err(err)
            }
        }
    }

    /// Emits the reset control tag and forgets every emitted handle,
    /// starting a fresh sub-session for callers writing multi-element
    /// streams through [`write_content`](Self::write_content).
    pub fn reset_stream(&mut self) {
        self.writer.u8(TypeCode::Reset.as_u8());
        self.aliases.reset();
    }

    /// Serializes one content element into the running stream.
    pub fn write_content(&mut self, value: &Value) -> Result<(), EncodeError> {
        match value {
            Value::Null => {
                self.writer.u8(TypeCode::Null.as_u8());
                Ok(())
            }
            Value::Str(s) => self.write_string(s),
            Value::Object(o) => self.write_object(o),
            Value::Array(a) => self.write_array(a),
            Value::Enum(e) => self.write_enum(e),
            Value::Class(c) => self.write_class(c),
            Value::BlockData(b) => {
                self.write_block_data(b);
                Ok(())
            }
            Value::Ref(handle) => match self.aliases.emitted(*handle) {
                Some(out) => {
                    self.write_reference(out);
                    Ok(())
                }
                None => Err(EncodeError::UnknownHandle(*handle)),
            },
            Value::UnresolvedRef(handle) => Err(EncodeError::UnresolvedPlaceholder(*handle)),
            Value::Bool(_)
            | Value::Byte(_)
            | Value::Char(_)
            | Value::Short(_)
            | Value::Int(_)
            | Value::Long(_)
            | Value::Float(_)
            | Value::Double(_) => Err(EncodeError::Unsupported(
                "a bare primitive outside a field or array",
            )),
        }
    }

    fn write_reference(&mut self, handle: u32) {
        self.writer.u8(TypeCode::Reference.as_u8());
        self.writer.u32(handle);
    }

    /// A 2-byte length-prefixed string payload with no handle (class names,
    /// field names, interface names).
    fn write_utf(&mut self, text: &str) -> Result<(), EncodeError> {
        let bytes = text.as_bytes();
        if bytes.len() > 0xFFFF {
            return Err(EncodeError::NameTooLong(bytes.len()));
        }
        self.writer.u16(bytes.len() as u16);
        self.writer.buf(bytes);
        Ok(())
    }

    fn write_string(&mut self, text: &str) -> Result<(), EncodeError> {
        if let Some(handle) = self.aliases.string(text) {
            self.write_reference(handle);
            return Ok(());
        }
        let bytes = text.as_bytes();
        if bytes.len() > 0xFFFF {
            self.writer.u8(TypeCode::LongString.as_u8());
            let handle = self.aliases.allocate();
            self.aliases.remember_string(text, handle);
            self.writer.u64(bytes.len() as u64);
        } else {
            self.writer.u8(TypeCode::String.as_u8());
            let handle = self.aliases.allocate();
            self.aliases.remember_string(text, handle);
            self.writer.u16(bytes.len() as u16);
        }
        self.writer.buf(bytes);
        Ok(())
    }

    fn write_block_data(&mut self, data: &[u8]) {
        if data.len() <= 0xFF {
            self.writer.u8(TypeCode::BlockData.as_u8());
            self.writer.u8(data.len() as u8);
        } else {
            self.writer.u8(TypeCode::BlockDataLong.as_u8());
            self.writer.i32(data.len() as i32);
        }
        self.writer.buf(data);
    }

    /// Writes a descriptor (or a back-reference to it) and returns the
    /// handle it is addressable by.
    fn write_class_desc(&mut self, desc: &ClassDesc) -> Result<u32, EncodeError> {
        if self.dedup_classes {
            if let Some(handle) = self.aliases.class(&desc.name) {
                self.write_reference(handle);
                return Ok(handle);
            }
        }

        let handle;
        if desc.is_proxy() {
            let interfaces = desc.interfaces.as_deref().unwrap_or(&[]);
            self.writer.u8(TypeCode::ProxyClassDesc.as_u8());
            self.writer.i32(interfaces.len() as i32);
            for name in interfaces {
                self.write_utf(name)?;
            }
            handle = self.aliases.allocate();
            self.aliases.remember_class(&desc.name, handle);
        } else {
            self.writer.u8(TypeCode::ClassDesc.as_u8());
            self.write_utf(&desc.name)?;
            self.writer.i64(desc.serial_uid);
            handle = self.aliases.allocate();
            self.aliases.remember_class(&desc.name, handle);
            self.writer.u8(desc.flags);
            self.writer.u16(desc.fields.len() as u16);
            for fd in &desc.fields {
                self.writer.u8(fd.ty.as_u8());
                self.write_utf(&fd.name)?;
                if fd.ty.is_reference() {
                    let type_name =
                        fd.type_name
                            .as_deref()
                            .ok_or_else(|| EncodeError::MissingTypeName {
                                class: desc.name.clone(),
                                field: fd.name.clone(),
                            })?;
                    self.write_string(type_name)?;
                }
            }
        }

        // Class annotation, terminated unconditionally.
        for item in &desc.annotation {
            self.write_content(item)?;
        }
        self.writer.u8(TypeCode::EndBlockData.as_u8());

        match &desc.super_desc {
            Some(super_desc) => {
                self.write_class_desc(super_desc)?;
            }
            None => self.writer.u8(TypeCode::Null.as_u8()),
        }
        Ok(handle)
    }

    fn write_object(&mut self, obj: &ObjectValue) -> Result<(), EncodeError> {
        self.writer.u8(TypeCode::Object.as_u8());
        self.write_class_desc(&obj.class)?;
        let handle = self.aliases.allocate();
        if obj.handle != 0 {
            self.aliases.remember_source(obj.handle, handle);
        }

        // Field values are consumed positionally against the hierarchy so
        // duplicate names survive; a graph built out of declaration order
        // falls back to by-name lookup.
        let mut cursor = 0usize;
        for cls in obj.class.hierarchy() {
            if cls.is_externalizable() {
                if !cls.has_block_data() {
                    return Err(EncodeError::Unsupported(
                        "an externalizable instance without block-data framing",
                    ));
                }
                self.write_instance_annotation(obj, cls)?;
                continue;
            }
            for fd in &cls.fields {
                let value = match obj.fields.get(cursor) {
                    Some((name, value)) if *name == fd.name => {
                        cursor += 1;
                        value
                    }
                    _ => obj.field(&fd.name).ok_or_else(|| EncodeError::MissingField {
                        class: cls.name.clone(),
                        field: fd.name.clone(),
                    })?,
                };
                self.write_field_value(&cls.name, fd, value)?;
            }
            if cls.has_write_method() {
                self.write_instance_annotation(obj, cls)?;
            }
        }
        Ok(())
    }

    fn write_instance_annotation(
        &mut self,
        obj: &ObjectValue,
        cls: &ClassDesc,
    ) -> Result<(), EncodeError> {
        if let Some(ann) = obj.annotations.iter().find(|a| a.class_name == cls.name) {
            for item in &ann.items {
                self.write_content(item)?;
            }
        }
        self.writer.u8(TypeCode::EndBlockData.as_u8());
        Ok(())
    }

    fn write_field_value(
        &mut self,
        class: &str,
        fd: &FieldDesc,
        value: &Value,
    ) -> Result<(), EncodeError> {
        let mismatch = |expected: &'static str| EncodeError::FieldTypeMismatch {
            class: class.to_owned(),
            field: fd.name.clone(),
            expected,
            found: value.kind(),
        };
        match (fd.ty, value) {
            (FieldType::Byte, Value::Byte(v)) => self.writer.i8(*v),
            (FieldType::Char, Value::Char(v)) => self.writer.u16(*v),
            (FieldType::Double, Value::Double(v)) => self.writer.f64(*v),
            (FieldType::Float, Value::Float(v)) => self.writer.f32(*v),
            (FieldType::Int, Value::Int(v)) => self.writer.i32(*v),
            (FieldType::Long, Value::Long(v)) => self.writer.i64(*v),
            (FieldType::Short, Value::Short(v)) => self.writer.i16(*v),
            (FieldType::Boolean, Value::Bool(v)) => self.writer.u8(*v as u8),
            (FieldType::Object | FieldType::Array, v) => return self.write_content(v),
            (FieldType::Byte, _) => return Err(mismatch("byte")),
            (FieldType::Char, _) => return Err(mismatch("char")),
            (FieldType::Double, _) => return Err(mismatch("double")),
            (FieldType::Float, _) => return Err(mismatch("float")),
            (FieldType::Int, _) => return Err(mismatch("int")),
            (FieldType::Long, _) => return Err(mismatch("long")),
            (FieldType::Short, _) => return Err(mismatch("short")),
            (FieldType::Boolean, _) => return Err(mismatch("boolean")),
        }
        Ok(())
    }

    fn write_array(&mut self, arr: &ArrayValue) -> Result<(), EncodeError> {
        self.writer.u8(TypeCode::Array.as_u8());
        self.write_class_desc(&arr.class)?;
        let handle = self.aliases.allocate();
        if arr.handle != 0 {
            self.aliases.remember_source(arr.handle, handle);
        }
        self.writer.i32(arr.elements.len() as i32);

        let elem = arr.class.element_type();
        for value in &arr.elements {
            let mismatch = |expected: &'static str| EncodeError::ElementTypeMismatch {
                class: arr.class.name.clone(),
                expected,
                found: value.kind(),
            };
            match (elem, value) {
                (FieldType::Byte, Value::Byte(v)) => self.writer.i8(*v),
                (FieldType::Char, Value::Char(v)) => self.writer.u16(*v),
                (FieldType::Double, Value::Double(v)) => self.writer.f64(*v),
                (FieldType::Float, Value::Float(v)) => self.writer.f32(*v),
                (FieldType::Int, Value::Int(v)) => self.writer.i32(*v),
                (FieldType::Long, Value::Long(v)) => self.writer.i64(*v),
                (FieldType::Short, Value::Short(v)) => self.writer.i16(*v),
                (FieldType::Boolean, Value::Bool(v)) => self.writer.u8(*v as u8),
                (FieldType::Object | FieldType::Array, v) => self.write_content(v)?,
                (FieldType::Byte, _) => return Err(mismatch("byte")),
                (FieldType::Char, _) => return Err(mismatch("char")),
                (FieldType::Double, _) => return Err(mismatch("double")),
                (FieldType::Float, _) => return Err(mismatch("float")),
                (FieldType::Int, _) => return Err(mismatch("int")),
                (FieldType::Long, _) => return Err(mismatch("long")),
                (FieldType::Short, _) => return Err(mismatch("short")),
                (FieldType::Boolean, _) => return Err(mismatch("boolean")),
            }
        }
        Ok(())
    }

    fn write_enum(&mut self, e: &EnumValue) -> Result<(), EncodeError> {
        self.writer.u8(TypeCode::Enum.as_u8());
        self.write_class_desc(&e.class)?;
        let handle = self.aliases.allocate();
        if e.handle != 0 {
            self.aliases.remember_source(e.handle, handle);
        }
        self.write_string(&e.constant)
    }

    /// A class used as a value. A name already emitted collapses to a
    /// back-reference, mirroring how such values come out of a decode;
    /// otherwise a fresh wrapper (with its own handle) is written.
    fn write_class(&mut self, desc: &ClassDesc) -> Result<(), EncodeError> {
        if self.dedup_classes {
            if let Some(handle) = self.aliases.class(&desc.name) {
                self.write_reference(handle);
                return Ok(());
            }
        }
        self.writer.u8(TypeCode::Class.as_u8());
        self.write_class_desc(desc)?;
        self.aliases.allocate();
        Ok(())
    }
}
