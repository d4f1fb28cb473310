//! Stream decoder: bytes to value graph.

use bwn_buffers::Reader;

use crate::constants::{TypeCode, STREAM_MAGIC, STREAM_VERSION};
use crate::desc::{ClassDesc, FieldDesc, FieldType};
use crate::error::DecodeError;
use crate::handles::{Entity, HandleTable};
use crate::value::{ArrayValue, EnumValue, InstanceAnnotation, ObjectValue, Value};

/// Decoder for one serialization stream.
///
/// A decoder owns its handle table and cursor, so concurrent streams each
/// use their own instance. After a failed decode the decoder can still be
/// queried for the failure position and the last handle it assigned, which
/// is enough to dump everything decoded before the failure point.
///
/// # Example
///
/// ```
/// use bwn_codec::{ObjectStreamDecoder, Value};
///
/// let data = [0xAC, 0xED, 0x00, 0x05, 0x70];
/// let mut decoder = ObjectStreamDecoder::new(&data);
/// assert_eq!(decoder.decode(), Ok(Value::Null));
/// ```
pub struct ObjectStreamDecoder<'a> {
    reader: Reader<'a>,
    handles: HandleTable,
    last_handle: Option<u32>,
}

impl<'a> ObjectStreamDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            reader: Reader::new(data),
            handles: HandleTable::new(),
            last_handle: None,
        }
    }

    /// Validates the stream header and decodes the single root content
    /// element. Streams carrying more than one top-level element can call
    /// [`read_content`](Self::read_content) again afterwards.
    pub fn decode(&mut self) -> Result<Value, DecodeError> {
        self.read_header()?;
        self.read_content()
    }

    /// Current byte offset of the cursor.
    pub fn position(&self) -> usize {
        self.reader.pos()
    }

    /// The handle most recently assigned, if any. Survives a failed decode
    /// for post-mortem reporting.
    pub fn last_handle(&self) -> Option<u32> {
        self.last_handle
    }

    /// The decode-side handle table, usable after a decode to resolve
    /// reference nodes left lazy in the returned graph.
    pub fn handles(&self) -> &HandleTable {
        &self.handles
    }

    fn read_header(&mut self) -> Result<(), DecodeError> {
        let magic = self.reader.u16()?;
        let version = self.reader.u16()?;
        if magic != STREAM_MAGIC || version != STREAM_VERSION {
            return Err(DecodeError::HeaderMismatch { magic, version });
        }
        Ok(())
    }

    /// Decodes one content element.
    pub fn read_content(&mut self) -> Result<Value, DecodeError> {
        let start = self.reader.pos();
        let code = self.reader.u8()?;
        let Some(tc) = TypeCode::from_u8(code) else {
            return Err(DecodeError::UnknownTypeCode {
                code,
                offset: start,
            });
        };
        match tc {
            TypeCode::Null => Ok(Value::Null),
            TypeCode::Reference => self.read_reference(),
            TypeCode::ClassDesc => {
                let desc = self.read_new_class_desc()?;
                Ok(Value::Class(Box::new(desc)))
            }
            TypeCode::ProxyClassDesc => {
                let desc = self.read_new_proxy_class_desc()?;
                Ok(Value::Class(Box::new(desc)))
            }
            TypeCode::Object => self.read_new_object(),
            TypeCode::String => Ok(Value::Str(self.read_new_string(false)?)),
            TypeCode::LongString => Ok(Value::Str(self.read_new_string(true)?)),
            TypeCode::Array => self.read_new_array(start),
            TypeCode::Class => self.read_new_class(start),
            TypeCode::Enum => self.read_new_enum(start),
            TypeCode::BlockData => {
                let len = self.reader.u8()? as usize;
                Ok(Value::BlockData(self.reader.bytes(len)?.to_vec()))
            }
            TypeCode::BlockDataLong => {
                let len = self.reader.i32()?;
                if len < 0 {
                    return Err(DecodeError::NegativeLength {
                        len: len as i64,
                        offset: start,
                    });
                }
                Ok(Value::BlockData(self.reader.bytes(len as usize)?.to_vec()))
            }
            TypeCode::EndBlockData => Err(DecodeError::StrayEndBlock { offset: start }),
            TypeCode::Reset => {
                // A fresh sub-session: everything before is unreachable by
                // handle from here on.
                self.handles.reset();
                self.last_handle = None;
                self.read_content()
            }
            TypeCode::Exception => Err(DecodeError::ExceptionInStream { offset: start }),
        }
    }

    fn alloc_handle(&mut self) -> u32 {
        let handle = self.handles.allocate();
        self.last_handle = Some(handle);
        handle
    }

    /// A 2-byte length-prefixed string payload with no handle of its own
    /// (class names, field names, interface names).
    fn read_utf(&mut self) -> Result<String, DecodeError> {
        let len = self.reader.u16()? as usize;
        Ok(self.reader.string(len)?)
    }

    fn read_new_string(&mut self, long: bool) -> Result<String, DecodeError> {
        let handle = self.alloc_handle();
        let len = if long {
            let start = self.reader.pos();
            let len = self.reader.i64()?;
            if len < 0 {
                return Err(DecodeError::NegativeLength { len, offset: start });
            }
            len as usize
        } else {
            self.reader.u16()? as usize
        };
        let text = self.reader.string(len)?;
        self.handles.register(handle, Entity::Str(text.clone()));
        Ok(text)
    }

    fn read_reference(&mut self) -> Result<Value, DecodeError> {
        let handle = self.reader.u32()?;
        Ok(match self.handles.resolve(handle) {
            // Strings and descriptors are cloned into place; the encoder's
            // dedup tables restore the shared handle on the way back.
            Some(Entity::Str(s)) => Value::Str(s.clone()),
            Some(Entity::Class(c)) | Some(Entity::ClassObject(c)) => {
                Value::Class(Box::new(c.clone()))
            }
            Some(Entity::Object) | Some(Entity::Array) | Some(Entity::Enum) => Value::Ref(handle),
            None => Value::UnresolvedRef(handle),
        })
    }

    /// The class-descriptor position grammar: null, a new (proxy)
    /// descriptor, or a back-reference to one.
    fn read_class_desc(&mut self) -> Result<Option<ClassDesc>, DecodeError> {
        let start = self.reader.pos();
        let code = self.reader.u8()?;
        match TypeCode::from_u8(code) {
            Some(TypeCode::Null) => Ok(None),
            Some(TypeCode::ClassDesc) => Ok(Some(self.read_new_class_desc()?)),
            Some(TypeCode::ProxyClassDesc) => Ok(Some(self.read_new_proxy_class_desc()?)),
            Some(TypeCode::Reference) => {
                let handle = self.reader.u32()?;
                match self.handles.resolve(handle) {
                    Some(Entity::Class(c)) | Some(Entity::ClassObject(c)) => Ok(Some(c.clone())),
                    _ => Err(DecodeError::BadClassReference { offset: start }),
                }
            }
            _ => Err(DecodeError::BadClassDescCode {
                code,
                offset: start,
            }),
        }
    }

    fn read_new_class_desc(&mut self) -> Result<ClassDesc, DecodeError> {
        let name = self.read_utf()?;
        let serial_uid = self.reader.i64()?;

        // The handle lands between the version tag and the flags, so
        // back-references inside this descriptor's own annotation already
        // resolve to it.
        let handle = self.alloc_handle();
        self.handles
            .register(handle, Entity::Class(ClassDesc::new(&name, serial_uid, 0)));

        let flags = self.reader.u8()?;
        let field_count = self.reader.u16()?;
        let mut fields = Vec::with_capacity(field_count as usize);
        for _ in 0..field_count {
            let start = self.reader.pos();
            let code = self.reader.u8()?;
            let Some(ty) = FieldType::from_u8(code) else {
                return Err(DecodeError::UnknownFieldType {
                    code,
                    offset: start,
                });
            };
            let field_name = self.read_utf()?;
            let type_name = if ty.is_reference() {
                Some(self.read_type_string()?)
            } else {
                None
            };
            fields.push(FieldDesc {
                ty,
                name: field_name,
                type_name,
            });
        }

        let mut desc = ClassDesc::new(&name, serial_uid, flags);
        desc.fields = fields;
        self.handles.register(handle, Entity::Class(desc.clone()));

        desc.annotation = self.read_annotation_items()?;
        desc.super_desc = self.read_class_desc()?.map(Box::new);
        self.handles.register(handle, Entity::Class(desc.clone()));
        Ok(desc)
    }

    fn read_new_proxy_class_desc(&mut self) -> Result<ClassDesc, DecodeError> {
        let start = self.reader.pos();
        let count = self.reader.i32()?;
        if count < 0 {
            return Err(DecodeError::NegativeLength {
                len: count as i64,
                offset: start,
            });
        }
        let mut interfaces = Vec::with_capacity(count as usize);
        for _ in 0..count {
            interfaces.push(self.read_utf()?);
        }

        let handle = self.alloc_handle();
        let mut desc = ClassDesc::proxy(interfaces);
        self.handles.register(handle, Entity::Class(desc.clone()));

        desc.annotation = self.read_annotation_items()?;
        desc.super_desc = self.read_class_desc()?.map(Box::new);
        self.handles.register(handle, Entity::Class(desc.clone()));
        Ok(desc)
    }

    /// A field type string: a new string or a back-reference to one,
    /// nothing else.
    fn read_type_string(&mut self) -> Result<String, DecodeError> {
        let start = self.reader.pos();
        let code = self.reader.u8()?;
        match TypeCode::from_u8(code) {
            Some(TypeCode::String) => self.read_new_string(false),
            Some(TypeCode::Reference) => {
                let handle = self.reader.u32()?;
                match self.handles.resolve(handle) {
                    Some(Entity::Str(s)) => Ok(s.clone()),
                    _ => Err(DecodeError::BadTypeString { offset: start }),
                }
            }
            _ => Err(DecodeError::BadTypeString { offset: start }),
        }
    }

    /// Content elements until the end-of-block sentinel, which is consumed.
    fn read_annotation_items(&mut self) -> Result<Vec<Value>, DecodeError> {
        let mut items = Vec::new();
        loop {
            if self.reader.peek_u8()? == TypeCode::EndBlockData.as_u8() {
                self.reader.skip(1)?;
                return Ok(items);
            }
            items.push(self.read_content()?);
        }
    }

    fn read_new_object(&mut self) -> Result<Value, DecodeError> {
        let Some(desc) = self.read_class_desc()? else {
            return Ok(Value::Null);
        };
        let handle = self.alloc_handle();
        self.handles.register(handle, Entity::Object);

        let mut fields = Vec::new();
        let mut annotations = Vec::new();
        for cls in desc.hierarchy() {
            if cls.is_externalizable() {
                if !cls.has_block_data() {
                    // Protocol 1 external contents have no framing; nothing
                    // after this point could be located again.
                    return Err(DecodeError::RawExternalContents {
                        offset: self.reader.pos(),
                    });
                }
                let items = self.read_annotation_items()?;
                annotations.push(InstanceAnnotation {
                    class_name: cls.name.clone(),
                    items,
                });
                continue;
            }
            for fd in &cls.fields {
                let value = self.read_field_value(fd)?;
                fields.push((fd.name.clone(), value));
            }
            if cls.has_write_method() {
                let items = self.read_annotation_items()?;
                annotations.push(InstanceAnnotation {
                    class_name: cls.name.clone(),
                    items,
                });
            }
        }

        Ok(Value::Object(Box::new(ObjectValue {
            class: desc,
            fields,
            annotations,
            handle,
        })))
    }

    fn read_field_value(&mut self, fd: &FieldDesc) -> Result<Value, DecodeError> {
        Ok(match fd.ty {
            FieldType::Byte => Value::Byte(self.reader.i8()?),
            FieldType::Char => Value::Char(self.reader.u16()?),
            FieldType::Double => Value::Double(self.reader.f64()?),
            FieldType::Float => Value::Float(self.reader.f32()?),
            FieldType::Int => Value::Int(self.reader.i32()?),
            FieldType::Long => Value::Long(self.reader.i64()?),
            FieldType::Short => Value::Short(self.reader.i16()?),
            FieldType::Boolean => Value::Bool(self.reader.u8()? != 0),
            FieldType::Object | FieldType::Array => self.read_content()?,
        })
    }

    fn read_new_array(&mut self, start: usize) -> Result<Value, DecodeError> {
        let desc = self
            .read_class_desc()?
            .ok_or(DecodeError::BadClassDescCode {
                code: TypeCode::Null.as_u8(),
                offset: start,
            })?;
        let handle = self.alloc_handle();
        self.handles.register(handle, Entity::Array);

        let len_offset = self.reader.pos();
        let len = self.reader.i32()?;
        if len < 0 {
            return Err(DecodeError::NegativeLength {
                len: len as i64,
                offset: len_offset,
            });
        }

        let elem = desc.element_type();
        let mut elements = Vec::with_capacity((len as usize).min(4096));
        for _ in 0..len {
            elements.push(match elem {
                FieldType::Byte => Value::Byte(self.reader.i8()?),
                FieldType::Char => Value::Char(self.reader.u16()?),
                FieldType::Double => Value::Double(self.reader.f64()?),
                FieldType::Float => Value::Float(self.reader.f32()?),
                FieldType::Int => Value::Int(self.reader.i32()?),
                FieldType::Long => Value::Long(self.reader.i64()?),
                FieldType::Short => Value::Short(self.reader.i16()?),
                FieldType::Boolean => Value::Bool(self.reader.u8()? != 0),
                FieldType::Object | FieldType::Array => self.read_content()?,
            });
        }

        Ok(Value::Array(Box::new(ArrayValue {
            class: desc,
            elements,
            handle,
        })))
    }

    fn read_new_enum(&mut self, start: usize) -> Result<Value, DecodeError> {
        let desc = self
            .read_class_desc()?
            .ok_or(DecodeError::BadClassDescCode {
                code: TypeCode::Null.as_u8(),
                offset: start,
            })?;
        let handle = self.alloc_handle();
        self.handles.register(handle, Entity::Enum);

        let constant_offset = self.reader.pos();
        let constant = match self.read_content()? {
            Value::Str(s) => s,
            _ => {
                return Err(DecodeError::BadEnumConstant {
                    offset: constant_offset,
                })
            }
        };

        Ok(Value::Enum(Box::new(EnumValue {
            class: desc,
            constant,
            handle,
        })))
    }

    fn read_new_class(&mut self, start: usize) -> Result<Value, DecodeError> {
        let desc = self
            .read_class_desc()?
            .ok_or(DecodeError::BadClassDescCode {
                code: TypeCode::Null.as_u8(),
                offset: start,
            })?;
        // The wrapper gets its own handle, distinct from the descriptor's.
        let handle = self.alloc_handle();
        self.handles
            .register(handle, Entity::ClassObject(desc.clone()));
        Ok(Value::Class(Box::new(desc)))
    }
}
