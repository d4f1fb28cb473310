//! Decoder behavior against hand-assembled byte vectors: the protocol
//! scenarios the format is known for, plus the failure taxonomy.

use bwn_buffers::Writer;
use bwn_codec::constants::flags;
use bwn_codec::{
    decode, encode, DecodeError, EncodeError, ObjectStreamDecoder, Value, BASE_HANDLE,
};

fn header(w: &mut Writer) {
    w.u16(0xACED);
    w.u16(0x0005);
}

fn utf(w: &mut Writer, s: &str) {
    w.u16(s.len() as u16);
    w.buf(s.as_bytes());
}

/// The HashMap shape: two primitive fields, then a custom-write block with
/// a capacity/size pair and the entries.
fn hashmap_fixture() -> Vec<u8> {
    let mut w = Writer::new();
    header(&mut w);
    w.u8(0x73); // object
    w.u8(0x72); // class desc
    utf(&mut w, "X");
    w.i64(1);
    w.u8(flags::WRITE_METHOD | flags::SERIALIZABLE);
    w.u16(2);
    w.u8(b'F');
    utf(&mut w, "loadFactor");
    w.u8(b'I');
    utf(&mut w, "threshold");
    w.u8(0x78); // end of class annotation
    w.u8(0x70); // no superclass
    w.f32(0.75);
    w.i32(12);
    w.u8(0x77); // block data
    w.u8(8);
    w.i32(16); // capacity
    w.i32(1); // size
    w.u8(0x74);
    utf(&mut w, "k");
    w.u8(0x74);
    utf(&mut w, "v");
    w.u8(0x78); // end of instance annotation
    w.flush()
}

#[test]
fn decodes_hashmap_shape() {
    let bytes = hashmap_fixture();
    let mut decoder = ObjectStreamDecoder::new(&bytes);
    let value = decoder.decode().unwrap();

    let obj = value.as_object().unwrap();
    assert_eq!(obj.class.name, "X");
    assert!(obj.class.has_write_method());
    assert_eq!(obj.field("loadFactor"), Some(&Value::Float(0.75)));
    assert_eq!(obj.field("threshold"), Some(&Value::Int(12)));

    let items: Vec<&Value> = obj.annotation_items().collect();
    assert_eq!(items.len(), 3);
    assert_eq!(
        items[0],
        &Value::BlockData(vec![0, 0, 0, 16, 0, 0, 0, 1])
    );
    assert_eq!(items[1], &Value::Str("k".into()));
    assert_eq!(items[2], &Value::Str("v".into()));

    // class, object, "k", "v" — four handles, strictly increasing.
    assert_eq!(decoder.handles().assigned(), 4);
    assert_eq!(obj.handle, BASE_HANDLE + 1);
    assert_eq!(decoder.last_handle(), Some(BASE_HANDLE + 3));
}

#[test]
fn hashmap_fixture_reencodes_byte_exactly() {
    let bytes = hashmap_fixture();
    let decoded = decode(&bytes).unwrap();
    assert_eq!(encode(&decoded).unwrap(), bytes);
}

#[test]
fn decodes_int_array() {
    let mut w = Writer::new();
    header(&mut w);
    w.u8(0x75); // array
    w.u8(0x72);
    utf(&mut w, "[I");
    w.i64(0);
    w.u8(flags::SERIALIZABLE);
    w.u16(0);
    w.u8(0x78);
    w.u8(0x70);
    w.i32(3);
    w.i32(1);
    w.i32(2);
    w.i32(3);
    let bytes = w.flush();

    let decoded = decode(&bytes).unwrap();
    let arr = decoded.as_array().unwrap();
    assert_eq!(arr.class.name, "[I");
    assert_eq!(
        arr.elements,
        vec![Value::Int(1), Value::Int(2), Value::Int(3)]
    );
    assert_eq!(encode(&decoded).unwrap(), bytes);
}

#[test]
fn string_then_reference_resolves_to_same_text() {
    // Two top-level elements, read back to back without a header.
    let mut w = Writer::new();
    w.u8(0x74);
    utf(&mut w, "foo");
    w.u8(0x71);
    w.u32(BASE_HANDLE);
    let bytes = w.flush();

    let mut decoder = ObjectStreamDecoder::new(&bytes);
    assert_eq!(decoder.read_content().unwrap(), Value::Str("foo".into()));
    assert_eq!(decoder.read_content().unwrap(), Value::Str("foo".into()));
}

#[test]
fn reset_restarts_handle_assignment() {
    let mut w = Writer::new();
    w.u8(0x74);
    utf(&mut w, "before");
    w.u8(0x79); // reset
    w.u8(0x74);
    utf(&mut w, "after");
    w.u8(0x71);
    w.u32(BASE_HANDLE);
    let bytes = w.flush();

    let mut decoder = ObjectStreamDecoder::new(&bytes);
    assert_eq!(decoder.read_content().unwrap(), Value::Str("before".into()));
    // The reset tag is consumed transparently; the next element is decoded
    // in its place with a fresh table.
    assert_eq!(decoder.read_content().unwrap(), Value::Str("after".into()));
    assert_eq!(decoder.handles().assigned(), 1);
    // The base handle now names "after", not "before".
    assert_eq!(decoder.read_content().unwrap(), Value::Str("after".into()));
}

#[test]
fn unresolved_reference_substitutes_placeholder() {
    let mut w = Writer::new();
    header(&mut w);
    w.u8(0x71);
    w.u32(BASE_HANDLE + 5);
    let bytes = w.flush();

    let decoded = decode(&bytes).unwrap();
    assert_eq!(decoded, Value::UnresolvedRef(BASE_HANDLE + 5));

    // The placeholder is not encodable.
    assert_eq!(
        encode(&decoded),
        Err(EncodeError::UnresolvedPlaceholder(BASE_HANDLE + 5))
    );
}

#[test]
fn header_only_buffer_is_truncation_not_a_crash() {
    let bytes = [0xAC, 0xED, 0x00, 0x05];
    assert_eq!(decode(&bytes), Err(DecodeError::Truncated { offset: 4 }));
}

#[test]
fn truncated_mid_value_reports_offset_and_last_handle() {
    let mut bytes = hashmap_fixture();
    bytes.truncate(bytes.len() - 6); // cut into the "v" record and sentinel

    let mut decoder = ObjectStreamDecoder::new(&bytes);
    let err = decoder.decode().unwrap_err();
    assert!(matches!(err, DecodeError::Truncated { .. }));
    // Class, object, and "k" were assigned before the cut.
    assert_eq!(decoder.last_handle(), Some(BASE_HANDLE + 2));
}

#[test]
fn bad_magic_and_version_are_rejected() {
    assert_eq!(
        decode(&[0xAC, 0xEE, 0x00, 0x05, 0x70]),
        Err(DecodeError::HeaderMismatch {
            magic: 0xACEE,
            version: 0x0005
        })
    );
    assert_eq!(
        decode(&[0xAC, 0xED, 0x00, 0x04, 0x70]),
        Err(DecodeError::HeaderMismatch {
            magic: 0xACED,
            version: 0x0004
        })
    );
}

#[test]
fn unknown_type_code_is_malformed() {
    assert_eq!(
        decode(&[0xAC, 0xED, 0x00, 0x05, 0x6F]),
        Err(DecodeError::UnknownTypeCode {
            code: 0x6F,
            offset: 4
        })
    );
}

#[test]
fn stray_end_block_is_malformed() {
    assert_eq!(
        decode(&[0xAC, 0xED, 0x00, 0x05, 0x78]),
        Err(DecodeError::StrayEndBlock { offset: 4 })
    );
}

#[test]
fn exception_marker_fails_decode() {
    assert_eq!(
        decode(&[0xAC, 0xED, 0x00, 0x05, 0x7B]),
        Err(DecodeError::ExceptionInStream { offset: 4 })
    );
}

#[test]
fn type_string_must_be_string_or_reference() {
    // A class with an object field whose type string slot holds a null tag.
    let mut w = Writer::new();
    header(&mut w);
    w.u8(0x73);
    w.u8(0x72);
    utf(&mut w, "Y");
    w.i64(1);
    w.u8(flags::SERIALIZABLE);
    w.u16(1);
    w.u8(b'L');
    utf(&mut w, "ref");
    let offset = w.len();
    w.u8(0x70); // invalid here
    let bytes = w.flush();

    assert_eq!(decode(&bytes), Err(DecodeError::BadTypeString { offset }));
}

#[test]
fn long_string_form_decodes() {
    let mut w = Writer::new();
    header(&mut w);
    w.u8(0x7C);
    w.i64(3);
    w.buf(b"abc");
    let bytes = w.flush();
    assert_eq!(decode(&bytes), Ok(Value::Str("abc".into())));
}

#[test]
fn invalid_utf8_payload_decodes_via_fallback() {
    let mut w = Writer::new();
    header(&mut w);
    w.u8(0x74);
    w.u16(2);
    w.buf(&[0xFF, 0x41]);
    let bytes = w.flush();
    assert_eq!(decode(&bytes), Ok(Value::Str("\u{FF}A".into())));
}

#[test]
fn missing_field_value_fails_encode_whole() {
    use bwn_codec::{ClassDesc, FieldDesc, FieldType, ObjectValue};

    let class = ClassDesc::new("demo.Partial", 1, flags::SERIALIZABLE)
        .with_fields(vec![FieldDesc::prim(FieldType::Int, "n")]);
    let obj = ObjectValue::new(class);
    assert_eq!(
        encode(&Value::Object(Box::new(obj))),
        Err(EncodeError::MissingField {
            class: "demo.Partial".into(),
            field: "n".into()
        })
    );
}

#[test]
fn field_type_mismatch_fails_encode() {
    use bwn_codec::{ClassDesc, FieldDesc, FieldType, ObjectValue};

    let class = ClassDesc::new("demo.Typed", 1, flags::SERIALIZABLE)
        .with_fields(vec![FieldDesc::prim(FieldType::Int, "n")]);
    let mut obj = ObjectValue::new(class);
    obj.fields.push(("n".into(), Value::Str("not an int".into())));
    let err = encode(&Value::Object(Box::new(obj))).unwrap_err();
    assert_eq!(
        err,
        EncodeError::FieldTypeMismatch {
            class: "demo.Typed".into(),
            field: "n".into(),
            expected: "int",
            found: "string"
        }
    );
}

#[test]
fn bare_primitive_at_content_position_fails_encode() {
    assert_eq!(
        encode(&Value::Int(7)),
        Err(EncodeError::Unsupported(
            "a bare primitive outside a field or array"
        ))
    );
}

#[test]
fn externalizable_without_block_data_is_rejected_both_ways() {
    use bwn_codec::{ClassDesc, ObjectValue};

    let mut w = Writer::new();
    header(&mut w);
    w.u8(0x73);
    w.u8(0x72);
    utf(&mut w, "demo.Raw");
    w.i64(1);
    w.u8(flags::EXTERNALIZABLE);
    w.u16(0);
    w.u8(0x78);
    w.u8(0x70);
    let bytes = w.flush();
    assert!(matches!(
        decode(&bytes),
        Err(DecodeError::RawExternalContents { .. })
    ));

    let class = ClassDesc::new("demo.Raw", 1, flags::EXTERNALIZABLE);
    let obj = ObjectValue::new(class);
    assert!(matches!(
        encode(&Value::Object(Box::new(obj))),
        Err(EncodeError::Unsupported(_))
    ));
}
