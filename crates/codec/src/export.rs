//! Lossy JSON projection of a decoded graph.
//!
//! Meant for inspection and diffing, not as an input format: class schemas
//! are reduced to names, primitives lose their wire widths, and binary
//! payloads are base64-encoded. Reserved `__`-prefixed keys carry the
//! structural metadata alongside the plain field keys.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Map, Value as Json};

use crate::value::Value;

/// Projects a decoded graph into a [`serde_json::Value`].
///
/// Field insertion order follows hierarchy declaration order. Duplicate
/// field names collapse to the most-derived value, matching the by-name
/// accessor on objects.
pub fn to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(v) => json!(v),
        Value::Byte(v) => json!(v),
        Value::Char(v) => match char::from_u32(*v as u32) {
            Some(c) => json!(c.to_string()),
            None => json!(format!("\\u{v:04x}")),
        },
        Value::Short(v) => json!(v),
        Value::Int(v) => json!(v),
        Value::Long(v) => json!(v),
        Value::Float(v) => number_or_null(*v as f64),
        Value::Double(v) => number_or_null(*v),
        Value::Str(s) => json!(s),
        Value::BlockData(data) => json!({
            "__blockdata__": STANDARD.encode(data),
            "__len__": data.len(),
        }),
        Value::Object(obj) => {
            let mut map = Map::new();
            map.insert("__class__".into(), json!(obj.class.name));
            map.insert("__handle__".into(), json!(format!("{:#x}", obj.handle)));
            for (name, field) in &obj.fields {
                map.insert(name.clone(), to_json(field));
            }
            let annotations: Vec<Json> = obj.annotation_items().map(to_json).collect();
            if !annotations.is_empty() {
                map.insert("__annotations__".into(), Json::Array(annotations));
            }
            Json::Object(map)
        }
        Value::Array(arr) => json!({
            "__array__": arr.class.name,
            "__len__": arr.elements.len(),
            "__elements__": arr.elements.iter().map(to_json).collect::<Vec<_>>(),
        }),
        Value::Enum(e) => json!({
            "__enum__": e.class.name,
            "__value__": e.constant,
        }),
        Value::Class(c) => json!({ "__classdesc__": c.name }),
        Value::Ref(handle) => json!({ "__ref__": format!("{handle:#x}") }),
        Value::UnresolvedRef(handle) => json!({ "__unresolved__": format!("{handle:#x}") }),
    }
}

fn number_or_null(v: f64) -> Json {
    serde_json::Number::from_f64(v).map_or(Json::Null, Json::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::flags;
    use crate::desc::ClassDesc;
    use crate::value::{InstanceAnnotation, ObjectValue};

    #[test]
    fn object_projection_keeps_field_order() {
        let mut obj = ObjectValue::new(ClassDesc::new(
            "java.util.HashMap",
            362498820763181265,
            flags::SERIALIZABLE | flags::WRITE_METHOD,
        ));
        obj.handle = 0x7E0002;
        obj.fields.push(("loadFactor".into(), Value::Float(0.75)));
        obj.fields.push(("threshold".into(), Value::Int(12)));
        obj.annotations.push(InstanceAnnotation {
            class_name: "java.util.HashMap".into(),
            items: vec![Value::Str("k".into()), Value::Str("v".into())],
        });

        let js = to_json(&Value::Object(Box::new(obj)));
        let map = js.as_object().unwrap();
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            [
                "__class__",
                "__handle__",
                "loadFactor",
                "threshold",
                "__annotations__"
            ]
        );
        assert_eq!(map["__handle__"], json!("0x7e0002"));
        assert_eq!(map["__annotations__"], json!(["k", "v"]));
    }

    #[test]
    fn block_data_is_base64() {
        let js = to_json(&Value::BlockData(vec![0, 1, 2]));
        assert_eq!(js["__blockdata__"], json!("AAEC"));
        assert_eq!(js["__len__"], json!(3));
    }

    #[test]
    fn non_finite_floats_become_null() {
        assert_eq!(to_json(&Value::Double(f64::NAN)), Json::Null);
        assert_eq!(to_json(&Value::Double(1.5)), json!(1.5));
    }
}
