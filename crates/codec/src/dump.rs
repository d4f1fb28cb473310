//! Human-readable structure summary of a decoded graph.

use std::fmt::Write;

use bwn_buffers::hex_preview;

use crate::value::Value;

const MAX_STRING: usize = 60;
const MAX_ELEMENTS: usize = 5;
const MAX_HEX: usize = 16;

/// Renders a decoded graph as an indented textual tree.
///
/// Long strings, large arrays, and block data payloads are truncated with a
/// note of what was left out. Output is deterministic, so it is usable in
/// golden tests as well as for eyeballing a freshly decoded file.
pub fn dump(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value, 0);
    out
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn write_value(out: &mut String, value: &Value, depth: usize) {
    indent(out, depth);
    match value {
        Value::Null => out.push_str("null\n"),
        Value::Bool(v) => {
            let _ = writeln!(out, "{v}");
        }
        Value::Byte(v) => {
            let _ = writeln!(out, "{v}b");
        }
        Value::Char(v) => match char::from_u32(*v as u32) {
            Some(c) => {
                let _ = writeln!(out, "'{c}'");
            }
            None => {
                let _ = writeln!(out, "'\\u{v:04x}'");
            }
        },
        Value::Short(v) => {
            let _ = writeln!(out, "{v}s");
        }
        Value::Int(v) => {
            let _ = writeln!(out, "{v}");
        }
        Value::Long(v) => {
            let _ = writeln!(out, "{v}L");
        }
        Value::Float(v) => {
            let _ = writeln!(out, "{v}f");
        }
        Value::Double(v) => {
            let _ = writeln!(out, "{v}");
        }
        Value::Str(s) => {
            let _ = writeln!(out, "\"{}\"", clip(s));
        }
        Value::BlockData(data) => {
            let _ = writeln!(
                out,
                "<block data, {} bytes: {}>",
                data.len(),
                hex_preview(data, MAX_HEX)
            );
        }
        Value::Object(obj) => {
            let _ = writeln!(out, "Object: {} (handle {:#x})", obj.class.name, obj.handle);
            for (name, field) in &obj.fields {
                indent(out, depth + 1);
                let _ = writeln!(out, ".{name}:");
                write_value(out, field, depth + 2);
            }
            if obj.annotations.iter().any(|a| !a.items.is_empty()) {
                indent(out, depth + 1);
                out.push_str("[annotations]:\n");
                for item in obj.annotation_items() {
                    write_value(out, item, depth + 2);
                }
            }
        }
        Value::Array(arr) => {
            let _ = writeln!(
                out,
                "Array[{}]: {} (handle {:#x})",
                arr.elements.len(),
                arr.class.name,
                arr.handle
            );
            for element in arr.elements.iter().take(MAX_ELEMENTS) {
                write_value(out, element, depth + 1);
            }
            if arr.elements.len() > MAX_ELEMENTS {
                indent(out, depth + 1);
                let _ = writeln!(out, "... ({} more)", arr.elements.len() - MAX_ELEMENTS);
            }
        }
        Value::Enum(e) => {
            let _ = writeln!(out, "Enum: {}.{}", e.class.name, e.constant);
        }
        Value::Class(c) => {
            let _ = writeln!(out, "Class: {}", c.name);
        }
        Value::Ref(handle) => {
            let _ = writeln!(out, "<ref {handle:#x}>");
        }
        Value::UnresolvedRef(handle) => {
            let _ = writeln!(out, "<unresolved ref {handle:#x}>");
        }
    }
}

fn clip(s: &str) -> String {
    if s.chars().count() <= MAX_STRING {
        return s.to_owned();
    }
    let mut clipped: String = s.chars().take(MAX_STRING).collect();
    clipped.push_str("...");
    clipped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::flags;
    use crate::desc::ClassDesc;
    use crate::value::{InstanceAnnotation, ObjectValue};

    #[test]
    fn dumps_nested_object() {
        let mut obj = ObjectValue::new(ClassDesc::new("demo.Step", 1, flags::SERIALIZABLE));
        obj.handle = 0x7E0001;
        obj.fields.push(("comment".into(), Value::Str("start".into())));
        obj.fields.push(("enabled".into(), Value::Bool(true)));
        let text = dump(&Value::Object(Box::new(obj)));

        assert!(text.starts_with("Object: demo.Step (handle 0x7e0001)\n"));
        assert!(text.contains(".comment:\n"));
        assert!(text.contains("\"start\"\n"));
        assert!(text.contains("true\n"));
    }

    #[test]
    fn clips_long_strings_and_annotations_show() {
        let mut obj = ObjectValue::new(ClassDesc::new("X", 1, flags::SERIALIZABLE));
        obj.annotations.push(InstanceAnnotation {
            class_name: "X".into(),
            items: vec![Value::Str("x".repeat(200))],
        });
        let text = dump(&Value::Object(Box::new(obj)));
        assert!(text.contains("[annotations]:"));
        assert!(text.contains(&format!("\"{}...\"", "x".repeat(60))));
    }

    #[test]
    fn block_data_preview_is_bounded() {
        let text = dump(&Value::BlockData(vec![0xAB; 40]));
        assert!(text.contains("40 bytes"));
        assert!(text.contains("(24 more)"));
    }
}
