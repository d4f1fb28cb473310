//! Handle assignment and back-reference tables.
//!
//! Both tables are owned by exactly one decode or encode session and are
//! never shared; concurrent streams each get their own.

use std::collections::HashMap;

use crate::constants::BASE_HANDLE;
use crate::desc::ClassDesc;

/// What a decode-time handle points at.
///
/// Strings and class descriptors are stored whole because later stream
/// positions need their contents (type strings, enum constants, the field
/// schema of a referenced class). Objects, arrays, and enums only need their
/// existence recorded — references to them stay lazy in the value tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Str(String),
    Class(ClassDesc),
    /// The wrapper handle a class-as-value allocates, distinct from the
    /// descriptor's own handle.
    ClassObject(ClassDesc),
    Object,
    Array,
    Enum,
}

/// Decode-side handle table: monotonically assigned handles mapped to the
/// entities they were assigned to.
#[derive(Debug, Default)]
pub struct HandleTable {
    next: u32,
    entries: HashMap<u32, Entity>,
}

impl HandleTable {
    pub fn new() -> HandleTable {
        HandleTable {
            next: BASE_HANDLE,
            entries: HashMap::new(),
        }
    }

    /// Returns the next handle and advances the counter.
    pub fn allocate(&mut self) -> u32 {
        let handle = self.next;
        self.next += 1;
        handle
    }

    /// Records what a handle points at. Re-registering the same handle
    /// replaces the entry; the decoder uses that to finalize a class
    /// descriptor registered before its fields were read.
    pub fn register(&mut self, handle: u32, entity: Entity) {
        self.entries.insert(handle, entity);
    }

    pub fn resolve(&self, handle: u32) -> Option<&Entity> {
        self.entries.get(&handle)
    }

    /// Clears every entry and restarts assignment at the base handle.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.next = BASE_HANDLE;
    }

    /// The handle the next allocation will return.
    pub fn next_handle(&self) -> u32 {
        self.next
    }

    /// Number of handles assigned since the last reset.
    pub fn assigned(&self) -> u32 {
        self.next - BASE_HANDLE
    }
}

/// Encode-side aliasing table.
///
/// Mirrors the deduplication the foreign writer performs: strings alias by
/// content, class descriptors by name, while objects/arrays/enums are never
/// structurally deduplicated — a back-reference to one of those only happens
/// through an explicit `Ref` node, resolved via the source-handle map.
#[derive(Debug, Default)]
pub struct AliasTable {
    next: u32,
    strings: HashMap<String, u32>,
    classes: HashMap<String, u32>,
    sources: HashMap<u32, u32>,
}

impl AliasTable {
    pub fn new() -> AliasTable {
        AliasTable {
            next: BASE_HANDLE,
            strings: HashMap::new(),
            classes: HashMap::new(),
            sources: HashMap::new(),
        }
    }

    pub fn allocate(&mut self) -> u32 {
        let handle = self.next;
        self.next += 1;
        handle
    }

    pub fn string(&self, text: &str) -> Option<u32> {
        self.strings.get(text).copied()
    }

    pub fn remember_string(&mut self, text: &str, handle: u32) {
        self.strings.insert(text.to_owned(), handle);
    }

    pub fn class(&self, name: &str) -> Option<u32> {
        self.classes.get(name).copied()
    }

    pub fn remember_class(&mut self, name: &str, handle: u32) {
        self.classes.insert(name.to_owned(), handle);
    }

    /// The handle this stream emitted for an entity that carried `source`
    /// as its decode-time handle.
    pub fn emitted(&self, source: u32) -> Option<u32> {
        self.sources.get(&source).copied()
    }

    pub fn remember_source(&mut self, source: u32, handle: u32) {
        self.sources.insert(source, handle);
    }

    pub fn reset(&mut self) {
        self.strings.clear();
        self.classes.clear();
        self.sources.clear();
        self.next = BASE_HANDLE;
    }
}
