//! Resolved, human-inspectable items.
//!
//! Every item owns its values and carries the byte offset it came from,
//! so a resolved [`Bytecode`] never borrows the input buffer.

use serde::Serialize;

use super::models::{Header, OperationEntry, TableOffset};

/// A sized data blob resolved from a table offset, or an opaque block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataItem {
    pub index: usize,
    /// Position relative to the table base, or absolute for opaque blocks.
    pub offset: usize,
    #[serde(with = "hex_bytes")]
    pub value: Vec<u8>,
}

/// A string resolved from a table offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StringItem {
    pub index: usize,
    pub offset: usize,
    pub value: String,
}

/// An instruction table entry. Instructions are not interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InstructionRef {
    pub index: usize,
    /// Serialized as its byte position relative to the table base.
    #[serde(serialize_with = "scaled_offset")]
    pub offset: TableOffset,
}

/// Pairs a positional sandbox operation with the entry a profile selects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedOperation {
    /// Position within the operation name table.
    pub operation_id: usize,
    pub name: String,
    /// Index into the operation entry table.
    pub operation_entry: u16,
}

/// A profile with its name and operation bindings resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub name: String,
    pub syscall_mask: u16,
    pub index: u16,
    pub offset: usize,
    pub operations: Vec<NamedOperation>,
}

/// An operation entry with its position in the entry table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexedOperation {
    pub index: usize,
    pub value: OperationEntry,
}

/// The fully resolved contents of one container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bytecode {
    pub header: Header,
    pub regexes: Vec<DataItem>,
    pub variables: Vec<StringItem>,
    pub variable_states: Vec<DataItem>,
    pub entitlements: Vec<StringItem>,
    pub instructions: Vec<InstructionRef>,
    pub profiles: Vec<Profile>,
    pub operation_entries: Vec<IndexedOperation>,
    pub opaque_blocks: Vec<DataItem>,
}

/// A labelled top-level section of a container, for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub label: &'static str,
    pub count: usize,
}

mod hex_bytes {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }
}

fn scaled_offset<S: serde::Serializer>(offset: &TableOffset, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(offset.position() as u64)
}
