//! Core data structures for sandbox bytecode components.
//!
//! This module defines the raw, structurally decoded types:
//! - The fixed header and the format revision it was read with
//! - Table offsets and their scaled byte positions
//! - Raw profiles, operation entries and opaque blocks
//!
//! Nothing here is resolved against the string tables; see
//! [`items`](super::items) for the resolved forms.

use serde::Serialize;

/// Header flags value for a container holding exactly one unnamed profile.
pub const SINGLE_PROFILE_FLAG: u16 = 0x0000;

/// Header flags value for a container holding a collection of named profiles.
pub const COLLECTION_FLAG: u16 = 0x8000;

/// Table offsets are stored divided by this factor.
pub const TABLE_OFFSET_SCALE: usize = 8;

/// Width of a single operation entry record.
pub const OPERATION_ENTRY_LEN: usize = 8;

/// Width of a single opaque block.
pub const OPAQUE_BLOCK_LEN: usize = 0x800;

/// The profile region is padded up to a multiple of this value.
pub const PROFILE_ALIGNMENT: usize = 8;

/// Known layouts of the fixed header.
///
/// The container carries no version marker, so the caller picks the
/// revision and the decoder branches on it in exactly one place per
/// optional region.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FormatRevision {
    /// 14-byte header without an entitlement key table.
    Legacy,
    /// 16-byte header carrying an entitlement key count.
    #[default]
    Entitlements,
}

impl FormatRevision {
    /// Returns the fixed header length for this revision.
    pub fn header_len(&self) -> usize {
        match self {
            FormatRevision::Legacy => 0x0E,
            FormatRevision::Entitlements => 0x10,
        }
    }

    /// Whether this revision carries an entitlement key table.
    pub fn has_entitlements(&self) -> bool {
        matches!(self, FormatRevision::Entitlements)
    }
}

/// Decoding configuration supplied by the caller.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    pub revision: FormatRevision,
}

impl DecodeOptions {
    pub fn with_revision(mut self, revision: FormatRevision) -> Self {
        self.revision = revision;
        self
    }
}

/// The fixed header at the start of every container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    /// The revision this header was decoded with.
    pub revision: FormatRevision,
    /// `0x0000` for a single profile, `0x8000` for a collection.
    pub flags: u16,
    /// Amount of 8-byte operation entries.
    pub operation_entry_count: u8,
    /// Amount of 0x800-byte opaque blocks following the operation entries.
    pub opaque_block_count: u8,
    /// Length of every profile's operation array. Must match the length
    /// of the operation name table used for resolution.
    pub table_operation_count: u8,
    /// Amount of pattern variables, such as `PROCESS_TEMP_DIR`.
    pub variable_count: u8,
    pub variable_state_count: u8,
    /// Byte 0x7, observed to be zero.
    pub reserved: u8,
    /// Amount of profiles. Only meaningful for collections.
    pub profile_count: u16,
    pub regex_count: u16,
    /// `None` when the revision has no entitlement key table.
    pub entitlement_key_count: Option<u16>,
    pub instruction_count: u16,
}

impl Header {
    /// Whether this container holds a collection of profiles.
    pub fn is_collection(&self) -> bool {
        self.flags == COLLECTION_FLAG
    }

    /// Whether this container holds an individual profile.
    pub fn is_single_profile(&self) -> bool {
        self.flags == SINGLE_PROFILE_FLAG
    }
}

/// A u16 offset into the data region following the fixed layout.
///
/// The stored value is scaled by [`TABLE_OFFSET_SCALE`] and is relative to
/// the forward read position at which offsets get resolved, not to the
/// start of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TableOffset(u16);

impl TableOffset {
    pub fn new(raw: u16) -> Self {
        Self(raw)
    }

    /// The value as stored in the container.
    pub fn raw(&self) -> u16 {
        self.0
    }

    /// The scaled byte position, relative to the table base.
    pub fn position(&self) -> usize {
        usize::from(self.0) * TABLE_OFFSET_SCALE
    }
}

impl From<u16> for TableOffset {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

/// A profile as laid out in the container, before name resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawProfile {
    /// Policy index. Zero for a single profile, otherwise as stored.
    pub index: u16,
    /// Offset of the profile's name. Only collection members have one.
    pub name_offset: Option<TableOffset>,
    /// Syscall mask. Single profiles inherit the header flags value.
    pub syscall_mask: u16,
    /// Absolute byte offset of this profile's record.
    pub offset: usize,
    /// Operation entry index for each positional sandbox operation.
    pub operations: Vec<u16>,
}

/// How evaluation proceeds after an operation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OperationKind {
    /// Evaluation continues at another entry.
    Continue,
    /// Evaluation ends at this entry.
    Terminate,
    /// An opcode with no known meaning.
    Unknown(u8),
}

impl From<u8> for OperationKind {
    fn from(opcode: u8) -> Self {
        match opcode {
            0x00 => Self::Continue,
            0x01 => Self::Terminate,
            other => Self::Unknown(other),
        }
    }
}

/// An 8-byte operation entry (decision node).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OperationEntry {
    pub opcode: u8,
    /// Only the low 7 bits identify the filter.
    pub filter: u8,
    pub operation_num: u16,
    pub unknown_two: u16,
    pub unknown_three: u16,
    /// Absolute byte offset of this entry.
    pub offset: usize,
}

impl OperationEntry {
    pub fn kind(&self) -> OperationKind {
        OperationKind::from(self.opcode)
    }

    /// The filter identifier, with the top bit masked off.
    pub fn filter_id(&self) -> u8 {
        self.filter & 0x7F
    }

    /// The raw top bit of the filter byte. Its meaning is unknown.
    pub fn filter_flag(&self) -> bool {
        self.filter & 0x80 != 0
    }
}

impl std::fmt::Display for OperationEntry {
    /// One-line listing. The filter byte is shown both masked and as stored.
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{:?}, filter {} ({:#04x}), operation {}, unknown {} {}",
            self.kind(),
            self.filter_id(),
            self.filter,
            self.operation_num,
            self.unknown_two,
            self.unknown_three
        )
    }
}

/// A fixed-size region of unknown meaning, kept byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueBlock {
    pub offset: usize,
    pub data: Vec<u8>,
}

/// Everything the layout pass reads, with offsets left unresolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBytecode {
    pub header: Header,
    pub regexes: Vec<TableOffset>,
    pub variables: Vec<TableOffset>,
    pub variable_states: Vec<TableOffset>,
    /// Empty when the revision has no entitlement key table.
    pub entitlements: Vec<TableOffset>,
    pub instructions: Vec<TableOffset>,
    pub profiles: Vec<RawProfile>,
    /// Bytes skipped to align the profile region.
    pub padding: usize,
    pub operation_entries: Vec<OperationEntry>,
    pub opaque_blocks: Vec<OpaqueBlock>,
    /// Forward position at the end of the layout pass. Every table
    /// offset is resolved relative to it.
    pub table_base: usize,
}
