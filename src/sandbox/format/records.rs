//! Fixed-width record decoders.
//!
//! These only interpret bytes the layout pass has already sliced out; bounds
//! are the cursor's concern.

use byteorder::{ByteOrder, LittleEndian};

use crate::sandbox::types::models::{OPERATION_ENTRY_LEN, OperationEntry, TableOffset};

/// Width of a collection member's leading fields.
pub const PROFILE_TRIPLE_LEN: usize = 6;

/// Leading fields of a collection member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileTriple {
    pub name_offset: TableOffset,
    pub syscall_mask: u16,
    pub index: u16,
}

/// Decodes a profile triple.
///
/// ```text
/// 0x0 u16 name offset
/// 0x2 u16 syscall mask
/// 0x4 u16 policy index
/// ```
pub fn decode_profile_triple(contents: &[u8; PROFILE_TRIPLE_LEN]) -> ProfileTriple {
    ProfileTriple {
        name_offset: TableOffset::new(LittleEndian::read_u16(&contents[0..2])),
        syscall_mask: LittleEndian::read_u16(&contents[2..4]),
        index: LittleEndian::read_u16(&contents[4..6]),
    }
}

/// Decodes an operation entry located at absolute `offset`.
///
/// ```text
/// 0x0 u8  opcode
/// 0x1 u8  filter
/// 0x2 u16 operation number
/// 0x4 u16 unknown
/// 0x6 u16 unknown
/// ```
pub fn decode_operation_entry(contents: &[u8; OPERATION_ENTRY_LEN], offset: usize) -> OperationEntry {
    OperationEntry {
        opcode: contents[0],
        filter: contents[1],
        operation_num: LittleEndian::read_u16(&contents[2..4]),
        unknown_two: LittleEndian::read_u16(&contents[4..6]),
        unknown_three: LittleEndian::read_u16(&contents[6..8]),
        offset,
    }
}
