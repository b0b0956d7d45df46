//! The structural decode pass.
//!
//! # Container Structure
//! ```text
//! ┌──────────────────────────┐
//! │  Header (14/16 bytes)    │ ← header::parse()
//! ├──────────────────────────┤
//! │  Offset tables (u16 × n) │   regex, variable, variable state,
//! │                          │   [entitlement key], instruction
//! ├──────────────────────────┤
//! │  Profiles                │   single: operations only
//! │                          │   collection: triple + operations, × n
//! ├──────────────────────────┤
//! │  Padding to 8 bytes      │
//! ├──────────────────────────┤
//! │  Operation entries (8 B) │
//! ├──────────────────────────┤
//! │  Opaque blocks (0x800 B) │
//! ├──────────────────────────┤ ← table base
//! │  Strings and data blobs  │   addressed by table offsets
//! └──────────────────────────┘
//! ```
//!
//! The pass is all-or-nothing: the first failed read aborts the decode.

use log::{debug, info, trace};

use crate::sandbox::cursor::Cursor;
use crate::sandbox::format::{header, records};
use crate::sandbox::types::error::{BytecodeError, Result};
use crate::sandbox::types::models::{
    DecodeOptions, Header, OPAQUE_BLOCK_LEN, OPERATION_ENTRY_LEN, OpaqueBlock, OperationEntry,
    PROFILE_ALIGNMENT, RawBytecode, RawProfile, TableOffset,
};

/// Offset tables in the order they follow the header.
#[derive(Debug, Default)]
struct OffsetTables {
    regexes: Vec<TableOffset>,
    variables: Vec<TableOffset>,
    variable_states: Vec<TableOffset>,
    entitlements: Vec<TableOffset>,
    instructions: Vec<TableOffset>,
}

/// Decodes the fixed layout of a container.
pub fn decode(data: &[u8], options: DecodeOptions) -> Result<RawBytecode> {
    let revision = options.revision;
    let header_len = revision.header_len();
    if data.len() < header_len {
        return Err(BytecodeError::TooSmall {
            expected: header_len,
            found: data.len(),
        });
    }

    let mut cursor = Cursor::new(data);
    let header = header::parse(cursor.read_bytes(header_len)?, revision)?;

    let tables = read_offset_tables(&mut cursor, &header)?;
    let profiles = read_profiles(&mut cursor, &header)?;

    let padding = cursor.align(PROFILE_ALIGNMENT)?;
    debug!("Profile region padded by {} bytes, now at {:#x}", padding, cursor.position());

    let operation_entries = read_operation_entries(&mut cursor, usize::from(header.operation_entry_count))?;
    let opaque_blocks = read_opaque_blocks(&mut cursor, usize::from(header.opaque_block_count))?;

    let table_base = cursor.position();
    info!(
        "Layout decoded: {} profiles, {} operation entries, {} opaque blocks, table base {:#x}",
        profiles.len(),
        operation_entries.len(),
        opaque_blocks.len(),
        table_base
    );

    Ok(RawBytecode {
        header,
        regexes: tables.regexes,
        variables: tables.variables,
        variable_states: tables.variable_states,
        entitlements: tables.entitlements,
        instructions: tables.instructions,
        profiles,
        padding,
        operation_entries,
        opaque_blocks,
        table_base,
    })
}

fn read_offset_tables(cursor: &mut Cursor<'_>, header: &Header) -> Result<OffsetTables> {
    let start = cursor.position();
    let regexes = cursor.read_offset_table(usize::from(header.regex_count))?;
    let variables = cursor.read_offset_table(usize::from(header.variable_count))?;
    let variable_states = cursor.read_offset_table(usize::from(header.variable_state_count))?;
    let entitlements = match header.entitlement_key_count {
        Some(count) => cursor.read_offset_table(usize::from(count))?,
        None => Vec::new(),
    };
    let instructions = cursor.read_offset_table(usize::from(header.instruction_count))?;

    debug!(
        "Offset tables {:#x}..{:#x}: regex={}, variable={}, state={}, entitlement={}, instruction={}",
        start,
        cursor.position(),
        regexes.len(),
        variables.len(),
        variable_states.len(),
        entitlements.len(),
        instructions.len()
    );

    Ok(OffsetTables {
        regexes,
        variables,
        variable_states,
        entitlements,
        instructions,
    })
}

fn read_profiles(cursor: &mut Cursor<'_>, header: &Header) -> Result<Vec<RawProfile>> {
    let operation_count = usize::from(header.table_operation_count);

    if header.is_single_profile() {
        // A lone profile has no name and inherits its mask from the flags.
        let offset = cursor.position();
        let operations = read_operations(cursor, operation_count)?;
        debug!("Single profile at {:#x} with {} operations", offset, operations.len());
        return Ok(vec![RawProfile {
            index: 0,
            name_offset: None,
            syscall_mask: header.flags,
            offset,
            operations,
        }]);
    }

    let mut profiles = Vec::with_capacity(usize::from(header.profile_count));
    for _ in 0..header.profile_count {
        let offset = cursor.position();
        let triple = records::decode_profile_triple(cursor.read_array()?);
        let operations = read_operations(cursor, operation_count)?;
        trace!(
            "Collection profile at {:#x}: index={}, mask={:#06x}, name offset={:#x}",
            offset,
            triple.index,
            triple.syscall_mask,
            triple.name_offset.position()
        );
        profiles.push(RawProfile {
            index: triple.index,
            name_offset: Some(triple.name_offset),
            syscall_mask: triple.syscall_mask,
            offset,
            operations,
        });
    }
    debug!("Collection holds {} profiles", profiles.len());
    Ok(profiles)
}

fn read_operations(cursor: &mut Cursor<'_>, count: usize) -> Result<Vec<u16>> {
    (0..count).map(|_| cursor.read_u16()).collect()
}

fn read_operation_entries(cursor: &mut Cursor<'_>, count: usize) -> Result<Vec<OperationEntry>> {
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let offset = cursor.position();
        let entry = records::decode_operation_entry(cursor.read_array::<OPERATION_ENTRY_LEN>()?, offset);
        trace!("Operation entry at {:#x}: {:?}", offset, entry);
        entries.push(entry);
    }
    debug!("Read {} operation entries", entries.len());
    Ok(entries)
}

fn read_opaque_blocks(cursor: &mut Cursor<'_>, count: usize) -> Result<Vec<OpaqueBlock>> {
    let mut blocks = Vec::with_capacity(count);
    for _ in 0..count {
        let offset = cursor.position();
        let data = cursor.read_bytes(OPAQUE_BLOCK_LEN)?.to_vec();
        blocks.push(OpaqueBlock { offset, data });
    }
    debug!("Read {} opaque blocks", blocks.len());
    Ok(blocks)
}
