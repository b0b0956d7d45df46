//! Resolution of raw layout output into named items.
//!
//! Table offsets are resolved through a [`Cursor`] positioned at the table
//! base recorded by the layout pass, and profile operation arrays are zipped
//! against the caller's operation name table.

use log::{debug, info};

use crate::sandbox::cursor::Cursor;
use crate::sandbox::types::error::{BytecodeError, Result};
use crate::sandbox::types::items::{
    Bytecode, DataItem, IndexedOperation, InstructionRef, NamedOperation, Profile, StringItem,
};
use crate::sandbox::types::models::{RawBytecode, RawProfile, TableOffset};
use crate::sandbox::types::names::OperationNames;

/// Label given to the unnamed profile of a single-profile container.
pub const SINGLE_PROFILE_NAME: &str = "Single Profile";

/// Resolves every table and profile of `raw`, which was decoded from `data`.
pub fn resolve(raw: &RawBytecode, data: &[u8], names: &OperationNames) -> Result<Bytecode> {
    let expected = usize::from(raw.header.table_operation_count);
    if names.len() != expected {
        return Err(BytecodeError::InvalidOperationCount {
            expected,
            found: names.len(),
        });
    }

    let cursor = Cursor::at(data, raw.table_base);

    let bytecode = Bytecode {
        header: raw.header.clone(),
        regexes: resolve_data(&cursor, &raw.regexes)?,
        variables: resolve_strings(&cursor, &raw.variables)?,
        variable_states: resolve_data(&cursor, &raw.variable_states)?,
        entitlements: resolve_strings(&cursor, &raw.entitlements)?,
        instructions: raw
            .instructions
            .iter()
            .enumerate()
            .map(|(index, &offset)| InstructionRef { index, offset })
            .collect(),
        profiles: raw
            .profiles
            .iter()
            .map(|profile| resolve_profile(&cursor, profile, names))
            .collect::<Result<_>>()?,
        operation_entries: raw
            .operation_entries
            .iter()
            .enumerate()
            .map(|(index, &value)| IndexedOperation { index, value })
            .collect(),
        opaque_blocks: raw
            .opaque_blocks
            .iter()
            .enumerate()
            .map(|(index, block)| DataItem {
                index,
                offset: block.offset,
                value: block.data.clone(),
            })
            .collect(),
    };

    info!(
        "Resolved {} regexes, {} variables, {} entitlements, {} profiles",
        bytecode.regexes.len(),
        bytecode.variables.len(),
        bytecode.entitlements.len(),
        bytecode.profiles.len()
    );
    Ok(bytecode)
}

fn resolve_data(cursor: &Cursor<'_>, offsets: &[TableOffset]) -> Result<Vec<DataItem>> {
    offsets
        .iter()
        .enumerate()
        .map(|(index, &offset)| {
            Ok(DataItem {
                index,
                offset: offset.position(),
                value: cursor.read_sized_region(offset)?.to_vec(),
            })
        })
        .collect()
}

fn resolve_strings(cursor: &Cursor<'_>, offsets: &[TableOffset]) -> Result<Vec<StringItem>> {
    offsets
        .iter()
        .enumerate()
        .map(|(index, &offset)| {
            Ok(StringItem {
                index,
                offset: offset.position(),
                value: cursor.read_string(offset)?,
            })
        })
        .collect()
}

fn resolve_profile(cursor: &Cursor<'_>, profile: &RawProfile, names: &OperationNames) -> Result<Profile> {
    let name = match profile.name_offset {
        Some(offset) => cursor.read_string(offset)?,
        None => SINGLE_PROFILE_NAME.to_string(),
    };
    debug!("Resolving profile '{}' at {:#x}", name, profile.offset);

    Ok(Profile {
        name,
        syscall_mask: profile.syscall_mask,
        index: profile.index,
        offset: profile.offset,
        operations: bind_operations(&profile.operations, names)?,
    })
}

/// Pairs each positional operation entry index with its operation name.
///
/// A length mismatch means the name table belongs to another release.
pub fn bind_operations(operations: &[u16], names: &OperationNames) -> Result<Vec<NamedOperation>> {
    if operations.len() != names.len() {
        return Err(BytecodeError::InvalidOperationCount {
            expected: operations.len(),
            found: names.len(),
        });
    }

    Ok(operations
        .iter()
        .zip(names.iter())
        .enumerate()
        .map(|(operation_id, (&operation_entry, name))| NamedOperation {
            operation_id,
            name: name.to_string(),
            operation_entry,
        })
        .collect())
}
