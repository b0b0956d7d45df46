use std::path::Path;
use log::info;

use super::cursor::Cursor;
use super::format::layout;
use super::resolve;
use super::types::error::Result;
use super::types::items::{Bytecode, Section};
use super::types::models::*;
use super::types::names::OperationNames;

/// The main reader for compiled sandbox profile containers.
///
/// Owns a copy of the container bytes together with the structural decode.
/// Decoding happens once, in the constructor; resolution against an
/// operation name table can be repeated with different tables.
#[derive(Debug, Clone)]
pub struct BytecodeReader {
    data: Vec<u8>,
    raw: RawBytecode,
}

impl BytecodeReader {
    /// Decodes a container using the default format revision.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The buffer is shorter than the header
    /// - The header flags are neither a single profile nor a collection
    /// - Any table or record runs past the end of the buffer
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Result<Self> {
        Self::from_bytes_with(data, DecodeOptions::default())
    }

    /// Decodes a container with explicit options.
    pub fn from_bytes_with(data: impl Into<Vec<u8>>, options: DecodeOptions) -> Result<Self> {
        let data = data.into();
        let raw = layout::decode(&data, options)?;
        Ok(Self { data, raw })
    }

    /// Reads and decodes a container file using the default format revision.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_path_with(path, DecodeOptions::default())
    }

    /// Reads and decodes a container file with explicit options.
    pub fn from_path_with(path: impl AsRef<Path>, options: DecodeOptions) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening sandbox bytecode: {}", path.display());
        let data = std::fs::read(path)?;
        Self::from_bytes_with(data, options)
    }

    pub fn header(&self) -> &Header {
        &self.raw.header
    }

    /// The structural decode, with offsets unresolved.
    pub fn raw(&self) -> &RawBytecode {
        &self.raw
    }

    /// The container bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// The forward position every table offset is relative to.
    pub fn table_base(&self) -> usize {
        self.raw.table_base
    }

    /// Resolves strings, data blobs and profile operation names.
    ///
    /// `names` must hold exactly `table_operation_count` entries.
    pub fn resolve(&self, names: &OperationNames) -> Result<Bytecode> {
        resolve::resolve(&self.raw, &self.data, names)
    }

    /// Reads `length` raw bytes at a table offset.
    ///
    /// Useful for regions this crate does not interpret, such as the
    /// targets of the instruction table.
    pub fn read_at(&self, offset: TableOffset, length: usize) -> Result<Vec<u8>> {
        let cursor = Cursor::at(&self.data, self.raw.table_base);
        Ok(cursor.read_at(offset, length)?.to_vec())
    }

    /// Reads the length-prefixed region at a table offset.
    pub fn read_sized(&self, offset: TableOffset) -> Result<Vec<u8>> {
        let cursor = Cursor::at(&self.data, self.raw.table_base);
        Ok(cursor.read_sized_region(offset)?.to_vec())
    }

    /// Lists the container's top-level sections with their item counts.
    pub fn sections(&self) -> Vec<Section> {
        let raw = &self.raw;
        vec![
            Section { label: "Regex", count: raw.regexes.len() },
            Section { label: "Variables", count: raw.variables.len() },
            Section { label: "Variable States", count: raw.variable_states.len() },
            Section { label: "Entitlements", count: raw.entitlements.len() },
            Section { label: "Instructions", count: raw.instructions.len() },
            Section { label: "Profiles", count: raw.profiles.len() },
            Section { label: "Operation Entries", count: raw.operation_entries.len() },
            Section { label: "Opaque Blocks", count: raw.opaque_blocks.len() },
        ]
    }
}
