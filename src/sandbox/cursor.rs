//! Bounds-checked reading over an immutable container buffer.
//!
//! A [`Cursor`] has one forward position. Sequential reads consume bytes at
//! that position and advance it. Addressed reads take a [`TableOffset`],
//! add its scaled position to the current forward position, and leave the
//! forward position untouched. Offset tables are written relative to the
//! end of the fixed layout, so addressed reads are only meaningful once the
//! layout pass has moved the cursor there.

use byteorder::{ByteOrder, LittleEndian};
use log::trace;

use crate::sandbox::types::error::{BytecodeError, Result};
use crate::sandbox::types::models::TableOffset;

#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Creates a cursor whose forward position is already `position`.
    ///
    /// Used to resolve table offsets against a previously recorded base.
    pub fn at(data: &'a [u8], position: usize) -> Self {
        Self { data, position }
    }

    /// The current forward position.
    pub fn position(&self) -> usize {
        self.position
    }

    // --- Sequential reads ---

    /// Reads `length` bytes at the forward position and advances past them.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        let bytes = self.slice(self.position, length)?;
        self.position += length;
        Ok(bytes)
    }

    /// Reads a fixed-width record at the forward position.
    pub fn read_array<const N: usize>(&mut self) -> Result<&'a [u8; N]> {
        let array = self
            .data
            .get(self.position..)
            .and_then(|rest| rest.first_chunk::<N>())
            .ok_or(BytecodeError::OffsetTooLarge {
                offset: self.position,
                length: N,
                available: self.data.len(),
            })?;
        self.position += N;
        Ok(array)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.read_bytes(2)?))
    }

    /// Reads `count` consecutive table offsets.
    pub fn read_offset_table(&mut self, count: usize) -> Result<Vec<TableOffset>> {
        let length = count.checked_mul(2).ok_or(BytecodeError::OffsetTooLarge {
            offset: self.position,
            length: usize::MAX,
            available: self.data.len(),
        })?;
        let table = self.read_bytes(length)?;
        Ok(table
            .chunks_exact(2)
            .map(|raw| TableOffset::new(LittleEndian::read_u16(raw)))
            .collect())
    }

    /// Advances the forward position to the next multiple of `alignment`,
    /// returning the amount of bytes skipped.
    pub fn align(&mut self, alignment: usize) -> Result<usize> {
        let padding = padding_for(self.position, alignment);
        if padding != 0 {
            self.read_bytes(padding)?;
        }
        Ok(padding)
    }

    // --- Addressed reads ---

    /// Reads `length` bytes at `offset`, relative to the forward position.
    pub fn read_at(&self, offset: TableOffset, length: usize) -> Result<&'a [u8]> {
        let start = self.resolve(offset)?;
        self.slice(start, length)
    }

    /// Reads a u16 length at `offset`, then that many following bytes.
    pub fn read_sized_region(&self, offset: TableOffset) -> Result<&'a [u8]> {
        let start = self.resolve(offset)?;
        let length = usize::from(LittleEndian::read_u16(self.slice(start, 2)?));
        trace!("Sized region at {:#x}: {} bytes", start, length);
        self.slice(start + 2, length)
    }

    /// Reads a sized region at `offset` and decodes it as strict UTF-8.
    pub fn read_string(&self, offset: TableOffset) -> Result<String> {
        let bytes = self.read_sized_region(offset)?;
        encoding_rs::UTF_8
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(|text| text.into_owned())
            .ok_or(BytecodeError::InvalidString {
                offset: self.position + offset.position(),
            })
    }

    fn resolve(&self, offset: TableOffset) -> Result<usize> {
        self.position
            .checked_add(offset.position())
            .ok_or(BytecodeError::OffsetTooLarge {
                offset: offset.position(),
                length: 0,
                available: self.data.len(),
            })
    }

    fn slice(&self, start: usize, length: usize) -> Result<&'a [u8]> {
        let out_of_bounds = || BytecodeError::OffsetTooLarge {
            offset: start,
            length,
            available: self.data.len(),
        };
        let end = start.checked_add(length).ok_or_else(out_of_bounds)?;
        self.data.get(start..end).ok_or_else(out_of_bounds)
    }
}

/// Bytes needed to move `position` up to the next multiple of `alignment`.
pub fn padding_for(position: usize, alignment: usize) -> usize {
    match position % alignment {
        0 => 0,
        remainder => alignment - remainder,
    }
}
