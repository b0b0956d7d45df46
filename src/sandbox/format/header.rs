//! Fixed header parsing.
//!
//! # Header Structure
//! ```text
//! 0x0  u16  flags (0x0000 single profile, 0x8000 collection)
//! 0x2  u8   operation entry count
//! 0x3  u8   opaque block count
//! 0x4  u8   table operation count
//! 0x5  u8   variable count
//! 0x6  u8   variable state count
//! 0x7  u8   reserved
//! 0x8  u16  profile count
//! 0xA  u16  regex count
//! 0xC  u16  entitlement key count   (Entitlements revision only)
//! 0xC/0xE u16 instruction count
//! ```

use byteorder::{ByteOrder, LittleEndian};
use log::{debug, trace};

use crate::sandbox::types::error::{BytecodeError, Result};
use crate::sandbox::types::models::{COLLECTION_FLAG, FormatRevision, Header, SINGLE_PROFILE_FLAG};

/// Parses a header from exactly `revision.header_len()` bytes.
pub fn parse(contents: &[u8], revision: FormatRevision) -> Result<Header> {
    let expected = revision.header_len();
    if contents.len() != expected {
        return Err(BytecodeError::TooSmall {
            expected,
            found: contents.len(),
        });
    }

    let flags = LittleEndian::read_u16(&contents[0x0..0x2]);
    let (entitlement_key_count, instruction_count) = match revision {
        FormatRevision::Legacy => (None, LittleEndian::read_u16(&contents[0xC..0xE])),
        FormatRevision::Entitlements => (
            Some(LittleEndian::read_u16(&contents[0xC..0xE])),
            LittleEndian::read_u16(&contents[0xE..0x10]),
        ),
    };

    let header = Header {
        revision,
        flags,
        operation_entry_count: contents[0x2],
        opaque_block_count: contents[0x3],
        table_operation_count: contents[0x4],
        variable_count: contents[0x5],
        variable_state_count: contents[0x6],
        reserved: contents[0x7],
        profile_count: LittleEndian::read_u16(&contents[0x8..0xA]),
        regex_count: LittleEndian::read_u16(&contents[0xA..0xC]),
        entitlement_key_count,
        instruction_count,
    };
    trace!("Raw header: {:?}", header);

    if flags != SINGLE_PROFILE_FLAG && flags != COLLECTION_FLAG {
        return Err(BytecodeError::UnknownBytecodeFlag(flags));
    }

    debug!(
        "Header parsed: {:?} revision, {}, {} table operations",
        revision,
        if header.is_collection() { "collection" } else { "single profile" },
        header.table_operation_count
    );
    Ok(header)
}
