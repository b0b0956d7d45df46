//! Container format parsing layer.
//!
//! This module provides the structural layer that bridges the raw buffer and
//! the high-level [`BytecodeReader`](crate::sandbox::reader::BytecodeReader).
//!
//! # Module Organization
//!
//! - [`header`]: Parses the fixed header for a given format revision
//! - [`layout`]: Drives the ordered read of tables, profiles and records
//! - [`records`]: Decodes fixed-width profile and operation entry records

pub mod header;
pub mod layout;
pub mod records;
