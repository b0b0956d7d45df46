//! # sandbox-reader
//!
//! A reader for compiled Apple sandbox profile bytecode containers.
//! Decodes single profiles and profile collections into their offset tables,
//! profiles, operation entries and opaque blocks, and resolves them against
//! a caller-supplied operation name table.
//!
//! **Note:** The container layout is reverse-engineered. Regions of unknown
//! meaning are surfaced as raw bytes rather than interpreted.
pub mod sandbox;

// Re-export the main types for convenience
pub use sandbox::{
    BytecodeError,
    BytecodeReader,
    Result,
    SINGLE_PROFILE_NAME,
    hexdump,
    types::{
        items::{
            Bytecode,
            DataItem,
            IndexedOperation,
            InstructionRef,
            NamedOperation,
            Profile,
            Section,
            StringItem,
        },
        models::{
            DecodeOptions,
            FormatRevision,
            Header,
            OpaqueBlock,
            OperationEntry,
            OperationKind,
            RawBytecode,
            RawProfile,
            TableOffset,
        },
        names::OperationNames,
    },
};
