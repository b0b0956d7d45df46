//! Custom error types for the sandbox-reader crate.

use thiserror::Error;

/// The primary error type for all operations in this crate.
///
/// Every structural variant is terminal for the decode that produced it.
/// Where possible the byte offset of the failing read is reported so the
/// malformed region of the container can be located.
#[derive(Debug, Error)]
pub enum BytecodeError {
    /// An error originating from I/O operations while loading a container.
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    /// The buffer is shorter than the fixed header of the selected revision.
    #[error("File is too small to be properly parsed: expected {expected} header bytes, found {found}")]
    TooSmall { expected: usize, found: usize },

    /// A sequential or addressed read would run past the end of the buffer.
    #[error("Offset {offset:#x} (+{length} bytes) exceeds the {available} bytes of usable data")]
    OffsetTooLarge {
        offset: usize,
        length: usize,
        available: usize,
    },

    /// A sized region expected to hold text is not valid UTF-8.
    #[error("An invalid string was encountered at offset {offset:#x}")]
    InvalidString { offset: usize },

    /// The operation count declared in the header disagrees with a table.
    #[error("Operation count mismatch: header declares {expected}, but the table holds {found}")]
    InvalidOperationCount { expected: usize, found: usize },

    /// The header flags are neither a single profile nor a collection.
    #[error("An unknown bytecode flag was encountered: {0:#06x}")]
    UnknownBytecodeFlag(u16),
}

/// A convenience `Result` type alias using the crate's `BytecodeError` type.
pub type Result<T> = std::result::Result<T, BytecodeError>;
