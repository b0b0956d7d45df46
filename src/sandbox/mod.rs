//! Core sandbox bytecode reader module
//!
//! Data flows one way: the layout pass walks the buffer with a bounds-checked
//! cursor and produces a [`RawBytecode`](types::models::RawBytecode); the
//! resolution pass then joins it against the string tables and the caller's
//! operation name table to produce a [`Bytecode`](types::items::Bytecode).

pub(crate) mod cursor;
pub(crate) mod format;
pub mod reader;
pub(crate) mod resolve;
pub mod types;
pub(crate) mod utils;

pub use reader::BytecodeReader;
pub use resolve::SINGLE_PROFILE_NAME;
pub use types::error::{BytecodeError, Result};
pub use utils::hexdump;
