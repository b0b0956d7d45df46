//! Foundational data structures, error types, and the operation name table.

pub mod error;
pub mod items;
pub mod models;
pub mod names;
