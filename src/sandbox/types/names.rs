//! The externally supplied operation name table.
//!
//! The table maps a profile's positional operation index to a name such as
//! `file-read*`. It changes between operating system releases and is not
//! stored in the container, so the caller always provides it.

use std::path::Path;

use super::error::Result;

/// An ordered list of sandbox operation names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationNames {
    names: Vec<String>,
}

impl OperationNames {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Parses one name per line. Blank lines and `#` comments are skipped.
    pub fn parse(text: &str) -> Self {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect()
    }

    /// Loads a name table from a text file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for OperationNames {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}
