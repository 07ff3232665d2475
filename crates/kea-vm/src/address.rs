//! Source locations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Immutable source location attached to every instruction and runtime error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    file: String,
    line: u32,
}

impl Address {
    /// Creates an address for `line` of `file`.
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// Name of the source file.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Line number within the source file.
    pub fn line(&self) -> u32 {
        self.line
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}
