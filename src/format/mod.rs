//! Reader and writer for the tab-separated mapping file format.
//!
//! The format is line oriented. A header names the two namespaces, then one
//! line per mapping node follows, indented one tab per nesting level:
//! classes at the top level (nested classes as their own lines with full `$`
//! names), fields and methods one level in, parameters and locals two levels
//! in, and documentation as a `c` line one level deeper than its owner.

use thiserror::Error;

use crate::mappings::MappingError;

mod reader;
mod writer;

pub use reader::{parse, read_file};
pub use writer::{serialize, write_file};

/// Errors raised while reading or writing mapping files.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The file could not be read.
    #[error("failed to read `{path}`: {source}")]
    Read {
        /// Path of the offending file.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file could not be written.
    #[error("failed to write `{path}`: {source}")]
    Write {
        /// Path of the offending file.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A line did not conform to the format.
    #[error("line {line}: {msg}: `{raw}`")]
    Parse {
        /// One-based line number.
        line: usize,
        /// What went wrong.
        msg: String,
        /// The offending line as read.
        raw: String,
    },
    /// A well-formed line described an illegal model mutation.
    #[error("line {line}: {source}")]
    Model {
        /// One-based line number.
        line: usize,
        /// The model error the line triggered.
        #[source]
        source: MappingError,
    },
}
