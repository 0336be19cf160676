//! Error types for container parsing and encoding.

use thiserror::Error;

/// Errors that can occur when working with container files.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] veles_common::Error),

    /// Header is structurally invalid: bad tag, bad version, sections out of
    /// bounds or out of order. Fatal; the file cannot be loaded.
    #[error("malformed header: {0}")]
    MalformedHeader(String),

    /// An index or offset inside the table set points outside its target
    /// table. Fatal for the referencing record.
    #[error("dangling reference: {what} {index} out of bounds (limit {limit})")]
    DanglingReference {
        what: &'static str,
        index: u64,
        limit: u64,
    },

    /// A struct is reachable from itself through its own fields. The table
    /// set encodes a tree, so this is always corruption.
    #[error("circular reference through struct {0}")]
    CircularReference(u32),

    /// Struct nesting exceeds the sanity cap. Real content nests a handful
    /// of levels; this only fires on corrupt tables.
    #[error("struct nesting too deep ({0} levels)")]
    NestingTooDeep(usize),

    /// A field declares a type id the format does not define.
    #[error("unknown field type {0}")]
    UnknownFieldType(u32),

    /// A label is longer than 16 bytes or not ASCII.
    #[error("invalid label {0:?}")]
    InvalidLabel(String),

    /// A resource name is longer than the 16 bytes the format allows.
    #[error("resource name too long: {0:?}")]
    ResRefTooLong(String),

    /// UTF-8 decoding error in string data.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Result type for container operations.
pub type Result<T> = std::result::Result<T, Error>;
