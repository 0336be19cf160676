//! Error types for the creature-blueprint overlay.

use thiserror::Error;

/// Errors that can occur when working with creature blueprint files.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Container codec error.
    #[error("{0}")]
    Gff(#[from] veles_gff::Error),

    /// The file's type tag is not a creature-blueprint tag.
    #[error("not a creature blueprint: type tag {actual:?} (expected {expected:?})")]
    WrongFileType { expected: String, actual: String },
}

/// Result type for creature-blueprint operations.
pub type Result<T> = std::result::Result<T, Error>;
