//! Common utilities for Veles.
//!
//! This crate provides foundational types used across all Veles crates:
//!
//! - [`BinaryReader`] - Bounds-checked binary reading from byte slices
//! - [`BinaryWriter`] - Little-endian buffer building with backpatching
//! - [`Error`] - The shared low-level error type

mod error;
mod reader;
mod writer;

pub use error::{Error, Result};
pub use reader::BinaryReader;
pub use writer::{BinaryWriter, Patch};

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Re-export memchr for fast byte searching
pub use memchr;
