//! Field table records.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// A record in the field table.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct FieldEntry {
    /// On-disk data type (see [`crate::FieldType`]).
    pub type_id: u32,
    /// Index into the label table.
    pub label_index: u32,
    /// Inline value for simple types; otherwise an offset into the field
    /// data pool or list-index table, or a struct-table index.
    pub data_or_offset: u32,
}

impl FieldEntry {
    /// Size of a field record in bytes.
    pub const SIZE: usize = 12;
}
