//! Struct table records.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// A record in the struct table.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct StructEntry {
    /// Writer-assigned type id grouping structs with the same field shape.
    /// [`StructEntry::ROOT_TYPE`] marks the root struct.
    pub type_id: u32,
    /// Field-table index when `field_count == 1`, byte offset into the
    /// field-index table when `field_count > 1`, zero when the struct has
    /// no fields.
    pub data_or_offset: u32,
    /// Number of fields owned by this struct.
    pub field_count: u32,
}

impl StructEntry {
    /// Size of a struct record in bytes.
    pub const SIZE: usize = 12;

    /// Sentinel type id of the root struct.
    pub const ROOT_TYPE: u32 = 0xFFFF_FFFF;
}
