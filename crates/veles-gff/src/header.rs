//! Container file header.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Container file header.
///
/// A fixed 56-byte record at the start of every container file: a 4-byte
/// file-type tag, a 4-byte version tag, and six (offset, count) pairs
/// locating the sections that follow. The struct, field and label counts are
/// record counts; the field-data, field-index and list-index counts are byte
/// lengths.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct GffHeader {
    /// File-type tag, space-padded ASCII (e.g. `"DLG "`).
    pub file_type: [u8; 4],
    /// Format version tag.
    pub file_version: [u8; 4],
    /// Offset of the struct table.
    pub struct_offset: u32,
    /// Number of struct records.
    pub struct_count: u32,
    /// Offset of the field table.
    pub field_offset: u32,
    /// Number of field records.
    pub field_count: u32,
    /// Offset of the label table.
    pub label_offset: u32,
    /// Number of label records.
    pub label_count: u32,
    /// Offset of the field data pool.
    pub field_data_offset: u32,
    /// Size of the field data pool in bytes.
    pub field_data_size: u32,
    /// Offset of the field-index table.
    pub field_indices_offset: u32,
    /// Size of the field-index table in bytes.
    pub field_indices_size: u32,
    /// Offset of the list-index table.
    pub list_indices_offset: u32,
    /// Size of the list-index table in bytes.
    pub list_indices_size: u32,
}

impl GffHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = 56;

    /// The version tag this codec reads and writes.
    pub const VERSION: &'static [u8; 4] = b"V3.2";

    /// The six sections as (offset, byte length) pairs, in canonical file
    /// order: struct, field, label, field data, field indices, list indices.
    pub fn sections(&self) -> [(u64, u64); 6] {
        [
            (self.struct_offset as u64, self.struct_count as u64 * 12),
            (self.field_offset as u64, self.field_count as u64 * 12),
            (self.label_offset as u64, self.label_count as u64 * 16),
            (self.field_data_offset as u64, self.field_data_size as u64),
            (self.field_indices_offset as u64, self.field_indices_size as u64),
            (self.list_indices_offset as u64, self.list_indices_size as u64),
        ]
    }
}
