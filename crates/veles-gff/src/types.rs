//! Field data types.

/// Data types a field record can declare.
///
/// The values are the actual binary values from the container format.
/// Simple types fit in the field record's 4-byte data slot; the rest store
/// an offset into the field data pool, a struct index, or a list-index
/// offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum FieldType {
    /// Unsigned 8-bit integer.
    Byte = 0,
    /// Signed 8-bit integer.
    Char = 1,
    /// Unsigned 16-bit integer.
    Word = 2,
    /// Signed 16-bit integer.
    Short = 3,
    /// Unsigned 32-bit integer.
    Dword = 4,
    /// Signed 32-bit integer.
    Int = 5,
    /// Unsigned 64-bit integer, spilled to the field data pool.
    Dword64 = 6,
    /// Signed 64-bit integer, spilled to the field data pool.
    Int64 = 7,
    /// 32-bit floating point.
    Float = 8,
    /// 64-bit floating point, spilled to the field data pool.
    Double = 9,
    /// Length-prefixed string.
    String = 10,
    /// Short resource name (max 16 bytes).
    ResRef = 11,
    /// Localized string record.
    LocString = 12,
    /// Opaque byte blob.
    Blob = 13,
    /// Nested struct; the data slot holds a struct-table index.
    Struct = 14,
    /// List of structs; the data slot holds a list-index offset.
    List = 15,
}

impl FieldType {
    /// Parse from the on-disk u32 value.
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Byte),
            1 => Some(Self::Char),
            2 => Some(Self::Word),
            3 => Some(Self::Short),
            4 => Some(Self::Dword),
            5 => Some(Self::Int),
            6 => Some(Self::Dword64),
            7 => Some(Self::Int64),
            8 => Some(Self::Float),
            9 => Some(Self::Double),
            10 => Some(Self::String),
            11 => Some(Self::ResRef),
            12 => Some(Self::LocString),
            13 => Some(Self::Blob),
            14 => Some(Self::Struct),
            15 => Some(Self::List),
            _ => None,
        }
    }

    /// Check if the value is stored directly in the field record's data slot.
    pub fn is_simple(&self) -> bool {
        matches!(
            self,
            Self::Byte
                | Self::Char
                | Self::Word
                | Self::Short
                | Self::Dword
                | Self::Int
                | Self::Float
        )
    }

    /// Get the string name for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Byte => "Byte",
            Self::Char => "Char",
            Self::Word => "Word",
            Self::Short => "Short",
            Self::Dword => "Dword",
            Self::Int => "Int",
            Self::Dword64 => "Dword64",
            Self::Int64 => "Int64",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::String => "String",
            Self::ResRef => "ResRef",
            Self::LocString => "LocString",
            Self::Blob => "Blob",
            Self::Struct => "Struct",
            Self::List => "List",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_values() {
        for raw in 0..16u32 {
            let ty = FieldType::from_u32(raw).unwrap();
            assert_eq!(ty as u32, raw);
        }
        assert_eq!(FieldType::from_u32(16), None);
    }

    #[test]
    fn test_simple_types() {
        assert!(FieldType::Dword.is_simple());
        assert!(FieldType::Float.is_simple());
        assert!(!FieldType::Double.is_simple());
        assert!(!FieldType::String.is_simple());
        assert!(!FieldType::List.is_simple());
    }
}
