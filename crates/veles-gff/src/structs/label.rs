//! Label table records.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{Error, Result};

/// A field name in the label table.
///
/// Labels are fixed 16-byte ASCII names, null-padded. Fields reference them
/// by index; the writer deduplicates identical names so that the same label
/// is shared across every field that uses it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct Label {
    raw: [u8; 16],
}

impl Label {
    /// Size of a label record in bytes.
    pub const SIZE: usize = 16;

    /// Create a label from a name.
    ///
    /// Fails with [`Error::InvalidLabel`] if the name is longer than 16
    /// bytes or contains non-ASCII characters.
    pub fn new(name: &str) -> Result<Self> {
        if name.len() > 16 || !name.is_ascii() {
            return Err(Error::InvalidLabel(name.to_string()));
        }
        let mut raw = [0u8; 16];
        raw[..name.len()].copy_from_slice(name.as_bytes());
        Ok(Self { raw })
    }

    /// The raw 16-byte value.
    pub fn as_raw(&self) -> &[u8; 16] {
        &self.raw
    }

    /// The label as a string, up to the first null byte.
    pub fn as_str(&self) -> &str {
        let end = memchr::memchr(0, &self.raw).unwrap_or(16);
        // Labels are validated as ASCII on construction; a label read from a
        // file may hold arbitrary bytes, so fall back to the empty string.
        std::str::from_utf8(&self.raw[..end]).unwrap_or("")
    }
}

impl std::fmt::Debug for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Label({:?})", self.as_str())
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl PartialEq<str> for Label {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Label {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let label = Label::new("RepliesList").unwrap();
        assert_eq!(label.as_str(), "RepliesList");
        assert_eq!(label, "RepliesList");
    }

    #[test]
    fn test_full_width_name() {
        let label = Label::new("SixteenCharsLong").unwrap();
        assert_eq!(label.as_str(), "SixteenCharsLong");
    }

    #[test]
    fn test_too_long_rejected() {
        assert!(matches!(
            Label::new("SeventeenCharsXYZ"),
            Err(Error::InvalidLabel(_))
        ));
    }

    #[test]
    fn test_identical_names_compare_equal() {
        let a = Label::new("Text").unwrap();
        let b = Label::new("Text").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_raw(), b.as_raw());
    }
}
