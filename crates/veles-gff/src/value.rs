//! Owned value tree decoded from (and encoded into) the container tables.
//!
//! [`GffStruct`] is the structure-agnostic in-memory form of a container
//! file: an ordered list of labeled [`Value`]s, nesting through the
//! `Struct` and `List` variants. Domain overlays map these trees to their
//! own record types and back.

use crate::structs::Label;
use crate::{Error, FieldType, Result};

/// A short resource name, at most 16 bytes.
///
/// Used for script and sound references. The engine treats these as
/// case-insensitive file stems; this codec stores them verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ResRef {
    name: String,
}

impl ResRef {
    /// Maximum length in bytes.
    pub const MAX_LEN: usize = 16;

    /// Create a resource name, failing if it exceeds 16 bytes.
    pub fn new(name: &str) -> Result<Self> {
        if name.len() > Self::MAX_LEN {
            return Err(Error::ResRefTooLong(name.to_string()));
        }
        Ok(Self { name: name.to_string() })
    }

    /// Construct from already-decoded file data, bypassing the length cap.
    ///
    /// The reader tolerates oversized names found in the wild; only newly
    /// authored names go through [`ResRef::new`].
    pub(crate) fn from_raw(name: String) -> Self {
        Self { name }
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// Whether the name is empty.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

impl std::fmt::Display for ResRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// One inline language variant of a localized string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocVariant {
    /// Engine language id.
    pub language: u32,
    /// The text in that language.
    pub text: String,
}

/// A localized string: an optional reference into an external string table
/// plus zero or more inline per-language variants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocString {
    /// Reference into the external string table, if any.
    pub string_ref: Option<u32>,
    /// Inline language variants.
    pub variants: Vec<LocVariant>,
}

impl LocString {
    /// Sentinel written when no external reference is present.
    pub(crate) const NO_REF: u32 = 0xFFFF_FFFF;

    /// Create a localized string with a single inline variant.
    pub fn inline(language: u32, text: &str) -> Self {
        Self {
            string_ref: None,
            variants: vec![LocVariant { language, text: text.to_string() }],
        }
    }

    /// The first inline variant's text, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.variants.first().map(|v| v.text.as_str())
    }

    /// Whether there is neither an external reference nor any inline text.
    pub fn is_empty(&self) -> bool {
        self.string_ref.is_none() && self.variants.is_empty()
    }
}

/// A decoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Unsigned 8-bit integer.
    Byte(u8),
    /// Signed 8-bit integer.
    Char(i8),
    /// Unsigned 16-bit integer.
    Word(u16),
    /// Signed 16-bit integer.
    Short(i16),
    /// Unsigned 32-bit integer.
    Dword(u32),
    /// Signed 32-bit integer.
    Int(i32),
    /// Unsigned 64-bit integer.
    Dword64(u64),
    /// Signed 64-bit integer.
    Int64(i64),
    /// 32-bit floating point.
    Float(f32),
    /// 64-bit floating point.
    Double(f64),
    /// String.
    String(String),
    /// Short resource name.
    ResRef(ResRef),
    /// Localized string.
    LocString(LocString),
    /// Opaque byte blob.
    Blob(Vec<u8>),
    /// Nested struct.
    Struct(Box<GffStruct>),
    /// List of structs.
    List(Vec<GffStruct>),
}

impl Value {
    /// The on-disk field type of this value.
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Byte(_) => FieldType::Byte,
            Self::Char(_) => FieldType::Char,
            Self::Word(_) => FieldType::Word,
            Self::Short(_) => FieldType::Short,
            Self::Dword(_) => FieldType::Dword,
            Self::Int(_) => FieldType::Int,
            Self::Dword64(_) => FieldType::Dword64,
            Self::Int64(_) => FieldType::Int64,
            Self::Float(_) => FieldType::Float,
            Self::Double(_) => FieldType::Double,
            Self::String(_) => FieldType::String,
            Self::ResRef(_) => FieldType::ResRef,
            Self::LocString(_) => FieldType::LocString,
            Self::Blob(_) => FieldType::Blob,
            Self::Struct(_) => FieldType::Struct,
            Self::List(_) => FieldType::List,
        }
    }

    /// Get as u8 if this is a `Byte`.
    pub fn as_u8(&self) -> Option<u8> {
        match self {
            Self::Byte(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as u16 if this is a `Word`.
    pub fn as_u16(&self) -> Option<u16> {
        match self {
            Self::Word(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as u32 if this is a `Dword`.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::Dword(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as i32 if this is an `Int`.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as f32 if this is a `Float`.
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as a string slice if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Get as a resource name if this is a `ResRef`.
    pub fn as_resref(&self) -> Option<&ResRef> {
        match self {
            Self::ResRef(v) => Some(v),
            _ => None,
        }
    }

    /// Get as a localized string if this is a `LocString`.
    pub fn as_loc(&self) -> Option<&LocString> {
        match self {
            Self::LocString(v) => Some(v),
            _ => None,
        }
    }

    /// Get the struct list if this is a `List`.
    pub fn as_list(&self) -> Option<&[GffStruct]> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    /// Get the nested struct if this is a `Struct`.
    pub fn as_struct(&self) -> Option<&GffStruct> {
        match self {
            Self::Struct(v) => Some(v),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Byte(v) => write!(f, "{v}"),
            Self::Char(v) => write!(f, "{v}"),
            Self::Word(v) => write!(f, "{v}"),
            Self::Short(v) => write!(f, "{v}"),
            Self::Dword(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Dword64(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::ResRef(v) => write!(f, "{v}"),
            Self::LocString(v) => match (&v.string_ref, v.first_text()) {
                (_, Some(text)) => write!(f, "{text:?}"),
                (Some(r), None) => write!(f, "strref:{r}"),
                (None, None) => write!(f, "\"\""),
            },
            Self::Blob(v) => write!(f, "blob[{}]", v.len()),
            Self::Struct(_) => write!(f, "struct"),
            Self::List(v) => write!(f, "list[{}]", v.len()),
        }
    }
}

/// A labeled value inside a struct.
#[derive(Debug, Clone, PartialEq)]
pub struct GffField {
    /// Field name.
    pub label: Label,
    /// Field value.
    pub value: Value,
}

/// A decoded struct: an ordered list of labeled values.
///
/// Field order is significant and preserved across a decode/encode cycle.
/// The `type_id` is informational on decode and recomputed by the encoder,
/// which groups structs by field-label shape (see the builder).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GffStruct {
    /// Writer-assigned shape group id (see [`crate::GffBuilder`]).
    pub type_id: u32,
    /// The fields, in file order.
    pub fields: Vec<GffField>,
}

impl GffStruct {
    /// Create an empty struct.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field.
    pub fn add(&mut self, label: &str, value: Value) -> Result<()> {
        self.fields.push(GffField { label: Label::new(label)?, value });
        Ok(())
    }

    /// Append a field, consuming and returning the struct for chaining.
    pub fn with(mut self, label: &str, value: Value) -> Result<Self> {
        self.add(label, value)?;
        Ok(self)
    }

    /// Whether a field with the given label exists.
    pub fn has(&self, label: &str) -> bool {
        self.field(label).is_some()
    }

    /// Get the first field value with the given label.
    pub fn field(&self, label: &str) -> Option<&Value> {
        self.fields.iter().find(|f| f.label == label).map(|f| &f.value)
    }

    /// Remove and return the first field value with the given label.
    ///
    /// Overlay decoders consume the fields they understand with `take`;
    /// whatever remains afterwards is preserved opaquely and re-emitted on
    /// encode, so unrecognized extensions survive a load/save cycle.
    pub fn take(&mut self, label: &str) -> Option<Value> {
        let at = self.fields.iter().position(|f| f.label == label)?;
        Some(self.fields.remove(at).value)
    }

    /// Get a `Byte` field.
    pub fn get_u8(&self, label: &str) -> Option<u8> {
        self.field(label).and_then(Value::as_u8)
    }

    /// Get a `Word` field.
    pub fn get_u16(&self, label: &str) -> Option<u16> {
        self.field(label).and_then(Value::as_u16)
    }

    /// Get a `Dword` field.
    pub fn get_u32(&self, label: &str) -> Option<u32> {
        self.field(label).and_then(Value::as_u32)
    }

    /// Get an `Int` field.
    pub fn get_i32(&self, label: &str) -> Option<i32> {
        self.field(label).and_then(Value::as_i32)
    }

    /// Get a `String` field.
    pub fn get_str(&self, label: &str) -> Option<&str> {
        self.field(label).and_then(Value::as_str)
    }

    /// Get a `ResRef` field.
    pub fn get_resref(&self, label: &str) -> Option<&ResRef> {
        self.field(label).and_then(Value::as_resref)
    }

    /// Get a `LocString` field.
    pub fn get_loc(&self, label: &str) -> Option<&LocString> {
        self.field(label).and_then(Value::as_loc)
    }

    /// Get a `List` field.
    pub fn get_list(&self, label: &str) -> Option<&[GffStruct]> {
        self.field(label).and_then(Value::as_list)
    }

    /// The ordered label shape of this struct, used for type-id grouping.
    pub fn shape(&self) -> Vec<Label> {
        self.fields.iter().map(|f| f.label).collect()
    }

    /// Remove the first field matching both label and predicate.
    ///
    /// A field with the right label but an unexpected type is deliberately
    /// left in place: the overlay treats it as unknown and preserves it
    /// rather than coercing or dropping it.
    fn take_match(&mut self, label: &str, pred: impl Fn(&Value) -> bool) -> Option<Value> {
        let at = self
            .fields
            .iter()
            .position(|f| f.label == label && pred(&f.value))?;
        Some(self.fields.remove(at).value)
    }

    /// Remove and return a `Byte` field.
    pub fn take_u8(&mut self, label: &str) -> Option<u8> {
        match self.take_match(label, |v| matches!(v, Value::Byte(_))) {
            Some(Value::Byte(v)) => Some(v),
            _ => None,
        }
    }

    /// Remove and return a `Word` field.
    pub fn take_u16(&mut self, label: &str) -> Option<u16> {
        match self.take_match(label, |v| matches!(v, Value::Word(_))) {
            Some(Value::Word(v)) => Some(v),
            _ => None,
        }
    }

    /// Remove and return a `Short` field.
    pub fn take_i16(&mut self, label: &str) -> Option<i16> {
        match self.take_match(label, |v| matches!(v, Value::Short(_))) {
            Some(Value::Short(v)) => Some(v),
            _ => None,
        }
    }

    /// Remove and return a `Dword` field.
    pub fn take_u32(&mut self, label: &str) -> Option<u32> {
        match self.take_match(label, |v| matches!(v, Value::Dword(_))) {
            Some(Value::Dword(v)) => Some(v),
            _ => None,
        }
    }

    /// Remove and return a `String` field.
    pub fn take_str(&mut self, label: &str) -> Option<String> {
        match self.take_match(label, |v| matches!(v, Value::String(_))) {
            Some(Value::String(v)) => Some(v),
            _ => None,
        }
    }

    /// Remove and return a `ResRef` field.
    pub fn take_resref(&mut self, label: &str) -> Option<ResRef> {
        match self.take_match(label, |v| matches!(v, Value::ResRef(_))) {
            Some(Value::ResRef(v)) => Some(v),
            _ => None,
        }
    }

    /// Remove and return a `LocString` field.
    pub fn take_loc(&mut self, label: &str) -> Option<LocString> {
        match self.take_match(label, |v| matches!(v, Value::LocString(_))) {
            Some(Value::LocString(v)) => Some(v),
            _ => None,
        }
    }

    /// Remove and return a `List` field.
    pub fn take_list(&mut self, label: &str) -> Option<Vec<GffStruct>> {
        match self.take_match(label, |v| matches!(v, Value::List(_))) {
            Some(Value::List(v)) => Some(v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_lookup() {
        let s = GffStruct::new()
            .with("Tag", Value::String("guard".into()))
            .unwrap()
            .with("Delay", Value::Dword(3))
            .unwrap();

        assert_eq!(s.get_str("Tag"), Some("guard"));
        assert_eq!(s.get_u32("Delay"), Some(3));
        assert_eq!(s.get_u32("Tag"), None); // wrong type
        assert_eq!(s.get_u32("Missing"), None);
    }

    #[test]
    fn test_take_removes_first_match_only() {
        let mut s = GffStruct::new()
            .with("Key", Value::String("a".into()))
            .unwrap()
            .with("Key", Value::String("b".into()))
            .unwrap();

        assert_eq!(s.take("Key"), Some(Value::String("a".into())));
        assert_eq!(s.get_str("Key"), Some("b"));
    }

    #[test]
    fn test_take_skips_mismatched_type() {
        // "Delay" exists but as a String; take_u32 must leave it alone so it
        // is preserved as an unknown field.
        let mut s = GffStruct::new()
            .with("Delay", Value::String("soon".into()))
            .unwrap();

        assert_eq!(s.take_u32("Delay"), None);
        assert_eq!(s.get_str("Delay"), Some("soon"));
    }

    #[test]
    fn test_resref_cap() {
        assert!(ResRef::new("nw_walk_wp").is_ok());
        assert!(ResRef::new("a_name_longer_than_sixteen").is_err());
    }

    #[test]
    fn test_loc_string_inline() {
        let loc = LocString::inline(0, "Hello there.");
        assert_eq!(loc.first_text(), Some("Hello there."));
        assert!(loc.string_ref.is_none());
        assert!(!loc.is_empty());
    }
}
