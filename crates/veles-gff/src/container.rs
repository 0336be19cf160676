//! Container file parser.

use std::path::Path;

use veles_common::BinaryReader;

use crate::structs::{FieldEntry, Label, StructEntry};
use crate::value::{GffField, GffStruct, LocString, LocVariant, ResRef, Value};
use crate::{Error, FieldType, GffHeader, Result};

/// Nesting cap for struct reification. Real files nest a handful of levels;
/// anything past this is corruption, not content.
const MAX_NESTING: usize = 256;

/// A parsed container file: the six raw table sections, owned.
///
/// Parsing is eager and validates the header before any table is read;
/// resolution of indices and offsets between tables happens lazily and is
/// bounds-checked at every dereference. Use [`GffContainer::root`] to build
/// the owned [`GffStruct`] tree.
#[derive(Debug)]
pub struct GffContainer {
    file_type: [u8; 4],
    file_version: [u8; 4],
    structs: Vec<StructEntry>,
    fields: Vec<FieldEntry>,
    labels: Vec<Label>,
    field_data: Vec<u8>,
    field_indices: Vec<u32>,
    list_indices: Vec<u32>,
}

impl GffContainer {
    /// Read and parse a container file.
    ///
    /// The file is read fully into memory; source files are small by design
    /// and the format is not streamable (the header indexes into every
    /// section).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::parse(&data)
    }

    /// Parse a container file from bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(data);
        let header: GffHeader = reader
            .read_struct()
            .map_err(|_| Error::MalformedHeader(format!(
                "file too short for header: {} bytes",
                data.len()
            )))?;

        let file_type = header.file_type;
        let file_version = header.file_version;

        if !file_type.iter().all(|b| (0x20..=0x7E).contains(b)) {
            return Err(Error::MalformedHeader(format!(
                "file type tag is not printable ASCII: {file_type:?}"
            )));
        }
        if &file_version != GffHeader::VERSION {
            return Err(Error::MalformedHeader(format!(
                "unsupported version tag {:?} (expected {:?})",
                String::from_utf8_lossy(&file_version),
                String::from_utf8_lossy(GffHeader::VERSION),
            )));
        }

        // Sections must lie within the file and appear in canonical order.
        let file_len = data.len() as u64;
        let mut previous = GffHeader::SIZE as u64;
        for (i, (offset, size)) in header.sections().into_iter().enumerate() {
            if offset < previous {
                return Err(Error::MalformedHeader(format!(
                    "section {i} offset {offset} precedes the preceding section"
                )));
            }
            let end = offset.checked_add(size).ok_or_else(|| {
                Error::MalformedHeader(format!("section {i} size overflows"))
            })?;
            if end > file_len {
                return Err(Error::MalformedHeader(format!(
                    "section {i} ends at {end}, past end of file ({file_len})"
                )));
            }
            previous = offset;
        }
        if header.field_indices_size % 4 != 0 || header.list_indices_size % 4 != 0 {
            return Err(Error::MalformedHeader(
                "index table size not a multiple of 4".to_string(),
            ));
        }

        reader.seek(header.struct_offset as usize);
        let structs = reader.read_array::<StructEntry>(header.struct_count as usize)?;

        reader.seek(header.field_offset as usize);
        let fields = reader.read_array::<FieldEntry>(header.field_count as usize)?;

        reader.seek(header.label_offset as usize);
        let labels = reader.read_array::<Label>(header.label_count as usize)?;

        reader.seek(header.field_data_offset as usize);
        let field_data = reader.read_bytes(header.field_data_size as usize)?.to_vec();

        reader.seek(header.field_indices_offset as usize);
        let field_indices =
            reader.read_array::<u32>((header.field_indices_size / 4) as usize)?;

        reader.seek(header.list_indices_offset as usize);
        let list_indices =
            reader.read_array::<u32>((header.list_indices_size / 4) as usize)?;

        Ok(Self {
            file_type,
            file_version,
            structs,
            fields,
            labels,
            field_data,
            field_indices,
            list_indices,
        })
    }

    /// The 4-byte file-type tag.
    #[inline]
    pub fn file_type(&self) -> [u8; 4] {
        self.file_type
    }

    /// The file-type tag as a trimmed string.
    pub fn file_type_str(&self) -> String {
        String::from_utf8_lossy(&self.file_type).trim_end().to_string()
    }

    /// The 4-byte version tag.
    #[inline]
    pub fn file_version(&self) -> [u8; 4] {
        self.file_version
    }

    /// The raw struct table.
    #[inline]
    pub fn struct_entries(&self) -> &[StructEntry] {
        &self.structs
    }

    /// The raw field table.
    #[inline]
    pub fn field_entries(&self) -> &[FieldEntry] {
        &self.fields
    }

    /// The label table.
    #[inline]
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// The field data pool.
    #[inline]
    pub fn field_data(&self) -> &[u8] {
        &self.field_data
    }

    /// The field-index table.
    #[inline]
    pub fn field_indices(&self) -> &[u32] {
        &self.field_indices
    }

    /// The list-index table.
    #[inline]
    pub fn list_indices(&self) -> &[u32] {
        &self.list_indices
    }

    /// Reify the root struct into an owned tree.
    pub fn root(&self) -> Result<GffStruct> {
        if self.structs.is_empty() {
            return Err(Error::MalformedHeader("empty struct table".to_string()));
        }
        let mut stack = Vec::new();
        self.reify_struct(0, &mut stack)
    }

    /// Reify an arbitrary struct by table index.
    pub fn struct_at(&self, index: u32) -> Result<GffStruct> {
        let mut stack = Vec::new();
        self.reify_struct(index, &mut stack)
    }

    fn reify_struct(&self, index: u32, stack: &mut Vec<u32>) -> Result<GffStruct> {
        let entry = *self.structs.get(index as usize).ok_or(Error::DanglingReference {
            what: "struct index",
            index: index as u64,
            limit: self.structs.len() as u64,
        })?;
        if stack.contains(&index) {
            return Err(Error::CircularReference(index));
        }
        if stack.len() >= MAX_NESTING {
            return Err(Error::NestingTooDeep(stack.len()));
        }
        stack.push(index);

        let type_id = entry.type_id;
        let field_ids = self.struct_field_indices(&entry)?;
        let mut out = GffStruct { type_id, fields: Vec::with_capacity(field_ids.len()) };
        for field_index in field_ids {
            out.fields.push(self.reify_field(field_index, stack)?);
        }

        stack.pop();
        Ok(out)
    }

    /// The field-table indices owned by a struct record.
    pub fn struct_field_indices(&self, entry: &StructEntry) -> Result<Vec<u32>> {
        let count = entry.field_count;
        let data = entry.data_or_offset;
        match count {
            0 => Ok(Vec::new()),
            1 => Ok(vec![data]),
            _ => {
                if data % 4 != 0 {
                    return Err(Error::DanglingReference {
                        what: "field-index offset",
                        index: data as u64,
                        limit: self.field_indices.len() as u64 * 4,
                    });
                }
                let start = (data / 4) as usize;
                let end = start.checked_add(count as usize).ok_or(Error::DanglingReference {
                    what: "field-index offset",
                    index: data as u64,
                    limit: self.field_indices.len() as u64 * 4,
                })?;
                let group = self.field_indices.get(start..end).ok_or(Error::DanglingReference {
                    what: "field-index group",
                    index: data as u64,
                    limit: self.field_indices.len() as u64 * 4,
                })?;
                Ok(group.to_vec())
            }
        }
    }

    fn reify_field(&self, field_index: u32, stack: &mut Vec<u32>) -> Result<GffField> {
        let field = *self.fields.get(field_index as usize).ok_or(Error::DanglingReference {
            what: "field index",
            index: field_index as u64,
            limit: self.fields.len() as u64,
        })?;

        let label_index = field.label_index;
        let label = *self.labels.get(label_index as usize).ok_or(Error::DanglingReference {
            what: "label index",
            index: label_index as u64,
            limit: self.labels.len() as u64,
        })?;

        let raw_type = field.type_id;
        let data = field.data_or_offset;
        let ty = FieldType::from_u32(raw_type).ok_or(Error::UnknownFieldType(raw_type))?;

        let value = match ty {
            FieldType::Byte => Value::Byte(data as u8),
            FieldType::Char => Value::Char(data as u8 as i8),
            FieldType::Word => Value::Word(data as u16),
            FieldType::Short => Value::Short(data as u16 as i16),
            FieldType::Dword => Value::Dword(data),
            FieldType::Int => Value::Int(data as i32),
            FieldType::Float => Value::Float(f32::from_bits(data)),
            FieldType::Dword64 => Value::Dword64(self.pool_reader(data)?.read_u64()?),
            FieldType::Int64 => Value::Int64(self.pool_reader(data)?.read_i64()?),
            FieldType::Double => Value::Double(self.pool_reader(data)?.read_f64()?),
            FieldType::String => {
                let mut r = self.pool_reader(data)?;
                let len = r.read_u32()? as usize;
                Value::String(r.read_string(len)?.to_string())
            }
            FieldType::ResRef => {
                let mut r = self.pool_reader(data)?;
                let len = r.read_u8()? as usize;
                Value::ResRef(ResRef::from_raw(r.read_string(len)?.to_string()))
            }
            FieldType::LocString => Value::LocString(self.read_loc_string(data)?),
            FieldType::Blob => {
                let mut r = self.pool_reader(data)?;
                let len = r.read_u32()? as usize;
                Value::Blob(r.read_bytes(len)?.to_vec())
            }
            FieldType::Struct => Value::Struct(Box::new(self.reify_struct(data, stack)?)),
            FieldType::List => Value::List(self.reify_list(data, stack)?),
        };

        Ok(GffField { label, value })
    }

    fn pool_reader(&self, offset: u32) -> Result<BinaryReader<'_>> {
        if offset as usize > self.field_data.len() {
            return Err(Error::DanglingReference {
                what: "field data offset",
                index: offset as u64,
                limit: self.field_data.len() as u64,
            });
        }
        Ok(BinaryReader::new_at(&self.field_data, offset as usize))
    }

    fn read_loc_string(&self, offset: u32) -> Result<LocString> {
        let mut r = self.pool_reader(offset)?;
        let _total_size = r.read_u32()?;
        let raw_ref = r.read_u32()?;
        let string_ref = (raw_ref != LocString::NO_REF).then_some(raw_ref);
        let count = r.read_u32()? as usize;

        // Every variant occupies at least 8 bytes; reject counts the
        // remaining pool cannot possibly satisfy before looping.
        if count.saturating_mul(8) > r.remaining() {
            return Err(Error::DanglingReference {
                what: "localized-string variant count",
                index: count as u64,
                limit: (r.remaining() / 8) as u64,
            });
        }

        let mut variants = Vec::with_capacity(count);
        for _ in 0..count {
            let language = r.read_u32()?;
            let len = r.read_u32()? as usize;
            variants.push(LocVariant { language, text: r.read_string(len)?.to_string() });
        }
        Ok(LocString { string_ref, variants })
    }

    fn reify_list(&self, offset: u32, stack: &mut Vec<u32>) -> Result<Vec<GffStruct>> {
        if offset % 4 != 0 {
            return Err(Error::DanglingReference {
                what: "list offset",
                index: offset as u64,
                limit: self.list_indices.len() as u64 * 4,
            });
        }
        let at = (offset / 4) as usize;
        let count = *self.list_indices.get(at).ok_or(Error::DanglingReference {
            what: "list offset",
            index: offset as u64,
            limit: self.list_indices.len() as u64 * 4,
        })? as usize;
        let indices = self
            .list_indices
            .get(at + 1..at + 1 + count)
            .ok_or(Error::DanglingReference {
                what: "list group",
                index: offset as u64,
                limit: self.list_indices.len() as u64 * 4,
            })?;

        let mut items = Vec::with_capacity(count);
        for &struct_index in indices {
            items.push(self.reify_struct(struct_index, stack)?);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a header followed by empty sections.
    fn header_bytes(patch: impl FnOnce(&mut [u32; 12])) -> Vec<u8> {
        let base = GffHeader::SIZE as u32;
        // (offset, count) pairs for the six sections, all empty.
        let mut pairs: [u32; 12] = [base, 0, base, 0, base, 0, base, 0, base, 0, base, 0];
        patch(&mut pairs);

        let mut data = Vec::new();
        data.extend_from_slice(b"DLG ");
        data.extend_from_slice(GffHeader::VERSION);
        for v in pairs {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data
    }

    #[test]
    fn test_truncated_file() {
        let result = GffContainer::parse(&[0u8; 10]);
        assert!(matches!(result, Err(Error::MalformedHeader(_))));
    }

    #[test]
    fn test_bad_version() {
        let mut data = header_bytes(|_| {});
        data[4..8].copy_from_slice(b"V9.9");
        assert!(matches!(GffContainer::parse(&data), Err(Error::MalformedHeader(_))));
    }

    #[test]
    fn test_section_past_end_of_file() {
        // Field section claims records beyond the end of the file.
        let data = header_bytes(|pairs| {
            pairs[2] = 9000; // field offset
            pairs[3] = 4; // field count
        });
        assert!(matches!(GffContainer::parse(&data), Err(Error::MalformedHeader(_))));
    }

    #[test]
    fn test_non_monotonic_sections() {
        let data = header_bytes(|pairs| {
            pairs[0] = 60; // struct offset after...
            pairs[2] = 56; // ...field offset
        });
        assert!(matches!(GffContainer::parse(&data), Err(Error::MalformedHeader(_))));
    }

    #[test]
    fn test_empty_struct_table_has_no_root() {
        let data = header_bytes(|_| {});
        let container = GffContainer::parse(&data).unwrap();
        assert!(container.root().is_err());
    }
}
