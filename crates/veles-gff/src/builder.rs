//! Container encoder.
//!
//! [`GffBuilder`] serializes an owned [`GffStruct`] tree back into the
//! binary table form. The emission order is deterministic: structs are
//! flattened pre-order, each struct's field records are contiguous, and the
//! header is written first with placeholder offsets that are backpatched as
//! each section lands. Encoding the same tree twice produces identical
//! bytes.

use std::hash::BuildHasherDefault;

use hashbrown::HashMap as FastHashMap;
use rustc_hash::FxHasher;
use veles_common::BinaryWriter;

use crate::structs::{FieldEntry, Label, StructEntry};
use crate::value::{GffStruct, LocString, Value};
use crate::GffHeader;

type FxHashMap<K, V> = FastHashMap<K, V, BuildHasherDefault<FxHasher>>;

/// Builder that encodes a struct tree into container bytes.
#[derive(Debug, Default)]
pub struct GffBuilder {
    structs: Vec<StructEntry>,
    shapes: Vec<Vec<Label>>,
    fields: Vec<FieldEntry>,
    labels: LabelTable,
    field_data: Vec<u8>,
    field_indices: Vec<u32>,
    list_indices: Vec<u32>,
}

/// Label table with exact 16-byte deduplication: identical field names
/// anywhere in the file share one label slot.
#[derive(Debug, Default)]
struct LabelTable {
    entries: Vec<Label>,
    index: FxHashMap<Label, u32>,
}

impl LabelTable {
    fn intern(&mut self, label: Label) -> u32 {
        if let Some(&at) = self.index.get(&label) {
            return at;
        }
        let at = self.entries.len() as u32;
        self.entries.push(label);
        self.index.insert(label, at);
        at
    }
}

enum Pending<'a> {
    Child(&'a GffStruct),
    Items(&'a [GffStruct]),
}

impl GffBuilder {
    /// Encode a tree as a container file with the given type tag.
    pub fn encode(root: &GffStruct, file_type: [u8; 4]) -> Vec<u8> {
        let mut builder = Self::default();
        builder.flatten_struct(root);
        builder.assign_type_ids();
        builder.finish(file_type)
    }

    /// Flatten one struct and everything below it, pre-order.
    ///
    /// The struct record and its field records are appended first; nested
    /// structs and list elements are flattened afterwards and their rows
    /// patched in, so a struct's field records stay contiguous.
    fn flatten_struct(&mut self, s: &GffStruct) -> u32 {
        let struct_index = self.structs.len() as u32;
        self.structs.push(StructEntry {
            type_id: 0,
            data_or_offset: 0,
            field_count: s.fields.len() as u32,
        });
        self.shapes.push(s.shape());

        let first_field_row = self.fields.len();
        let mut pending: Vec<(usize, Pending)> = Vec::new();

        for field in &s.fields {
            let label_index = self.labels.intern(field.label);
            let row = self.fields.len();
            let data = match &field.value {
                Value::Byte(v) => *v as u32,
                Value::Char(v) => *v as u8 as u32,
                Value::Word(v) => *v as u32,
                Value::Short(v) => *v as u16 as u32,
                Value::Dword(v) => *v,
                Value::Int(v) => *v as u32,
                Value::Float(v) => v.to_bits(),
                Value::Struct(child) => {
                    pending.push((row, Pending::Child(child)));
                    0
                }
                Value::List(items) => {
                    pending.push((row, Pending::Items(items)));
                    0
                }
                spilled => self.append_field_data(spilled),
            };
            self.fields.push(FieldEntry {
                type_id: field.value.field_type() as u32,
                label_index,
                data_or_offset: data,
            });
        }

        match s.fields.len() {
            0 => {}
            1 => self.structs[struct_index as usize].data_or_offset = first_field_row as u32,
            count => {
                let offset = (self.field_indices.len() * 4) as u32;
                for row in first_field_row..first_field_row + count {
                    self.field_indices.push(row as u32);
                }
                self.structs[struct_index as usize].data_or_offset = offset;
            }
        }

        for (row, child) in pending {
            match child {
                Pending::Child(c) => {
                    let child_index = self.flatten_struct(c);
                    self.fields[row].data_or_offset = child_index;
                }
                Pending::Items(items) => {
                    // The group header is reserved before the elements are
                    // flattened; nested lists land after it.
                    let offset = (self.list_indices.len() * 4) as u32;
                    self.list_indices.push(items.len() as u32);
                    let base = self.list_indices.len();
                    self.list_indices.resize(base + items.len(), 0);
                    for (k, item) in items.iter().enumerate() {
                        self.list_indices[base + k] = self.flatten_struct(item);
                    }
                    self.fields[row].data_or_offset = offset;
                }
            }
        }

        struct_index
    }

    /// Append a spilled value to the field data pool and return its offset.
    ///
    /// Values start 4-byte aligned and are zero-padded back to alignment.
    fn append_field_data(&mut self, value: &Value) -> u32 {
        let offset = self.field_data.len() as u32;
        match value {
            Value::Dword64(v) => self.field_data.extend_from_slice(&v.to_le_bytes()),
            Value::Int64(v) => self.field_data.extend_from_slice(&v.to_le_bytes()),
            Value::Double(v) => self.field_data.extend_from_slice(&v.to_le_bytes()),
            Value::String(v) => {
                self.field_data.extend_from_slice(&(v.len() as u32).to_le_bytes());
                self.field_data.extend_from_slice(v.as_bytes());
            }
            Value::ResRef(v) => {
                self.field_data.push(v.as_str().len() as u8);
                self.field_data.extend_from_slice(v.as_str().as_bytes());
            }
            Value::LocString(v) => {
                let total: usize = 8 + v.variants.iter().map(|s| 8 + s.text.len()).sum::<usize>();
                self.field_data.extend_from_slice(&(total as u32).to_le_bytes());
                let raw_ref = v.string_ref.unwrap_or(LocString::NO_REF);
                self.field_data.extend_from_slice(&raw_ref.to_le_bytes());
                self.field_data.extend_from_slice(&(v.variants.len() as u32).to_le_bytes());
                for variant in &v.variants {
                    self.field_data.extend_from_slice(&variant.language.to_le_bytes());
                    self.field_data.extend_from_slice(&(variant.text.len() as u32).to_le_bytes());
                    self.field_data.extend_from_slice(variant.text.as_bytes());
                }
            }
            Value::Blob(v) => {
                self.field_data.extend_from_slice(&(v.len() as u32).to_le_bytes());
                self.field_data.extend_from_slice(v);
            }
            // Simple, struct and list values never reach the pool.
            _ => unreachable!("value kind is not pool-spilled"),
        }
        while self.field_data.len() % 4 != 0 {
            self.field_data.push(0);
        }
        offset
    }

    /// Assign struct type ids by field-shape frequency.
    ///
    /// Non-root structs are grouped by their exact ordered label shape;
    /// groups are sorted by descending population (ties keep first-appearance
    /// order) and numbered from 0, so the most common shape gets id 0. The
    /// root struct keeps its sentinel id. This matches the numbering the
    /// engine's own writer produces, which keeps regenerated files
    /// structurally diffable against engine output.
    fn assign_type_ids(&mut self) {
        let mut counts: FxHashMap<Vec<Label>, u32> = FxHashMap::default();
        let mut groups: Vec<Vec<Label>> = Vec::new();
        for shape in self.shapes.iter().skip(1) {
            if !counts.contains_key(shape) {
                groups.push(shape.clone());
            }
            *counts.entry(shape.clone()).or_insert(0) += 1;
        }

        // Stable sort: equal populations keep first-appearance order.
        groups.sort_by_key(|shape| std::cmp::Reverse(counts[shape]));
        let ids: FxHashMap<Vec<Label>, u32> = groups
            .into_iter()
            .enumerate()
            .map(|(i, shape)| (shape, i as u32))
            .collect();

        for (i, entry) in self.structs.iter_mut().enumerate() {
            entry.type_id = if i == 0 {
                StructEntry::ROOT_TYPE
            } else {
                ids[&self.shapes[i]]
            };
        }
    }

    /// Write the header and sections in canonical order.
    fn finish(&self, file_type: [u8; 4]) -> Vec<u8> {
        let capacity = GffHeader::SIZE
            + self.structs.len() * StructEntry::SIZE
            + self.fields.len() * FieldEntry::SIZE
            + self.labels.entries.len() * Label::SIZE
            + self.field_data.len()
            + (self.field_indices.len() + self.list_indices.len()) * 4;
        let mut w = BinaryWriter::with_capacity(capacity);

        w.write_bytes(&file_type);
        w.write_bytes(GffHeader::VERSION);

        // Six (offset, count) pairs; offsets are placeholders until the
        // matching section is written.
        let counts = [
            self.structs.len() as u32,
            self.fields.len() as u32,
            self.labels.entries.len() as u32,
            self.field_data.len() as u32,
            (self.field_indices.len() * 4) as u32,
            (self.list_indices.len() * 4) as u32,
        ];
        let offsets: Vec<_> = counts
            .iter()
            .map(|&count| {
                let patch = w.reserve_u32();
                w.write_u32(count);
                patch
            })
            .collect();

        w.patch_u32(offsets[0], w.position() as u32);
        for entry in &self.structs {
            w.write_struct(entry);
        }

        w.patch_u32(offsets[1], w.position() as u32);
        for field in &self.fields {
            w.write_struct(field);
        }

        w.patch_u32(offsets[2], w.position() as u32);
        for label in &self.labels.entries {
            w.write_struct(label);
        }

        w.patch_u32(offsets[3], w.position() as u32);
        w.write_bytes(&self.field_data);

        w.patch_u32(offsets[4], w.position() as u32);
        for &index in &self.field_indices {
            w.write_u32(index);
        }

        w.patch_u32(offsets[5], w.position() as u32);
        for &index in &self.list_indices {
            w.write_u32(index);
        }

        w.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{LocString, ResRef};
    use crate::GffContainer;

    fn sample_tree() -> GffStruct {
        let reply = GffStruct::new()
            .with("Text", Value::LocString(LocString::inline(0, "Fine, take it.")))
            .unwrap()
            .with("Delay", Value::Dword(0))
            .unwrap();

        GffStruct::new()
            .with("Tag", Value::String("merchant".into()))
            .unwrap()
            .with("OnEnd", Value::ResRef(ResRef::new("sc_end").unwrap()))
            .unwrap()
            .with("Weight", Value::Double(12.5))
            .unwrap()
            .with("Payload", Value::Blob(vec![1, 2, 3, 4, 5]))
            .unwrap()
            .with("Replies", Value::List(vec![reply]))
            .unwrap()
    }

    #[test]
    fn test_round_trip_all_value_kinds() {
        let bytes = GffBuilder::encode(&sample_tree(), *b"DLG ");
        let decoded = GffContainer::parse(&bytes).unwrap().root().unwrap();

        assert_eq!(decoded.get_str("Tag"), Some("merchant"));
        assert_eq!(decoded.get_resref("OnEnd").unwrap().as_str(), "sc_end");
        assert_eq!(decoded.field("Weight"), Some(&Value::Double(12.5)));
        assert_eq!(decoded.field("Payload"), Some(&Value::Blob(vec![1, 2, 3, 4, 5])));

        let replies = decoded.get_list("Replies").unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(
            replies[0].get_loc("Text").unwrap().first_text(),
            Some("Fine, take it.")
        );
    }

    #[test]
    fn test_second_generation_is_byte_identical() {
        let bytes = GffBuilder::encode(&sample_tree(), *b"DLG ");
        let decoded = GffContainer::parse(&bytes).unwrap().root().unwrap();
        let again = GffBuilder::encode(&decoded, *b"DLG ");
        assert_eq!(bytes, again);
    }

    #[test]
    fn test_encode_is_deterministic() {
        let a = GffBuilder::encode(&sample_tree(), *b"DLG ");
        let b = GffBuilder::encode(&sample_tree(), *b"DLG ");
        assert_eq!(a, b);
    }

    #[test]
    fn test_label_dedup() {
        let mut root = GffStruct::new();
        let mut list = Vec::new();
        for i in 0..4 {
            list.push(
                GffStruct::new()
                    .with("Index", Value::Dword(i))
                    .unwrap()
                    .with("Active", Value::ResRef(ResRef::default()))
                    .unwrap(),
            );
        }
        root.add("Pointers", Value::List(list)).unwrap();

        let bytes = GffBuilder::encode(&root, *b"DLG ");
        let container = GffContainer::parse(&bytes).unwrap();

        // Pointers + Index + Active, regardless of how many fields use them.
        assert_eq!(container.labels().len(), 3);
    }

    #[test]
    fn test_type_ids_follow_shape_frequency() {
        let mut items = Vec::new();
        for i in 0..10 {
            items.push(
                GffStruct::new()
                    .with("Name", Value::String(format!("item{i}")))
                    .unwrap()
                    .with("Cost", Value::Dword(i))
                    .unwrap(),
            );
        }
        for _ in 0..2 {
            items.push(GffStruct::new().with("Tag", Value::String("x".into())).unwrap());
        }
        let root = GffStruct::new().with("Items", Value::List(items)).unwrap();

        let bytes = GffBuilder::encode(&root, *b"TST ");
        let container = GffContainer::parse(&bytes).unwrap();
        let decoded = container.root().unwrap();

        let items = decoded.get_list("Items").unwrap();
        for item in &items[..10] {
            assert_eq!(item.type_id, 0);
        }
        for item in &items[10..] {
            assert_eq!(item.type_id, 1);
        }

        let root_entry = container.struct_entries()[0];
        let root_type = root_entry.type_id;
        assert_eq!(root_type, StructEntry::ROOT_TYPE);
    }

    #[test]
    fn test_field_data_values_are_padded() {
        let root = GffStruct::new()
            .with("A", Value::String("abc".into()))
            .unwrap()
            .with("B", Value::String("defg".into()))
            .unwrap();

        let bytes = GffBuilder::encode(&root, *b"TST ");
        let container = GffContainer::parse(&bytes).unwrap();

        // "abc": 4-byte length + 3 bytes + 1 pad byte = 8.
        // "defg": 4-byte length + 4 bytes = 8, already aligned.
        assert_eq!(container.field_data().len(), 16);
        let decoded = container.root().unwrap();
        assert_eq!(decoded.get_str("A"), Some("abc"));
        assert_eq!(decoded.get_str("B"), Some("defg"));
    }

    #[test]
    fn test_section_offsets_are_cumulative() {
        let bytes = GffBuilder::encode(&sample_tree(), *b"DLG ");
        let mut reader = veles_common::BinaryReader::new(&bytes);
        let header: GffHeader = reader.read_struct().unwrap();

        let mut expected = GffHeader::SIZE as u64;
        for (offset, size) in header.sections() {
            assert_eq!(offset, expected);
            expected += size;
        }
        assert_eq!(expected, bytes.len() as u64);
    }
}
