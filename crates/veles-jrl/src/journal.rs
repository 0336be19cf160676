//! Journal file mapping.

use std::path::Path;

use veles_gff::{GffBuilder, GffContainer, GffField, GffStruct, LocString, Value};

use crate::{Error, Result};

/// One stage of a quest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JournalEntry {
    /// Stage id; higher stages supersede lower ones in the player journal.
    pub id: u32,
    /// Journal text shown at this stage.
    pub text: LocString,
    /// Whether reaching this stage finishes the quest.
    pub end: bool,
    /// Unrecognized fields, preserved.
    pub extra: Vec<GffField>,
}

impl JournalEntry {
    fn from_gff(mut s: GffStruct) -> Self {
        Self {
            id: s.take_u32("ID").unwrap_or(0),
            text: s.take_loc("Text").unwrap_or_default(),
            end: s.take_u16("End").unwrap_or(0) != 0,
            extra: s.fields,
        }
    }

    fn to_gff(&self) -> Result<GffStruct> {
        let mut s = GffStruct::new();
        s.add("ID", Value::Dword(self.id))?;
        s.add("Text", Value::LocString(self.text.clone()))?;
        s.add("End", Value::Word(self.end as u16))?;
        s.fields.extend(self.extra.iter().cloned());
        Ok(s)
    }
}

/// A quest: its display name and its ordered stages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Category {
    /// Quest name shown as the journal heading.
    pub name: LocString,
    /// Tag scripts use to address this quest.
    pub tag: String,
    /// Sort priority in the journal display.
    pub priority: u32,
    /// Experience awarded on completion.
    pub xp: u32,
    /// Author comment.
    pub comment: String,
    /// The stages, in authored order.
    pub entries: Vec<JournalEntry>,
    /// Unrecognized fields, preserved.
    pub extra: Vec<GffField>,
}

impl Category {
    fn from_gff(mut s: GffStruct) -> Self {
        Self {
            name: s.take_loc("Name").unwrap_or_default(),
            tag: s.take_str("Tag").unwrap_or_default(),
            priority: s.take_u32("Priority").unwrap_or(0),
            xp: s.take_u32("XP").unwrap_or(0),
            comment: s.take_str("Comment").unwrap_or_default(),
            entries: s
                .take_list("EntryList")
                .unwrap_or_default()
                .into_iter()
                .map(JournalEntry::from_gff)
                .collect(),
            extra: s.fields,
        }
    }

    fn to_gff(&self) -> Result<GffStruct> {
        let mut s = GffStruct::new();
        s.add("Name", Value::LocString(self.name.clone()))?;
        s.add("Tag", Value::String(self.tag.clone()))?;
        s.add("Priority", Value::Dword(self.priority))?;
        s.add("XP", Value::Dword(self.xp))?;
        s.add("Comment", Value::String(self.comment.clone()))?;
        let entries: Result<Vec<_>> = self.entries.iter().map(JournalEntry::to_gff).collect();
        s.add("EntryList", Value::List(entries?))?;
        s.fields.extend(self.extra.iter().cloned());
        Ok(s)
    }

    /// Find a stage by id.
    pub fn entry(&self, id: u32) -> Option<&JournalEntry> {
        self.entries.iter().find(|e| e.id == id)
    }
}

/// A module's quest journal: every quest with every stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Journal {
    /// The quests, in authored order.
    pub categories: Vec<Category>,
    /// Unrecognized top-level fields, preserved.
    pub extra: Vec<GffField>,
}

impl Journal {
    /// File-type tag of journal containers.
    pub const FILE_TYPE: [u8; 4] = *b"JRL ";

    /// Read and decode a journal file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::parse(&data)
    }

    /// Decode a journal file from bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let container = GffContainer::parse(data)?;
        if container.file_type() != Self::FILE_TYPE {
            return Err(Error::WrongFileType {
                expected: String::from_utf8_lossy(&Self::FILE_TYPE).into_owned(),
                actual: container.file_type_str(),
            });
        }
        Ok(Self::from_gff(container.root()?))
    }

    /// Build the journal from a decoded container tree.
    pub fn from_gff(mut root: GffStruct) -> Self {
        Self {
            categories: root
                .take_list("Categories")
                .unwrap_or_default()
                .into_iter()
                .map(Category::from_gff)
                .collect(),
            extra: root.fields,
        }
    }

    /// Serialize the journal back into a container tree.
    pub fn to_gff(&self) -> Result<GffStruct> {
        let mut root = GffStruct::new();
        let categories: Result<Vec<_>> = self.categories.iter().map(Category::to_gff).collect();
        root.add("Categories", Value::List(categories?))?;
        root.fields.extend(self.extra.iter().cloned());
        Ok(root)
    }

    /// Encode the journal as file bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(GffBuilder::encode(&self.to_gff()?, Self::FILE_TYPE))
    }

    /// Encode and write the journal to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    /// Find a quest by tag.
    pub fn category(&self, tag: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.tag == tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Journal {
        Journal {
            categories: vec![Category {
                name: LocString::inline(0, "The Missing Caravan"),
                tag: "q_caravan".into(),
                priority: 2,
                xp: 250,
                comment: "act one main quest".into(),
                entries: vec![
                    JournalEntry {
                        id: 10,
                        text: LocString::inline(0, "Find the caravan."),
                        end: false,
                        extra: Vec::new(),
                    },
                    JournalEntry {
                        id: 20,
                        text: LocString::inline(0, "The caravan is safe."),
                        end: true,
                        extra: Vec::new(),
                    },
                ],
                extra: Vec::new(),
            }],
            extra: Vec::new(),
        }
    }

    #[test]
    fn test_round_trip() {
        let journal = sample();
        let parsed = Journal::parse(&journal.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed, journal);

        let quest = parsed.category("q_caravan").unwrap();
        assert_eq!(quest.entries.len(), 2);
        assert!(quest.entry(20).unwrap().end);
        assert!(!quest.entry(10).unwrap().end);
    }

    #[test]
    fn test_wrong_tag_rejected() {
        let bytes = GffBuilder::encode(&GffStruct::new(), *b"DLG ");
        assert!(matches!(
            Journal::parse(&bytes),
            Err(Error::WrongFileType { .. })
        ));
    }

    #[test]
    fn test_unknown_fields_preserved() {
        let root = GffStruct::new()
            .with("Categories", Value::List(vec![]))
            .unwrap()
            .with("SortMode", Value::Byte(3))
            .unwrap();
        let bytes = GffBuilder::encode(&root, Journal::FILE_TYPE);

        let journal = Journal::parse(&bytes).unwrap();
        assert_eq!(journal.extra.len(), 1);

        let reparsed = Journal::parse(&journal.to_bytes().unwrap()).unwrap();
        assert_eq!(reparsed.extra[0].label.as_str(), "SortMode");
        assert_eq!(reparsed.extra[0].value, Value::Byte(3));
    }
}
