//! Creature blueprint mapping.

use std::path::Path;

use veles_gff::{GffBuilder, GffContainer, GffField, GffStruct, LocString, ResRef, Value};

use crate::{Error, Result};

/// The six ability scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Abilities {
    pub strength: u8,
    pub dexterity: u8,
    pub constitution: u8,
    pub intelligence: u8,
    pub wisdom: u8,
    pub charisma: u8,
}

/// One item carried in a creature's inventory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventoryItem {
    /// Blueprint resource of the item.
    pub resource: ResRef,
    /// Grid position in the inventory panel.
    pub position: (u16, u16),
    /// Whether the item drops on death.
    pub dropable: bool,
    /// Unrecognized fields, preserved.
    pub extra: Vec<GffField>,
}

impl InventoryItem {
    fn from_gff(mut s: GffStruct) -> Self {
        Self {
            resource: s.take_resref("InventoryRes").unwrap_or_default(),
            position: (
                s.take_u16("Repos_PosX").unwrap_or(0),
                s.take_u16("Repos_Posy").unwrap_or(0),
            ),
            dropable: s.take_u8("Dropable").unwrap_or(0) != 0,
            extra: s.fields,
        }
    }

    fn to_gff(&self) -> Result<GffStruct> {
        let mut s = GffStruct::new();
        s.add("InventoryRes", Value::ResRef(self.resource.clone()))?;
        s.add("Repos_PosX", Value::Word(self.position.0))?;
        s.add("Repos_Posy", Value::Word(self.position.1))?;
        s.add("Dropable", Value::Byte(self.dropable as u8))?;
        s.fields.extend(self.extra.iter().cloned());
        Ok(s)
    }
}

/// A creature blueprint: identity, scores, hit points and inventory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Creature {
    /// Localized first name.
    pub first_name: LocString,
    /// Localized last name.
    pub last_name: LocString,
    /// Tag scripts use to address instances of this blueprint.
    pub tag: String,
    /// Author comment.
    pub comment: String,
    /// Ability scores.
    pub abilities: Abilities,
    /// Current hit points.
    pub hit_points: i16,
    /// Maximum hit points.
    pub max_hit_points: i16,
    /// Dialogue file this creature speaks.
    pub conversation: Option<ResRef>,
    /// Carried items.
    pub inventory: Vec<InventoryItem>,
    /// Unrecognized top-level fields, preserved.
    pub extra: Vec<GffField>,
}

impl Creature {
    /// File-type tag of creature blueprints.
    pub const FILE_TYPE: [u8; 4] = *b"UTC ";

    /// Read and decode a creature blueprint.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::parse(&data)
    }

    /// Decode a creature blueprint from bytes.
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

    /// Build the blueprint from a decoded container tree.
    pub fn from_gff(mut root: GffStruct) -> Self {
        let abilities = Abilities {
            strength: root.take_u8("Str").unwrap_or(10),
            dexterity: root.take_u8("Dex").unwrap_or(10),
            constitution: root.take_u8("Con").unwrap_or(10),
            intelligence: root.take_u8("Int").unwrap_or(10),
            wisdom: root.take_u8("Wis").unwrap_or(10),
            charisma: root.take_u8("Cha").unwrap_or(10),
        };
        let hit_points = root.take_i16("HitPoints").unwrap_or(1);
        let max_hit_points = root.take_i16("MaxHitPoints").unwrap_or(hit_points);

        Self {
            first_name: root.take_loc("FirstName").unwrap_or_default(),
            last_name: root.take_loc("LastName").unwrap_or_default(),
            tag: root.take_str("Tag").unwrap_or_default(),
            comment: root.take_str("Comment").unwrap_or_default(),
            abilities,
            hit_points,
            max_hit_points,
            conversation: root.take_resref("Conversation"),
            inventory: root
                .take_list("ItemList")
                .unwrap_or_default()
                .into_iter()
                .map(InventoryItem::from_gff)
                .collect(),
            extra: root.fields,
        }
    }

    /// Serialize the blueprint back into a container tree.
    pub fn to_gff(&self) -> Result<GffStruct> {
        let mut root = GffStruct::new();
        root.add("FirstName", Value::LocString(self.first_name.clone()))?;
        root.add("LastName", Value::LocString(self.last_name.clone()))?;
        root.add("Tag", Value::String(self.tag.clone()))?;
        root.add("Str", Value::Byte(self.abilities.strength))?;
        root.add("Dex", Value::Byte(self.abilities.dexterity))?;
        root.add("Con", Value::Byte(self.abilities.constitution))?;
        root.add("Int", Value::Byte(self.abilities.intelligence))?;
        root.add("Wis", Value::Byte(self.abilities.wisdom))?;
        root.add("Cha", Value::Byte(self.abilities.charisma))?;
        root.add("HitPoints", Value::Short(self.hit_points))?;
        root.add("MaxHitPoints", Value::Short(self.max_hit_points))?;
        if let Some(conversation) = &self.conversation {
            root.add("Conversation", Value::ResRef(conversation.clone()))?;
        }
        if !self.comment.is_empty() {
            root.add("Comment", Value::String(self.comment.clone()))?;
        }
        let items: Result<Vec<_>> = self.inventory.iter().map(InventoryItem::to_gff).collect();
        root.add("ItemList", Value::List(items?))?;
        root.fields.extend(self.extra.iter().cloned());
        Ok(root)
    }

    /// Encode the blueprint as file bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(GffBuilder::encode(&self.to_gff()?, Self::FILE_TYPE))
    }

    /// Encode and write the blueprint to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Creature {
        Creature {
            first_name: LocString::inline(0, "Darrow"),
            last_name: LocString::inline(0, "the Fence"),
            tag: "npc_fence".into(),
            comment: "buys stolen goods".into(),
            abilities: Abilities {
                strength: 9,
                dexterity: 14,
                constitution: 11,
                intelligence: 13,
                wisdom: 10,
                charisma: 15,
            },
            hit_points: 8,
            max_hit_points: 8,
            conversation: Some(ResRef::new("fence_dlg").unwrap()),
            inventory: vec![InventoryItem {
                resource: ResRef::new("it_lockpick").unwrap(),
                position: (2, 0),
                dropable: true,
                extra: Vec::new(),
            }],
            extra: Vec::new(),
        }
    }

    #[test]
    fn test_round_trip() {
        let creature = sample();
        let parsed = Creature::parse(&creature.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed, creature);
        assert_eq!(parsed.inventory[0].resource.as_str(), "it_lockpick");
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let bytes = GffBuilder::encode(&GffStruct::new(), Creature::FILE_TYPE);
        let creature = Creature::parse(&bytes).unwrap();

        assert_eq!(creature.abilities.strength, 10);
        assert_eq!(creature.hit_points, 1);
        assert_eq!(creature.max_hit_points, 1);
        assert!(creature.inventory.is_empty());
    }

    #[test]
    fn test_unknown_fields_preserved() {
        let mut creature = sample();
        let mut tree = creature.to_gff().unwrap();
        tree.add("FactionID", Value::Word(4)).unwrap();

        creature = Creature::from_gff(tree);
        assert_eq!(creature.extra.len(), 1);

        let reparsed = Creature::parse(&creature.to_bytes().unwrap()).unwrap();
        assert_eq!(reparsed.extra[0].label.as_str(), "FactionID");
        assert_eq!(reparsed.extra[0].value, Value::Word(4));
    }
}
