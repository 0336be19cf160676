//! Creature-blueprint overlay for the container codec.
//!
//! Creature blueprints describe the characters a module can spawn: names,
//! ability scores, hit points, the dialogue they speak and what they carry.
//!
//! # Example
//!
//! ```no_run
//! use veles_utc::Creature;
//!
//! let creature = Creature::open("fence.utc")?;
//! println!("{} carries {} items", creature.tag, creature.inventory.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod creature;
mod error;

pub use creature::{Abilities, Creature, InventoryItem};
pub use error::{Error, Result};
