//! Veles - game resource container toolkit.
//!
//! This crate provides a unified interface to the Veles library ecosystem
//! for working with the engine's container-format resources.
//!
//! # Crates
//!
//! - [`veles_common`] - Common utilities (binary reading and writing)
//! - [`veles_gff`] - Generic container codec (struct/field/label tables)
//! - [`veles_dlg`] - Dialogue files as conversation graphs
//! - [`veles_jrl`] - Journal files (quests and stages)
//! - [`veles_utc`] - Creature blueprints
//!
//! # Example
//!
//! ```no_run
//! use veles::prelude::*;
//!
//! let mut dialog = Dialog::open("merchant.dlg")?;
//!
//! let dropped_edges = dialog.remove_orphaned_pointers();
//! let dropped_nodes = dialog.remove_orphaned_nodes();
//! println!("repaired: {} edges, {} nodes", dropped_edges, dropped_nodes.len());
//!
//! dialog.save("merchant.dlg")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Re-export all sub-crates
pub use veles_common as common;
pub use veles_dlg as dlg;
pub use veles_gff as gff;
pub use veles_jrl as jrl;
pub use veles_utc as utc;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use veles_common::{BinaryReader, BinaryWriter};
    pub use veles_dlg::{Dialog, Edge, EdgeKind, Node, NodeId, NodeKind};
    pub use veles_gff::{GffBuilder, GffContainer, GffStruct, LocString, ResRef, Value};
    pub use veles_jrl::Journal;
    pub use veles_utc::Creature;
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
