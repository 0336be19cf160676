//! Dialogue overlay for the container codec.
//!
//! Dialogue files store branching conversations: two flat tables of lines
//! (character "entries" and player "replies") wired into a directed graph by
//! pointer records. The same line can be the target of many pointers, so the
//! decoded form is a graph with shared sub-trees, not a tree. This crate
//! decodes that structure into a [`Dialog`] - an arena of [`Node`]s joined by
//! [`Edge`]s - and encodes it back in stable traversal order.
//!
//! # Quick Start
//!
//! ```no_run
//! use veles_dlg::Dialog;
//!
//! let mut dialog = Dialog::open("merchant.dlg")?;
//!
//! for node in dialog.nodes() {
//!     println!("{:?}: {}", node.kind, node.text.first_text().unwrap_or(""));
//! }
//!
//! // Drop anything no entry point reaches, then save.
//! let removed = dialog.remove_orphaned_nodes();
//! println!("pruned {} unreachable lines", removed.len());
//! dialog.save("merchant.dlg")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Original and link edges
//!
//! The first edge to reach a node in traversal order (entry points first,
//! then depth-first) is that node's *original* introduction; every other
//! edge to it is a *link*. The distinction is structural: it is recomputed
//! from the topology after every mutation rather than edited in place, so it
//! can never drift from the graph it describes. See [`Dialog::reclassify`].

mod dialog;
mod error;
mod graph;
mod orphans;
mod walk;

pub use error::{Error, Result};
pub use graph::{Dialog, Edge, EdgeKind, Node, NodeId, NodeKind, Param};
