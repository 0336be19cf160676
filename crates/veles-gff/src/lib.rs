//! Generic container format (GFF) codec.
//!
//! The container format is a compact, self-describing encoding for trees of
//! typed key/value records, used by the engine to persist dialogue, journal
//! and blueprint resources. A file is a fixed header plus six sections:
//! struct table, field table, label table, field data pool, field-index
//! table and list-index table. This crate decodes files into an owned
//! [`GffStruct`] tree and encodes trees back, reproducing the engine
//! writer's layout (label dedup, 4-byte value padding, frequency-ordered
//! struct type ids) so regenerated files diff cleanly against engine output.
//!
//! # Quick Start
//!
//! ```no_run
//! use veles_gff::{GffBuilder, GffContainer};
//!
//! let container = GffContainer::open("convo.dlg")?;
//! let root = container.root()?;
//!
//! for field in &root.fields {
//!     println!("{}: {}", field.label, field.value);
//! }
//!
//! let bytes = GffBuilder::encode(&root, container.file_type());
//! std::fs::write("convo-out.dlg", bytes)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! The codec is structure-agnostic: it knows labels and types, never what a
//! "conversation" is. Domain overlays (veles-dlg, veles-jrl, veles-utc) map
//! trees to their record types on top of this crate.

mod builder;
mod container;
mod error;
mod header;
mod types;
mod value;

pub mod structs;

#[cfg(feature = "json-export")]
mod json;

pub use builder::GffBuilder;
pub use container::GffContainer;
pub use error::{Error, Result};
pub use header::GffHeader;
pub use types::FieldType;
pub use value::{GffField, GffStruct, LocString, LocVariant, ResRef, Value};
