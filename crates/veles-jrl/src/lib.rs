//! Journal overlay for the container codec.
//!
//! Journal files hold a module's quests: each category is one quest with a
//! tag, a display name and a list of staged entries. Scripts advance a quest
//! by stage id; the journal shows the text of the highest stage reached.
//!
//! # Example
//!
//! ```no_run
//! use veles_jrl::Journal;
//!
//! let journal = Journal::open("module.jrl")?;
//! for quest in &journal.categories {
//!     println!("{} ({} stages)", quest.tag, quest.entries.len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod journal;

pub use error::{Error, Result};
pub use journal::{Category, Journal, JournalEntry};
