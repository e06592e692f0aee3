//! Persistence access per entity.
//!
//! The store only offers whole-value reads and writes, so every mutation is a
//! read-modify-write of one key. Each repository holds a lock for its key; clones share it.

mod settings;
mod todo;

pub use settings::{LanguageRepository, ThemeRepository};
pub use todo::TodoRepository;
