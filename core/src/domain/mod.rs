//! Domain values carried by the procedures and persisted by the store.

pub mod language;
pub mod theme;
pub mod todo;

pub use language::Language;
pub use theme::Theme;
pub use todo::{CreateTodo, Todo, TodoId, UpdateTodo};
