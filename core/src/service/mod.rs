//! Business rules per entity.

pub mod language;
pub mod notification;
pub mod theme;
pub mod todo;

pub use language::LanguageService;
pub use notification::NotificationService;
pub use theme::ThemeService;
pub use todo::TodoService;
