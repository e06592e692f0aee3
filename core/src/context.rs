//! Shared state handed to every procedure.

use std::sync::Arc;

use crate::{
	infra::{
		event::EventBus,
		store::{AppStore, MemoryStore, PersistenceStore},
	},
	repository::{LanguageRepository, ThemeRepository, TodoRepository},
	service::{LanguageService, NotificationService, ThemeService, TodoService},
};

/// Owns the store and the services built on it. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct AppContext {
	pub store: AppStore,
	pub events: EventBus,
	pub todos: TodoService,
	pub theme: ThemeService,
	pub language: LanguageService,
	pub notifications: NotificationService,
}

impl AppContext {
	pub fn new(engine: Arc<dyn PersistenceStore>) -> Self {
		let store = AppStore::new(engine);
		let events = EventBus::default();

		let language_repository = LanguageRepository::new(store.clone());
		let notifications = NotificationService::new(events.clone(), language_repository.clone());

		Self {
			todos: TodoService::new(TodoRepository::new(store.clone()), notifications.clone()),
			theme: ThemeService::new(ThemeRepository::new(store.clone())),
			language: LanguageService::new(language_repository, events.clone()),
			notifications,
			events,
			store,
		}
	}

	/// Context over a fresh in-memory store.
	pub fn in_memory() -> Self {
		Self::new(Arc::new(MemoryStore::with_defaults(AppStore::defaults())))
	}
}
