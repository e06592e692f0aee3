use tracing::info;
use uuid::Uuid;

use crate::{
	domain::{CreateTodo, Todo, UpdateTodo},
	error::{CoreError, Result},
	repository::TodoRepository,
};

use super::NotificationService;

#[derive(Clone)]
pub struct TodoService {
	repository: TodoRepository,
	notifications: NotificationService,
}

impl TodoService {
	pub fn new(repository: TodoRepository, notifications: NotificationService) -> Self {
		Self {
			repository,
			notifications,
		}
	}

	pub async fn list(&self) -> Result<Vec<Todo>> {
		self.repository.find_all().await
	}

	pub async fn create(&self, input: CreateTodo) -> Result<Todo> {
		let title = input.title.trim();
		if title.is_empty() {
			return Err(CoreError::Validation("Title is required".to_string()));
		}

		let todo = Todo {
			id: Uuid::new_v4().to_string(),
			title: title.to_string(),
			completed: false,
			reminder_date_time: input.reminder_date_time,
		};

		let todo = self.repository.add(todo).await?;
		info!(id = %todo.id, "Created todo");
		self.notifications.schedule(&todo);
		Ok(todo)
	}

	pub async fn toggle(&self, id: &str) -> Result<Todo> {
		self.repository.toggle(id).await
	}

	/// Remove a todo and its reminder. Returns the removed id.
	pub async fn remove(&self, id: &str) -> Result<String> {
		let removed = self.repository.remove(id).await?;
		self.notifications.cancel(&removed.id);
		info!(id = %removed.id, "Removed todo");
		Ok(removed.id)
	}

	pub async fn update(&self, changes: UpdateTodo) -> Result<Todo> {
		if matches!(&changes.title, Some(title) if title.trim().is_empty()) {
			return Err(CoreError::Validation(
				"Title can't be empty if provided".to_string(),
			));
		}

		let todo = self.repository.update(&changes).await?;
		// A pending timer carries the title it was scheduled with
		let retitled = changes.title.is_some() && self.notifications.is_scheduled(&todo.id);
		if changes.touches_reminder() || retitled {
			self.notifications.schedule(&todo);
		}
		Ok(todo)
	}

	/// Restore reminder timers from the persisted todos.
	pub async fn reschedule_reminders(&self) -> Result<usize> {
		let todos = self.repository.find_all().await?;
		Ok(self.notifications.reschedule_all(&todos))
	}
}
