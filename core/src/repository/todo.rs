use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
	domain::{Todo, UpdateTodo},
	error::{CoreError, Result},
	infra::store::{AppStore, Todos},
};

#[derive(Clone)]
pub struct TodoRepository {
	store: AppStore,
	write_lock: Arc<Mutex<()>>,
}

impl TodoRepository {
	pub fn new(store: AppStore) -> Self {
		Self {
			store,
			write_lock: Arc::new(Mutex::new(())),
		}
	}

	pub async fn find_all(&self) -> Result<Vec<Todo>> {
		Ok(self.store.get::<Todos>().await?)
	}

	pub async fn find_by_id(&self, id: &str) -> Result<Option<Todo>> {
		let todos = self.find_all().await?;
		Ok(todos.into_iter().find(|todo| todo.id == id))
	}

	pub async fn get_by_id(&self, id: &str) -> Result<Todo> {
		self.find_by_id(id)
			.await?
			.ok_or_else(|| CoreError::todo_not_found(id))
	}

	pub async fn add(&self, todo: Todo) -> Result<Todo> {
		let _guard = self.write_lock.lock().await;
		let mut todos = self.store.get::<Todos>().await?;
		todos.push(todo.clone());
		self.store.set::<Todos>(&todos).await?;
		Ok(todo)
	}

	pub async fn toggle(&self, id: &str) -> Result<Todo> {
		self.modify(id, |todo| todo.completed = !todo.completed)
			.await
	}

	pub async fn update(&self, changes: &UpdateTodo) -> Result<Todo> {
		self.modify(&changes.id, |todo| changes.apply(todo)).await
	}

	/// Remove by id, returning the removed todo.
	pub async fn remove(&self, id: &str) -> Result<Todo> {
		let _guard = self.write_lock.lock().await;
		let mut todos = self.store.get::<Todos>().await?;
		let index = todos
			.iter()
			.position(|todo| todo.id == id)
			.ok_or_else(|| CoreError::todo_not_found(id))?;
		let removed = todos.remove(index);
		self.store.set::<Todos>(&todos).await?;
		Ok(removed)
	}

	async fn modify(&self, id: &str, change: impl FnOnce(&mut Todo)) -> Result<Todo> {
		let _guard = self.write_lock.lock().await;
		let mut todos = self.store.get::<Todos>().await?;
		let todo = todos
			.iter_mut()
			.find(|todo| todo.id == id)
			.ok_or_else(|| CoreError::todo_not_found(id))?;
		change(todo);
		let updated = todo.clone();
		self.store.set::<Todos>(&todos).await?;
		Ok(updated)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::infra::store::MemoryStore;
	use pretty_assertions::assert_eq;

	fn todo(id: &str) -> Todo {
		Todo {
			id: id.into(),
			title: format!("todo {id}"),
			completed: false,
			reminder_date_time: None,
		}
	}

	fn repository() -> TodoRepository {
		TodoRepository::new(AppStore::new(Arc::new(MemoryStore::new())))
	}

	#[tokio::test]
	async fn toggle_and_remove_by_id() {
		let repo = repository();
		repo.add(todo("a")).await.unwrap();
		repo.add(todo("b")).await.unwrap();

		let toggled = repo.toggle("b").await.unwrap();
		assert!(toggled.completed);

		let removed = repo.remove("a").await.unwrap();
		assert_eq!(removed.id, "a");

		let ids: Vec<_> = repo
			.find_all()
			.await
			.unwrap()
			.into_iter()
			.map(|t| t.id)
			.collect();
		assert_eq!(ids, vec!["b"]);
	}

	#[tokio::test]
	async fn missing_ids_are_not_found() {
		let repo = repository();
		for result in [repo.toggle("x").await, repo.remove("x").await] {
			assert!(matches!(result, Err(CoreError::NotFound { .. })));
		}
		assert!(repo.find_by_id("x").await.unwrap().is_none());
	}

	#[tokio::test]
	async fn concurrent_adds_are_not_lost() {
		let repo = repository();
		let handles: Vec<_> = (0..20)
			.map(|n| {
				let repo = repo.clone();
				tokio::spawn(async move { repo.add(todo(&n.to_string())).await })
			})
			.collect();
		for handle in handles {
			handle.await.unwrap().unwrap();
		}
		assert_eq!(repo.find_all().await.unwrap().len(), 20);
	}
}
