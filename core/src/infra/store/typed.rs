use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use super::{PersistenceStore, Result, StoreError};
use crate::domain::{Language, Theme, Todo};

/// A key of the persisted document, with the type stored under it.
pub trait StoreKey {
	const NAME: &'static str;

	type Value: Serialize + DeserializeOwned + Send + Sync;

	fn default_value() -> Self::Value;
}

pub struct Todos;

impl StoreKey for Todos {
	const NAME: &'static str = "todos";

	type Value = Vec<Todo>;

	fn default_value() -> Self::Value {
		Vec::new()
	}
}

pub struct ThemeKey;

impl StoreKey for ThemeKey {
	const NAME: &'static str = "theme";

	type Value = Theme;

	fn default_value() -> Self::Value {
		Theme::default()
	}
}

pub struct UserLanguage;

impl StoreKey for UserLanguage {
	const NAME: &'static str = "userLanguage";

	type Value = Language;

	fn default_value() -> Self::Value {
		Language::default()
	}
}

fn default_entry<K: StoreKey>() -> (String, Value) {
	let value = serde_json::to_value(K::default_value()).unwrap_or(Value::Null);
	(K::NAME.to_string(), value)
}

/// Typed view over a [`PersistenceStore`]. Cheap to clone.
#[derive(Clone)]
pub struct AppStore {
	engine: Arc<dyn PersistenceStore>,
}

impl AppStore {
	pub fn new(engine: Arc<dyn PersistenceStore>) -> Self {
		Self { engine }
	}

	/// The document a fresh store starts from.
	pub fn defaults() -> Map<String, Value> {
		[
			default_entry::<Todos>(),
			default_entry::<ThemeKey>(),
			default_entry::<UserLanguage>(),
		]
		.into_iter()
		.collect()
	}

	/// Stored value, or the key's default when nothing is stored.
	pub async fn get<K: StoreKey>(&self) -> Result<K::Value> {
		match self.engine.get(K::NAME).await? {
			Some(value) => serde_json::from_value(value).map_err(|source| {
				StoreError::InvalidValue {
					key: K::NAME,
					source,
				}
			}),
			None => Ok(K::default_value()),
		}
	}

	pub async fn set<K: StoreKey>(&self, value: &K::Value) -> Result<()> {
		let value = serde_json::to_value(value)?;
		self.engine.set(K::NAME, value).await
	}

	pub async fn has<K: StoreKey>(&self) -> Result<bool> {
		self.engine.has(K::NAME).await
	}

	pub async fn delete<K: StoreKey>(&self) -> Result<()> {
		self.engine.delete(K::NAME).await
	}
}
