use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::{
	fs,
	sync::{OnceCell, RwLock},
};
use tracing::{debug, info, warn};

use super::{PersistenceStore, Result, StoreError};

/// Single JSON document on disk, e.g. `settings.json`.
///
/// The file is opened on first access, not at construction. Missing keys are filled from
/// the defaults at that point. Every write replaces the whole document through a temporary
/// file and a rename, so a crash never leaves a truncated file behind.
pub struct JsonFileStore {
	path: PathBuf,
	defaults: Map<String, Value>,
	document: OnceCell<RwLock<Map<String, Value>>>,
}

impl JsonFileStore {
	pub fn new(path: impl Into<PathBuf>, defaults: Map<String, Value>) -> Self {
		Self {
			path: path.into(),
			defaults,
			document: OnceCell::new(),
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn io_error(&self, source: std::io::Error) -> StoreError {
		StoreError::Io {
			path: self.path.clone(),
			source,
		}
	}

	async fn document(&self) -> Result<&RwLock<Map<String, Value>>> {
		self.document.get_or_try_init(|| self.open()).await
	}

	async fn open(&self) -> Result<RwLock<Map<String, Value>>> {
		let mut document = match fs::read(&self.path).await {
			Ok(bytes) => match serde_json::from_slice::<Value>(&bytes) {
				Ok(Value::Object(map)) => map,
				Ok(_) | Err(_) => {
					warn!(path = %self.path.display(), "Store file is not a JSON object, starting from defaults");
					Map::new()
				}
			},
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				info!(path = %self.path.display(), "Creating store file");
				Map::new()
			}
			Err(e) => return Err(self.io_error(e)),
		};

		let mut filled = false;
		for (key, value) in &self.defaults {
			if !document.contains_key(key) {
				document.insert(key.clone(), value.clone());
				filled = true;
			}
		}

		if filled || !fs::try_exists(&self.path).await.unwrap_or(false) {
			self.persist(&document).await?;
		}

		debug!(path = %self.path.display(), keys = document.len(), "Store opened");
		Ok(RwLock::new(document))
	}

	async fn persist(&self, document: &Map<String, Value>) -> Result<()> {
		if let Some(parent) = self.path.parent() {
			fs::create_dir_all(parent)
				.await
				.map_err(|e| self.io_error(e))?;
		}

		let json = serde_json::to_vec_pretty(document)?;
		let tmp_path = self.path.with_extension("json.tmp");
		fs::write(&tmp_path, json)
			.await
			.map_err(|e| self.io_error(e))?;
		fs::rename(&tmp_path, &self.path)
			.await
			.map_err(|e| self.io_error(e))
	}
}

#[async_trait]
impl PersistenceStore for JsonFileStore {
	async fn get(&self, key: &str) -> Result<Option<Value>> {
		let document = self.document().await?;
		let value = document.read().await.get(key).cloned();
		Ok(value)
	}

	async fn set(&self, key: &str, value: Value) -> Result<()> {
		let document = self.document().await?;
		let mut guard = document.write().await;
		let mut next = guard.clone();
		next.insert(key.to_string(), value);
		self.persist(&next).await?;
		*guard = next;
		Ok(())
	}

	async fn has(&self, key: &str) -> Result<bool> {
		let document = self.document().await?;
		let present = document.read().await.contains_key(key);
		Ok(present)
	}

	async fn delete(&self, key: &str) -> Result<()> {
		let document = self.document().await?;
		let mut guard = document.write().await;
		if !guard.contains_key(key) {
			return Ok(());
		}

		let mut next = guard.clone();
		next.remove(key);
		self.persist(&next).await?;
		*guard = next;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use serde_json::json;

	fn defaults() -> Map<String, Value> {
		let mut map = Map::new();
		map.insert("theme".into(), json!("system"));
		map
	}

	#[tokio::test]
	async fn opening_is_lazy_and_fills_defaults() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("settings.json");
		let store = JsonFileStore::new(&path, defaults());
		assert!(!path.exists());

		assert_eq!(store.get("theme").await.unwrap(), Some(json!("system")));
		assert!(path.exists());
		assert!(!store.has("other").await.unwrap());
	}

	#[tokio::test]
	async fn writes_survive_reopening() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("settings.json");

		let store = JsonFileStore::new(&path, defaults());
		store.set("theme", json!("dark")).await.unwrap();
		store.set("extra", json!([1, 2])).await.unwrap();
		store.delete("extra").await.unwrap();
		drop(store);

		let reopened = JsonFileStore::new(&path, defaults());
		assert_eq!(reopened.get("theme").await.unwrap(), Some(json!("dark")));
		assert_eq!(reopened.get("extra").await.unwrap(), None);
		assert!(!dir.path().join("settings.json.tmp").exists());
	}

	#[tokio::test]
	async fn corrupt_file_is_replaced_by_defaults() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("settings.json");
		std::fs::write(&path, "[not an object").unwrap();

		let store = JsonFileStore::new(&path, defaults());
		assert_eq!(store.get("theme").await.unwrap(), Some(json!("system")));

		let on_disk: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
		assert_eq!(on_disk, json!({ "theme": "system" }));
	}

	#[tokio::test]
	async fn failed_writes_leave_the_document_untouched() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("settings.json");
		let store = JsonFileStore::new(&path, defaults());
		store.set("extra", json!(1)).await.unwrap();

		// A directory in place of the temp file makes every persist fail
		std::fs::create_dir(dir.path().join("settings.json.tmp")).unwrap();

		assert!(store.set("theme", json!("dark")).await.is_err());
		assert_eq!(store.get("theme").await.unwrap(), Some(json!("system")));

		assert!(store.delete("extra").await.is_err());
		assert_eq!(store.get("extra").await.unwrap(), Some(json!(1)));

		let on_disk: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
		assert_eq!(on_disk, json!({ "theme": "system", "extra": 1 }));
	}
}
