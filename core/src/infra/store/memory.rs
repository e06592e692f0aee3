use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};

use super::{PersistenceStore, Result};

/// Non-persistent engine, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
	values: RwLock<Map<String, Value>>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_defaults(defaults: Map<String, Value>) -> Self {
		Self {
			values: RwLock::new(defaults),
		}
	}

	pub fn snapshot(&self) -> Map<String, Value> {
		self.values.read().clone()
	}
}

#[async_trait]
impl PersistenceStore for MemoryStore {
	async fn get(&self, key: &str) -> Result<Option<Value>> {
		Ok(self.values.read().get(key).cloned())
	}

	async fn set(&self, key: &str, value: Value) -> Result<()> {
		self.values.write().insert(key.to_string(), value);
		Ok(())
	}

	async fn has(&self, key: &str) -> Result<bool> {
		Ok(self.values.read().contains_key(key))
	}

	async fn delete(&self, key: &str) -> Result<()> {
		self.values.write().remove(key);
		Ok(())
	}
}
