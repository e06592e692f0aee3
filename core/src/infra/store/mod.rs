//! Key-value persistence.
//!
//! [`PersistenceStore`] is the untyped engine: string keys, JSON values. [`AppStore`] is the
//! typed view the rest of the core uses; its keys are types, so a key outside the
//! persisted schema cannot be named.

mod json_file;
mod memory;
mod typed;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use typed::{AppStore, StoreKey, ThemeKey, Todos, UserLanguage};

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub const SETTINGS_FILE_NAME: &str = "settings.json";

#[derive(Debug, Error)]
pub enum StoreError {
	#[error("failed to access {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("failed to encode store document: {0}")]
	Encode(#[from] serde_json::Error),
	#[error("stored value for '{key}' is invalid: {source}")]
	InvalidValue {
		key: &'static str,
		#[source]
		source: serde_json::Error,
	},
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait PersistenceStore: Send + Sync {
	async fn get(&self, key: &str) -> Result<Option<Value>>;

	async fn set(&self, key: &str, value: Value) -> Result<()>;

	async fn has(&self, key: &str) -> Result<bool>;

	async fn delete(&self, key: &str) -> Result<()>;
}
