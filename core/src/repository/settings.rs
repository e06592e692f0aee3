use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
	domain::{Language, Theme},
	error::Result,
	infra::store::{AppStore, ThemeKey, UserLanguage},
};

#[derive(Clone)]
pub struct ThemeRepository {
	store: AppStore,
}

impl ThemeRepository {
	pub fn new(store: AppStore) -> Self {
		Self { store }
	}

	pub async fn get(&self) -> Result<Theme> {
		Ok(self.store.get::<ThemeKey>().await?)
	}

	pub async fn set(&self, theme: Theme) -> Result<Theme> {
		self.store.set::<ThemeKey>(&theme).await?;
		Ok(theme)
	}
}

#[derive(Clone)]
pub struct LanguageRepository {
	store: AppStore,
	write_lock: Arc<Mutex<()>>,
}

impl LanguageRepository {
	pub fn new(store: AppStore) -> Self {
		Self {
			store,
			write_lock: Arc::new(Mutex::new(())),
		}
	}

	pub async fn get(&self) -> Result<Language> {
		Ok(self.store.get::<UserLanguage>().await?)
	}

	/// Store `language` unless it is already current. Returns whether anything changed.
	pub async fn replace(&self, language: Language) -> Result<bool> {
		let _guard = self.write_lock.lock().await;
		if self.store.get::<UserLanguage>().await? == language {
			return Ok(false);
		}
		self.store.set::<UserLanguage>(&language).await?;
		Ok(true)
	}
}
