use tracing::{debug, info};

use crate::{
	domain::Language,
	error::Result,
	infra::event::{CoreEvent, EventBus},
	repository::LanguageRepository,
};

#[derive(Clone)]
pub struct LanguageService {
	repository: LanguageRepository,
	events: EventBus,
}

impl LanguageService {
	pub fn new(repository: LanguageRepository, events: EventBus) -> Self {
		Self { repository, events }
	}

	pub async fn current(&self) -> Result<Language> {
		self.repository.get().await
	}

	/// Persist `language` and broadcast `language-changed`. Setting the current language
	/// again does nothing.
	pub async fn set(&self, language: Language) -> Result<Language> {
		if !self.repository.replace(language).await? {
			debug!(%language, "Language unchanged, skipping update");
			return Ok(language);
		}

		info!(%language, "Language updated");
		self.events.emit(CoreEvent::LanguageChanged { language });
		Ok(language)
	}
}
