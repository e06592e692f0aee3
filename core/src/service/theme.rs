use tracing::info;

use crate::{domain::Theme, error::Result, repository::ThemeRepository};

#[derive(Clone)]
pub struct ThemeService {
	repository: ThemeRepository,
}

impl ThemeService {
	pub fn new(repository: ThemeRepository) -> Self {
		Self { repository }
	}

	pub async fn current(&self) -> Result<Theme> {
		self.repository.get().await
	}

	pub async fn set(&self, theme: Theme) -> Result<Theme> {
		let theme = self.repository.set(theme).await?;
		info!(%theme, "Theme updated");
		Ok(theme)
	}
}
