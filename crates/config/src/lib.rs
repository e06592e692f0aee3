use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use strum::{Display, EnumString};
use tracing::{info, warn};

pub const CONFIG_FILE_NAME: &str = "tickbox.json";

/// Environment variable that overrides [`AppConfig::environment`]
pub const ENV_VAR: &str = "TICKBOX_ENV";

/// Platform-specific data directory resolution
pub fn default_data_dir() -> Result<PathBuf> {
	#[cfg(target_os = "linux")]
	let dir = dirs::data_local_dir()
		.ok_or_else(|| anyhow!("Could not determine data directory"))?
		.join("tickbox");

	#[cfg(not(target_os = "linux"))]
	let dir = dirs::data_dir()
		.ok_or_else(|| anyhow!("Could not determine data directory"))?
		.join("Tickbox");

	fs::create_dir_all(&dir)?;

	Ok(dir)
}

/// Development builds expose internal error detail and request ids over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Environment {
	Development,
	Production,
}

impl Default for Environment {
	fn default() -> Self {
		if cfg!(debug_assertions) {
			Self::Development
		} else {
			Self::Production
		}
	}
}

impl Environment {
	pub fn is_development(self) -> bool {
		self == Self::Development
	}

	/// Parse an override value, ignoring anything unrecognized.
	pub fn from_override(value: Option<&str>) -> Option<Self> {
		let value = value?.trim();
		match value.parse() {
			Ok(environment) => Some(environment),
			Err(_) => {
				warn!(%value, "Ignoring unrecognized TICKBOX_ENV value");
				None
			}
		}
	}
}

/// Application configuration, stored next to the data it describes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
	/// Config schema version
	pub version: u32,

	pub data_dir: PathBuf,

	/// Default filter when `RUST_LOG` is unset
	pub log_level: String,

	#[serde(default)]
	pub environment: Environment,

	/// IPC channel the RPC router is attached to
	#[serde(default = "default_channel")]
	pub channel: String,

	/// Socket file name, relative to `data_dir`
	#[serde(default = "default_socket_name")]
	pub socket_name: String,
}

fn default_channel() -> String {
	"rpc".to_string()
}

fn default_socket_name() -> String {
	"tickbox.sock".to_string()
}

impl AppConfig {
	pub const VERSION: u32 = 1;

	/// Load configuration from the default location
	pub fn load() -> Result<Self> {
		let data_dir = default_data_dir()?;
		Self::load_from(&data_dir)
	}

	/// Load configuration from a specific data directory, creating it with defaults when
	/// the file does not exist yet.
	pub fn load_from(data_dir: &Path) -> Result<Self> {
		let config_path = data_dir.join(CONFIG_FILE_NAME);

		if config_path.exists() {
			info!("Loading config from {:?}", config_path);
			let json = fs::read_to_string(&config_path)
				.with_context(|| format!("Failed to read {}", config_path.display()))?;
			let mut config: AppConfig = serde_json::from_str(&json)
				.with_context(|| format!("Failed to parse {}", config_path.display()))?;

			// The file may have been moved along with its directory
			config.data_dir = data_dir.to_path_buf();
			Ok(config)
		} else {
			warn!("No config found, creating default at {:?}", config_path);
			let config = Self::default_with_dir(data_dir.to_path_buf());
			config.save()?;
			Ok(config)
		}
	}

	/// Like [`AppConfig::load_from`], but a corrupt file is replaced by defaults.
	pub fn load_or_create(data_dir: &Path) -> Result<Self> {
		Self::load_from(data_dir).or_else(|e| {
			warn!("Config unreadable ({e:#}), recreating defaults");
			let config = Self::default_with_dir(data_dir.to_path_buf());
			config.save()?;
			Ok(config)
		})
	}

	pub fn default_with_dir(data_dir: PathBuf) -> Self {
		Self {
			version: Self::VERSION,
			data_dir,
			log_level: "info".to_string(),
			environment: Environment::default(),
			channel: default_channel(),
			socket_name: default_socket_name(),
		}
	}

	/// Apply `TICKBOX_ENV`, if set.
	pub fn with_env_overrides(mut self) -> Self {
		let value = std::env::var(ENV_VAR).ok();
		if let Some(environment) = Environment::from_override(value.as_deref()) {
			self.environment = environment;
		}
		self
	}

	pub fn save(&self) -> Result<()> {
		fs::create_dir_all(&self.data_dir)?;

		let config_path = self.data_dir.join(CONFIG_FILE_NAME);
		let json = serde_json::to_string_pretty(self)?;
		fs::write(&config_path, json)?;
		info!("Saved config to {:?}", config_path);
		Ok(())
	}

	pub fn logs_dir(&self) -> PathBuf {
		self.data_dir.join("logs")
	}

	pub fn socket_path(&self) -> PathBuf {
		self.data_dir.join(&self.socket_name)
	}

	pub fn ensure_directories(&self) -> Result<()> {
		fs::create_dir_all(&self.data_dir)?;
		fs::create_dir_all(self.logs_dir())?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn creates_defaults_then_reloads_them() {
		let dir = tempfile::tempdir().unwrap();
		let created = AppConfig::load_from(dir.path()).unwrap();
		assert!(dir.path().join(CONFIG_FILE_NAME).exists());
		assert_eq!(created.channel, "rpc");
		assert_eq!(created.socket_path(), dir.path().join("tickbox.sock"));

		let reloaded = AppConfig::load_from(dir.path()).unwrap();
		assert_eq!(reloaded, created);
	}

	#[test]
	fn missing_optional_fields_take_defaults() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(
			dir.path().join(CONFIG_FILE_NAME),
			r#"{ "version": 1, "data_dir": "/elsewhere", "log_level": "debug", "environment": "production" }"#,
		)
		.unwrap();

		let config = AppConfig::load_from(dir.path()).unwrap();
		assert_eq!(config.log_level, "debug");
		assert_eq!(config.environment, Environment::Production);
		assert_eq!(config.socket_name, "tickbox.sock");
		assert_eq!(config.data_dir, dir.path());
	}

	#[test]
	fn corrupt_config_is_recreated() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join(CONFIG_FILE_NAME), "{ nope").unwrap();
		assert!(AppConfig::load_from(dir.path()).is_err());

		let config = AppConfig::load_or_create(dir.path()).unwrap();
		assert_eq!(config.version, AppConfig::VERSION);
	}

	#[test]
	fn environment_overrides() {
		assert_eq!(
			Environment::from_override(Some("Production")),
			Some(Environment::Production)
		);
		assert_eq!(
			Environment::from_override(Some(" development ")),
			Some(Environment::Development)
		);
		assert_eq!(Environment::from_override(Some("staging")), None);
		assert_eq!(Environment::from_override(None), None);
		assert_eq!(Environment::Production.to_string(), "production");
	}
}
