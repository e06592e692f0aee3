use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use tb_config::AppConfig;
use tb_rpc::{attach, AdapterOptions, IpcMain, IpcServer, RpcError};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
	api,
	client::INITIAL_LANGUAGE_CHANNEL,
	context::AppContext,
	infra::store::{AppStore, JsonFileStore, SETTINGS_FILE_NAME},
};

/// Everything the daemon serves, without the socket.
pub struct Backend {
	pub ipc: Arc<IpcMain>,
	pub context: AppContext,
}

impl Backend {
	/// Build the backend over `settings.json` in the configured data directory.
	pub async fn from_config(config: &AppConfig) -> Result<Self> {
		let store = JsonFileStore::new(
			config.data_dir.join(SETTINGS_FILE_NAME),
			AppStore::defaults(),
		);
		Self::new(
			AppContext::new(Arc::new(store)),
			&config.channel,
			config.environment.is_development(),
		)
		.await
	}

	/// Wire `context` to a fresh IPC host: the router on `channel`, the initial-language
	/// sync channel, event forwarding and the persisted reminders.
	pub async fn new(context: AppContext, channel: &str, development: bool) -> Result<Self> {
		let router = Arc::new(api::mount().context("Failed to build procedure router")?);
		let ipc = Arc::new(IpcMain::new());

		attach(
			&ipc,
			channel,
			router,
			context.clone(),
			AdapterOptions { development },
		);
		register_initial_language(&ipc, &context);
		forward_events(&ipc, &context);

		match context.todos.reschedule_reminders().await {
			Ok(count) => info!(count, "Reminders restored"),
			Err(e) => warn!(error = %e, "Failed to restore reminders"),
		}

		Ok(Self { ipc, context })
	}
}

fn register_initial_language(ipc: &IpcMain, context: &AppContext) {
	let language = context.language.clone();
	ipc.on_sync(INITIAL_LANGUAGE_CHANNEL, move |_| {
		let language = language.clone();
		async move {
			let value = match language.current().await {
				Ok(current) => current,
				Err(e) => {
					warn!(error = %e, "Failed to read initial language, returning default");
					Default::default()
				}
			};
			serde_json::to_value(value).map_err(|e| RpcError::internal(e.to_string()))
		}
	});
}

fn forward_events(ipc: &Arc<IpcMain>, context: &AppContext) {
	let mut events = context.events.subscribe();
	let ipc = Arc::clone(ipc);

	tokio::spawn(async move {
		loop {
			match events.recv().await {
				Ok(event) => {
					debug!(channel = event.channel(), "Forwarding event");
					ipc.emit(event.channel(), event.payload());
				}
				Err(RecvError::Lagged(skipped)) => {
					warn!(skipped, "Event forwarder lagged");
				}
				Err(RecvError::Closed) => break,
			}
		}
	});
}

/// Start the daemon: logging, backend, socket server. Returns when the server stops.
pub async fn start_default_server(config: AppConfig) -> Result<()> {
	config.ensure_directories()?;
	initialize_tracing_with_file_logging(&config.logs_dir(), &config.log_level)?;

	info!("Starting Tickbox daemon");
	info!("Data directory: {:?}", config.data_dir);
	info!("Socket path: {:?}", config.socket_path());
	info!("Environment: {}", config.environment);

	let backend = Backend::from_config(&config).await?;
	let mut server = IpcServer::new(config.socket_path(), Arc::clone(&backend.ipc));
	let result = server.start().await.context("IPC server failed");

	backend.context.notifications.shutdown();
	result
}

/// Sender that stops a server started with [`serve`].
pub type ShutdownHandle = mpsc::Sender<()>;

/// Serve an already built backend on `socket_path` in the background.
pub fn serve(backend: &Backend, socket_path: &Path) -> Result<ShutdownHandle> {
	let mut server = IpcServer::new(socket_path, Arc::clone(&backend.ipc));
	let listener = server.bind().context("Failed to bind IPC socket")?;
	let shutdown = server.shutdown_handle();

	tokio::spawn(async move {
		if let Err(e) = server.run(listener).await {
			warn!(error = %e, "IPC server stopped with error");
		}
	});

	Ok(shutdown)
}

/// Initialize tracing with file logging to `{logs_dir}/daemon.log`
fn initialize_tracing_with_file_logging(logs_dir: &Path, default_level: &str) -> Result<()> {
	use std::sync::Once;
	use tracing_appender::rolling::{RollingFileAppender, Rotation};
	use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

	static INIT: Once = Once::new();
	let mut result = Ok(());

	INIT.call_once(|| {
		let file_appender = RollingFileAppender::new(Rotation::DAILY, logs_dir, "daemon.log");

		let default_filter = format!("tb_core={default_level},tb_rpc={default_level},tickbox_daemon={default_level}");

		if let Err(e) = tracing_subscriber::registry()
			.with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
			.with(
				fmt::layer()
					.with_target(true)
					.with_thread_ids(true)
					.with_writer(std::io::stdout),
			)
			.with(
				fmt::layer()
					.with_target(true)
					.with_thread_ids(true)
					.with_ansi(false)
					.with_writer(file_appender),
			)
			.try_init()
		{
			result = Err(anyhow::anyhow!("Failed to initialize tracing: {e}"));
		}
	});

	result
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::domain::Language;
	use serde_json::json;

	#[tokio::test]
	async fn initial_language_reads_the_store() {
		let context = AppContext::in_memory();
		context.language.set(Language::Ja).await.unwrap();
		let backend = Backend::new(context, "rpc", false).await.unwrap();

		let value = backend
			.ipc
			.send_sync(INITIAL_LANGUAGE_CHANNEL, Value::Null)
			.await
			.unwrap();
		assert_eq!(value, json!("ja"));
	}

	#[tokio::test]
	async fn core_events_reach_ipc_subscribers() {
		let backend = Backend::new(AppContext::in_memory(), "rpc", false)
			.await
			.unwrap();
		let mut rx = backend.ipc.subscribe();

		backend.context.language.set(Language::Ja).await.unwrap();
		let event = tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv())
			.await
			.unwrap()
			.unwrap();
		assert_eq!(event.channel, "language-changed");
		assert_eq!(event.payload, json!("ja"));
	}
}
