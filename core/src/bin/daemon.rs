use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tb_config::AppConfig;
use tokio::signal;

#[derive(Parser, Debug)]
#[command(name = "tickbox-daemon", about = "Tickbox backend daemon")]
struct Args {
	/// Path to the Tickbox data directory
	#[arg(long, env = "TICKBOX_DATA_DIR")]
	data_dir: Option<PathBuf>,

	/// Log level used when RUST_LOG is not set
	#[arg(long)]
	log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	let data_dir = match args.data_dir {
		Some(dir) => dir,
		None => tb_config::default_data_dir()?,
	};

	let mut config = AppConfig::load_or_create(&data_dir)
		.with_context(|| format!("Failed to load config from {}", data_dir.display()))?
		.with_env_overrides();
	if let Some(level) = args.log_level {
		config.log_level = level;
	}

	let ctrl_c = async {
		if let Err(e) = signal::ctrl_c().await {
			eprintln!("Failed to listen for Ctrl+C: {e}");
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match signal::unix::signal(signal::unix::SignalKind::terminate()) {
			Ok(mut signal) => {
				signal.recv().await;
			}
			Err(e) => {
				eprintln!("Failed to install SIGTERM handler: {e}");
				std::future::pending::<()>().await;
			}
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	let socket_path = config.socket_path();

	let result = tokio::select! {
		result = tb_core::start_default_server(config) => result,
		() = ctrl_c => {
			println!("Received Ctrl+C, shutting down gracefully...");
			Ok(())
		}
		() = terminate => {
			println!("Received SIGTERM, shutting down gracefully...");
			Ok(())
		}
	};

	// The server future was dropped mid-loop; clear its socket
	let _ = std::fs::remove_file(socket_path);
	result
}
