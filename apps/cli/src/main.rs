mod context;
mod domains;
mod util;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tb_config::AppConfig;
use tb_core::client::initial_language;
use tb_rpc::SocketTransport;
use tracing_subscriber::EnvFilter;

use crate::context::{Context, OutputFormat};
use crate::domains::{
	settings::{LangCmd, ThemeCmd},
	task::TaskCmd,
};
use crate::util::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "tickbox", about = "Tickbox todo list (daemon client)")]
struct Cli {
	/// Path to the Tickbox data directory
	#[arg(long, env = "TICKBOX_DATA_DIR")]
	data_dir: Option<PathBuf>,

	/// Output format
	#[arg(long, value_enum, default_value = "human")]
	format: OutputFormat,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Check that the daemon answers
	Ping,
	/// Todo operations
	#[command(subcommand)]
	Task(TaskCmd),
	/// Theme preference
	#[command(subcommand)]
	Theme(ThemeCmd),
	/// Language preference
	#[command(subcommand)]
	Lang(LangCmd),
	/// Print backend events as they arrive
	Watch {
		/// Only these channels (default: all)
		channels: Vec<String>,
	},
}

fn main() -> Result<()> {
	let cli = Cli::parse();

	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
		)
		.with_writer(std::io::stderr)
		.init();

	let data_dir = match cli.data_dir {
		Some(dir) => dir,
		None => tb_config::default_data_dir()?,
	};
	let config = AppConfig::load_or_create(&data_dir)
		.with_context(|| format!("Failed to load config from {}", data_dir.display()))?
		.with_env_overrides();

	// Blocking read before the runtime starts; falls back to English when the daemon is down
	let language = initial_language(&SocketTransport::new(config.socket_path()));
	tracing::debug!(%language, "Initial language");
	let ctx = Context::new(&config, cli.format, language);

	tokio::runtime::Builder::new_multi_thread()
		.enable_all()
		.build()
		.context("Failed to start async runtime")?
		.block_on(run(ctx, cli.command))
}

async fn run(ctx: Context, command: Commands) -> Result<()> {
	match command {
		Commands::Ping => {
			let reply = ctx.client.ping().await.map_err(improve_client_error)?;
			print_output!(ctx, &reply, |reply: &String| println!("{reply}"));
		}
		Commands::Task(cmd) => domains::task::run(&ctx, cmd).await?,
		Commands::Theme(cmd) => domains::settings::run_theme(&ctx, cmd).await?,
		Commands::Lang(cmd) => domains::settings::run_lang(&ctx, cmd).await?,
		Commands::Watch { channels } => domains::watch::run(&ctx, channels).await?,
	}

	Ok(())
}
