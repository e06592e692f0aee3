use std::path::PathBuf;

use tb_config::AppConfig;
use tb_core::{domain::Language, TickboxClient};
use tb_rpc::{RpcClient, SocketTransport};

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
	Human,
	Json,
}

pub struct Context {
	pub client: TickboxClient<SocketTransport>,
	pub format: OutputFormat,
	pub socket_path: PathBuf,
	/// Language persisted by the daemon, read once at startup
	pub language: Language,
}

impl Context {
	pub fn new(config: &AppConfig, format: OutputFormat, language: Language) -> Self {
		let socket_path = config.socket_path();
		let rpc = RpcClient::new(SocketTransport::new(&socket_path), &config.channel)
			.with_development(config.environment.is_development());

		Self {
			client: TickboxClient::new(rpc),
			format,
			socket_path,
			language,
		}
	}

	/// A separate transport for long-lived event streams.
	pub fn event_transport(&self) -> SocketTransport {
		SocketTransport::new(&self.socket_path)
	}
}
