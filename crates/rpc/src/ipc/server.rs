//! Newline-delimited JSON over a Unix domain socket.
//!
//! Each line a client writes is one [`IpcMessage`], each line the server writes back is one
//! [`IpcReply`]. A connection may carry any number of request frames. After a `subscribe`
//! frame the connection also receives every event emitted on the subscribed channels.

use std::{
	io,
	path::{Path, PathBuf},
	sync::{
		atomic::{AtomicUsize, Ordering},
		Arc,
	},
};

use futures::StreamExt;
use tokio::{
	io::AsyncWriteExt,
	net::{unix::OwnedWriteHalf, UnixListener, UnixStream},
	sync::{broadcast, mpsc},
};
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};

use super::{IpcEvent, IpcMain, IpcMessage, IpcReply};
use crate::error::RpcError;

const DEFAULT_MAX_CONNECTIONS: usize = 100;
const MAX_FRAME_LENGTH: usize = 8 * 1024 * 1024;

pub struct IpcServer {
	socket_path: PathBuf,
	ipc: Arc<IpcMain>,
	shutdown_tx: mpsc::Sender<()>,
	shutdown_rx: mpsc::Receiver<()>,
	connection_count: Arc<AtomicUsize>,
	max_connections: usize,
}

impl IpcServer {
	pub fn new(socket_path: impl Into<PathBuf>, ipc: Arc<IpcMain>) -> Self {
		let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
		Self {
			socket_path: socket_path.into(),
			ipc,
			shutdown_tx,
			shutdown_rx,
			connection_count: Arc::new(AtomicUsize::new(0)),
			max_connections: DEFAULT_MAX_CONNECTIONS,
		}
	}

	pub fn with_max_connections(mut self, max_connections: usize) -> Self {
		self.max_connections = max_connections;
		self
	}

	pub fn socket_path(&self) -> &Path {
		&self.socket_path
	}

	/// Sender that stops [`IpcServer::run`] when a message is sent on it.
	pub fn shutdown_handle(&self) -> mpsc::Sender<()> {
		self.shutdown_tx.clone()
	}

	/// (current, max)
	pub fn connection_stats(&self) -> (usize, usize) {
		(
			self.connection_count.load(Ordering::Relaxed),
			self.max_connections,
		)
	}

	/// Bind the socket. A stale socket file from a previous run is removed first.
	pub fn bind(&self) -> io::Result<UnixListener> {
		match std::fs::remove_file(&self.socket_path) {
			Ok(()) => tracing::debug!(path = %self.socket_path.display(), "Removed stale socket"),
			Err(e) if e.kind() == io::ErrorKind::NotFound => {}
			Err(e) => return Err(e),
		}
		if let Some(parent) = self.socket_path.parent() {
			std::fs::create_dir_all(parent)?;
		}

		let listener = UnixListener::bind(&self.socket_path)?;
		tracing::info!(path = %self.socket_path.display(), "IPC server bound");
		Ok(listener)
	}

	/// Accept connections until a shutdown signal arrives, then remove the socket file.
	pub async fn run(&mut self, listener: UnixListener) -> io::Result<()> {
		loop {
			tokio::select! {
				result = listener.accept() => {
					match result {
						Ok((mut stream, _addr)) => {
							let current = self.connection_count.load(Ordering::Relaxed);
							if current >= self.max_connections {
								tracing::warn!(
									max = self.max_connections,
									"Connection limit reached, rejecting new connection"
								);
								let _ = stream.shutdown().await;
								continue;
							}

							let ipc = Arc::clone(&self.ipc);
							let connection_count = Arc::clone(&self.connection_count);
							connection_count.fetch_add(1, Ordering::Relaxed);

							tokio::spawn(async move {
								if let Err(e) = Self::handle_connection(stream, ipc).await {
									tracing::debug!(error = %e, "Connection closed with error");
								}
								connection_count.fetch_sub(1, Ordering::Relaxed);
							});
						}
						Err(e) => {
							tracing::error!(error = %e, "Accept error");
							continue;
						}
					}
				}

				_ = self.shutdown_rx.recv() => {
					tracing::info!("Shutdown signal received, stopping IPC server");
					break;
				}
			}
		}

		if let Err(e) = std::fs::remove_file(&self.socket_path) {
			if e.kind() != io::ErrorKind::NotFound {
				tracing::warn!(error = %e, "Failed to remove socket file");
			}
		}

		Ok(())
	}

	/// [`IpcServer::bind`] followed by [`IpcServer::run`].
	pub async fn start(&mut self) -> io::Result<()> {
		let listener = self.bind()?;
		self.run(listener).await
	}

	async fn handle_connection(stream: UnixStream, ipc: Arc<IpcMain>) -> io::Result<()> {
		let (reader, mut writer) = stream.into_split();
		// `next()` on a framed reader is cancel-safe, so a partial frame survives an event
		// winning the select below
		let mut frames = FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_FRAME_LENGTH));

		// Set once the client subscribes; (receiver, channel filter)
		let mut subscription: Option<(broadcast::Receiver<IpcEvent>, Vec<String>)> = None;

		loop {
			tokio::select! {
				frame = frames.next() => {
					let line = match frame {
						None => break,
						Some(Ok(line)) => line,
						Some(Err(LinesCodecError::Io(e))) => return Err(e),
						Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
							let error = RpcError::invalid_request("Frame too long");
							write_frame(&mut writer, &IpcReply::Error { error }).await?;
							continue;
						}
					};

					let frame = line.trim();
					if frame.is_empty() {
						continue;
					}

					let reply = match serde_json::from_str::<IpcMessage>(frame) {
						Ok(IpcMessage::Subscribe { channels }) => {
							subscription = Some((ipc.subscribe(), channels));
							IpcReply::Subscribed
						}
						Ok(message) => ipc.dispatch(message).await,
						Err(e) => {
							tracing::warn!(error = %e, "Malformed IPC frame");
							IpcReply::Error {
								error: RpcError::invalid_request(format!("Malformed frame: {e}")),
							}
						}
					};

					write_frame(&mut writer, &reply).await?;
				}

				event = next_event(&mut subscription) => {
					match event {
						Ok(event) => write_frame(&mut writer, &IpcReply::Event(event)).await?,
						Err(broadcast::error::RecvError::Lagged(skipped)) => {
							tracing::warn!(skipped, "Subscriber lagged, events dropped");
						}
						Err(broadcast::error::RecvError::Closed) => subscription = None,
					}
				}
			}
		}

		Ok(())
	}
}

/// Next event matching the connection's filter. Pending forever without a subscription.
async fn next_event(
	subscription: &mut Option<(broadcast::Receiver<IpcEvent>, Vec<String>)>,
) -> Result<IpcEvent, broadcast::error::RecvError> {
	let Some((rx, channels)) = subscription else {
		return std::future::pending().await;
	};

	loop {
		let event = rx.recv().await?;
		if channels.is_empty() || channels.contains(&event.channel) {
			return Ok(event);
		}
	}
}

async fn write_frame(writer: &mut OwnedWriteHalf, reply: &IpcReply) -> io::Result<()> {
	let mut json = serde_json::to_string(reply)?;
	json.push('\n');
	writer.write_all(json.as_bytes()).await
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use serde_json::json;
	use tokio::io::{AsyncBufReadExt, BufReader};

	async fn spawn_server(ipc: Arc<IpcMain>) -> (tempfile::TempDir, PathBuf, mpsc::Sender<()>) {
		let dir = tempfile::tempdir().unwrap();
		let socket_path = dir.path().join("test.sock");
		let mut server = IpcServer::new(&socket_path, ipc);
		let listener = server.bind().unwrap();
		let shutdown = server.shutdown_handle();
		tokio::spawn(async move { server.run(listener).await });
		(dir, socket_path, shutdown)
	}

	async fn read_reply(reader: &mut BufReader<tokio::net::unix::OwnedReadHalf>) -> IpcReply {
		let mut line = String::new();
		reader.read_line(&mut line).await.unwrap();
		serde_json::from_str(line.trim()).unwrap()
	}

	#[tokio::test]
	async fn serves_several_frames_on_one_connection() {
		let ipc = Arc::new(IpcMain::new());
		ipc.handle("echo", |payload| async move { Ok::<_, RpcError>(payload) });
		let (_dir, socket_path, _shutdown) = spawn_server(ipc).await;

		let stream = UnixStream::connect(&socket_path).await.unwrap();
		let (reader, mut writer) = stream.into_split();
		let mut reader = BufReader::new(reader);

		for n in 0..2 {
			let frame = json!({ "kind": "invoke", "channel": "echo", "payload": n });
			writer
				.write_all(format!("{frame}\n").as_bytes())
				.await
				.unwrap();
			assert_eq!(read_reply(&mut reader).await, IpcReply::Ok { data: json!(n) });
		}

		writer.write_all(b"not json\n").await.unwrap();
		match read_reply(&mut reader).await {
			IpcReply::Error { error } => assert_eq!(error.code, crate::ErrorCode::InvalidRequest),
			other => panic!("unexpected reply: {other:?}"),
		}
	}

	#[tokio::test]
	async fn subscribers_receive_filtered_events() {
		let ipc = Arc::new(IpcMain::new());
		let (_dir, socket_path, _shutdown) = spawn_server(Arc::clone(&ipc)).await;

		let stream = UnixStream::connect(&socket_path).await.unwrap();
		let (reader, mut writer) = stream.into_split();
		let mut reader = BufReader::new(reader);

		writer
			.write_all(b"{\"kind\":\"subscribe\",\"channels\":[\"language-changed\"]}\n")
			.await
			.unwrap();
		assert_eq!(read_reply(&mut reader).await, IpcReply::Subscribed);

		ipc.emit("reminder", json!({}));
		ipc.emit("language-changed", json!("ja"));

		assert_eq!(
			read_reply(&mut reader).await,
			IpcReply::Event(IpcEvent {
				channel: "language-changed".into(),
				payload: json!("ja"),
			})
		);
	}

	#[tokio::test]
	async fn frames_split_around_an_event_stay_intact() {
		let ipc = Arc::new(IpcMain::new());
		ipc.handle("echo", |payload| async move { Ok::<_, RpcError>(payload) });
		let (_dir, socket_path, _shutdown) = spawn_server(Arc::clone(&ipc)).await;

		let stream = UnixStream::connect(&socket_path).await.unwrap();
		let (reader, mut writer) = stream.into_split();
		let mut reader = BufReader::new(reader);

		writer.write_all(b"{\"kind\":\"subscribe\"}\n").await.unwrap();
		assert_eq!(read_reply(&mut reader).await, IpcReply::Subscribed);

		writer.write_all(b"{\"kind\":\"invoke\",\"chan").await.unwrap();
		tokio::time::sleep(std::time::Duration::from_millis(50)).await;
		ipc.emit("language-changed", json!("ja"));
		assert_eq!(
			read_reply(&mut reader).await,
			IpcReply::Event(IpcEvent {
				channel: "language-changed".into(),
				payload: json!("ja"),
			})
		);

		writer
			.write_all(b"nel\":\"echo\",\"payload\":7}\n")
			.await
			.unwrap();
		assert_eq!(read_reply(&mut reader).await, IpcReply::Ok { data: json!(7) });
	}

	#[tokio::test]
	async fn shutdown_removes_socket() {
		let ipc = Arc::new(IpcMain::new());
		let dir = tempfile::tempdir().unwrap();
		let socket_path = dir.path().join("nested").join("test.sock");
		let mut server = IpcServer::new(&socket_path, ipc);
		let listener = server.bind().unwrap();
		assert!(socket_path.exists());

		let shutdown = server.shutdown_handle();
		let handle = tokio::spawn(async move { server.run(listener).await });
		shutdown.send(()).await.unwrap();
		handle.await.unwrap().unwrap();
		assert!(!socket_path.exists());
	}
}
