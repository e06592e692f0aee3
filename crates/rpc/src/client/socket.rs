use std::{
	io::{BufRead, Write},
	path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde_json::Value;
use tokio::{
	io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
	net::UnixStream,
	sync::mpsc,
};

use super::{ClientError, Result, Transport};
use crate::ipc::{IpcEvent, IpcMessage, IpcReply};

/// Client end of [`crate::ipc::IpcServer`]. Each call opens its own connection.
#[derive(Debug, Clone)]
pub struct SocketTransport {
	socket_path: PathBuf,
}

impl SocketTransport {
	pub fn new(socket_path: impl Into<PathBuf>) -> Self {
		Self {
			socket_path: socket_path.into(),
		}
	}

	pub fn socket_path(&self) -> &Path {
		&self.socket_path
	}

	async fn connect(&self) -> Result<UnixStream> {
		UnixStream::connect(&self.socket_path).await.map_err(|e| {
			ClientError::transport(format!(
				"Failed to connect to daemon at {}: {e}",
				self.socket_path.display()
			))
		})
	}

	async fn round_trip(&self, message: &IpcMessage) -> Result<Value> {
		let stream = self.connect().await?;
		let (reader, mut writer) = stream.into_split();

		let mut frame = serde_json::to_string(message)?;
		frame.push('\n');
		writer
			.write_all(frame.as_bytes())
			.await
			.map_err(|e| ClientError::transport(format!("Failed to send request to daemon: {e}")))?;

		let mut line = String::new();
		let read = BufReader::new(reader)
			.read_line(&mut line)
			.await
			.map_err(|e| ClientError::transport(format!("Failed to read reply from daemon: {e}")))?;
		if read == 0 {
			return Err(ClientError::transport("Daemon closed the connection"));
		}

		into_result(serde_json::from_str(line.trim())?)
	}

	/// Blocking call on the channel's sync handler. Does not need a runtime, so it can run
	/// before one exists.
	pub fn send_sync(&self, channel: &str, payload: Value) -> Result<Value> {
		let mut stream = std::os::unix::net::UnixStream::connect(&self.socket_path).map_err(|e| {
			ClientError::transport(format!(
				"Failed to connect to daemon at {}: {e}",
				self.socket_path.display()
			))
		})?;

		let message = IpcMessage::SendSync {
			channel: channel.to_string(),
			payload,
		};
		let mut frame = serde_json::to_string(&message)?;
		frame.push('\n');
		stream
			.write_all(frame.as_bytes())
			.map_err(|e| ClientError::transport(format!("Failed to send request to daemon: {e}")))?;

		let mut line = String::new();
		let read = std::io::BufReader::new(stream)
			.read_line(&mut line)
			.map_err(|e| ClientError::transport(format!("Failed to read reply from daemon: {e}")))?;
		if read == 0 {
			return Err(ClientError::transport("Daemon closed the connection"));
		}

		into_result(serde_json::from_str(line.trim())?)
	}

	/// Stream events on `channels` (all channels when empty) into `event_tx` until the daemon
	/// goes away or the receiver is dropped.
	pub async fn subscribe(
		&self,
		channels: Vec<String>,
		event_tx: mpsc::UnboundedSender<IpcEvent>,
	) -> Result<()> {
		let stream = self.connect().await?;
		let (reader, mut writer) = stream.into_split();

		let mut frame = serde_json::to_string(&IpcMessage::Subscribe { channels })?;
		frame.push('\n');
		writer
			.write_all(frame.as_bytes())
			.await
			.map_err(|e| ClientError::transport(format!("Failed to send request to daemon: {e}")))?;

		let mut buf_reader = BufReader::new(reader);
		let mut line = String::new();

		loop {
			line.clear();
			match buf_reader.read_line(&mut line).await {
				Ok(0) => break,
				Ok(_) => match serde_json::from_str::<IpcReply>(line.trim()) {
					Ok(IpcReply::Event(event)) => {
						if event_tx.send(event).is_err() {
							break;
						}
					}
					Ok(IpcReply::Subscribed) => {}
					Ok(IpcReply::Error { error }) => return Err(error.into()),
					Ok(IpcReply::Ok { .. }) => {
						return Err(ClientError::transport("Unexpected reply on event stream"));
					}
					Err(e) => {
						tracing::warn!(error = %e, "Skipping malformed event frame");
					}
				},
				Err(e) => {
					return Err(ClientError::transport(format!(
						"Event stream interrupted: {e}"
					)));
				}
			}
		}

		Ok(())
	}
}

fn into_result(reply: IpcReply) -> Result<Value> {
	match reply {
		IpcReply::Ok { data } => Ok(data),
		IpcReply::Error { error } => Err(ClientError::Rpc(error)),
		IpcReply::Subscribed | IpcReply::Event(_) => {
			Err(ClientError::transport("Unexpected reply to a request frame"))
		}
	}
}

#[async_trait]
impl Transport for SocketTransport {
	async fn invoke(&self, channel: &str, payload: Value) -> Result<Value> {
		self.round_trip(&IpcMessage::Invoke {
			channel: channel.to_string(),
			payload,
		})
		.await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{ipc::IpcMain, ipc::IpcServer, ErrorCode, RpcError};
	use pretty_assertions::assert_eq;
	use serde_json::json;
	use std::sync::Arc;

	#[tokio::test]
	async fn missing_socket_is_a_transport_error() {
		let dir = tempfile::tempdir().unwrap();
		let transport = SocketTransport::new(dir.path().join("absent.sock"));
		let err = transport.invoke("rpc", json!({})).await.unwrap_err();
		assert!(matches!(err, ClientError::Transport(_)));
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
	async fn invoke_and_sync_calls_cross_the_socket() {
		let ipc = Arc::new(IpcMain::new());
		ipc.handle("rpc", |payload| async move {
			if payload.is_null() {
				Err(RpcError::invalid_request("empty"))
			} else {
				Ok(payload)
			}
		});
		ipc.on_sync("get-initial-language", |_| async { Ok::<_, RpcError>(json!("ja")) });

		let dir = tempfile::tempdir().unwrap();
		let socket_path = dir.path().join("test.sock");
		let mut server = IpcServer::new(&socket_path, ipc);
		let listener = server.bind().unwrap();
		tokio::spawn(async move { server.run(listener).await });

		let transport = SocketTransport::new(&socket_path);
		assert_eq!(transport.invoke("rpc", json!([1])).await.unwrap(), json!([1]));

		let err = transport.invoke("rpc", Value::Null).await.unwrap_err();
		assert_eq!(err.code(), Some(ErrorCode::InvalidRequest));

		let sync = transport.clone();
		let language = tokio::task::spawn_blocking(move || {
			sync.send_sync("get-initial-language", Value::Null)
		})
		.await
		.unwrap()
		.unwrap();
		assert_eq!(language, json!("ja"));
	}
}
