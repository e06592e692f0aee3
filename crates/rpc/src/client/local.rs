use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::{ClientError, Result, Transport};
use crate::ipc::IpcMain;

/// In-process transport, for embedding the backend and for tests.
#[derive(Clone)]
pub struct LocalTransport {
	ipc: Arc<IpcMain>,
}

impl LocalTransport {
	pub fn new(ipc: Arc<IpcMain>) -> Self {
		Self { ipc }
	}

	pub async fn send_sync(&self, channel: &str, payload: Value) -> Result<Value> {
		self.ipc
			.send_sync(channel, payload)
			.await
			.map_err(ClientError::Rpc)
	}
}

#[async_trait]
impl Transport for LocalTransport {
	async fn invoke(&self, channel: &str, payload: Value) -> Result<Value> {
		self.ipc
			.invoke(channel, payload)
			.await
			.map_err(ClientError::Rpc)
	}
}
