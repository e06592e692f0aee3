//! Frontend side of the RPC-over-IPC bridge.
//!
//! [`RpcClient`] wraps one channel of some [`Transport`]: every call builds a
//! [`CallEnvelope`], performs one round trip and decodes the result. An error envelope from
//! the backend is surfaced unchanged as [`ClientError::Rpc`].

mod local;
mod socket;

pub use local::LocalTransport;
pub use socket::SocketTransport;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
	envelope::{generate_request_id, CallEnvelope},
	error::{ErrorCode, RpcError},
};

#[derive(Debug, Error)]
pub enum ClientError {
	/// The backend answered with an error envelope
	#[error(transparent)]
	Rpc(#[from] RpcError),
	/// The channel could not carry the call
	#[error("transport error: {0}")]
	Transport(String),
	#[error("codec error: {0}")]
	Codec(#[from] serde_json::Error),
}

impl ClientError {
	/// The envelope code, when the backend produced one.
	pub fn code(&self) -> Option<ErrorCode> {
		match self {
			Self::Rpc(error) => Some(error.code),
			_ => None,
		}
	}

	pub fn transport(message: impl Into<String>) -> Self {
		Self::Transport(message.into())
	}
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// One request/one reply over a named channel.
#[async_trait]
pub trait Transport: Send + Sync {
	async fn invoke(&self, channel: &str, payload: Value) -> Result<Value>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
	async fn invoke(&self, channel: &str, payload: Value) -> Result<Value> {
		(**self).invoke(channel, payload).await
	}
}

pub struct RpcClient<T> {
	transport: T,
	channel: String,
	development: bool,
}

impl<T: Transport> RpcClient<T> {
	pub fn new(transport: T, channel: impl Into<String>) -> Self {
		Self {
			transport,
			channel: channel.into(),
			development: false,
		}
	}

	/// Attach a request id to every envelope.
	pub fn with_development(mut self, development: bool) -> Self {
		self.development = development;
		self
	}

	pub fn transport(&self) -> &T {
		&self.transport
	}

	pub fn channel(&self) -> &str {
		&self.channel
	}

	/// Untyped round trip.
	pub async fn call_raw(&self, path: &str, input: Value) -> Result<Value> {
		let request_id = self.development.then(generate_request_id);
		let envelope = CallEnvelope::new(path, input).with_request_id(request_id);
		let payload = serde_json::to_value(&envelope)?;

		tracing::trace!(%path, request_id = ?envelope.request_id, "Invoking procedure");
		self.transport.invoke(&self.channel, payload).await
	}

	pub async fn call<I, O>(&self, path: &str, input: I) -> Result<O>
	where
		I: Serialize,
		O: DeserializeOwned,
	{
		let output = self.call_raw(path, serde_json::to_value(input)?).await?;
		Ok(serde_json::from_value(output)?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		adapter::{attach, AdapterOptions},
		ipc::IpcMain,
		procedure::Procedure,
		router::Router,
	};
	use pretty_assertions::assert_eq;
	use serde_json::json;
	use std::sync::Arc;

	fn backend() -> Arc<IpcMain> {
		let ipc = Arc::new(IpcMain::new());
		let router = Router::<()>::new()
			.procedure(
				"echo",
				Procedure::mutation()
					.input::<Value>()
					.handler(|_, input: Value| async move { anyhow::Ok(input) }),
			)
			.build()
			.unwrap();
		attach(&ipc, "rpc", Arc::new(router), (), AdapterOptions::default());
		ipc
	}

	#[tokio::test]
	async fn typed_round_trip() {
		let client = RpcClient::new(LocalTransport::new(backend()), "rpc").with_development(true);
		let out: Vec<u8> = client.call("echo", vec![1u8, 2, 3]).await.unwrap();
		assert_eq!(out, vec![1, 2, 3]);
	}

	#[tokio::test]
	async fn error_envelopes_surface_as_rpc_errors() {
		let client = RpcClient::new(LocalTransport::new(backend()), "rpc");
		let err = client.call_raw("nope", json!(null)).await.unwrap_err();
		assert_eq!(err.code(), Some(ErrorCode::NotFound));
	}

	#[tokio::test]
	async fn unknown_channel_is_not_found() {
		let client = RpcClient::new(LocalTransport::new(backend()), "other");
		let err = client.call_raw("echo", json!(1)).await.unwrap_err();
		assert_eq!(err.code(), Some(ErrorCode::NotFound));
	}
}
