//! Process-boundary messaging.
//!
//! [`IpcMain`] is the backend's registry of named channels. Two kinds of handlers can be
//! registered on a channel: invoke handlers (asynchronous request, single reply) and sync
//! handlers (the caller blocks until the reply arrives). Events flow the other way through
//! a broadcast bus that the socket server forwards to subscribed connections.

pub mod server;

use std::{collections::HashMap, future::Future, sync::Arc};

use futures::future::BoxFuture;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::RpcError;

pub use server::IpcServer;

/// Frame sent from the UI process to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IpcMessage {
	/// Request/single-reply call on a channel
	Invoke { channel: String, payload: Value },
	/// Same shape as `Invoke`, served by the channel's sync handler
	SendSync { channel: String, payload: Value },
	/// Keep the connection open and stream events; an empty list means every channel
	Subscribe {
		#[serde(default)]
		channels: Vec<String>,
	},
}

/// Frame sent from the backend to the UI process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IpcReply {
	Ok { data: Value },
	Error { error: RpcError },
	Subscribed,
	Event(IpcEvent),
}

impl From<Result<Value, RpcError>> for IpcReply {
	fn from(result: Result<Value, RpcError>) -> Self {
		match result {
			Ok(data) => Self::Ok { data },
			Err(error) => Self::Error { error },
		}
	}
}

/// Backend-initiated message, e.g. `language-changed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpcEvent {
	pub channel: String,
	pub payload: Value,
}

pub type ChannelHandler =
	Arc<dyn Fn(Value) -> BoxFuture<'static, Result<Value, RpcError>> + Send + Sync>;

const EVENT_CAPACITY: usize = 256;

fn erase<F, Fut>(handler: F) -> ChannelHandler
where
	F: Fn(Value) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = Result<Value, RpcError>> + Send + 'static,
{
	Arc::new(move |payload| -> BoxFuture<'static, Result<Value, RpcError>> {
		Box::pin(handler(payload))
	})
}

impl Default for IpcMain {
	fn default() -> Self {
		Self::new()
	}
}

pub struct IpcMain {
	invoke_handlers: RwLock<HashMap<String, ChannelHandler>>,
	sync_handlers: RwLock<HashMap<String, ChannelHandler>>,
	events: broadcast::Sender<IpcEvent>,
}

impl IpcMain {
	pub fn new() -> Self {
		let (events, _) = broadcast::channel(EVENT_CAPACITY);
		Self {
			invoke_handlers: RwLock::new(HashMap::new()),
			sync_handlers: RwLock::new(HashMap::new()),
			events,
		}
	}

	/// Register the invoke handler for `channel`, replacing any previous one.
	pub fn handle<F, Fut>(&self, channel: impl Into<String>, handler: F)
	where
		F: Fn(Value) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<Value, RpcError>> + Send + 'static,
	{
		let handler = erase(handler);
		let channel = channel.into();
		if self
			.invoke_handlers
			.write()
			.insert(channel.clone(), handler)
			.is_some()
		{
			tracing::warn!(%channel, "Replaced existing invoke handler");
		}
	}

	/// Register the sync handler for `channel`, replacing any previous one.
	pub fn on_sync<F, Fut>(&self, channel: impl Into<String>, handler: F)
	where
		F: Fn(Value) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<Value, RpcError>> + Send + 'static,
	{
		let handler = erase(handler);
		let channel = channel.into();
		if self
			.sync_handlers
			.write()
			.insert(channel.clone(), handler)
			.is_some()
		{
			tracing::warn!(%channel, "Replaced existing sync handler");
		}
	}

	pub fn has_channel(&self, channel: &str) -> bool {
		self.invoke_handlers.read().contains_key(channel)
	}

	pub async fn invoke(&self, channel: &str, payload: Value) -> Result<Value, RpcError> {
		let handler = self.invoke_handlers.read().get(channel).cloned();
		match handler {
			Some(handler) => handler(payload).await,
			None => Err(RpcError::not_found(format!(
				"No handler registered for channel: {channel}"
			))),
		}
	}

	pub async fn send_sync(&self, channel: &str, payload: Value) -> Result<Value, RpcError> {
		let handler = self.sync_handlers.read().get(channel).cloned();
		match handler {
			Some(handler) => handler(payload).await,
			None => Err(RpcError::not_found(format!(
				"No sync handler registered for channel: {channel}"
			))),
		}
	}

	/// Serve one request frame. Subscriptions are connection state and are handled by the
	/// server, so they are rejected here.
	pub async fn dispatch(&self, message: IpcMessage) -> IpcReply {
		match message {
			IpcMessage::Invoke { channel, payload } => self.invoke(&channel, payload).await.into(),
			IpcMessage::SendSync { channel, payload } => {
				self.send_sync(&channel, payload).await.into()
			}
			IpcMessage::Subscribe { .. } => IpcReply::Error {
				error: RpcError::invalid_request("Subscriptions require a socket connection"),
			},
		}
	}

	/// Broadcast an event to every subscriber. Having no subscribers is not an error.
	pub fn emit(&self, channel: impl Into<String>, payload: Value) {
		let _ = self.events.send(IpcEvent {
			channel: channel.into(),
			payload,
		});
	}

	pub fn subscribe(&self) -> broadcast::Receiver<IpcEvent> {
		self.events.subscribe()
	}
}
