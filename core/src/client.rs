//! Typed client for the procedure tree in [`crate::api`].
//!
//! Method names mirror the tree: `client.task().add(..)` calls `task.add`. The transport is
//! pluggable; the UI process uses a [`SocketTransport`], tests use a
//! [`tb_rpc::LocalTransport`].

use serde_json::Value;
use tb_rpc::{client::Result, ProcedureKind, RpcClient, SocketTransport, Transport};
use tracing::warn;

use crate::domain::{CreateTodo, Language, Theme, Todo, TodoId, UpdateTodo};

/// Sync channel the UI reads its language from before it renders anything
pub const INITIAL_LANGUAGE_CHANNEL: &str = "get-initial-language";

/// Every procedure this client can call, with its kind.
pub const PROCEDURES: &[(&str, ProcedureKind)] = &[
	("ping", ProcedureKind::Query),
	("task.list", ProcedureKind::Query),
	("task.add", ProcedureKind::Mutation),
	("task.toggle", ProcedureKind::Mutation),
	("task.remove", ProcedureKind::Mutation),
	("task.update", ProcedureKind::Mutation),
	("theme.get", ProcedureKind::Query),
	("theme.set", ProcedureKind::Mutation),
	("lang.get", ProcedureKind::Query),
	("lang.set", ProcedureKind::Mutation),
];

pub struct TickboxClient<T> {
	rpc: RpcClient<T>,
}

impl<T: Transport> TickboxClient<T> {
	pub fn new(rpc: RpcClient<T>) -> Self {
		Self { rpc }
	}

	pub fn rpc(&self) -> &RpcClient<T> {
		&self.rpc
	}

	pub async fn ping(&self) -> Result<String> {
		self.rpc.call("ping", Value::Null).await
	}

	pub fn task(&self) -> TaskClient<'_, T> {
		TaskClient { rpc: &self.rpc }
	}

	pub fn theme(&self) -> ThemeClient<'_, T> {
		ThemeClient { rpc: &self.rpc }
	}

	pub fn lang(&self) -> LangClient<'_, T> {
		LangClient { rpc: &self.rpc }
	}
}

pub struct TaskClient<'a, T> {
	rpc: &'a RpcClient<T>,
}

impl<T: Transport> TaskClient<'_, T> {
	pub async fn list(&self) -> Result<Vec<Todo>> {
		self.rpc.call("task.list", Value::Null).await
	}

	pub async fn add(&self, input: CreateTodo) -> Result<Todo> {
		self.rpc.call("task.add", input).await
	}

	pub async fn toggle(&self, id: impl Into<String>) -> Result<Todo> {
		self.rpc.call("task.toggle", TodoId::new(id)).await
	}

	/// Returns the removed id.
	pub async fn remove(&self, id: impl Into<String>) -> Result<String> {
		self.rpc.call("task.remove", TodoId::new(id)).await
	}

	pub async fn update(&self, changes: UpdateTodo) -> Result<Todo> {
		self.rpc.call("task.update", changes).await
	}
}

pub struct ThemeClient<'a, T> {
	rpc: &'a RpcClient<T>,
}

impl<T: Transport> ThemeClient<'_, T> {
	pub async fn get(&self) -> Result<Theme> {
		self.rpc.call("theme.get", Value::Null).await
	}

	pub async fn set(&self, theme: Theme) -> Result<Theme> {
		self.rpc.call("theme.set", theme).await
	}
}

pub struct LangClient<'a, T> {
	rpc: &'a RpcClient<T>,
}

impl<T: Transport> LangClient<'_, T> {
	pub async fn get(&self) -> Result<Language> {
		self.rpc.call("lang.get", Value::Null).await
	}

	pub async fn set(&self, language: Language) -> Result<Language> {
		self.rpc.call("lang.set", language).await
	}
}

/// Blocking read of the persisted language. Any failure yields the default language.
pub fn initial_language(transport: &SocketTransport) -> Language {
	let value = match transport.send_sync(INITIAL_LANGUAGE_CHANNEL, Value::Null) {
		Ok(value) => value,
		Err(e) => {
			warn!(error = %e, "Failed to get initial language, using default");
			return Language::default();
		}
	};

	serde_json::from_value(value).unwrap_or_else(|e| {
		warn!(error = %e, "Unexpected initial language, using default");
		Language::default()
	})
}
