//! RPC Channel Tests
//!
//! Drives the full procedure tree through the `rpc` channel of an in-process IPC host,
//! the same path a UI call takes minus the socket.

use std::collections::BTreeMap;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tb_core::{
	client::PROCEDURES,
	domain::{CreateTodo, Theme},
	AppContext, Backend, TickboxClient,
};
use tb_rpc::{ErrorCode, IpcMain, LocalTransport, RpcClient, RpcError};

async fn backend() -> Backend {
	Backend::new(AppContext::in_memory(), "rpc", false)
		.await
		.unwrap()
}

async fn invoke(ipc: &IpcMain, envelope: Value) -> Result<Value, RpcError> {
	ipc.invoke("rpc", envelope).await
}

#[tokio::test]
async fn add_returns_the_new_todo() {
	let backend = backend().await;
	let todo = invoke(
		&backend.ipc,
		json!({ "path": "task.add", "input": { "title": "Buy milk" } }),
	)
	.await
	.unwrap();

	assert!(!todo["id"].as_str().unwrap().is_empty());
	assert_eq!(todo["title"], "Buy milk");
	assert_eq!(todo["completed"], false);
	assert_eq!(todo["reminderDateTime"], Value::Null);
}

#[tokio::test]
async fn toggling_a_missing_todo_is_not_found() {
	let backend = backend().await;
	let err = invoke(
		&backend.ipc,
		json!({ "path": "task.toggle", "input": { "id": "missing-id" } }),
	)
	.await
	.unwrap_err();

	assert_eq!(err.code, ErrorCode::NotFound);
	assert_eq!(err.status_code, 404);
	assert!(err.message.contains("Todo"));
	assert!(err.message.contains("missing-id"));
}

#[tokio::test]
async fn unknown_and_empty_paths_are_rejected() {
	let backend = backend().await;

	let err = invoke(&backend.ipc, json!({ "path": "bogus.path", "input": {} }))
		.await
		.unwrap_err();
	assert_eq!((err.code, err.status_code), (ErrorCode::NotFound, 404));

	let err = invoke(&backend.ipc, json!({ "path": "", "input": {} }))
		.await
		.unwrap_err();
	assert_eq!((err.code, err.status_code), (ErrorCode::InvalidRequest, 400));

	let err = invoke(&backend.ipc, json!({ "path": "task" }))
		.await
		.unwrap_err();
	assert_eq!(err.code, ErrorCode::NotFound);
	assert!(err.message.contains("No procedure at path"));
}

#[tokio::test]
async fn theme_set_then_get() {
	let backend = backend().await;
	let set = invoke(&backend.ipc, json!({ "path": "theme.set", "input": "dark" }))
		.await
		.unwrap();
	assert_eq!(set, json!("dark"));

	let again = invoke(&backend.ipc, json!({ "path": "theme.set", "input": "dark" }))
		.await
		.unwrap();
	assert_eq!(again, json!("dark"));

	let current = invoke(&backend.ipc, json!({ "path": "theme.get" }))
		.await
		.unwrap();
	assert_eq!(current, json!("dark"));
}

#[tokio::test]
async fn invalid_input_has_no_side_effect() {
	let backend = backend().await;

	let err = invoke(
		&backend.ipc,
		json!({ "path": "task.add", "input": { "title": "   " } }),
	)
	.await
	.unwrap_err();
	assert_eq!(err.code, ErrorCode::ValidationError);
	assert_eq!(err.status_code, 400);
	let issues = &err.data.unwrap()["issues"];
	assert_eq!(issues[0]["path"], json!(["title"]));

	let err = invoke(&backend.ipc, json!({ "path": "theme.set", "input": "neon" }))
		.await
		.unwrap_err();
	assert_eq!(err.code, ErrorCode::ValidationError);

	assert_eq!(backend.context.todos.list().await.unwrap(), vec![]);
	assert_eq!(backend.context.theme.current().await.unwrap(), Theme::System);
}

#[tokio::test]
async fn client_round_trip() {
	let backend = backend().await;
	let client = TickboxClient::new(RpcClient::new(
		LocalTransport::new(backend.ipc.clone()),
		"rpc",
	));

	assert_eq!(client.ping().await.unwrap(), "pong");

	let added = client.task().add(CreateTodo::new("X")).await.unwrap();
	let todos = client.task().list().await.unwrap();
	let matching: Vec<_> = todos.iter().filter(|t| t.title == "X").collect();
	assert_eq!(matching.len(), 1);
	assert_eq!(matching[0], &added);
	assert!(!added.completed);
	assert_eq!(added.reminder_date_time, None);

	let toggled = client.task().toggle(&added.id).await.unwrap();
	assert!(toggled.completed);

	assert_eq!(client.task().remove(&added.id).await.unwrap(), added.id);
	let err = client.task().remove(&added.id).await.unwrap_err();
	assert_eq!(err.code(), Some(ErrorCode::NotFound));
}

#[test]
fn client_mirrors_the_router() {
	let router = tb_core::api::mount().unwrap();
	let client: BTreeMap<_, _> = PROCEDURES.iter().copied().collect();
	assert_eq!(client, router.procedures());
}
