//! Backend side of the RPC-over-IPC bridge.
//!
//! [`attach`] binds a built router to one channel of an [`IpcMain`]. Every payload on that
//! channel is read as a [`CallEnvelope`], resolved against the router and invoked with the
//! adapter's context. Whatever goes wrong on the way comes back as an [`RpcError`].

use std::{panic::AssertUnwindSafe, sync::Arc, time::Instant};

use futures::FutureExt;
use serde_json::Value;

use crate::{
	envelope::CallEnvelope,
	error::RpcError,
	ipc::IpcMain,
	router::{BuiltRouter, Caller},
};

#[derive(Debug, Clone, Copy, Default)]
pub struct AdapterOptions {
	/// Attach internal error detail to envelopes and log each call with its request id
	pub development: bool,
}

pub struct RpcAdapter<Ctx> {
	caller: Caller<Ctx>,
	options: AdapterOptions,
}

impl<Ctx> Clone for RpcAdapter<Ctx>
where
	Ctx: Clone,
{
	fn clone(&self) -> Self {
		Self {
			caller: self.caller.clone(),
			options: self.options,
		}
	}
}

impl<Ctx> RpcAdapter<Ctx>
where
	Ctx: Clone + Send + Sync + 'static,
{
	pub fn new(router: Arc<BuiltRouter<Ctx>>, ctx: Ctx, options: AdapterOptions) -> Self {
		Self {
			caller: router.create_caller(ctx),
			options,
		}
	}

	/// Serve one inbound payload.
	pub async fn handle(&self, payload: Value) -> Result<Value, RpcError> {
		let envelope = CallEnvelope::from_payload(payload)?;
		let CallEnvelope {
			path,
			input,
			request_id,
		} = envelope;

		let development = self.options.development;
		let started = Instant::now();
		if development {
			tracing::debug!(request_id = ?request_id, %path, "RPC call started");
		}

		let result = AssertUnwindSafe(self.caller.call(&path, input))
			.catch_unwind()
			.await;

		let result = match result {
			Ok(Ok(output)) => Ok(output),
			Ok(Err(err)) => Err(RpcError::from_handler_error(err, development)),
			Err(panic) => {
				let message = panic_message(panic.as_ref());
				tracing::error!(%path, %message, "Procedure panicked");
				// The payload stays in the log unless running in development
				let mut error = RpcError::internal("Internal error");
				if development {
					error = error.with_data(
						serde_json::json!({ "detail": format!("procedure panicked: {message}") }),
					);
				}
				Err(error)
			}
		};

		if development {
			let elapsed_ms = started.elapsed().as_millis() as u64;
			match &result {
				Ok(_) => tracing::debug!(request_id = ?request_id, %path, elapsed_ms, "RPC call finished"),
				Err(error) => tracing::warn!(
					request_id = ?request_id,
					%path,
					elapsed_ms,
					code = %error.code,
					message = %error.message,
					"RPC call failed"
				),
			}
		}

		result
	}
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
	if let Some(message) = panic.downcast_ref::<&str>() {
		(*message).to_string()
	} else if let Some(message) = panic.downcast_ref::<String>() {
		message.clone()
	} else {
		"Unknown error".to_string()
	}
}

/// Register the router as the invoke handler of `channel`.
pub fn attach<Ctx>(
	ipc: &IpcMain,
	channel: &str,
	router: Arc<BuiltRouter<Ctx>>,
	ctx: Ctx,
	options: AdapterOptions,
) where
	Ctx: Clone + Send + Sync + 'static,
{
	let adapter = RpcAdapter::new(router, ctx, options);
	ipc.handle(channel, move |payload| {
		let adapter = adapter.clone();
		async move { adapter.handle(payload).await }
	});
	tracing::info!(%channel, "RPC router attached");
}
