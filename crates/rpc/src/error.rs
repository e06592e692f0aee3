//! Wire-safe error envelope.
//!
//! Every failure that crosses the process boundary is converted into an [`RpcError`]
//! before it is serialized. Arbitrary error values never leave the backend.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error taxonomy shared by both ends of the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	/// The envelope itself was malformed
	InvalidRequest,
	/// Unresolved procedure path or missing entity
	NotFound,
	/// The input failed the procedure's schema
	ValidationError,
	/// Anything unanticipated
	InternalError,
}

impl ErrorCode {
	/// Numeric classification sent alongside the code.
	pub fn status_code(self) -> u16 {
		match self {
			Self::InvalidRequest | Self::ValidationError => 400,
			Self::NotFound => 404,
			Self::InternalError => 500,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::InvalidRequest => "INVALID_REQUEST",
			Self::NotFound => "NOT_FOUND",
			Self::ValidationError => "VALIDATION_ERROR",
			Self::InternalError => "INTERNAL_ERROR",
		}
	}
}

impl fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// The Error Envelope: `{ code, message, statusCode, data? }`.
///
/// This is also the recognized application error type. A handler that fails with an
/// `RpcError` (directly or wrapped in an [`anyhow::Error`]) has its fields forwarded
/// verbatim by the transport adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{code}: {message}")]
pub struct RpcError {
	pub code: ErrorCode,
	pub message: String,
	pub status_code: u16,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<Value>,
}

impl RpcError {
	pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
		Self {
			code,
			message: message.into(),
			status_code: code.status_code(),
			data: None,
		}
	}

	pub fn with_data(mut self, data: Value) -> Self {
		self.data = Some(data);
		self
	}

	pub fn invalid_request(message: impl Into<String>) -> Self {
		Self::new(ErrorCode::InvalidRequest, message)
	}

	pub fn not_found(message: impl Into<String>) -> Self {
		Self::new(ErrorCode::NotFound, message)
	}

	/// Entity-shaped not found, e.g. `Todo with id 'abc' not found`.
	pub fn resource_not_found(resource: &str, id: Option<&str>) -> Self {
		match id {
			Some(id) => Self::not_found(format!("{resource} with id '{id}' not found")),
			None => Self::not_found(format!("{resource} not found")),
		}
	}

	pub fn validation(message: impl Into<String>) -> Self {
		Self::new(ErrorCode::ValidationError, message)
	}

	pub fn internal(message: impl Into<String>) -> Self {
		Self::new(ErrorCode::InternalError, message)
	}

	/// Normalize any handler failure into an envelope.
	///
	/// Recognized application errors pass through unchanged. Everything else becomes
	/// `INTERNAL_ERROR`; the debug rendering of the underlying error is attached as `data`
	/// only when `development` is set.
	pub fn from_handler_error(err: anyhow::Error, development: bool) -> Self {
		let err = match err.downcast::<RpcError>() {
			Ok(app_error) => return app_error,
			Err(err) => err,
		};

		let message = err.to_string();
		let message = if message.trim().is_empty() {
			"Unknown error".to_string()
		} else {
			message
		};

		let mut envelope = Self::internal(message);
		if development {
			envelope.data = Some(serde_json::json!({ "detail": format!("{err:?}") }));
		}
		envelope
	}

	pub fn is(&self, code: ErrorCode) -> bool {
		self.code == code
	}
}
