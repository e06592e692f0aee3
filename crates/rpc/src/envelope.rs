//! The wire message for one RPC invocation.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RpcError;

/// `{ path, input, requestId? }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallEnvelope {
	pub path: String,
	#[serde(default)]
	pub input: Value,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub request_id: Option<String>,
}

impl CallEnvelope {
	pub fn new(path: impl Into<String>, input: Value) -> Self {
		Self {
			path: path.into(),
			input,
			request_id: None,
		}
	}

	pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
		self.request_id = request_id;
		self
	}

	/// Read an envelope out of an untyped payload.
	///
	/// Anything that is not an object carrying a non-empty string `path` is rejected with
	/// `INVALID_REQUEST`. A missing `input` is treated as `null`, a non-string `requestId`
	/// is dropped.
	pub fn from_payload(payload: Value) -> Result<Self, RpcError> {
		let Value::Object(mut fields) = payload else {
			return Err(RpcError::invalid_request(
				"Request envelope must be an object",
			));
		};

		let path = match fields.remove("path") {
			Some(Value::String(path)) if !path.is_empty() => path,
			Some(Value::String(_)) | None | Some(Value::Null) => {
				return Err(RpcError::invalid_request("Missing procedure path"));
			}
			Some(_) => {
				return Err(RpcError::invalid_request("Procedure path must be a string"));
			}
		};

		let input = fields.remove("input").unwrap_or(Value::Null);
		let request_id = match fields.remove("requestId") {
			Some(Value::String(id)) => Some(id),
			_ => None,
		};

		Ok(Self {
			path,
			input,
			request_id,
		})
	}
}

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn to_base36(mut value: u128) -> String {
	if value == 0 {
		return "0".to_string();
	}

	let mut digits = Vec::new();
	while value > 0 {
		digits.push(BASE36[(value % 36) as usize]);
		value /= 36;
	}
	digits.reverse();
	String::from_utf8_lossy(&digits).into_owned()
}

/// Correlation id for tracing a call across the boundary.
///
/// Base-36 millisecond timestamp followed by five random base-36 characters. Ordered by
/// creation time, not collision proof.
pub fn generate_request_id() -> String {
	let millis = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|elapsed| elapsed.as_millis())
		.unwrap_or_default();

	let mut rng = rand::thread_rng();
	let suffix: String = (0..5)
		.map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
		.collect();

	format!("{}{suffix}", to_base36(millis))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ErrorCode;
	use serde_json::json;

	#[test]
	fn missing_or_empty_path_is_an_invalid_request() {
		let payloads = [
			json!({ "input": {} }),
			json!({ "path": "" }),
			json!(null),
			json!({ "path": null }),
		];
		for payload in payloads {
			let err = CallEnvelope::from_payload(payload).unwrap_err();
			assert_eq!(err.code, ErrorCode::InvalidRequest);
			assert_eq!(err.status_code, 400);
		}
	}

	#[test]
	fn reads_path_input_and_request_id() {
		let envelope = CallEnvelope::from_payload(json!({
			"path": "task.add",
			"input": { "title": "x" },
			"requestId": "abc"
		}))
		.unwrap();

		assert_eq!(envelope.path, "task.add");
		assert_eq!(envelope.input, json!({ "title": "x" }));
		assert_eq!(envelope.request_id.as_deref(), Some("abc"));
	}

	#[test]
	fn serializes_without_absent_request_id() {
		let json = serde_json::to_value(CallEnvelope::new("ping", Value::Null)).unwrap();
		assert_eq!(json, json!({ "path": "ping", "input": null }));
	}

	#[test]
	fn request_ids_are_base36_and_distinct() {
		let a = generate_request_id();
		let b = generate_request_id();
		assert!(a.len() > 5);
		assert!(a.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
		assert_ne!(a, b);
	}
}
