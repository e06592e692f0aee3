//! Input schemas.
//!
//! A schema is a type that can be parsed from the untyped call input and then checked
//! against its own rules. Parsing is serde, the rules are [`Schema::validate`].

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};

use crate::error::RpcError;

/// A single diagnostic produced while checking an input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
	/// Field path from the root of the input, empty for the root itself
	pub path: Vec<String>,
	pub message: String,
}

impl Issue {
	pub fn new(path: &[&str], message: impl Into<String>) -> Self {
		Self {
			path: path.iter().map(|segment| (*segment).to_string()).collect(),
			message: message.into(),
		}
	}

	pub fn root(message: impl Into<String>) -> Self {
		Self::new(&[], message)
	}
}

/// Collected diagnostics for one input value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Issues(Vec<Issue>);

impl Issues {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, issue: Issue) {
		self.0.push(issue);
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Issue> {
		self.0.iter()
	}

	/// `Ok(())` when nothing was reported.
	pub fn into_result(self) -> Result<(), Self> {
		if self.is_empty() {
			Ok(())
		} else {
			Err(self)
		}
	}

	/// Turn the diagnostics into a `VALIDATION_ERROR` envelope.
	pub fn into_rpc_error(self) -> RpcError {
		let message = self
			.0
			.first()
			.map(|issue| issue.message.clone())
			.unwrap_or_else(|| "Invalid input".to_string());

		RpcError::validation(message).with_data(json!({ "issues": self.0 }))
	}
}

impl From<Issue> for Issues {
	fn from(issue: Issue) -> Self {
		Self(vec![issue])
	}
}

/// Declarative shape of a procedure input.
pub trait Schema: DeserializeOwned + Send + 'static {
	/// Rules that serde cannot express. The default accepts every parsed value.
	fn validate(&self) -> Result<(), Issues> {
		Ok(())
	}

	/// Parse and validate in one step.
	fn parse(input: Value) -> Result<Self, RpcError> {
		let parsed = serde_json::from_value::<Self>(input)
			.map_err(|e| Issues::from(Issue::root(e.to_string())).into_rpc_error())?;
		parsed.validate().map_err(Issues::into_rpc_error)?;
		Ok(parsed)
	}
}

macro_rules! impl_schema {
	($($ty:ty),* $(,)?) => {
		$(impl Schema for $ty {})*
	};
}

impl_schema!(String, bool, i64, u64, f64, Value);
