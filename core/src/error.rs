//! Business errors raised by the services.

use tb_rpc::RpcError;
use thiserror::Error;

use crate::infra::store::StoreError;

#[derive(Debug, Error)]
pub enum CoreError {
	#[error("{resource} with id '{id}' not found")]
	NotFound { resource: &'static str, id: String },

	#[error("{0}")]
	Validation(String),

	#[error(transparent)]
	Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
	pub fn todo_not_found(id: impl Into<String>) -> Self {
		Self::NotFound {
			resource: "Todo",
			id: id.into(),
		}
	}

	/// Convert at the procedure boundary. Not-found and validation failures become
	/// application errors; storage failures stay opaque and surface as internal errors.
	pub fn into_rpc(self) -> anyhow::Error {
		match self {
			Self::NotFound { resource, id } => {
				RpcError::resource_not_found(resource, Some(&id)).into()
			}
			Self::Validation(message) => RpcError::validation(message).into(),
			Self::Store(e) => anyhow::Error::new(e).context("Store operation failed"),
		}
	}
}
