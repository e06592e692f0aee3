//! Procedures: the unit of RPC exposure.
//!
//! A procedure is built once from a typed handler and stored type-erased, so the router
//! can keep every procedure in one lookup table keyed by its dotted path.

use std::{fmt, future::Future, marker::PhantomData, sync::Arc};

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{error::RpcError, schema::Schema};

/// Read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcedureKind {
	Query,
	Mutation,
}

impl fmt::Display for ProcedureKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Query => f.write_str("query"),
			Self::Mutation => f.write_str("mutation"),
		}
	}
}

/// Future returned by an erased handler.
pub type HandlerFuture = BoxFuture<'static, anyhow::Result<Value>>;

type ErasedHandler<Ctx> = Arc<dyn Fn(Ctx, Value) -> HandlerFuture + Send + Sync>;

/// How the untyped call input becomes the handler's input.
pub trait InputParser: Send + Sync + 'static {
	type Output: Send + 'static;

	/// Whether a schema runs before the handler.
	const VALIDATES: bool;

	fn parse(input: Value) -> Result<Self::Output, RpcError>;
}

/// The procedure takes no input; whatever the caller sent is ignored.
pub struct NoInput;

impl InputParser for NoInput {
	type Output = ();

	const VALIDATES: bool = false;

	fn parse(_input: Value) -> Result<Self::Output, RpcError> {
		Ok(())
	}
}

/// The input is parsed and validated against `I` before the handler runs.
pub struct Validated<I>(PhantomData<fn() -> I>);

impl<I: Schema> InputParser for Validated<I> {
	type Output = I;

	const VALIDATES: bool = true;

	fn parse(input: Value) -> Result<Self::Output, RpcError> {
		I::parse(input)
	}
}

/// A registered, invocable operation.
pub struct Procedure<Ctx> {
	kind: ProcedureKind,
	validates_input: bool,
	handler: ErasedHandler<Ctx>,
}

impl<Ctx> Clone for Procedure<Ctx> {
	fn clone(&self) -> Self {
		Self {
			kind: self.kind,
			validates_input: self.validates_input,
			handler: Arc::clone(&self.handler),
		}
	}
}

impl<Ctx> fmt::Debug for Procedure<Ctx> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Procedure")
			.field("kind", &self.kind)
			.field("validates_input", &self.validates_input)
			.finish_non_exhaustive()
	}
}

impl<Ctx> Procedure<Ctx>
where
	Ctx: Send + 'static,
{
	/// Start building a read-only procedure.
	pub fn query() -> ProcedureBuilder<Ctx, NoInput> {
		ProcedureBuilder::new(ProcedureKind::Query)
	}

	/// Start building a state-changing procedure.
	pub fn mutation() -> ProcedureBuilder<Ctx, NoInput> {
		ProcedureBuilder::new(ProcedureKind::Mutation)
	}

	pub fn kind(&self) -> ProcedureKind {
		self.kind
	}

	pub fn validates_input(&self) -> bool {
		self.validates_input
	}

	/// Run input validation and then the handler.
	///
	/// Validation failures resolve to an [`RpcError`] wrapped in the returned error and
	/// the handler is never entered. Handler errors are returned as they were produced.
	pub fn call(&self, ctx: Ctx, input: Value) -> HandlerFuture {
		(self.handler)(ctx, input)
	}
}

/// Builder returned by [`Procedure::query`] and [`Procedure::mutation`].
pub struct ProcedureBuilder<Ctx, P> {
	kind: ProcedureKind,
	_marker: PhantomData<fn(Ctx, P)>,
}

impl<Ctx, P> ProcedureBuilder<Ctx, P> {
	fn new(kind: ProcedureKind) -> Self {
		Self {
			kind,
			_marker: PhantomData,
		}
	}
}

impl<Ctx> ProcedureBuilder<Ctx, NoInput> {
	/// Attach an input schema.
	pub fn input<I: Schema>(self) -> ProcedureBuilder<Ctx, Validated<I>> {
		ProcedureBuilder::new(self.kind)
	}
}

impl<Ctx, P> ProcedureBuilder<Ctx, P>
where
	Ctx: Send + 'static,
	P: InputParser,
{
	/// Finish the procedure with its handler.
	pub fn handler<F, Fut, O>(self, handler: F) -> Procedure<Ctx>
	where
		F: Fn(Ctx, P::Output) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = anyhow::Result<O>> + Send + 'static,
		O: Serialize + 'static,
	{
		let handler = Arc::new(handler);

		Procedure {
			kind: self.kind,
			validates_input: P::VALIDATES,
			handler: Arc::new(move |ctx: Ctx, input: Value| -> HandlerFuture {
				let handler = Arc::clone(&handler);
				Box::pin(async move {
					let input = P::parse(input)?;
					let output = handler(ctx, input).await?;
					Ok(serde_json::to_value(output)?)
				})
			}),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{schema::Issues, ErrorCode};
	use serde::Deserialize;
	use serde_json::json;
	use std::sync::atomic::{AtomicUsize, Ordering};

	#[derive(Deserialize)]
	struct Double {
		value: i64,
	}

	impl Schema for Double {
		fn validate(&self) -> Result<(), Issues> {
			if self.value < 0 {
				return Err(crate::schema::Issue::new(&["value"], "must be positive").into());
			}
			Ok(())
		}
	}

	#[tokio::test]
	async fn validated_procedure_passes_parsed_input() {
		let procedure = Procedure::<()>::mutation()
			.input::<Double>()
			.handler(|_, input| async move { anyhow::Ok(input.value * 2) });

		assert_eq!(procedure.kind(), ProcedureKind::Mutation);
		assert!(procedure.validates_input());
		let out = procedure.call((), json!({ "value": 21 })).await.unwrap();
		assert_eq!(out, json!(42));
	}

	#[tokio::test]
	async fn invalid_input_never_reaches_handler() {
		let calls = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&calls);
		let procedure = Procedure::<()>::mutation()
			.input::<Double>()
			.handler(move |_, input| {
				counter.fetch_add(1, Ordering::SeqCst);
				async move { anyhow::Ok(input.value) }
			});

		let err = procedure.call((), json!({ "value": -1 })).await.unwrap_err();
		let err = err.downcast::<RpcError>().unwrap();
		assert_eq!(err.code, ErrorCode::ValidationError);
		assert_eq!(calls.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn input_is_ignored_without_schema() {
		let procedure = Procedure::<u8>::query().handler(|ctx, ()| async move { anyhow::Ok(ctx) });
		assert!(!procedure.validates_input());
		let out = procedure.call(7, json!({ "anything": true })).await.unwrap();
		assert_eq!(out, json!(7));
	}
}
