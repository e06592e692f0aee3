//! Procedure router and caller.
//!
//! A [`Router`] is declared as a tree: each level maps a segment name to either a
//! procedure or a nested router. [`Router::build`] checks the tree and flattens it into a
//! [`BuiltRouter`], a table from full dotted path to procedure plus the set of namespace
//! paths. Dispatch is then a single map lookup.

use std::{
	collections::{BTreeMap, BTreeSet, HashMap, HashSet},
	sync::Arc,
};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
	error::RpcError,
	procedure::{Procedure, ProcedureKind},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouterError {
	#[error("duplicate key '{path}' in router definition")]
	DuplicateKey { path: String },
	#[error("invalid segment name '{segment}' under '{parent}': names must be non-empty and contain no '.'")]
	InvalidSegment { parent: String, segment: String },
}

pub type Result<T> = std::result::Result<T, RouterError>;

enum Node<Ctx> {
	Procedure(Procedure<Ctx>),
	Namespace(Router<Ctx>),
}

/// Router definition, not yet checked.
pub struct Router<Ctx> {
	entries: Vec<(String, Node<Ctx>)>,
}

impl<Ctx> Default for Router<Ctx> {
	fn default() -> Self {
		Self {
			entries: Vec::new(),
		}
	}
}

impl<Ctx> Router<Ctx>
where
	Ctx: Clone + Send + Sync + 'static,
{
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a leaf procedure under `name`.
	pub fn procedure(mut self, name: impl Into<String>, procedure: Procedure<Ctx>) -> Self {
		self.entries.push((name.into(), Node::Procedure(procedure)));
		self
	}

	/// Register a nested namespace under `name`.
	pub fn nest(mut self, name: impl Into<String>, router: Router<Ctx>) -> Self {
		self.entries.push((name.into(), Node::Namespace(router)));
		self
	}

	/// Check the tree and flatten it into its lookup table.
	pub fn build(self) -> Result<BuiltRouter<Ctx>> {
		let mut built = BuiltRouter {
			procedures: HashMap::new(),
			namespaces: HashSet::new(),
		};
		self.flatten_into("", &mut built)?;
		Ok(built)
	}

	fn flatten_into(self, parent: &str, built: &mut BuiltRouter<Ctx>) -> Result<()> {
		let mut seen = HashSet::new();

		for (segment, node) in self.entries {
			if segment.is_empty() || segment.contains('.') {
				return Err(RouterError::InvalidSegment {
					parent: parent.to_string(),
					segment,
				});
			}

			let path = if parent.is_empty() {
				segment.clone()
			} else {
				format!("{parent}.{segment}")
			};

			if !seen.insert(segment) {
				return Err(RouterError::DuplicateKey { path });
			}

			match node {
				Node::Procedure(procedure) => {
					built.procedures.insert(path, procedure);
				}
				Node::Namespace(router) => {
					router.flatten_into(&path, built)?;
					built.namespaces.insert(path);
				}
			}
		}

		Ok(())
	}
}

/// Immutable, flattened router.
pub struct BuiltRouter<Ctx> {
	procedures: HashMap<String, Procedure<Ctx>>,
	namespaces: HashSet<String>,
}

impl<Ctx> BuiltRouter<Ctx>
where
	Ctx: Clone + Send + Sync + 'static,
{
	/// Resolve a dotted path to its procedure.
	///
	/// Fails with `NOT_FOUND` naming the first prefix that resolves to nothing, or the full
	/// path when it names a namespace rather than a procedure.
	pub fn resolve(&self, path: &str) -> std::result::Result<&Procedure<Ctx>, RpcError> {
		if let Some(procedure) = self.procedures.get(path) {
			return Ok(procedure);
		}

		let mut prefix = String::with_capacity(path.len());
		for segment in path.split('.') {
			if !prefix.is_empty() {
				prefix.push('.');
			}
			prefix.push_str(segment);

			if !self.namespaces.contains(&prefix) && !self.procedures.contains_key(&prefix) {
				return Err(RpcError::not_found(format!(
					"No procedure or namespace at path: {prefix}"
				)));
			}
		}

		Err(RpcError::not_found(format!("No procedure at path: {path}")))
	}

	pub fn contains(&self, path: &str) -> bool {
		self.procedures.contains_key(path)
	}

	pub fn is_namespace(&self, path: &str) -> bool {
		self.namespaces.contains(path)
	}

	/// Every registered procedure path with its kind, sorted by path.
	pub fn procedures(&self) -> BTreeMap<&str, ProcedureKind> {
		self.procedures
			.iter()
			.map(|(path, procedure)| (path.as_str(), procedure.kind()))
			.collect()
	}

	/// Every namespace path, sorted.
	pub fn namespaces(&self) -> BTreeSet<&str> {
		self.namespaces.iter().map(String::as_str).collect()
	}

	/// Bind the router to an execution context.
	pub fn create_caller(self: &Arc<Self>, ctx: Ctx) -> Caller<Ctx> {
		Caller {
			router: Arc::clone(self),
			ctx,
			prefix: None,
		}
	}
}

/// Invocable realization of a router, bound to one context.
///
/// A caller can be narrowed to a namespace with [`Caller::scope`]; paths passed to a
/// scoped caller are relative to that namespace, mirroring the tree shape.
pub struct Caller<Ctx> {
	router: Arc<BuiltRouter<Ctx>>,
	ctx: Ctx,
	prefix: Option<String>,
}

impl<Ctx: Clone> Clone for Caller<Ctx> {
	fn clone(&self) -> Self {
		Self {
			router: Arc::clone(&self.router),
			ctx: self.ctx.clone(),
			prefix: self.prefix.clone(),
		}
	}
}

impl<Ctx> Caller<Ctx>
where
	Ctx: Clone + Send + Sync + 'static,
{
	pub fn context(&self) -> &Ctx {
		&self.ctx
	}

	pub fn router(&self) -> &Arc<BuiltRouter<Ctx>> {
		&self.router
	}

	fn full_path(&self, path: &str) -> String {
		match &self.prefix {
			Some(prefix) => format!("{prefix}.{path}"),
			None => path.to_string(),
		}
	}

	/// Narrow the caller to a nested namespace.
	pub fn scope(&self, namespace: &str) -> std::result::Result<Self, RpcError> {
		let full = self.full_path(namespace);
		if !self.router.is_namespace(&full) {
			return Err(RpcError::not_found(format!("No namespace at path: {full}")));
		}

		Ok(Self {
			router: Arc::clone(&self.router),
			ctx: self.ctx.clone(),
			prefix: Some(full),
		})
	}

	/// Resolve and invoke a procedure with an untyped input.
	///
	/// Resolution failures are returned as [`RpcError`]s; handler failures are returned
	/// exactly as the handler produced them.
	pub async fn call(&self, path: &str, input: Value) -> anyhow::Result<Value> {
		let full = self.full_path(path);
		let procedure = self.router.resolve(&full)?;
		procedure.call(self.ctx.clone(), input).await
	}

	/// Typed convenience over [`Caller::call`].
	pub async fn call_typed<I, O>(&self, path: &str, input: I) -> anyhow::Result<O>
	where
		I: Serialize,
		O: DeserializeOwned,
	{
		let output = self.call(path, serde_json::to_value(input)?).await?;
		Ok(serde_json::from_value(output)?)
	}
}
