use tb_rpc::{Procedure, Router};

use crate::{
	context::AppContext,
	domain::{CreateTodo, TodoId, UpdateTodo},
	error::CoreError,
};

pub(super) fn router() -> Router<AppContext> {
	Router::new()
		.procedure(
			"list",
			Procedure::query().handler(|ctx: AppContext, ()| async move {
				ctx.todos.list().await.map_err(CoreError::into_rpc)
			}),
		)
		.procedure(
			"add",
			Procedure::mutation()
				.input::<CreateTodo>()
				.handler(|ctx: AppContext, input: CreateTodo| async move {
					ctx.todos.create(input).await.map_err(CoreError::into_rpc)
				}),
		)
		.procedure(
			"toggle",
			Procedure::mutation()
				.input::<TodoId>()
				.handler(|ctx: AppContext, input: TodoId| async move {
					ctx.todos.toggle(&input.id).await.map_err(CoreError::into_rpc)
				}),
		)
		.procedure(
			"remove",
			Procedure::mutation()
				.input::<TodoId>()
				.handler(|ctx: AppContext, input: TodoId| async move {
					ctx.todos.remove(&input.id).await.map_err(CoreError::into_rpc)
				}),
		)
		.procedure(
			"update",
			Procedure::mutation()
				.input::<UpdateTodo>()
				.handler(|ctx: AppContext, input: UpdateTodo| async move {
					ctx.todos.update(input).await.map_err(CoreError::into_rpc)
				}),
		)
}
