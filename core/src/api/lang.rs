use tb_rpc::{Procedure, Router};

use crate::{context::AppContext, domain::Language, error::CoreError};

pub(super) fn router() -> Router<AppContext> {
	Router::new()
		.procedure(
			"get",
			Procedure::query().handler(|ctx: AppContext, ()| async move {
				ctx.language.current().await.map_err(CoreError::into_rpc)
			}),
		)
		.procedure(
			"set",
			Procedure::mutation()
				.input::<Language>()
				.handler(|ctx: AppContext, language: Language| async move {
					ctx.language.set(language).await.map_err(CoreError::into_rpc)
				}),
		)
}
