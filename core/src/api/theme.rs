use tb_rpc::{Procedure, Router};

use crate::{context::AppContext, domain::Theme, error::CoreError};

pub(super) fn router() -> Router<AppContext> {
	Router::new()
		.procedure(
			"get",
			Procedure::query().handler(|ctx: AppContext, ()| async move {
				ctx.theme.current().await.map_err(CoreError::into_rpc)
			}),
		)
		.procedure(
			"set",
			Procedure::mutation()
				.input::<Theme>()
				.handler(|ctx: AppContext, theme: Theme| async move {
					ctx.theme.set(theme).await.map_err(CoreError::into_rpc)
				}),
		)
}
