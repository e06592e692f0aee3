//! The procedure tree exposed over IPC.
//!
//! ```text
//! ping
//! task.{list, add, toggle, remove, update}
//! theme.{get, set}
//! lang.{get, set}
//! ```

mod lang;
mod task;
mod theme;

use tb_rpc::{BuiltRouter, Procedure, Router, RouterError};

use crate::context::AppContext;

pub fn router() -> Router<AppContext> {
	Router::new()
		.procedure(
			"ping",
			Procedure::query().handler(|_: AppContext, ()| async { anyhow::Ok("pong") }),
		)
		.nest("task", task::router())
		.nest("theme", theme::router())
		.nest("lang", lang::router())
}

/// Build the procedure tree once, at startup.
pub fn mount() -> Result<BuiltRouter<AppContext>, RouterError> {
	router().build()
}
