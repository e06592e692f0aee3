use tb_rpc::{ClientError, ErrorCode};

/// Turn a failed call into a message a terminal user can act on.
pub fn improve_client_error(err: ClientError) -> anyhow::Error {
	match err {
		ClientError::Transport(message) => anyhow::anyhow!(
			"{message}\nIs the daemon running? Start it with `tickbox-daemon`."
		),
		ClientError::Rpc(rpc) if rpc.is(ErrorCode::ValidationError) => {
			let issues = rpc
				.data
				.as_ref()
				.and_then(|data| data.get("issues"))
				.and_then(|issues| issues.as_array())
				.map(|issues| {
					issues
						.iter()
						.filter_map(|issue| issue.get("message").and_then(|m| m.as_str()))
						.collect::<Vec<_>>()
						.join("; ")
				})
				.filter(|joined| !joined.is_empty());

			match issues {
				Some(issues) => anyhow::anyhow!("Invalid input: {issues}"),
				None => anyhow::anyhow!("Invalid input: {}", rpc.message),
			}
		}
		ClientError::Rpc(rpc) => anyhow::anyhow!("{}", rpc.message),
		other => other.into(),
	}
}
