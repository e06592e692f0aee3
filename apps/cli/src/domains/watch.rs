use anyhow::Result;
use tb_rpc::IpcEvent;
use tokio::sync::mpsc;

use crate::context::{Context, OutputFormat};
use crate::util::error::improve_client_error;

/// Stream backend events (language changes, due reminders) until Ctrl+C.
pub async fn run(ctx: &Context, channels: Vec<String>) -> Result<()> {
	let (event_tx, mut event_rx) = mpsc::unbounded_channel::<IpcEvent>();
	let transport = ctx.event_transport();
	let stream = tokio::spawn(async move { transport.subscribe(channels, event_tx).await });

	loop {
		tokio::select! {
			event = event_rx.recv() => match event {
				Some(event) => print_event(ctx.format, &event)?,
				None => break,
			},
			_ = tokio::signal::ctrl_c() => return Ok(()),
		}
	}

	// The sender is gone, so the stream ended; surface why
	match stream.await {
		Ok(result) => result.map_err(improve_client_error),
		Err(e) => Err(e.into()),
	}
}

fn print_event(format: OutputFormat, event: &IpcEvent) -> Result<()> {
	match format {
		OutputFormat::Json => println!("{}", serde_json::to_string(event)?),
		OutputFormat::Human => match event.channel.as_str() {
			"reminder" => println!(
				"{}: {}",
				event.payload["title"].as_str().unwrap_or_default(),
				event.payload["body"].as_str().unwrap_or_default()
			),
			channel => println!("{channel}: {}", event.payload),
		},
	}
	Ok(())
}
