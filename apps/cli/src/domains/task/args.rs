use chrono::{DateTime, Utc};
use clap::Args;

use tb_core::domain::{CreateTodo, UpdateTodo};

#[derive(Args, Debug)]
pub struct TaskAddArgs {
	pub title: String,
	/// Reminder time as an RFC 3339 timestamp, e.g. 2026-10-20T09:00:00Z
	#[arg(long)]
	pub remind_at: Option<DateTime<Utc>>,
}

impl From<TaskAddArgs> for CreateTodo {
	fn from(args: TaskAddArgs) -> Self {
		let input = CreateTodo::new(args.title);
		match args.remind_at {
			Some(at) => input.with_reminder(at),
			None => input,
		}
	}
}

#[derive(Args, Debug)]
pub struct TaskIdArgs {
	pub id: String,
}

#[derive(Args, Debug)]
pub struct TaskUpdateArgs {
	pub id: String,
	#[arg(long)]
	pub title: Option<String>,
	#[arg(long)]
	pub completed: Option<bool>,
	/// New reminder time (RFC 3339)
	#[arg(long, conflicts_with = "clear_reminder")]
	pub remind_at: Option<DateTime<Utc>>,
	/// Remove the reminder
	#[arg(long, default_value_t = false)]
	pub clear_reminder: bool,
}

impl From<TaskUpdateArgs> for UpdateTodo {
	fn from(args: TaskUpdateArgs) -> Self {
		let mut changes = UpdateTodo::new(args.id);
		changes.title = args.title;
		changes.completed = args.completed;
		changes.reminder_date_time = if args.clear_reminder {
			Some(None)
		} else {
			args.remind_at.map(Some)
		};
		changes
	}
}
