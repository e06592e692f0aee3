mod args;

use anyhow::Result;
use clap::Subcommand;
use tb_core::domain::{Language, Todo};

use crate::context::Context;
use crate::util::prelude::*;

use self::args::*;

#[derive(Subcommand, Debug)]
pub enum TaskCmd {
	/// List todos
	List,
	/// Add a todo
	Add(TaskAddArgs),
	/// Flip a todo between open and done
	Toggle(TaskIdArgs),
	/// Remove a todo
	Remove(TaskIdArgs),
	/// Change a todo's title, completion or reminder
	Update(TaskUpdateArgs),
}

pub async fn run(ctx: &Context, cmd: TaskCmd) -> Result<()> {
	let tasks = ctx.client.task();

	match cmd {
		TaskCmd::List => {
			let todos = tasks.list().await.map_err(improve_client_error)?;
			print_output!(ctx, &todos, |todos: &Vec<Todo>| {
				if todos.is_empty() {
					println!("{}", empty_message(ctx.language));
					return;
				}
				for todo in todos {
					println!("{}", render(todo));
				}
			});
		}
		TaskCmd::Add(args) => {
			let todo = tasks.add(args.into()).await.map_err(improve_client_error)?;
			print_output!(ctx, &todo, |todo: &Todo| {
				println!("Added {}", render(todo));
			});
		}
		TaskCmd::Toggle(args) => {
			let todo = tasks.toggle(args.id).await.map_err(improve_client_error)?;
			print_output!(ctx, &todo, |todo: &Todo| println!("{}", render(todo)));
		}
		TaskCmd::Remove(args) => {
			let id = tasks.remove(args.id).await.map_err(improve_client_error)?;
			print_output!(ctx, &id, |id: &String| println!("Removed {id}"));
		}
		TaskCmd::Update(args) => {
			let todo = tasks.update(args.into()).await.map_err(improve_client_error)?;
			print_output!(ctx, &todo, |todo: &Todo| println!("{}", render(todo)));
		}
	}

	Ok(())
}

fn empty_message(language: Language) -> &'static str {
	match language {
		Language::En => "No todos yet",
		Language::Ja => "タスクはありません",
	}
}

fn render(todo: &Todo) -> String {
	let mark = if todo.completed { "x" } else { " " };
	match todo.reminder_date_time {
		Some(at) => format!("[{mark}] {} {} (reminder {})", todo.id, todo.title, at.to_rfc3339()),
		None => format!("[{mark}] {} {}", todo.id, todo.title),
	}
}
