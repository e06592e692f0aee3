//! `theme` and `lang` commands.

use anyhow::Result;
use clap::Subcommand;
use tb_core::domain::{Language, Theme};

use crate::context::Context;
use crate::util::prelude::*;

#[derive(Subcommand, Debug)]
pub enum ThemeCmd {
	/// Show the current theme
	Get,
	/// Set the theme (light, dark or system)
	Set { theme: Theme },
}

#[derive(Subcommand, Debug)]
pub enum LangCmd {
	/// Show the current language
	Get,
	/// Set the language (en or ja)
	Set { language: Language },
}

pub async fn run_theme(ctx: &Context, cmd: ThemeCmd) -> Result<()> {
	let theme = match cmd {
		ThemeCmd::Get => ctx.client.theme().get().await,
		ThemeCmd::Set { theme } => ctx.client.theme().set(theme).await,
	}
	.map_err(improve_client_error)?;

	print_output!(ctx, &theme, |theme: &Theme| println!("{theme}"));
	Ok(())
}

pub async fn run_lang(ctx: &Context, cmd: LangCmd) -> Result<()> {
	let language = match cmd {
		LangCmd::Get => ctx.client.lang().get().await,
		LangCmd::Set { language } => ctx.client.lang().set(language).await,
	}
	.map_err(improve_client_error)?;

	print_output!(ctx, &language, |language: &Language| println!("{language}"));
	Ok(())
}
