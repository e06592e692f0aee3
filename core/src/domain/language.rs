use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use tb_rpc::Schema;

/// Supported UI locales.
#[derive(
	Debug,
	Clone,
	Copy,
	Default,
	PartialEq,
	Eq,
	Hash,
	Serialize,
	Deserialize,
	AsRefStr,
	Display,
	EnumIter,
	EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Language {
	#[default]
	En,
	Ja,
}

impl Language {
	/// Title of a reminder notification in this language.
	pub fn reminder_title(self) -> &'static str {
		match self {
			Self::En => "To-Do Reminder",
			Self::Ja => "リマインダー",
		}
	}
}

impl Schema for Language {}
