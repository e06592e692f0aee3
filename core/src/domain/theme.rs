use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use tb_rpc::Schema;

/// UI color scheme. `System` follows the OS setting.
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
pub enum Theme {
	Light,
	Dark,
	#[default]
	System,
}

impl Schema for Theme {}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;
	use tb_rpc::ErrorCode;

	#[test]
	fn parses_lowercase_names_only() {
		assert_eq!(Theme::parse(json!("dark")).unwrap(), Theme::Dark);
		assert_eq!(Theme::default(), Theme::System);

		let err = Theme::parse(json!("Dark")).unwrap_err();
		assert_eq!(err.code, ErrorCode::ValidationError);
		assert!(Theme::parse(json!({ "theme": "dark" })).is_err());
	}
}
