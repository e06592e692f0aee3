use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tb_rpc::{Issue, Issues, Schema};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
	pub id: String,
	pub title: String,
	pub completed: bool,
	/// Always serialized, `null` when no reminder is set
	#[serde(default)]
	pub reminder_date_time: Option<DateTime<Utc>>,
}

/// Input of `task.add`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodo {
	pub title: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub reminder_date_time: Option<DateTime<Utc>>,
}

impl CreateTodo {
	pub fn new(title: impl Into<String>) -> Self {
		Self {
			title: title.into(),
			reminder_date_time: None,
		}
	}

	pub fn with_reminder(mut self, at: DateTime<Utc>) -> Self {
		self.reminder_date_time = Some(at);
		self
	}
}

impl Schema for CreateTodo {
	fn validate(&self) -> Result<(), Issues> {
		if self.title.trim().is_empty() {
			return Err(Issue::new(&["title"], "Title is required").into());
		}
		Ok(())
	}
}

/// Input of `task.toggle` and `task.remove`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoId {
	pub id: String,
}

impl TodoId {
	pub fn new(id: impl Into<String>) -> Self {
		Self { id: id.into() }
	}
}

impl Schema for TodoId {
	fn validate(&self) -> Result<(), Issues> {
		if self.id.is_empty() {
			return Err(Issue::new(&["id"], "Todo ID is required").into());
		}
		Ok(())
	}
}

/// Input of `task.update`. Absent fields are left unchanged; an explicit `null`
/// `reminderDateTime` clears the reminder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodo {
	pub id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub completed: Option<bool>,
	#[serde(
		default,
		deserialize_with = "present",
		skip_serializing_if = "Option::is_none"
	)]
	pub reminder_date_time: Option<Option<DateTime<Utc>>>,
}

/// Distinguishes `null` from a missing field: a present field always yields `Some`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
	D: Deserializer<'de>,
	T: Deserialize<'de>,
{
	Option::<T>::deserialize(deserializer).map(Some)
}

impl UpdateTodo {
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			..Default::default()
		}
	}

	/// Apply the present fields to `todo`.
	pub fn apply(&self, todo: &mut Todo) {
		if let Some(title) = &self.title {
			todo.title = title.trim().to_string();
		}
		if let Some(completed) = self.completed {
			todo.completed = completed;
		}
		if let Some(reminder) = self.reminder_date_time {
			todo.reminder_date_time = reminder;
		}
	}

	pub fn touches_reminder(&self) -> bool {
		self.reminder_date_time.is_some()
	}
}

impl Schema for UpdateTodo {
	fn validate(&self) -> Result<(), Issues> {
		let mut issues = Issues::new();
		if self.id.is_empty() {
			issues.push(Issue::new(&["id"], "Todo ID is required"));
		}
		if matches!(&self.title, Some(title) if title.trim().is_empty()) {
			issues.push(Issue::new(&["title"], "Title can't be empty if provided"));
		}
		issues.into_result()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use serde_json::json;

	#[test]
	fn todo_serializes_null_reminder() {
		let todo = Todo {
			id: "1".into(),
			title: "x".into(),
			completed: false,
			reminder_date_time: None,
		};
		assert_eq!(
			serde_json::to_value(&todo).unwrap(),
			json!({ "id": "1", "title": "x", "completed": false, "reminderDateTime": null })
		);
	}

	#[test]
	fn create_rejects_blank_titles() {
		let err = CreateTodo::parse(json!({ "title": "  " })).unwrap_err();
		assert_eq!(err.message, "Title is required");
		assert_eq!(err.data.unwrap()["issues"][0]["path"], json!(["title"]));

		let input = CreateTodo::parse(json!({
			"title": "Call mom",
			"reminderDateTime": "2030-01-01T09:00:00Z"
		}))
		.unwrap();
		assert!(input.reminder_date_time.is_some());
	}

	#[test]
	fn update_distinguishes_null_from_absent() {
		let absent = UpdateTodo::parse(json!({ "id": "a" })).unwrap();
		assert_eq!(absent.reminder_date_time, None);

		let cleared = UpdateTodo::parse(json!({ "id": "a", "reminderDateTime": null })).unwrap();
		assert_eq!(cleared.reminder_date_time, Some(None));

		let mut todo = Todo {
			id: "a".into(),
			title: "old".into(),
			completed: false,
			reminder_date_time: Some(Utc::now()),
		};
		cleared.apply(&mut todo);
		assert_eq!(todo.reminder_date_time, None);
		assert_eq!(todo.title, "old");
	}

	#[test]
	fn update_collects_every_issue() {
		let err = UpdateTodo::parse(json!({ "id": "", "title": " " })).unwrap_err();
		let issues = &err.data.unwrap()["issues"];
		assert_eq!(issues.as_array().unwrap().len(), 2);
	}
}
