//! Event bus for backend-initiated notifications

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::broadcast;

use crate::domain::Language;

pub const LANGUAGE_CHANGED_CHANNEL: &str = "language-changed";
pub const REMINDER_CHANNEL: &str = "reminder";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CoreEvent {
	LanguageChanged {
		language: Language,
	},
	/// A todo's reminder came due
	Reminder {
		todo_id: String,
		/// Localized notification title
		title: String,
		/// The todo's title
		body: String,
	},
}

impl CoreEvent {
	/// IPC channel the event is forwarded on.
	pub fn channel(&self) -> &'static str {
		match self {
			Self::LanguageChanged { .. } => LANGUAGE_CHANGED_CHANNEL,
			Self::Reminder { .. } => REMINDER_CHANNEL,
		}
	}

	/// Payload sent to the UI process.
	pub fn payload(&self) -> Value {
		match self {
			Self::LanguageChanged { language } => json!(language),
			Self::Reminder {
				todo_id,
				title,
				body,
			} => json!({ "id": todo_id, "title": title, "body": body }),
		}
	}
}

#[derive(Debug, Clone)]
pub struct EventBus {
	sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	/// Emit an event to all subscribers. Nobody listening is fine.
	pub fn emit(&self, event: CoreEvent) {
		let _ = self.sender.send(event);
	}

	pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
		self.sender.subscribe()
	}

	pub fn subscriber_count(&self) -> usize {
		self.sender.receiver_count()
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new(1024)
	}
}
