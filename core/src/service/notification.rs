//! Reminder scheduling.
//!
//! One timer task per todo, keyed `reminder-<id>`. Scheduling a todo again replaces its
//! timer. Timers live only in memory; [`NotificationService::reschedule_all`] restores
//! them from the persisted todos at startup.

use std::{
	collections::HashMap,
	sync::{
		atomic::{AtomicU64, Ordering},
		Arc,
	},
};

use chrono::Utc;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
	domain::Todo,
	infra::event::{CoreEvent, EventBus},
	repository::LanguageRepository,
};

struct Job {
	generation: u64,
	handle: JoinHandle<()>,
}

#[derive(Clone)]
pub struct NotificationService {
	events: EventBus,
	language: LanguageRepository,
	jobs: Arc<Mutex<HashMap<String, Job>>>,
	generation: Arc<AtomicU64>,
}

fn job_name(todo_id: &str) -> String {
	format!("reminder-{todo_id}")
}

impl NotificationService {
	pub fn new(events: EventBus, language: LanguageRepository) -> Self {
		Self {
			events,
			language,
			jobs: Arc::new(Mutex::new(HashMap::new())),
			generation: Arc::new(AtomicU64::new(0)),
		}
	}

	/// (Re)schedule the reminder of `todo`. Returns whether a timer is now pending.
	///
	/// Any existing timer for the todo is cancelled first. A missing or past reminder
	/// leaves the todo without a timer.
	pub fn schedule(&self, todo: &Todo) -> bool {
		let name = job_name(&todo.id);
		self.cancel_job(&name);

		let Some(at) = todo.reminder_date_time else {
			return false;
		};

		let delay = match (at - Utc::now()).to_std() {
			Ok(delay) if !delay.is_zero() => delay,
			_ => {
				debug!(todo_id = %todo.id, %at, "Reminder is in the past, not scheduling");
				return false;
			}
		};

		let generation = self.generation.fetch_add(1, Ordering::Relaxed);
		let service = self.clone();
		let todo_id = todo.id.clone();
		let body = todo.title.clone();
		let job = name.clone();

		// Held across the spawn so the timer cannot fire before its job is registered
		let mut jobs = self.jobs.lock();
		let handle = tokio::spawn(async move {
			tokio::time::sleep(delay).await;
			service.fire(&job, generation, todo_id, body).await;
		});
		jobs.insert(name, Job { generation, handle });
		drop(jobs);

		info!(todo_id = %todo.id, %at, "Scheduled reminder");
		true
	}

	async fn fire(&self, job: &str, generation: u64, todo_id: String, body: String) {
		{
			let mut jobs = self.jobs.lock();
			match jobs.get(job) {
				Some(current) if current.generation == generation => {
					jobs.remove(job);
				}
				_ => return,
			}
		}

		let language = match self.language.get().await {
			Ok(language) => language,
			Err(e) => {
				warn!(error = %e, "Failed to read language for reminder, using default");
				Default::default()
			}
		};

		info!(%todo_id, "Triggering reminder");
		self.events.emit(CoreEvent::Reminder {
			todo_id,
			title: language.reminder_title().to_string(),
			body,
		});
	}

	pub fn cancel(&self, todo_id: &str) {
		if self.cancel_job(&job_name(todo_id)) {
			info!(%todo_id, "Cancelled reminder");
		}
	}

	fn cancel_job(&self, name: &str) -> bool {
		match self.jobs.lock().remove(name) {
			Some(job) => {
				job.handle.abort();
				true
			}
			None => false,
		}
	}

	/// Schedule every todo with a future reminder. Returns how many timers are pending.
	pub fn reschedule_all(&self, todos: &[Todo]) -> usize {
		info!(count = todos.len(), "Rescheduling reminders");
		todos.iter().filter(|todo| self.schedule(todo)).count()
	}

	pub fn is_scheduled(&self, todo_id: &str) -> bool {
		self.jobs.lock().contains_key(&job_name(todo_id))
	}

	pub fn pending_count(&self) -> usize {
		self.jobs.lock().len()
	}

	/// Abort every pending timer.
	pub fn shutdown(&self) {
		for (_, job) in self.jobs.lock().drain() {
			job.handle.abort();
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		domain::Language,
		infra::store::{AppStore, MemoryStore},
	};
	use chrono::Duration;
	use pretty_assertions::assert_eq;

	fn service() -> (NotificationService, EventBus, LanguageRepository) {
		let store = AppStore::new(Arc::new(MemoryStore::new()));
		let language = LanguageRepository::new(store);
		let events = EventBus::default();
		(
			NotificationService::new(events.clone(), language.clone()),
			events,
			language,
		)
	}

	fn todo_due_in(millis: i64) -> Todo {
		Todo {
			id: "t1".into(),
			title: "Buy milk".into(),
			completed: false,
			reminder_date_time: Some(Utc::now() + Duration::milliseconds(millis)),
		}
	}

	#[tokio::test]
	async fn past_or_missing_reminders_are_not_scheduled() {
		let (service, _, _) = service();
		assert!(!service.schedule(&todo_due_in(-1_000)));

		let mut todo = todo_due_in(60_000);
		todo.reminder_date_time = None;
		assert!(!service.schedule(&todo));
		assert_eq!(service.pending_count(), 0);
	}

	#[tokio::test]
	async fn rescheduling_replaces_the_timer() {
		let (service, _, _) = service();
		assert!(service.schedule(&todo_due_in(60_000)));
		assert!(service.schedule(&todo_due_in(120_000)));
		assert_eq!(service.pending_count(), 1);

		service.cancel("t1");
		assert!(!service.is_scheduled("t1"));
	}

	#[tokio::test]
	async fn due_reminders_emit_a_localized_event() {
		let (service, events, language) = service();
		language.replace(Language::Ja).await.unwrap();
		let mut rx = events.subscribe();

		service.schedule(&todo_due_in(50));
		let event = tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv())
			.await
			.unwrap()
			.unwrap();

		assert_eq!(
			event,
			CoreEvent::Reminder {
				todo_id: "t1".into(),
				title: "リマインダー".into(),
				body: "Buy milk".into(),
			}
		);
		assert!(!service.is_scheduled("t1"));
	}

	#[tokio::test]
	async fn reschedule_all_counts_future_reminders() {
		let (service, _, _) = service();
		let mut past = todo_due_in(-5_000);
		past.id = "past".into();
		let future = todo_due_in(60_000);
		assert_eq!(service.reschedule_all(&[past, future]), 1);
		service.shutdown();
		assert_eq!(service.pending_count(), 0);
	}
}
