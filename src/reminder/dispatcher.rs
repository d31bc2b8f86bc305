use chrono::{DateTime, FixedOffset, Utc};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use super::email::{notification_message, ReminderEmail};
use super::evaluator::{evaluate, ReminderAction, ReminderKind, ReminderState};
use super::store::ReminderStore;
use crate::error::Result;
use crate::mail::{Mailer, OutboundEmail};
use crate::notification::notification_models::{Notification, NotificationType};
use crate::state::Config;
use crate::task::task_models::Task;

impl From<ReminderKind> for NotificationType {
    fn from(kind: ReminderKind) -> Self {
        match kind {
            ReminderKind::Overdue => NotificationType::Overdue,
            ReminderKind::DueSoon => NotificationType::DueSoon,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReminderSettings {
    pub from_email: String,
    pub base_url: String,
    pub utc_offset: FixedOffset,
}

impl ReminderSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            from_email: config.default_from_email.clone(),
            base_url: config.base_url.clone(),
            utc_offset: config.utc_offset,
        }
    }
}

/// Broadcast and email owed for a reminder raised during a save. Held back
/// until the save commits.
#[derive(Debug)]
struct PendingDelivery {
    notification: Notification,
    email: Option<OutboundEmail>,
}

/// A task after the reminder rules ran on it.
#[derive(Debug)]
pub struct ReminderOutcome {
    pub task: Task,
    delivery: Option<PendingDelivery>,
}

#[derive(Clone)]
pub struct ReminderDispatcher {
    mailer: Arc<dyn Mailer>,
    settings: Arc<ReminderSettings>,
    notification_tx: broadcast::Sender<Notification>,
}

impl ReminderDispatcher {
    pub fn new(
        mailer: Arc<dyn Mailer>,
        settings: ReminderSettings,
        notification_tx: broadcast::Sender<Notification>,
    ) -> Self {
        Self {
            mailer,
            settings: Arc::new(settings),
            notification_tx,
        }
    }

    /// Runs the reminder rules against a task that was just written and records
    /// the result through `store`, which must share the task write's transaction.
    /// The returned outcome carries the task with its reminder flag brought up to
    /// date; pass it to [`deliver`](Self::deliver) once the transaction commits.
    pub async fn on_task_saved<S>(&self, store: &mut S, mut task: Task, now: DateTime<Utc>) -> Result<ReminderOutcome>
    where
        S: ReminderStore + ?Sized,
    {
        let mut delivery = None;

        match evaluate(ReminderState::of(&task, now)) {
            ReminderAction::Emit(kind) => {
                if store.claim_reminder(task.id).await? {
                    let message = notification_message(kind, &task.title);
                    let notification = store
                        .create_notification(task.user_id, task.id, &message, kind.into())
                        .await?;
                    info!("Notification created: {}", message);

                    let email = self.compose_email(store, &task, kind).await;
                    delivery = Some(PendingDelivery { notification, email });
                } else {
                    debug!("Task '{}' already has an active reminder", task.title);
                }
                task.has_active_reminder_notification = true;
            }
            ReminderAction::Clear => {
                let cleared = store.release_reminder(task.id).await?;
                task.has_active_reminder_notification = false;
                info!(
                    "Reminder for task '{}' resolved, {} notification(s) marked read",
                    task.title, cleared
                );
            }
            ReminderAction::Nothing => {}
        }

        Ok(ReminderOutcome { task, delivery })
    }

    /// Publishes the notification to live subscribers and sends the email.
    /// Mail failures are logged and dropped.
    pub async fn deliver(&self, outcome: ReminderOutcome) -> Task {
        let ReminderOutcome { task, delivery } = outcome;
        let Some(PendingDelivery { notification, email }) = delivery else {
            return task;
        };

        let _ = self.notification_tx.send(notification);

        if let Some(email) = email {
            match self.mailer.send(&email).await {
                Ok(()) => info!(
                    "Email sent for task '{}' to {}",
                    task.title,
                    email.recipients.join(", ")
                ),
                Err(e) => error!("Error sending email for task '{}': {}", task.title, e),
            }
        }

        task
    }

    async fn compose_email<S>(&self, store: &mut S, task: &Task, kind: ReminderKind) -> Option<OutboundEmail>
    where
        S: ReminderStore + ?Sized,
    {
        let recipient = match store.recipient(task.user_id).await {
            Ok(Some(recipient)) => recipient,
            Ok(None) => {
                warn!("Owner {} of task '{}' not found, skipping email", task.user_id, task.title);
                return None;
            }
            Err(e) => {
                error!("Error loading owner of task '{}': {:?}", task.title, e);
                return None;
            }
        };

        let Some(address) = recipient.email.as_deref().filter(|e| !e.trim().is_empty()) else {
            debug!("User {} has no email address, skipping reminder email", recipient.username);
            return None;
        };

        let category_name = match task.category_id {
            Some(category_id) => store.category_name(category_id).await.unwrap_or_else(|e| {
                warn!("Error loading category for task '{}': {:?}", task.title, e);
                None
            }),
            None => None,
        };

        let email = ReminderEmail {
            kind,
            task,
            username: &recipient.username,
            recipient: address,
            category_name: category_name.as_deref(),
            from: &self.settings.from_email,
            base_url: &self.settings.base_url,
            utc_offset: self.settings.utc_offset,
        }
        .compose();

        Some(email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::mail::MailError;
    use crate::reminder::store::Recipient;
    use crate::task::task_models::tests::task_due;
    use async_trait::async_trait;
    use chrono::Duration;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Rows a save may write; restored wholesale when a save fails.
    #[derive(Clone, Default)]
    struct Tables {
        notifications: Vec<Notification>,
        flags: HashMap<Uuid, bool>,
    }

    #[derive(Default)]
    struct MemoryStore {
        recipients: HashMap<Uuid, Recipient>,
        categories: HashMap<Uuid, String>,
        tables: Tables,
        failing_claims: u32,
        failing_inserts: u32,
    }

    impl MemoryStore {
        fn with_recipient(user_id: Uuid, email: Option<&str>) -> Self {
            let mut store = Self::default();
            store.recipients.insert(
                user_id,
                Recipient {
                    username: "alice".to_string(),
                    email: email.map(str::to_string),
                },
            );
            store
        }

        fn notifications_for(&self, task_id: Uuid) -> Vec<Notification> {
            self.tables
                .notifications
                .iter()
                .filter(|n| n.task_id == Some(task_id))
                .cloned()
                .collect()
        }

        fn unread_reminders_for(&self, task_id: Uuid) -> usize {
            self.notifications_for(task_id)
                .iter()
                .filter(|n| !n.is_read && n.notification_type != NotificationType::General)
                .count()
        }

        fn flag(&self, task_id: Uuid) -> bool {
            self.tables.flags.get(&task_id).copied().unwrap_or(false)
        }
    }

    fn write_failure() -> AppError {
        AppError::Database(sqlx::Error::PoolTimedOut)
    }

    #[async_trait]
    impl ReminderStore for MemoryStore {
        async fn recipient(&mut self, user_id: Uuid) -> Result<Option<Recipient>> {
            Ok(self.recipients.get(&user_id).cloned())
        }

        async fn category_name(&mut self, category_id: Uuid) -> Result<Option<String>> {
            Ok(self.categories.get(&category_id).cloned())
        }

        async fn claim_reminder(&mut self, task_id: Uuid) -> Result<bool> {
            if self.failing_claims > 0 {
                self.failing_claims -= 1;
                return Err(write_failure());
            }
            let flag = self.tables.flags.entry(task_id).or_insert(false);
            if *flag {
                return Ok(false);
            }
            *flag = true;
            Ok(true)
        }

        async fn create_notification(
            &mut self,
            user_id: Uuid,
            task_id: Uuid,
            message: &str,
            notification_type: NotificationType,
        ) -> Result<Notification> {
            if self.failing_inserts > 0 {
                self.failing_inserts -= 1;
                return Err(write_failure());
            }
            let notification = Notification {
                id: Uuid::new_v4(),
                user_id,
                task_id: Some(task_id),
                message: message.to_string(),
                notification_type,
                is_read: false,
                created_at: Utc::now(),
            };
            self.tables.notifications.push(notification.clone());
            Ok(notification)
        }

        async fn release_reminder(&mut self, task_id: Uuid) -> Result<u64> {
            self.tables.flags.insert(task_id, false);
            let mut changed = 0;
            for n in self.tables.notifications.iter_mut() {
                if n.task_id == Some(task_id) && !n.is_read {
                    n.is_read = true;
                    changed += 1;
                }
            }
            Ok(changed)
        }
    }

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<OutboundEmail>>,
    }

    impl RecordingMailer {
        fn sent(&self) -> Vec<OutboundEmail> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &OutboundEmail) -> std::result::Result<(), MailError> {
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send(&self, _email: &OutboundEmail) -> std::result::Result<(), MailError> {
            Err(MailError::Rejected {
                status: 503,
                body: "relay unavailable".to_string(),
            })
        }
    }

    fn settings() -> ReminderSettings {
        ReminderSettings {
            from_email: "webmaster@localhost".to_string(),
            base_url: "http://127.0.0.1:3000".to_string(),
            utc_offset: FixedOffset::east_opt(0).unwrap(),
        }
    }

    fn dispatcher(mailer: Arc<dyn Mailer>) -> ReminderDispatcher {
        let (tx, _) = broadcast::channel(16);
        ReminderDispatcher::new(mailer, settings(), tx)
    }

    /// One save as the task service performs it: staged rows are kept and
    /// delivery happens only when the reminder step succeeds.
    async fn save(
        reminders: &ReminderDispatcher,
        store: &mut MemoryStore,
        task: Task,
        now: DateTime<Utc>,
    ) -> Result<Task> {
        let before = store.tables.clone();
        match reminders.on_task_saved(store, task, now).await {
            Ok(outcome) => Ok(reminders.deliver(outcome).await),
            Err(e) => {
                store.tables = before;
                Err(e)
            }
        }
    }

    #[tokio::test]
    async fn test_overdue_task_gets_one_notification_and_email() {
        let now = Utc::now();
        let task = task_due(Some(now - Duration::days(1)));
        let mut store = MemoryStore::with_recipient(task.user_id, Some("alice@example.com"));
        let mailer = Arc::new(RecordingMailer::default());
        let reminders = dispatcher(mailer.clone());

        let saved = save(&reminders, &mut store, task, now).await.unwrap();

        assert!(saved.has_active_reminder_notification);
        assert!(store.flag(saved.id));
        let notifications = store.notifications_for(saved.id);
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].notification_type, NotificationType::Overdue);
        assert_eq!(notifications[0].message, "Task 'Write report' is overdue!");
        assert!(!notifications[0].is_read);

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "OVERDUE: Your Task 'Write report'");
        assert_eq!(sent[0].recipients, vec!["alice@example.com".to_string()]);
    }

    #[tokio::test]
    async fn test_repeated_save_does_not_duplicate() {
        let now = Utc::now();
        let task = task_due(Some(now - Duration::hours(2)));
        let mut store = MemoryStore::with_recipient(task.user_id, Some("alice@example.com"));
        let mailer = Arc::new(RecordingMailer::default());
        let reminders = dispatcher(mailer.clone());

        let saved = save(&reminders, &mut store, task, now).await.unwrap();
        let saved = save(&reminders, &mut store, saved, now).await.unwrap();
        let saved = save(&reminders, &mut store, saved, now + Duration::minutes(5))
            .await
            .unwrap();

        assert_eq!(store.notifications_for(saved.id).len(), 1);
        assert_eq!(mailer.sent().len(), 1);
        assert!(saved.has_active_reminder_notification);
    }

    #[tokio::test]
    async fn test_stale_copy_of_task_does_not_raise_second_reminder() {
        let now = Utc::now();
        let task = task_due(Some(now - Duration::days(1)));
        let stale = task.clone();
        let mut store = MemoryStore::with_recipient(task.user_id, Some("alice@example.com"));
        let mailer = Arc::new(RecordingMailer::default());
        let reminders = dispatcher(mailer.clone());

        save(&reminders, &mut store, task, now).await.unwrap();
        // A concurrent save that read the row before the first one committed.
        let saved = save(&reminders, &mut store, stale, now).await.unwrap();

        assert!(saved.has_active_reminder_notification);
        assert_eq!(store.unread_reminders_for(saved.id), 1);
        assert_eq!(mailer.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_flag_write_leaves_no_reminder_behind() {
        let now = Utc::now();
        let task = task_due(Some(now - Duration::days(1)));
        let task_id = task.id;
        let mut store = MemoryStore::with_recipient(task.user_id, Some("alice@example.com"));
        store.failing_claims = 1;
        let mailer = Arc::new(RecordingMailer::default());
        let reminders = dispatcher(mailer.clone());

        let first = save(&reminders, &mut store, task.clone(), now).await;
        assert!(first.is_err());
        assert_eq!(store.unread_reminders_for(task_id), 0);
        assert!(!store.flag(task_id));
        assert!(mailer.sent().is_empty());

        let saved = save(&reminders, &mut store, task, now).await.unwrap();
        assert!(saved.has_active_reminder_notification);
        assert_eq!(store.unread_reminders_for(task_id), 1);
        assert_eq!(mailer.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_notification_insert_rolls_back_flag() {
        let now = Utc::now();
        let task = task_due(Some(now + Duration::days(2)));
        let task_id = task.id;
        let mut store = MemoryStore::with_recipient(task.user_id, None);
        store.failing_inserts = 1;
        let reminders = dispatcher(Arc::new(RecordingMailer::default()));

        assert!(save(&reminders, &mut store, task.clone(), now).await.is_err());
        assert!(!store.flag(task_id));
        assert!(store.notifications_for(task_id).is_empty());

        save(&reminders, &mut store, task.clone(), now).await.unwrap();
        save(&reminders, &mut store, task, now).await.unwrap();
        assert_eq!(store.unread_reminders_for(task_id), 1);
        assert!(store.flag(task_id));
    }

    #[tokio::test]
    async fn test_completing_task_clears_reminder() {
        let now = Utc::now();
        let task = task_due(Some(now - Duration::days(1)));
        let mut store = MemoryStore::with_recipient(task.user_id, None);
        let reminders = dispatcher(Arc::new(RecordingMailer::default()));

        let mut saved = save(&reminders, &mut store, task, now).await.unwrap();
        saved.completed = true;
        let saved = save(&reminders, &mut store, saved, now).await.unwrap();

        assert!(!saved.has_active_reminder_notification);
        assert!(!store.flag(saved.id));
        let notifications = store.notifications_for(saved.id);
        assert_eq!(notifications.len(), 1);
        assert!(notifications.iter().all(|n| n.is_read));
    }

    #[tokio::test]
    async fn test_due_in_three_days_is_due_soon() {
        let now = Utc::now();
        let task = task_due(Some(now + Duration::days(3)));
        let mut store = MemoryStore::with_recipient(task.user_id, Some("alice@example.com"));
        let mailer = Arc::new(RecordingMailer::default());
        let reminders = dispatcher(mailer.clone());

        let saved = save(&reminders, &mut store, task, now).await.unwrap();

        let notifications = store.notifications_for(saved.id);
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].notification_type, NotificationType::DueSoon);
        assert_eq!(
            mailer.sent()[0].subject,
            "REMINDER: Your Task 'Write report' is due soon!"
        );
    }

    #[tokio::test]
    async fn test_mail_failure_does_not_fail_save() {
        let now = Utc::now();
        let task = task_due(Some(now - Duration::days(1)));
        let mut store = MemoryStore::with_recipient(task.user_id, Some("alice@example.com"));
        let reminders = dispatcher(Arc::new(FailingMailer));

        let saved = save(&reminders, &mut store, task, now).await.unwrap();

        assert!(saved.has_active_reminder_notification);
        assert_eq!(store.notifications_for(saved.id).len(), 1);
    }

    #[tokio::test]
    async fn test_no_email_without_address() {
        let now = Utc::now();
        let task = task_due(Some(now - Duration::days(1)));
        let mut store = MemoryStore::with_recipient(task.user_id, None);
        let mailer = Arc::new(RecordingMailer::default());
        let reminders = dispatcher(mailer.clone());

        save(&reminders, &mut store, task, now).await.unwrap();

        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_email_includes_category_name() {
        let now = Utc::now();
        let mut task = task_due(Some(now + Duration::days(1)));
        let category_id = Uuid::new_v4();
        task.category_id = Some(category_id);
        let mut store = MemoryStore::with_recipient(task.user_id, Some("alice@example.com"));
        store.categories.insert(category_id, "Work".to_string());
        let mailer = Arc::new(RecordingMailer::default());
        let reminders = dispatcher(mailer.clone());

        save(&reminders, &mut store, task, now).await.unwrap();

        assert!(mailer.sent()[0].body.contains("Category: Work\n"));
    }

    #[tokio::test]
    async fn test_nothing_is_broadcast_before_delivery() {
        let now = Utc::now();
        let task = task_due(Some(now - Duration::days(1)));
        let mut store = MemoryStore::with_recipient(task.user_id, None);
        let (tx, mut rx) = broadcast::channel(16);
        let reminders = ReminderDispatcher::new(Arc::new(RecordingMailer::default()), settings(), tx);

        let outcome = reminders.on_task_saved(&mut store, task, now).await.unwrap();
        assert!(rx.try_recv().is_err());

        let saved = reminders.deliver(outcome).await;
        let live = rx.try_recv().unwrap();
        assert_eq!(live.task_id, Some(saved.id));
        assert_eq!(live.user_id, saved.user_id);
    }

    #[tokio::test]
    async fn test_at_most_one_unread_reminder_while_flagged() {
        let now = Utc::now();
        let task = task_due(Some(now + Duration::days(2)));
        let task_id = task.id;
        let mut store = MemoryStore::with_recipient(task.user_id, None);
        let reminders = dispatcher(Arc::new(RecordingMailer::default()));

        let check = |store: &MemoryStore, task: &Task| {
            if task.has_active_reminder_notification {
                assert!(store.unread_reminders_for(task_id) <= 1);
            }
            assert_eq!(task.has_active_reminder_notification, store.flag(task_id));
        };

        // Due soon: reminder raised.
        let mut task = save(&reminders, &mut store, task, now).await.unwrap();
        check(&store, &task);

        // Slips past due while flagged: existing reminder stands.
        task.due_date = Some(now - Duration::hours(1));
        let mut task = save(&reminders, &mut store, task, now).await.unwrap();
        check(&store, &task);
        assert_eq!(store.notifications_for(task_id).len(), 1);

        // Pushed out of the window: reminder cleared.
        task.due_date = Some(now + Duration::days(30));
        let mut task = save(&reminders, &mut store, task, now).await.unwrap();
        check(&store, &task);
        assert!(!task.has_active_reminder_notification);
        assert_eq!(store.unread_reminders_for(task_id), 0);

        // Pulled back to overdue: a fresh reminder.
        task.due_date = Some(now - Duration::days(1));
        let task = save(&reminders, &mut store, task, now).await.unwrap();
        check(&store, &task);
        let notifications = store.notifications_for(task_id);
        assert_eq!(notifications.len(), 2);
        assert_eq!(store.unread_reminders_for(task_id), 1);
        assert!(notifications
            .iter()
            .any(|n| !n.is_read && n.notification_type == NotificationType::Overdue));
    }
}
