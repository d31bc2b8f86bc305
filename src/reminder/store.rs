use async_trait::async_trait;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::category::category_repository::CategoryRepository;
use crate::error::Result;
use crate::notification::notification_models::{Notification, NotificationType};
use crate::notification::notification_repository::NotificationRepository;
use crate::task::task_repository::TaskRepository;
use crate::user::user_repository::UserRepository;

/// Who a reminder email is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub username: String,
    pub email: Option<String>,
}

/// Persistence the reminder dispatcher needs, scoped to the unit of work that
/// wrote the task. Writes made through it commit or roll back with the task.
#[async_trait]
pub trait ReminderStore: Send {
    async fn recipient(&mut self, user_id: Uuid) -> Result<Option<Recipient>>;

    async fn category_name(&mut self, category_id: Uuid) -> Result<Option<String>>;

    /// Raises the task's reminder flag. Returns false if it was already raised.
    async fn claim_reminder(&mut self, task_id: Uuid) -> Result<bool>;

    async fn create_notification(
        &mut self,
        user_id: Uuid,
        task_id: Uuid,
        message: &str,
        notification_type: NotificationType,
    ) -> Result<Notification>;

    /// Lowers the flag and marks every unread notification of the task read;
    /// returns how many notifications changed.
    async fn release_reminder(&mut self, task_id: Uuid) -> Result<u64>;
}

/// Repositories behind [`PgReminderStore`].
#[derive(Clone)]
pub struct ReminderRepositories {
    users: UserRepository,
    tasks: TaskRepository,
    categories: CategoryRepository,
    notifications: NotificationRepository,
}

impl ReminderRepositories {
    pub fn new(
        users: UserRepository,
        tasks: TaskRepository,
        categories: CategoryRepository,
        notifications: NotificationRepository,
    ) -> Self {
        Self {
            users,
            tasks,
            categories,
            notifications,
        }
    }

    pub fn in_tx<'a>(&'a self, tx: &'a mut Transaction<'static, Postgres>) -> PgReminderStore<'a> {
        PgReminderStore { repos: self, tx }
    }
}

/// `ReminderStore` writing through an open Postgres transaction. Lookups for
/// the email go through the pool.
pub struct PgReminderStore<'a> {
    repos: &'a ReminderRepositories,
    tx: &'a mut Transaction<'static, Postgres>,
}

#[async_trait]
impl<'a> ReminderStore for PgReminderStore<'a> {
    async fn recipient(&mut self, user_id: Uuid) -> Result<Option<Recipient>> {
        let user = self.repos.users.find_by_id(user_id).await?;
        Ok(user.map(|u| Recipient {
            username: u.username,
            email: u.email,
        }))
    }

    async fn category_name(&mut self, category_id: Uuid) -> Result<Option<String>> {
        let category = self.repos.categories.find_by_id(category_id).await?;
        Ok(category.map(|c| c.name))
    }

    async fn claim_reminder(&mut self, task_id: Uuid) -> Result<bool> {
        self.repos.tasks.claim_reminder_with_tx(self.tx, task_id).await
    }

    async fn create_notification(
        &mut self,
        user_id: Uuid,
        task_id: Uuid,
        message: &str,
        notification_type: NotificationType,
    ) -> Result<Notification> {
        self.repos
            .notifications
            .create_with_tx(self.tx, user_id, Some(task_id), message, notification_type)
            .await
    }

    async fn release_reminder(&mut self, task_id: Uuid) -> Result<u64> {
        self.repos.tasks.release_reminder_with_tx(self.tx, task_id).await?;
        self.repos
            .notifications
            .mark_unread_read_for_task_with_tx(self.tx, task_id)
            .await
    }
}
