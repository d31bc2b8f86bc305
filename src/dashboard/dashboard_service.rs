use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::notification::notification_repository::NotificationRepository;
use crate::task::task_models::DUE_SOON_WINDOW_DAYS;
use crate::task::task_repository::TaskRepository;
use crate::user::user_repository::UserRepository;

use super::dashboard_dto::DashboardResponse;

#[derive(Clone)]
pub struct DashboardService {
    user_repository: UserRepository,
    task_repository: TaskRepository,
    notification_repository: NotificationRepository,
}

impl DashboardService {
    pub fn new(
        user_repository: UserRepository,
        task_repository: TaskRepository,
        notification_repository: NotificationRepository,
    ) -> Self {
        Self {
            user_repository,
            task_repository,
            notification_repository,
        }
    }

    pub async fn get_dashboard(&self, user_id: Uuid) -> Result<DashboardResponse> {
        self.dashboard_at(user_id, Utc::now()).await
    }

    async fn dashboard_at(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<DashboardResponse> {
        let user = self
            .user_repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let counts = self.task_repository.count_by_status(user_id).await?;
        let overdue_tasks = self.task_repository.find_overdue(user_id, now).await?;
        let due_soon_tasks = self
            .task_repository
            .find_pending_due_between(user_id, now, now + Duration::days(DUE_SOON_WINDOW_DAYS))
            .await?;
        let tasks_by_category = self.task_repository.count_by_category(user_id).await?;
        let unread_notifications = self.notification_repository.count_unread(user_id).await?;

        Ok(DashboardResponse {
            username: user.username,
            total_tasks: counts.total,
            completed_tasks: counts.completed,
            pending_tasks: counts.pending,
            overdue_count: overdue_tasks.len(),
            overdue_tasks,
            due_soon_count: due_soon_tasks.len(),
            due_soon_tasks,
            tasks_by_category,
            unread_notifications,
        })
    }
}
