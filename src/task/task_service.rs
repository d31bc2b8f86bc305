use crate::access::require_owner;
use crate::category::category_repository::CategoryRepository;
use crate::error::{AppError, Result};
use crate::pagination::PageParams;
use crate::db::DbPool;
use crate::reminder::{ReminderDispatcher, ReminderOutcome, ReminderRepositories};
use crate::task::task_dto::{CreateTaskRequest, TaskListQuery, UpdateTaskRequest};
use crate::task::task_filters::{DueDateBucket, StatusFilter};
use crate::task::task_models::Task;
use crate::task::task_repository::{TaskFields, TaskFilters, TaskRepository};
use chrono::{FixedOffset, Utc};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

/// Service layer for task‑related business logic.
///
/// Every write runs [`ReminderDispatcher::on_task_saved`] in the transaction
/// that wrote the task; broadcast and email follow the commit.
#[derive(Clone)]
pub struct TaskService {
    db: DbPool,
    repo: TaskRepository,
    categories: CategoryRepository,
    reminder_repos: ReminderRepositories,
    reminders: ReminderDispatcher,
    utc_offset: FixedOffset,
}

impl TaskService {
    pub fn new(
        db: DbPool,
        repo: TaskRepository,
        categories: CategoryRepository,
        reminder_repos: ReminderRepositories,
        reminders: ReminderDispatcher,
        utc_offset: FixedOffset,
    ) -> Self {
        Self {
            db,
            repo,
            categories,
            reminder_repos,
            reminders,
            utc_offset,
        }
    }

    pub async fn list_tasks(&self, user_id: Uuid, query: TaskListQuery) -> Result<(Vec<Task>, i64)> {
        let now = Utc::now();

        // A category that does not parse, does not exist or is not the caller's
        // leaves the list unfiltered.
        let category_id = match query.category.as_deref().and_then(|c| Uuid::parse_str(c).ok()) {
            Some(id) => self.categories.find_owned(id, user_id).await?.map(|c| c.id),
            None => None,
        };

        let filters = TaskFilters {
            status: query.status.as_deref().and_then(StatusFilter::parse),
            category_id,
            search: query.q.map(|q| q.trim().to_string()).filter(|q| !q.is_empty()),
            due_window: query
                .due_date_filter
                .as_deref()
                .and_then(DueDateBucket::parse)
                .map(|bucket| bucket.window(now, self.utc_offset)),
            page: PageParams {
                page: query.page,
                limit: query.limit,
            },
        };

        self.repo.find_all(user_id, filters).await
    }

    pub async fn get_task(&self, user_id: Uuid, task_id: Uuid) -> Result<Task> {
        let task = self.repo.find_by_id(task_id).await?;
        require_owner(task, user_id, "Task")
    }

    pub async fn create_task(&self, user_id: Uuid, payload: CreateTaskRequest) -> Result<Task> {
        self.check_category(user_id, payload.category_id).await?;

        let mut tx = self.db.begin().await?;
        let task = self
            .repo
            .create_with_tx(
                &mut tx,
                user_id,
                TaskFields {
                    title: &payload.title,
                    description: payload.description.as_deref(),
                    category_id: payload.category_id,
                    due_date: payload.due_date,
                    completed: payload.completed,
                    priority: payload.priority.unwrap_or_default(),
                },
            )
            .await?;
        let outcome = self.run_reminders(&mut tx, task).await?;
        tx.commit().await?;

        Ok(self.reminders.deliver(outcome).await)
    }

    pub async fn update_task(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        payload: UpdateTaskRequest,
    ) -> Result<Task> {
        let existing = self.get_task(user_id, task_id).await?;
        self.check_category(user_id, payload.category_id).await?;

        let mut tx = self.db.begin().await?;
        let task = self
            .repo
            .update_with_tx(
                &mut tx,
                task_id,
                TaskFields {
                    title: &payload.title,
                    description: payload.description.as_deref(),
                    category_id: payload.category_id,
                    due_date: payload.due_date,
                    completed: payload.completed,
                    priority: payload.priority.unwrap_or(existing.priority),
                },
            )
            .await?
            .ok_or_else(|| AppError::NotFound("Task not found".into()))?;
        let outcome = self.run_reminders(&mut tx, task).await?;
        tx.commit().await?;

        Ok(self.reminders.deliver(outcome).await)
    }

    pub async fn update_status(&self, user_id: Uuid, task_id: Uuid, completed: bool) -> Result<Task> {
        self.get_task(user_id, task_id).await?;

        let mut tx = self.db.begin().await?;
        let task = self
            .repo
            .update_completed_with_tx(&mut tx, task_id, completed)
            .await?
            .ok_or_else(|| AppError::NotFound("Task not found".into()))?;
        let outcome = self.run_reminders(&mut tx, task).await?;
        tx.commit().await?;

        Ok(self.reminders.deliver(outcome).await)
    }

    pub async fn delete_task(&self, user_id: Uuid, task_id: Uuid) -> Result<()> {
        self.get_task(user_id, task_id).await?;
        self.repo.delete(task_id).await?;
        Ok(())
    }

    async fn run_reminders(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        task: Task,
    ) -> Result<ReminderOutcome> {
        let mut store = self.reminder_repos.in_tx(tx);
        self.reminders.on_task_saved(&mut store, task, Utc::now()).await
    }

    async fn check_category(&self, user_id: Uuid, category_id: Option<Uuid>) -> Result<()> {
        if let Some(category_id) = category_id {
            self.categories
                .find_owned(category_id, user_id)
                .await?
                .ok_or_else(|| AppError::BadRequest("Select a valid category".into()))?;
        }
        Ok(())
    }
}
