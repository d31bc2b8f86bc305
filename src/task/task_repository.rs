use crate::error::Result;
use crate::pagination::PageParams;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use utoipa::ToSchema;
use uuid::Uuid;

use super::task_filters::{contains_pattern, DueWindow, StatusFilter};
use super::task_models::{Task, TaskPriority};

#[derive(Clone)]
pub struct TaskRepository {
    pool: PgPool,
}

#[derive(Debug, Default)]
pub struct TaskFilters {
    pub status: Option<StatusFilter>,
    pub category_id: Option<Uuid>,
    pub search: Option<String>,
    pub due_window: Option<DueWindow>,
    pub page: PageParams,
}

/// Editable task fields, written as a whole on create and update.
#[derive(Debug, Clone, Copy)]
pub struct TaskFields<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub category_id: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
    pub completed: bool,
    pub priority: TaskPriority,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct CategoryTaskCount {
    pub category_name: String,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, FromRow)]
pub struct TaskCounts {
    pub total: i64,
    pub completed: i64,
    pub pending: i64,
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, user_id: Uuid, filters: &TaskFilters) {
    qb.push(" WHERE user_id = ").push_bind(user_id);

    if let Some(status) = filters.status {
        qb.push(" AND completed = ").push_bind(status.completed());
    }

    if let Some(category_id) = filters.category_id {
        qb.push(" AND category_id = ").push_bind(category_id);
    }

    if let Some(search) = filters.search.as_deref().filter(|s| !s.is_empty()) {
        let pattern = contains_pattern(search);
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    match filters.due_window {
        Some(DueWindow::PendingBefore(now)) => {
            qb.push(" AND completed = FALSE AND due_date < ").push_bind(now);
        }
        Some(DueWindow::Between(start, end)) => {
            qb.push(" AND due_date BETWEEN ")
                .push_bind(start)
                .push(" AND ")
                .push_bind(end);
        }
        Some(DueWindow::After(instant)) => {
            qb.push(" AND due_date > ").push_bind(instant);
        }
        Some(DueWindow::Unscheduled) => {
            qb.push(" AND due_date IS NULL");
        }
        None => {}
    }
}

impl TaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_all(&self, user_id: Uuid, filters: TaskFilters) -> Result<(Vec<Task>, i64)> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tasks");
        push_filters(&mut count_query, user_id, &filters);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM tasks");
        push_filters(&mut query, user_id, &filters);
        query
            .push(" ORDER BY completed ASC, due_date ASC NULLS LAST, created_at DESC LIMIT ")
            .push_bind(i64::from(filters.page.limit()))
            .push(" OFFSET ")
            .push_bind(filters.page.offset());

        let tasks = query
            .build_query_as::<Task>()
            .fetch_all(&self.pool)
            .await?;

        Ok((tasks, total))
    }

    /// Looks a task up regardless of owner; callers check ownership.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    pub async fn create_with_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        user_id: Uuid,
        fields: TaskFields<'_>,
    ) -> Result<Task> {
        let task = sqlx::query_as::<_, Task>(
            "INSERT INTO tasks (user_id, title, description, category_id, due_date, completed, priority)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *"
        )
        .bind(user_id)
        .bind(fields.title)
        .bind(fields.description)
        .bind(fields.category_id)
        .bind(fields.due_date)
        .bind(fields.completed)
        .bind(fields.priority)
        .fetch_one(&mut **tx)
        .await?;

        Ok(task)
    }

    pub async fn update_with_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: Uuid,
        fields: TaskFields<'_>,
    ) -> Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(
            "UPDATE tasks SET
                title = $1,
                description = $2,
                category_id = $3,
                due_date = $4,
                completed = $5,
                priority = $6,
                updated_at = NOW()
             WHERE id = $7
             RETURNING *"
        )
        .bind(fields.title)
        .bind(fields.description)
        .bind(fields.category_id)
        .bind(fields.due_date)
        .bind(fields.completed)
        .bind(fields.priority)
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(task)
    }

    pub async fn update_completed_with_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: Uuid,
        completed: bool,
    ) -> Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(
            "UPDATE tasks SET completed = $1, updated_at = NOW()
             WHERE id = $2
             RETURNING *"
        )
        .bind(completed)
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(task)
    }

    /// Raises the reminder flag if it is down. Returns false when another save
    /// already holds it, in which case no new reminder may be created.
    ///
    /// `updated_at` is left alone on both flag writes.
    pub async fn claim_reminder_with_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: Uuid,
    ) -> Result<bool> {
        let claimed = sqlx::query_scalar::<_, Uuid>(
            "UPDATE tasks SET has_active_reminder_notification = TRUE
             WHERE id = $1 AND has_active_reminder_notification = FALSE
             RETURNING id"
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(claimed.is_some())
    }

    pub async fn release_reminder_with_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: Uuid,
    ) -> Result<()> {
        sqlx::query("UPDATE tasks SET has_active_reminder_notification = FALSE WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Notifications attached to the task are removed by `ON DELETE CASCADE`.
    pub async fn delete(&self, id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn count_by_status(&self, user_id: Uuid) -> Result<TaskCounts> {
        let counts = sqlx::query_as::<_, TaskCounts>(
            "SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE completed) AS completed,
                COUNT(*) FILTER (WHERE NOT completed) AS pending
             FROM tasks
             WHERE user_id = $1"
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(counts)
    }

    pub async fn find_overdue(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks
             WHERE user_id = $1 AND completed = FALSE AND due_date < $2
             ORDER BY due_date"
        )
        .bind(user_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    pub async fn find_pending_due_between(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks
             WHERE user_id = $1 AND completed = FALSE AND due_date BETWEEN $2 AND $3
             ORDER BY due_date"
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    pub async fn count_by_category(&self, user_id: Uuid) -> Result<Vec<CategoryTaskCount>> {
        let rows = sqlx::query_as::<_, CategoryTaskCount>(
            "SELECT COALESCE(c.name, 'No Category') AS category_name, COUNT(*) AS count
             FROM tasks t
             LEFT JOIN categories c ON c.id = t.category_id
             WHERE t.user_id = $1
             GROUP BY 1
             ORDER BY 1"
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
