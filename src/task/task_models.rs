use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// How far ahead a pending task counts as due soon.
pub const DUE_SOON_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskPriority::Low => write!(f, "low"),
            TaskPriority::Medium => write!(f, "medium"),
            TaskPriority::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Task {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
    pub completed: bool,
    pub priority: TaskPriority,
    /// Set while an unresolved overdue/due-soon notification exists for this task.
    pub has_active_reminder_notification: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.due_date.is_some_and(|due| due < now)
    }

    pub fn is_due_soon(&self, now: DateTime<Utc>) -> bool {
        let horizon = now + Duration::days(DUE_SOON_WINDOW_DAYS);
        !self.completed
            && !self.is_overdue(now)
            && self.due_date.is_some_and(|due| due <= horizon)
    }
}

impl crate::access::Owned for Task {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}
