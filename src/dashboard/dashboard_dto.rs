use serde::Serialize;
use utoipa::ToSchema;

use crate::task::task_models::Task;
use crate::task::task_repository::CategoryTaskCount;

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub username: String,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub pending_tasks: i64,
    pub overdue_count: usize,
    pub overdue_tasks: Vec<Task>,
    pub due_soon_count: usize,
    pub due_soon_tasks: Vec<Task>,
    /// Tasks without a category are grouped under "No Category".
    pub tasks_by_category: Vec<CategoryTaskCount>,
    pub unread_notifications: i64,
}
