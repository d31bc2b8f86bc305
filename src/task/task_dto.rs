use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::task_models::TaskPriority;
use crate::input::{trimmed, trimmed_opt};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTaskRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default, deserialize_with = "trimmed_opt")]
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
    pub priority: Option<TaskPriority>,
}

/// Replaces every editable field; omitted optional fields are cleared.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateTaskRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default, deserialize_with = "trimmed_opt")]
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
    pub completed: bool,
    pub priority: Option<TaskPriority>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTaskStatusRequest {
    pub completed: bool,
}

/// Raw task list query string. Values that do not parse are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct TaskListQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    pub q: Option<String>,
    pub due_date_filter: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_title_fails_validation() {
        let request: CreateTaskRequest = serde_json::from_str(r#"{"title": "   "}"#).unwrap();
        assert_eq!(request.title, "");
        assert!(request.validate().is_err());

        let request: UpdateTaskRequest =
            serde_json::from_str(r#"{"title": "\t ", "completed": false}"#).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_title_is_stored_trimmed() {
        let request: CreateTaskRequest =
            serde_json::from_str(r#"{"title": "  Write report  ", "description": "  "}"#).unwrap();
        assert!(request.validate().is_ok());
        assert_eq!(request.title, "Write report");
        assert_eq!(request.description, None);
        assert!(!request.completed);
    }
}
