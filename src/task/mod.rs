pub mod task_models;
pub mod task_dto;
pub mod task_filters;
pub mod task_repository;
pub mod task_handlers;
pub mod task_service;

pub use task_models::{Task, TaskPriority};
pub use task_dto::{CreateTaskRequest, UpdateTaskRequest, UpdateTaskStatusRequest};
pub use task_handlers::{create_task, delete_task, get_task, get_tasks, update_task, update_task_status};
