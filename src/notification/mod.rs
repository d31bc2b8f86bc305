pub mod notification_models;
pub mod notification_dto;
pub mod notification_repository;
pub mod notification_handlers;

pub use notification_models::{Notification, NotificationType};
pub use notification_dto::UnreadCountResponse;
pub use notification_handlers::{
    delete_notification, get_notifications, get_unread_count, mark_notification_read,
    notification_stream,
};
