pub mod user_models;
pub mod user_dto;
pub mod user_repository;
pub mod user_handlers;
pub mod user_service;

pub use user_models::UserResponse;
pub use user_dto::{ChangePasswordRequest, UpdateProfileRequest};
pub use user_handlers::{change_password, delete_current_user, get_current_user, update_current_user};
