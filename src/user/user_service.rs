use crate::{
    auth::{hash_password, verify_password},
    error::{AppError, Result},
    user::{
        user_dto::{ChangePasswordRequest, UpdateProfileRequest},
        user_models::UserResponse,
        user_repository::UserRepository,
    },
};
use uuid::Uuid;

#[derive(Clone)]
pub struct UserService {
    user_repository: UserRepository,
}

impl UserService {
    pub fn new(user_repository: UserRepository) -> Self {
        Self { user_repository }
    }

    pub async fn get_current_user(&self, user_id: Uuid) -> Result<UserResponse> {
        let user = self
            .user_repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(user.into())
    }

    pub async fn update_current_user(
        &self,
        user_id: Uuid,
        payload: UpdateProfileRequest,
    ) -> Result<UserResponse> {
        let user = self
            .user_repository
            .update_profile(
                user_id,
                payload.username.as_deref(),
                payload.email.as_deref(),
                payload.first_name.as_deref(),
                payload.last_name.as_deref(),
            )
            .await
            .map_err(|e| {
                if e.is_unique_violation() {
                    AppError::BadRequest("Username is already taken".to_string())
                } else {
                    e
                }
            })?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(UserResponse::from(user))
    }

    pub async fn change_password(&self, user_id: Uuid, payload: ChangePasswordRequest) -> Result<()> {
        let user = self
            .user_repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if !verify_password(&payload.current_password, &user.password_hash)? {
            return Err(AppError::Authentication("Current password is incorrect".to_string()));
        }

        let password_hash = hash_password(&payload.new_password)?;
        self.user_repository.update_password(user_id, &password_hash).await
    }

    pub async fn delete_current_user(&self, user_id: Uuid) -> Result<()> {
        let rows_affected = self.user_repository.delete_user(user_id).await?;
        if rows_affected == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        tracing::info!("Deleted account {}", user_id);
        Ok(())
    }
}
