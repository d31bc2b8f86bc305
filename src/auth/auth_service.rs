use crate::auth::auth_repository::RefreshTokenRepository;
use crate::auth::jwt::{TokenKind, REFRESH_TOKEN_DAYS};
use crate::auth::{create_access_token, create_refresh_token, hash_password, verify_jwt, verify_password};
use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::user::user_models::User;
use crate::user::user_repository::UserRepository;
use chrono::{Duration, Utc};

#[derive(Clone)]
pub struct AuthService {
    db: DbPool,
    user_repo: UserRepository,
    refresh_token_repo: RefreshTokenRepository,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(
        db: DbPool,
        user_repo: UserRepository,
        refresh_token_repo: RefreshTokenRepository,
        jwt_secret: String,
    ) -> Self {
        Self {
            db,
            user_repo,
            refresh_token_repo,
            jwt_secret,
        }
    }

    pub async fn register(
        &self,
        username: &str,
        email: Option<&str>,
        password: &str,
    ) -> Result<(User, String, String)> {
        let password_hash = hash_password(password)?;

        let mut tx = self.db.begin().await?;

        let user = self
            .user_repo
            .create_with_tx(&mut tx, username, email, &password_hash)
            .await
            .map_err(|e| {
                if e.is_unique_violation() {
                    AppError::BadRequest("User already exists".to_string())
                } else {
                    e
                }
            })?;

        let (access_token, refresh_token) = self.issue_tokens(&mut tx, &user).await?;

        tx.commit().await?;

        tracing::info!("Registered user {}", user.username);
        Ok((user, access_token, refresh_token))
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<(User, String, String)> {
        let user = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid credentials".into()))?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Authentication("Invalid credentials".into()));
        }

        let mut tx = self.db.begin().await?;
        let (access_token, refresh_token) = self.issue_tokens(&mut tx, &user).await?;
        tx.commit().await?;

        Ok((user, access_token, refresh_token))
    }

    /// Exchanges a stored refresh token for a fresh access token, rotating the
    /// refresh token in the same transaction.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<(String, String)> {
        let claims = verify_jwt(refresh_token, &self.jwt_secret)?;
        if claims.kind != TokenKind::Refresh {
            return Err(AppError::Authentication("Invalid refresh token".into()));
        }

        let user_id = self
            .refresh_token_repo
            .find_owner(refresh_token)
            .await?
            .filter(|owner| owner.to_string() == claims.sub)
            .ok_or_else(|| AppError::Authentication("Invalid refresh token".into()))?;

        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Authentication("User not found".into()))?;

        let mut tx = self.db.begin().await?;
        self.refresh_token_repo
            .delete_by_token_with_tx(&mut tx, refresh_token)
            .await?;
        let tokens = self.issue_tokens(&mut tx, &user).await?;
        tx.commit().await?;

        Ok(tokens)
    }

    pub async fn logout(&self, refresh_token: &str) -> Result<()> {
        self.refresh_token_repo
            .delete_by_token(refresh_token)
            .await
    }

    async fn issue_tokens(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        user: &User,
    ) -> Result<(String, String)> {
        let access_token = create_access_token(user.id, &user.username, &self.jwt_secret)?;
        let refresh_token = create_refresh_token(user.id, &user.username, &self.jwt_secret)?;

        let expires_at = Utc::now() + Duration::days(REFRESH_TOKEN_DAYS);
        self.refresh_token_repo
            .create_with_tx(tx, user.id, &refresh_token, expires_at)
            .await?;

        Ok((access_token, refresh_token))
    }
}
