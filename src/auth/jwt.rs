use crate::error::{AppError, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ACCESS_TOKEN_MINUTES: i64 = 15;
pub const REFRESH_TOKEN_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub username: String,
    pub kind: TokenKind,
    pub exp: i64,
    // Keeps two tokens minted in the same second distinct.
    pub jti: String,
}

fn create_token(
    user_id: Uuid,
    username: &str,
    kind: TokenKind,
    lifetime: Duration,
    secret: &str,
) -> Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(lifetime)
        .ok_or(AppError::InternalError)?
        .timestamp();

    let claims = Claims {
        sub: user_id.to_string(),
        username: username.to_string(),
        kind,
        exp: expiration,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AppError::Authentication("Failed to create token".to_string()))
}

/// Create access token (short-lived, 15 minutes)
pub fn create_access_token(user_id: Uuid, username: &str, secret: &str) -> Result<String> {
    create_token(
        user_id,
        username,
        TokenKind::Access,
        Duration::minutes(ACCESS_TOKEN_MINUTES),
        secret,
    )
}

/// Create refresh token (long-lived, 7 days)
pub fn create_refresh_token(user_id: Uuid, username: &str, secret: &str) -> Result<String> {
    create_token(
        user_id,
        username,
        TokenKind::Refresh,
        Duration::days(REFRESH_TOKEN_DAYS),
        secret,
    )
}

/// Verify JWT token and extract claims
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_token_claims() {
        let user_id = Uuid::new_v4();
        let token = create_access_token(user_id, "alice", "secret").unwrap();
        let claims = verify_jwt(&token, "secret").unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.kind, TokenKind::Access);
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_refresh_token_outlives_access_token() {
        let user_id = Uuid::new_v4();
        let access = verify_jwt(&create_access_token(user_id, "alice", "secret").unwrap(), "secret").unwrap();
        let refresh = verify_jwt(&create_refresh_token(user_id, "alice", "secret").unwrap(), "secret").unwrap();

        assert_eq!(refresh.kind, TokenKind::Refresh);
        assert!(refresh.exp > access.exp);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = create_access_token(Uuid::new_v4(), "alice", "secret").unwrap();
        assert!(matches!(verify_jwt(&token, "other"), Err(AppError::Unauthorized(_))));
    }
}
