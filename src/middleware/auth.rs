use crate::{
    auth::{verify_jwt, TokenKind},
    error::{AppError, Result},
    state::AppState,
};
use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// Id of the user an access token was issued to. Put into request extensions by
/// [`auth_middleware`]; handlers take it as an extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Uuid);

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Accepts only unexpired access tokens signed with `secret`.
fn authenticate(token: &str, secret: &str) -> Result<AuthUser> {
    let claims = verify_jwt(token, secret)?;
    if claims.kind != TokenKind::Access {
        return Err(AppError::Unauthorized("Invalid token".to_string()));
    }

    Uuid::parse_str(&claims.sub)
        .map(AuthUser)
        .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response> {
    let token = bearer_token(req.headers())
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;
    let user = authenticate(token, &state.config.jwt_secret)?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{create_access_token, create_refresh_token};
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers("bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("abc.def")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_access_token_authenticates_its_user() {
        let user_id = Uuid::new_v4();
        let token = create_access_token(user_id, "alice", "secret").unwrap();
        assert_eq!(authenticate(&token, "secret").unwrap(), AuthUser(user_id));
    }

    #[test]
    fn test_refresh_token_and_wrong_secret_are_rejected() {
        let user_id = Uuid::new_v4();
        let refresh = create_refresh_token(user_id, "alice", "secret").unwrap();
        assert!(matches!(authenticate(&refresh, "secret"), Err(AppError::Unauthorized(_))));

        let access = create_access_token(user_id, "alice", "secret").unwrap();
        assert!(matches!(authenticate(&access, "other"), Err(AppError::Unauthorized(_))));
    }
}
