pub mod jwt;
pub mod password;
pub mod token_cleanup;

pub mod auth_dto;
pub mod auth_repository;
pub mod auth_handlers;
pub mod auth_service;

pub use jwt::{create_access_token, create_refresh_token, verify_jwt, TokenKind};
pub use password::{hash_password, verify_password};
pub use token_cleanup::start_token_cleanup;
pub use auth_dto::{AuthResponse, LoginRequest, RegisterRequest, RefreshTokenRequest, RefreshTokenResponse};
pub use auth_handlers::{login, logout, refresh_token, register};
