use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::Result,
    middleware::AuthUser,
    state::AppState,
};
use super::{
    category_dto::CategoryRequest,
    category_models::{Category, CategoryWithCount},
};

/// List the authenticated user's categories with task counts
#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "Categories ordered by name", body = Vec<CategoryWithCount>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "categories",
    security(("bearer_auth" = []))
)]
pub async fn get_categories(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<CategoryWithCount>>> {
    let categories = state.category_service.list_categories(user_id).await?;
    Ok(Json(categories))
}

/// Get a single category
#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category found", body = Category),
        (status = 403, description = "Category belongs to another user"),
        (status = 404, description = "Category not found")
    ),
    tag = "categories",
    security(("bearer_auth" = []))
)]
pub async fn get_category(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(category_id): Path<Uuid>,
) -> Result<Json<Category>> {
    let category = state.category_service.get_category(user_id, category_id).await?;
    Ok(Json(category))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Invalid input or duplicate name")
    ),
    tag = "categories",
    security(("bearer_auth" = []))
)]
pub async fn create_category(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CategoryRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let category = state.category_service.create_category(user_id, payload).await?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// Update a category
#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = Category),
        (status = 400, description = "Invalid input or duplicate name"),
        (status = 403, description = "Category belongs to another user"),
        (status = 404, description = "Category not found")
    ),
    tag = "categories",
    security(("bearer_auth" = []))
)]
pub async fn update_category(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(category_id): Path<Uuid>,
    Json(payload): Json<CategoryRequest>,
) -> Result<Json<Category>> {
    payload.validate()?;

    let category = state
        .category_service
        .update_category(user_id, category_id, payload)
        .await?;

    Ok(Json(category))
}

/// Delete a category; its tasks are kept without a category
#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 403, description = "Category belongs to another user"),
        (status = 404, description = "Category not found")
    ),
    tag = "categories",
    security(("bearer_auth" = []))
)]
pub async fn delete_category(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(category_id): Path<Uuid>,
) -> Result<StatusCode> {
    state.category_service.delete_category(user_id, category_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
