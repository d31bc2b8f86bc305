use axum::{extract::State, Json};

use crate::{error::Result, middleware::AuthUser, state::AppState};
use super::dashboard_dto::DashboardResponse;

/// Summary of the authenticated user's tasks and notifications
#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Dashboard summary", body = DashboardResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "dashboard",
    security(("bearer_auth" = []))
)]
pub async fn get_dashboard(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<DashboardResponse>> {
    let dashboard = state.dashboard_service.get_dashboard(user_id).await?;
    Ok(Json(dashboard))
}
