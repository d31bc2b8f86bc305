use crate::{
    auth, category, dashboard, middleware::auth_middleware, notification, state::AppState, task,
    user,
};
use axum::{
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::auth_handlers::register,
        auth::auth_handlers::login,
        auth::auth_handlers::refresh_token,
        auth::auth_handlers::logout,
        user::user_handlers::get_current_user,
        user::user_handlers::update_current_user,
        user::user_handlers::change_password,
        user::user_handlers::delete_current_user,
        task::task_handlers::get_tasks,
        task::task_handlers::get_task,
        task::task_handlers::create_task,
        task::task_handlers::update_task,
        task::task_handlers::delete_task,
        task::task_handlers::update_task_status,
        category::category_handlers::get_categories,
        category::category_handlers::get_category,
        category::category_handlers::create_category,
        category::category_handlers::update_category,
        category::category_handlers::delete_category,
        notification::notification_handlers::get_notifications,
        notification::notification_handlers::get_unread_count,
        notification::notification_handlers::notification_stream,
        notification::notification_handlers::mark_notification_read,
        notification::notification_handlers::delete_notification,
        dashboard::dashboard_handlers::get_dashboard,
    ),
    components(
        schemas(
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::AuthResponse,
            auth::RefreshTokenRequest,
            auth::RefreshTokenResponse,
            user::UserResponse,
            user::UpdateProfileRequest,
            user::ChangePasswordRequest,
            task::Task,
            task::TaskPriority,
            task::CreateTaskRequest,
            task::UpdateTaskRequest,
            task::UpdateTaskStatusRequest,
            task::task_repository::CategoryTaskCount,
            category::Category,
            category::CategoryWithCount,
            category::CategoryRequest,
            notification::Notification,
            notification::NotificationType,
            notification::UnreadCountResponse,
            dashboard::DashboardResponse,
            crate::pagination::TaskPage,
            crate::pagination::NotificationPage,
        )
    ),
    tags(
        (name = "auth", description = "Authentication endpoints"),
        (name = "users", description = "Current user profile"),
        (name = "tasks", description = "Task management endpoints"),
        (name = "categories", description = "Task categories"),
        (name = "notifications", description = "Reminder notifications"),
        (name = "dashboard", description = "Task summary")
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            )
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh_token))
        .route("/logout", post(auth::logout));

    // Protected routes (auth required)
    let user_routes = Router::new()
        .route(
            "/me",
            get(user::get_current_user)
                .put(user::update_current_user)
                .delete(user::delete_current_user),
        )
        .route("/me/password", put(user::change_password));

    let task_routes = Router::new()
        .route("/", get(task::get_tasks).post(task::create_task))
        .route(
            "/:id",
            get(task::get_task)
                .put(task::update_task)
                .delete(task::delete_task),
        )
        .route("/:id/status", patch(task::update_task_status));

    let category_routes = Router::new()
        .route("/", get(category::get_categories).post(category::create_category))
        .route(
            "/:id",
            get(category::get_category)
                .put(category::update_category)
                .delete(category::delete_category),
        );

    let notification_routes = Router::new()
        .route("/", get(notification::get_notifications))
        .route("/unread-count", get(notification::get_unread_count))
        .route("/stream", get(notification::notification_stream))
        .route("/:id/read", patch(notification::mark_notification_read))
        .route("/:id", axum::routing::delete(notification::delete_notification));

    let protected_routes = Router::new()
        .nest("/users", user_routes)
        .nest("/tasks", task_routes)
        .nest("/categories", category_routes)
        .nest("/notifications", notification_routes)
        .route("/dashboard", get(dashboard::get_dashboard))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Combine all routes
    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(protected_routes);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
