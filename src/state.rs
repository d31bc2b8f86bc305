use crate::auth::{auth_repository::RefreshTokenRepository, auth_service::AuthService};
use crate::category::{category_repository::CategoryRepository, category_service::CategoryService};
use crate::dashboard::dashboard_service::DashboardService;
use crate::db::DbPool;
use crate::mail::Mailer;
use crate::notification::{notification_models::Notification, notification_repository::NotificationRepository};
use crate::reminder::{ReminderDispatcher, ReminderRepositories, ReminderSettings};
use crate::task::{task_repository::TaskRepository, task_service::TaskService};
use crate::user::{user_repository::UserRepository, user_service::UserService};
use anyhow::{bail, Context};
use chrono::FixedOffset;
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub notification_tx: broadcast::Sender<Notification>,
    pub refresh_token_repository: RefreshTokenRepository,
    pub notification_repository: NotificationRepository,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub task_service: TaskService,
    pub category_service: CategoryService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    pub fn new(db: DbPool, config: Arc<Config>, mailer: Arc<dyn Mailer>) -> Self {
        let (notification_tx, _) = broadcast::channel(100);

        let user_repository = UserRepository::new(db.clone());
        let task_repository = TaskRepository::new(db.clone());
        let category_repository = CategoryRepository::new(db.clone());
        let notification_repository = NotificationRepository::new(db.clone());
        let refresh_token_repository = RefreshTokenRepository::new(db.clone());

        let reminder_repos = ReminderRepositories::new(
            user_repository.clone(),
            task_repository.clone(),
            category_repository.clone(),
            notification_repository.clone(),
        );
        let reminders = ReminderDispatcher::new(
            mailer,
            ReminderSettings::from_config(&config),
            notification_tx.clone(),
        );

        let auth_service = AuthService::new(
            db.clone(),
            user_repository.clone(),
            refresh_token_repository.clone(),
            config.jwt_secret.clone(),
        );
        let user_service = UserService::new(user_repository.clone());
        let task_service = TaskService::new(
            db.clone(),
            task_repository.clone(),
            category_repository.clone(),
            reminder_repos,
            reminders,
            config.utc_offset,
        );
        let category_service = CategoryService::new(category_repository);
        let dashboard_service = DashboardService::new(
            user_repository,
            task_repository,
            notification_repository.clone(),
        );

        Self {
            config,
            notification_tx,
            refresh_token_repository,
            notification_repository,
            auth_service,
            user_service,
            task_service,
            category_service,
            dashboard_service,
        }
    }
}

/// Where reminder emails go.
#[derive(Clone, Debug, PartialEq)]
pub enum MailBackend {
    /// Write outgoing mail to the log instead of delivering it.
    Console,
    /// POST outgoing mail as JSON to a relay endpoint.
    Http { api_url: String, api_key: Option<String> },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    pub base_url: String,
    pub default_from_email: String,
    pub mail_backend: MailBackend,
    pub utc_offset: FixedOffset,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET must be set")?;

        let port = get_or("PORT", "3000")
            .parse()
            .context("PORT must be a number")?;

        let mail_backend = match get_or("MAIL_BACKEND", "console").to_lowercase().as_str() {
            "console" => MailBackend::Console,
            "http" => MailBackend::Http {
                api_url: lookup("MAIL_API_URL")
                    .context("MAIL_API_URL must be set when MAIL_BACKEND=http")?,
                api_key: lookup("MAIL_API_KEY"),
            },
            other => bail!("unknown MAIL_BACKEND '{}'", other),
        };

        let offset_minutes: i32 = get_or("UTC_OFFSET_MINUTES", "0")
            .parse()
            .context("UTC_OFFSET_MINUTES must be a whole number of minutes")?;
        let utc_offset = FixedOffset::east_opt(offset_minutes * 60)
            .context("UTC_OFFSET_MINUTES is out of range")?;

        Ok(Self {
            database_url,
            jwt_secret,
            host: get_or("HOST", "127.0.0.1"),
            port,
            base_url: get_or("BASE_URL", "http://127.0.0.1:3000"),
            default_from_email: get_or("DEFAULT_FROM_EMAIL", "webmaster@localhost"),
            mail_backend,
            utc_offset,
        })
    }
}
