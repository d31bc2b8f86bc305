use crate::auth::auth_repository::RefreshTokenRepository;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

/// Purges expired refresh tokens at the top of every hour.
pub async fn start_token_cleanup(
    repo: RefreshTokenRepository,
) -> Result<JobScheduler, Box<dyn std::error::Error + Send + Sync>> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async("0 0 * * * *", move |_uuid, _l| {
        let repo = repo.clone();

        Box::pin(async move {
            match repo.delete_expired().await {
                Ok(0) => {}
                Ok(removed) => info!("Removed {} expired refresh tokens", removed),
                Err(e) => error!("Error removing expired refresh tokens: {:?}", e),
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    info!("Refresh token cleanup scheduled");
    Ok(scheduler)
}
