// Jobs module - Scheduled background work

pub mod expiry_sweep;

use chrono::Utc;
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Starts the scheduler running the credential expiry sweep on `cron`
pub async fn start_scheduler(pool: PgPool, cron: &str) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    let sweep = Job::new_async(cron, move |_id, _scheduler| {
        let pool = pool.clone();
        Box::pin(async move {
            let today = Utc::now().date_naive();
            if let Err(e) = expiry_sweep::expire_overdue_credentials(&pool, today).await {
                tracing::error!(error = %e, "Credential expiry sweep failed");
            }
        })
    })?;

    scheduler.add(sweep).await?;
    scheduler.start().await?;

    tracing::info!(cron = %cron, "Job scheduler started");

    Ok(scheduler)
}
