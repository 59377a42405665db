use async_trait::async_trait;
use eyre::{Context as _, Error};
use log::{error, info};
use process::rates::RatesBg;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracker::Tracker;

pub mod process;

/// Periodic job run by the scheduler. A failed run is logged and the job
/// stays scheduled.
#[async_trait]
pub trait Task {
    const NAME: &'static str;

    fn cron(&self) -> &str;

    async fn process(&mut self) -> Result<(), Error>;
}

/// Starts the background jobs. The returned scheduler keeps them running.
pub async fn start(tracker: Tracker, rates_cron: &str) -> Result<JobScheduler, Error> {
    let scheduler = JobScheduler::new()
        .await
        .context("Failed to create scheduler")?;
    schedule(&scheduler, RatesBg::new(tracker, rates_cron)).await?;
    scheduler
        .start()
        .await
        .context("Failed to start scheduler")?;
    Ok(scheduler)
}

async fn schedule<T>(scheduler: &JobScheduler, task: T) -> Result<(), Error>
where
    T: Task + Clone + Send + Sync + 'static,
{
    let cron = task.cron().to_owned();
    let job = Job::new_async(cron.as_str(), move |_, _| {
        let mut task = task.clone();
        Box::pin(async move {
            info!("Running {}", T::NAME);
            if let Err(err) = task.process().await {
                error!("{} failed: {:#}", T::NAME, err);
            }
        })
    })
    .with_context(|| format!("Invalid schedule of {}: '{}'", T::NAME, cron))?;
    scheduler
        .add(job)
        .await
        .with_context(|| format!("Failed to schedule {}", T::NAME))?;
    info!("Scheduled {} at '{}'", T::NAME, cron);
    Ok(())
}
