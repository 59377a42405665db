use async_trait::async_trait;
use eyre::Error;
use log::{info, warn};
use tracker::{service::currency::RatesSource, Tracker};

use crate::Task;

#[derive(Clone)]
pub struct RatesBg {
    tracker: Tracker,
    cron: String,
}

impl RatesBg {
    pub fn new(tracker: Tracker, cron: &str) -> RatesBg {
        RatesBg {
            tracker,
            cron: cron.to_owned(),
        }
    }
}

#[async_trait]
impl Task for RatesBg {
    const NAME: &'static str = "rates-refresh";

    fn cron(&self) -> &str {
        &self.cron
    }

    async fn process(&mut self) -> Result<(), Error> {
        let mut session = self.tracker.db.start_session().await?;
        match self.tracker.refresh_rates(&mut session).await {
            RatesSource::Remote => info!("Exchange rates refreshed"),
            RatesSource::Cached => warn!("Using cached exchange rates"),
            RatesSource::Unavailable => warn!("No exchange rates available"),
        }
        Ok(())
    }
}
