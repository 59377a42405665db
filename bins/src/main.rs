use eyre::Context;
use exchange::RatesApi;
use log::info;
use model::currency::CurrencyCode;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let env = env::Env::load()?;
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", env.rust_log());
    }
    pretty_env_logger::init();
    color_eyre::install()?;

    info!("connecting to mongo");
    let storage = storage::Storage::new(env.mongo_url(), env.db_name())
        .await
        .context("Failed to create storage")?;
    let api = RatesApi::new(env.rates_api_url())?;
    info!("creating tracker");
    let tracker = tracker::Tracker::new(storage, api);

    let base: CurrencyCode = env
        .base_currency()
        .parse()
        .context("Invalid BASE_CURRENCY")?;
    let mut session = tracker.db.start_session().await?;
    tracker.init(&mut session, &base).await?;
    let source = tracker.refresh_rates(&mut session).await;
    info!(
        "Exchange rates: {:?}, base currency {}",
        source,
        tracker.currency.base_currency()
    );

    let mut scheduler = bg_process::start(tracker, env.rates_refresh_cron()).await?;
    info!("Running. Press Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    info!("Shutting down");
    scheduler.shutdown().await?;
    Ok(())
}
