use std::{env::var, sync::Arc};

use dotenv::dotenv;
use eyre::{eyre, Error};
use log::debug;

pub const DEFAULT_DB_NAME: &str = "tip_tracker";
pub const DEFAULT_RATES_API_URL: &str = "https://open.er-api.com/v6/latest/USD";
pub const DEFAULT_BASE_CURRENCY: &str = "USD";
pub const DEFAULT_RATES_REFRESH_CRON: &str = "0 0 * * * *";
pub const DEFAULT_RUST_LOG: &str = "info";

#[derive(Clone)]
pub struct Env(Arc<EnvInner>);

#[derive(Clone)]
pub struct EnvInner {
    mongo_url: String,
    db_name: String,
    rates_api_url: String,
    base_currency: String,
    rates_refresh_cron: String,
    rust_log: String,
}

impl Env {
    pub fn mongo_url(&self) -> &str {
        &self.0.mongo_url
    }

    pub fn db_name(&self) -> &str {
        &self.0.db_name
    }

    pub fn rates_api_url(&self) -> &str {
        &self.0.rates_api_url
    }

    /// Base currency applied when no settings are stored yet.
    pub fn base_currency(&self) -> &str {
        &self.0.base_currency
    }

    pub fn rates_refresh_cron(&self) -> &str {
        &self.0.rates_refresh_cron
    }

    pub fn rust_log(&self) -> &str {
        &self.0.rust_log
    }

    /// Reads the process environment, after loading `.env` when present.
    pub fn load() -> Result<Env, Error> {
        if let Err(err) = dotenv() {
            debug!("No .env loaded: {}", err);
        }
        Env::from_lookup(|name| var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Env, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |name: &str, default: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_owned())
        };
        Ok(Env(Arc::new(EnvInner {
            mongo_url: lookup("MONGO_URL")
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| eyre!("MONGO_URL is not set"))?,
            db_name: value("DB_NAME", DEFAULT_DB_NAME),
            rates_api_url: value("RATES_API_URL", DEFAULT_RATES_API_URL),
            base_currency: value("BASE_CURRENCY", DEFAULT_BASE_CURRENCY),
            rates_refresh_cron: value("RATES_REFRESH_CRON", DEFAULT_RATES_REFRESH_CRON),
            rust_log: value("RUST_LOG", DEFAULT_RUST_LOG),
        })))
    }
}
