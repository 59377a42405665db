use std::{collections::BTreeMap, time::Duration};

use eyre::{bail, Context as _, Error};
use log::debug;
use serde::Deserialize;

pub const DEFAULT_URL: &str = "https://open.er-api.com/v6/latest/USD";

const TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Deserialize)]
struct LatestRates {
    #[serde(default)]
    result: Option<String>,
    #[serde(default, rename = "error-type")]
    error_type: Option<String>,
    #[serde(default)]
    rates: BTreeMap<String, f64>,
}

/// Client of the public "latest rates" endpoint. Rates are relative to USD.
#[derive(Clone)]
pub struct RatesApi {
    url: String,
    client: reqwest::Client,
}

impl RatesApi {
    pub fn new(url: impl Into<String>) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(TIMEOUT)
            .build()
            .context("Failed to build http client")?;
        Ok(RatesApi {
            url: url.into(),
            client,
        })
    }

    pub async fn fetch(&self) -> Result<BTreeMap<String, f64>, Error> {
        debug!("Fetching exchange rates from {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .context("Exchange rate request failed")?;
        let status = response.status();
        if !status.is_success() {
            bail!("Exchange rate endpoint answered {}", status);
        }
        let body = response
            .text()
            .await
            .context("Failed to read exchange rate response")?;
        parse_rates(&body)
    }
}

pub fn parse_rates(body: &str) -> Result<BTreeMap<String, f64>, Error> {
    let latest: LatestRates =
        serde_json::from_str(body).context("Malformed exchange rate response")?;
    if latest.result.as_deref() == Some("error") {
        bail!(
            "Exchange rate endpoint reported an error: {}",
            latest.error_type.as_deref().unwrap_or("unknown")
        );
    }
    let rates: BTreeMap<String, f64> = latest
        .rates
        .into_iter()
        .filter(|(_, rate)| rate.is_finite() && *rate > 0.0)
        .collect();
    if rates.is_empty() {
        bail!("Exchange rate response has no rates");
    }
    Ok(rates)
}
