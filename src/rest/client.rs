//! Per-venue REST ticker fetches.

use std::time::Duration;

use reqwest::header::ACCEPT;
use serde_json::Value;
use tracing::warn;

use crate::domain::ExchangeId;
use crate::error::{Error, Result};
use crate::stream::RetryPolicy;
use crate::venue::Venue;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Kraken predates the BTC ticker symbol.
fn kraken_symbol(symbol: &str) -> String {
    let upper = symbol.to_uppercase();
    if upper == "BTC" {
        "XBT".to_owned()
    } else {
        upper
    }
}

/// Ticker endpoint for one venue, built over the registry's base URL.
fn ticker_url(venue: &Venue, symbol: &str) -> String {
    let base = venue.url.trim_end_matches('/');
    let upper = symbol.to_uppercase();
    let lower = symbol.to_lowercase();
    match venue.exchange {
        ExchangeId::Upbit | ExchangeId::Bithumb => {
            format!("{base}/ticker?markets=KRW-{upper}")
        }
        ExchangeId::Coinone => {
            format!("{base}/ticker_new/KRW/{upper}?additional_data=true")
        }
        ExchangeId::Korbit => format!("{base}/tickers?symbol={lower}_krw"),
        ExchangeId::Binance => format!("{base}/ticker/24hr?symbol={upper}USDT&type=FULL"),
        ExchangeId::Kraken => format!("{base}/Ticker?pair={}USD", kraken_symbol(symbol)),
        ExchangeId::Coinbase => format!("{base}/products/{upper}-USDT/stats"),
        ExchangeId::Okx => format!("{base}/market/ticker?instId={upper}-USDT"),
        ExchangeId::Gateio => format!("{base}/tickers?currency_pair={lower}_usdt"),
        ExchangeId::Bybit => {
            format!("{base}/market/tickers?category=spot&symbol={upper}USDT")
        }
    }
}

/// Strip each venue's response envelope down to the ticker object the
/// parameter list indexes into.
fn unwrap_payload(exchange: ExchangeId, symbol: &str, payload: Value) -> Result<Value> {
    let missing = || Error::Pipeline(format!("{exchange}: unexpected ticker response shape"));
    match exchange {
        ExchangeId::Upbit | ExchangeId::Bithumb | ExchangeId::Gateio => payload
            .as_array()
            .and_then(|items| items.first().cloned())
            .ok_or_else(missing),
        ExchangeId::Coinone => payload
            .pointer("/tickers/0")
            .cloned()
            .ok_or_else(missing),
        ExchangeId::Korbit | ExchangeId::Okx => payload
            .pointer("/data/0")
            .cloned()
            .ok_or_else(missing),
        ExchangeId::Kraken => {
            let pair = format!("X{}ZUSD", kraken_symbol(symbol));
            payload
                .pointer(&format!("/result/{pair}"))
                .cloned()
                .ok_or_else(missing)
        }
        ExchangeId::Bybit => payload
            .pointer("/result/list/0")
            .cloned()
            .ok_or_else(missing),
        ExchangeId::Binance | ExchangeId::Coinbase => Ok(payload),
    }
}

/// JSON-over-HTTP client shared by every venue of a region's poller.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    policy: RetryPolicy,
}

impl Default for RestClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RestClient {
    #[must_use]
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            policy: RetryPolicy::default(),
        }
    }

    /// Fetch and unwrap one venue's ticker payload, retrying HTTP and
    /// client errors with the standard backoff curve.
    pub async fn fetch_ticker(&self, venue: &Venue, symbol: &str) -> Result<Value> {
        let url = ticker_url(venue, symbol);
        let mut attempt: u32 = 0;

        loop {
            match self.get_json(&url).await {
                Ok(payload) => return unwrap_payload(venue.exchange, symbol, payload),
                Err(err) if attempt + 1 < self.policy.retries => {
                    let delay = self.policy.delay(attempt);
                    attempt += 1;
                    warn!(
                        url,
                        error = %err,
                        attempt,
                        delay_ms = delay.as_millis(),
                        "ticker fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        let response = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}
