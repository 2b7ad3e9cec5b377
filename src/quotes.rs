//! Spot price lookups
//!
//! SOL/USD comes from the Binance public ticker. Lookups are best-effort:
//! the watch workflow degrades to "valuation unavailable" on any failure,
//! and monitoring itself never depends on them.

use std::time::Duration;

use serde::Deserialize;

use crate::errors::QuoteError;
use crate::logger::{self, LogTag};

const SOL_TICKER_URL: &str = "https://api.binance.com/api/v3/ticker/price?symbol=SOLUSDT";

/// Lookups sit on the watch workflow's path between buy confirmation and
/// valuation; a stale answer is worth less than a fast failure.
const QUOTE_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Deserialize)]
struct TickerPrice {
    #[serde(default)]
    price: Option<String>,
}

pub struct QuoteClient {
    http: reqwest::Client,
}

impl QuoteClient {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder().timeout(QUOTE_TIMEOUT).build()?,
        })
    }

    /// Current SOL/USD spot price.
    pub async fn sol_usd_price(&self) -> Result<f64, QuoteError> {
        let response = self
            .http
            .get(SOL_TICKER_URL)
            .send()
            .await?
            .error_for_status()?;
        let ticker: TickerPrice = response.json().await?;
        let price = price_from_ticker(ticker)?;
        logger::debug(LogTag::Quotes, &format!("SOL/USD at {:.2}", price));
        Ok(price)
    }
}

fn price_from_ticker(ticker: TickerPrice) -> Result<f64, QuoteError> {
    let text = ticker.price.ok_or(QuoteError::Empty)?;
    text.parse::<f64>()
        .map_err(|_| QuoteError::Malformed(format!("price '{}' is not numeric", text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ticker_price() {
        let ticker: TickerPrice =
            serde_json::from_str(r#"{"symbol":"SOLUSDT","price":"194.52000000"}"#).unwrap();
        assert_eq!(price_from_ticker(ticker).unwrap(), 194.52);
    }

    #[test]
    fn missing_price_is_empty() {
        let ticker: TickerPrice = serde_json::from_str(r#"{"symbol":"SOLUSDT"}"#).unwrap();
        assert!(matches!(price_from_ticker(ticker), Err(QuoteError::Empty)));
    }

    #[test]
    fn non_numeric_price_is_malformed() {
        let ticker: TickerPrice =
            serde_json::from_str(r#"{"symbol":"SOLUSDT","price":"n/a"}"#).unwrap();
        assert!(matches!(
            price_from_ticker(ticker),
            Err(QuoteError::Malformed(_))
        ));
    }
}
