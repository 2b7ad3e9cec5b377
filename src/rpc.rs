// =============================================================================
// SOLANA JSON-RPC CLIENT
// =============================================================================
//
// Thin HTTP wrapper around the two RPC methods the monitor needs:
// getTransaction (jsonParsed) and getTokenSupply. Retry policy lives with the
// callers; this layer only classifies a single request's outcome.

use std::time::Duration;

use serde_json::{json, Value};

use crate::errors::FetchError;
use crate::transactions::types::{TransactionEnvelope, UiTokenAmount};

/// Per-request cap so one stalled node cannot absorb a whole retry window.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct RpcClient {
    http: reqwest::Client,
    url: String,
}

impl RpcClient {
    pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    /// Fetch one confirmed transaction. `Ok(None)` means the node does not
    /// have the signature indexed yet, which callers treat as retryable.
    pub async fn get_transaction(
        &self,
        signature: &str,
    ) -> Result<Option<TransactionEnvelope>, FetchError> {
        let payload = transaction_request_payload(signature);
        let body = self.post_rpc(&payload).await?;

        let result = match body.get("result") {
            Some(value) if !value.is_null() => value.clone(),
            _ => return Ok(None),
        };

        let envelope: TransactionEnvelope = serde_json::from_value(result)
            .map_err(|e| FetchError::Malformed(format!("getTransaction result: {}", e)))?;
        Ok(Some(envelope))
    }

    /// Total UI-unit supply of a mint (raw amount scaled by decimals).
    pub async fn get_token_supply(&self, mint: &str) -> Result<f64, FetchError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getTokenSupply",
            "params": [mint]
        });
        let body = self.post_rpc(&payload).await?;

        let value = body
            .get("result")
            .and_then(|r| r.get("value"))
            .ok_or_else(|| FetchError::Malformed("getTokenSupply missing value".to_string()))?;
        parse_supply_value(value)
    }

    async fn post_rpc(&self, payload: &Value) -> Result<Value, FetchError> {
        let response = self
            .http
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() != 200 {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let body: Value = response.json().await?;
        Ok(body)
    }
}

fn transaction_request_payload(signature: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "getTransaction",
        "params": [
            signature,
            {
                "encoding": "jsonParsed",
                "maxSupportedTransactionVersion": 0,
                "commitment": "confirmed"
            }
        ]
    })
}

fn parse_supply_value(value: &Value) -> Result<f64, FetchError> {
    let amount: UiTokenAmount = serde_json::from_value(value.clone())
        .map_err(|e| FetchError::Malformed(format!("getTokenSupply value: {}", e)))?;

    let raw: u128 = amount
        .amount
        .parse()
        .map_err(|_| FetchError::Malformed(format!("supply amount '{}'", amount.amount)))?;
    Ok(raw as f64 / 10f64.powi(amount.decimals as i32))
}
