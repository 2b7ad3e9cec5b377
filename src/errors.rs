//! Structured error types for the monitoring engine.
//!
//! Failure classes map onto how the engine reacts: transient fetch errors
//! consume a retry attempt, permanent ones short-circuit the signature,
//! websocket errors trigger the reconnect backoff, config errors abort
//! startup. Nothing here terminates the engine once it is running.

use thiserror::Error;

/// Errors from resolving a signature into transaction detail.
///
/// Transient variants are retried up to the fetcher's attempt budget;
/// permanent variants mean the signature can never produce a valid result
/// and the fetcher gives up on it immediately.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("rpc transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("rpc returned http status {0}")]
    HttpStatus(u16),

    #[error("transaction not indexed yet")]
    NotIndexed,

    #[error("transaction failed on-chain")]
    ExecutionFailed,

    #[error("monitored wallet absent from account keys")]
    WalletAbsent,

    #[error("malformed transaction detail: {0}")]
    Malformed(String),
}

impl FetchError {
    /// Whether another attempt could still succeed for this signature.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FetchError::Transport(_) | FetchError::HttpStatus(_) | FetchError::NotIndexed
        )
    }
}

/// Websocket subscription failures. Always recoverable: the stream loop
/// logs the error, waits the fixed backoff and reconnects from scratch.
#[derive(Debug, Error)]
pub enum WsError {
    #[error("websocket connect failed: {0}")]
    Connect(tokio_tungstenite::tungstenite::Error),

    #[error("websocket stream error: {0}")]
    Stream(tokio_tungstenite::tungstenite::Error),

    #[error("failed to build subscription request: {0}")]
    Subscribe(#[from] serde_json::Error),

    #[error("websocket closed by server")]
    Closed,

    #[error("signature channel closed")]
    ChannelClosed,
}

/// Startup configuration problems. Fatal before any service starts,
/// never produced afterwards.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is missing")]
    MissingVar(&'static str),

    #[error("invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Price/supply lookup failures. The watch workflow degrades to
/// "valuation unavailable" when these occur; monitoring is unaffected.
#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("quote request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed quote response: {0}")]
    Malformed(String),

    #[error("empty quote response")]
    Empty,
}
