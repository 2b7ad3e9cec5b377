//! Runtime configuration
//!
//! Environment-variable driven (`RPC_URL`, `WEBSOCKET_URL`,
//! `WALLET_ADDRESS`) with command-line overrides, validated before any
//! service starts. The library never reads the environment on its own;
//! the binary calls `Config::load()` once and passes the result down.

use std::str::FromStr;
use std::time::Duration;

use clap::Parser;
use solana_sdk::pubkey::Pubkey;
use url::Url;

use crate::errors::ConfigError;

/// Wrapped-SOL mint, the intermediate leg of every SOL-denominated swap.
pub const WSOL_MINT: &str = "So11111111111111111111111111111111111111112";

/// Watch-workflow defaults matching the downstream trading consumer.
pub const DEFAULT_BUY_SIGNATURE_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_BUY_EVENT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SELL_TIMEOUT_SECS: u64 = 21_600;

#[derive(Debug, Parser)]
#[command(
    name = "swapwatch",
    about = "Watches a wallet's on-chain swaps and tracks per-token positions"
)]
pub struct Args {
    /// HTTP RPC endpoint (overrides RPC_URL)
    #[arg(long)]
    pub rpc_url: Option<String>,

    /// Websocket endpoint (overrides WEBSOCKET_URL)
    #[arg(long)]
    pub ws_url: Option<String>,

    /// Wallet address to monitor (overrides WALLET_ADDRESS)
    #[arg(long)]
    pub wallet: Option<String>,

    /// Token mint to track from startup; repeatable
    #[arg(long = "track", value_name = "MINT")]
    pub track: Vec<String>,

    /// Seconds to wait for a buy signature in the watch workflow
    #[arg(long, default_value_t = DEFAULT_BUY_SIGNATURE_TIMEOUT_SECS)]
    pub buy_timeout: u64,

    /// Seconds to wait for the position to close in the watch workflow
    #[arg(long, default_value_t = DEFAULT_SELL_TIMEOUT_SECS)]
    pub sell_timeout: u64,
}

/// Parse CLI arguments, leaving logging flags to the logger's own argv scan.
pub fn parse_args() -> Args {
    let filtered: Vec<String> = std::env::args()
        .filter(|a| {
            !(a == "--verbose"
                || a == "--quiet"
                || a.starts_with("--debug-")
                || a.starts_with("--verbose-"))
        })
        .collect();
    Args::parse_from(filtered)
}

#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: String,
    pub ws_url: String,
    pub wallet_address: String,
    /// Mints to start tracking at startup.
    pub tracked_mints: Vec<String>,
    pub buy_signature_timeout: Duration,
    pub buy_event_timeout: Duration,
    pub sell_timeout: Duration,
}

impl Config {
    /// Merge CLI arguments over environment variables and validate.
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let rpc_url = args
            .rpc_url
            .clone()
            .or_else(|| env_var("RPC_URL"))
            .ok_or(ConfigError::MissingVar("RPC_URL"))?;
        let ws_url = args
            .ws_url
            .clone()
            .or_else(|| env_var("WEBSOCKET_URL"))
            .ok_or(ConfigError::MissingVar("WEBSOCKET_URL"))?;
        let wallet_address = args
            .wallet
            .clone()
            .or_else(|| env_var("WALLET_ADDRESS"))
            .ok_or(ConfigError::MissingVar("WALLET_ADDRESS"))?;

        let config = Self {
            rpc_url,
            ws_url,
            wallet_address,
            tracked_mints: args.track.clone(),
            buy_signature_timeout: Duration::from_secs(args.buy_timeout),
            buy_event_timeout: Duration::from_secs(DEFAULT_BUY_EVENT_TIMEOUT_SECS),
            sell_timeout: Duration::from_secs(args.sell_timeout),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let rpc = Url::parse(&self.rpc_url).map_err(|e| ConfigError::Invalid {
            name: "RPC_URL",
            reason: e.to_string(),
        })?;
        if !matches!(rpc.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                name: "RPC_URL",
                reason: format!("expected http(s) url, got scheme '{}'", rpc.scheme()),
            });
        }

        let ws = Url::parse(&self.ws_url).map_err(|e| ConfigError::Invalid {
            name: "WEBSOCKET_URL",
            reason: e.to_string(),
        })?;
        if !matches!(ws.scheme(), "ws" | "wss") {
            return Err(ConfigError::Invalid {
                name: "WEBSOCKET_URL",
                reason: format!("expected ws(s) url, got scheme '{}'", ws.scheme()),
            });
        }

        Pubkey::from_str(&self.wallet_address).map_err(|e| ConfigError::Invalid {
            name: "WALLET_ADDRESS",
            reason: e.to_string(),
        })?;

        for mint in &self.tracked_mints {
            Pubkey::from_str(mint).map_err(|e| ConfigError::Invalid {
                name: "tracked mint",
                reason: format!("{}: {}", mint, e),
            })?;
        }

        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
