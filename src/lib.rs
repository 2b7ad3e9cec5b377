//! Real-time swap monitoring for a single Solana wallet
//!
//! Subscribes to the wallet's transaction log stream, resolves each
//! signature into balance changes, classifies buys and sells per token
//! mint, and tracks open positions until they close. Consumers interact
//! through [`monitor::SwapMonitor`]: tracking calls, blocking waiters and
//! event sinks.

pub mod config;
pub mod errors;
pub mod logger;
pub mod monitor;
pub mod positions;
pub mod quotes;
pub mod rpc;
pub mod shutdown;
pub mod transactions;
pub mod utils;
pub mod waiters;
pub mod websocket;
pub mod workflow;
