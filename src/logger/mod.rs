//! Structured console logging
//!
//! Colored, tag-aligned logging with standard levels and per-subsystem
//! debug gating:
//!
//! ```rust
//! use swapwatch::logger::{self, LogTag};
//!
//! logger::info(LogTag::Websocket, "Subscription confirmed");
//! logger::debug(LogTag::Fetch, "Attempt 3 of 15"); // only with --debug-fetch
//! ```
//!
//! Call `logger::init()` once at startup; it reads `LOG_LEVEL` and scans
//! argv for `--quiet`, `--verbose` and `--debug-<tag>` flags.

mod config;
mod core;
mod format;
mod levels;
mod special;
mod tags;

pub use config::{get_logger_config, set_logger_config, LoggerConfig};
pub use levels::LogLevel;
pub use special::{log_buy_confirmation, log_sell_valuation, valuation_delta_percent};
pub use tags::LogTag;

/// Initialize the logger from argv and environment. Call once at startup.
pub fn init() {
    config::init_from_args();
}

/// Log at ERROR level. Always shown.
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level.
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level. Standard operational messages.
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level. Shown only with --debug-<tag> for this tag.
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level. Shown only with --verbose or --verbose-<tag>.
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}
