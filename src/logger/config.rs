//! Logger configuration with command-line and environment initialization
//!
//! The configuration lives in a process-wide static so logging works from
//! any task without threading a handle through every call site. This is
//! the one deliberate global in the crate.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use super::levels::LogLevel;
use super::tags::LogTag;

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Minimum level printed (errors bypass this check).
    pub min_level: LogLevel,
    /// Tags with debug output enabled via --debug-<tag>.
    pub debug_tags: HashSet<String>,
    /// Tags with verbose output enabled via --verbose-<tag>.
    pub verbose_tags: HashSet<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            debug_tags: HashSet::new(),
            verbose_tags: HashSet::new(),
        }
    }
}

static LOGGER_CONFIG: Lazy<RwLock<LoggerConfig>> = Lazy::new(|| RwLock::new(LoggerConfig::default()));

/// Snapshot of the current logger configuration.
pub fn get_logger_config() -> LoggerConfig {
    LOGGER_CONFIG.read().clone()
}

/// Replace the logger configuration wholesale (used by tests and init).
pub fn set_logger_config(config: LoggerConfig) {
    *LOGGER_CONFIG.write() = config;
}

/// Build configuration from the process environment and argv.
///
/// Recognized inputs:
/// - `LOG_LEVEL` env var: minimum level name (error/warning/info/debug/verbose)
/// - `--quiet`: warnings and errors only
/// - `--verbose`: everything, all tags
/// - `--debug-<tag>` / `--verbose-<tag>`: per-tag gating
pub fn init_from_args() {
    let mut config = LoggerConfig::default();

    if let Ok(level) = std::env::var("LOG_LEVEL") {
        if let Some(parsed) = LogLevel::parse(&level) {
            config.min_level = parsed;
        }
    }

    for arg in std::env::args() {
        if arg == "--quiet" {
            config.min_level = LogLevel::Warning;
        } else if arg == "--verbose" {
            config.min_level = LogLevel::Verbose;
        } else if let Some(tag) = arg.strip_prefix("--debug-") {
            config.debug_tags.insert(tag.to_string());
        } else if let Some(tag) = arg.strip_prefix("--verbose-") {
            config.verbose_tags.insert(tag.to_string());
        }
    }

    set_logger_config(config);
}

pub fn is_debug_enabled_for_tag(tag: &LogTag) -> bool {
    LOGGER_CONFIG.read().debug_tags.contains(&tag.to_debug_key())
}

pub fn is_verbose_enabled_for_tag(tag: &LogTag) -> bool {
    LOGGER_CONFIG.read().verbose_tags.contains(&tag.to_debug_key())
}
