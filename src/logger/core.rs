//! Central filtering logic deciding whether a message is printed
//!
//! Rules:
//! 1. Errors are always shown
//! 2. The level must pass the minimum-level threshold
//! 3. Debug requires --debug-<tag> for that tag
//! 4. Verbose requires --verbose or --verbose-<tag> for that tag

use super::config::{get_logger_config, is_debug_enabled_for_tag, is_verbose_enabled_for_tag};
use super::levels::LogLevel;
use super::tags::LogTag;

pub fn should_log(tag: &LogTag, level: LogLevel) -> bool {
    let config = get_logger_config();

    if level == LogLevel::Error {
        return true;
    }

    if level > config.min_level {
        // Debug/verbose can still be opted into per tag below the threshold
        if level == LogLevel::Debug {
            return is_debug_enabled_for_tag(tag);
        }
        if level == LogLevel::Verbose {
            return is_verbose_enabled_for_tag(tag);
        }
        return false;
    }

    true
}

pub fn log_internal(tag: LogTag, level: LogLevel, message: &str) {
    if !should_log(&tag, level) {
        return;
    }

    super::format::format_and_log(tag, level.as_str(), message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::config::{set_logger_config, LoggerConfig};

    // Single test because the logger config is a process-wide static.
    #[test]
    fn filtering_rules() {
        set_logger_config(LoggerConfig::default());
        assert!(should_log(&LogTag::System, LogLevel::Error));
        assert!(should_log(&LogTag::System, LogLevel::Info));
        assert!(!should_log(&LogTag::Fetch, LogLevel::Debug));
        assert!(!should_log(&LogTag::Fetch, LogLevel::Verbose));

        let mut config = LoggerConfig::default();
        config.debug_tags.insert("fetch".to_string());
        set_logger_config(config);
        assert!(should_log(&LogTag::Fetch, LogLevel::Debug));
        assert!(!should_log(&LogTag::Websocket, LogLevel::Debug));

        set_logger_config(LoggerConfig::default());
    }
}
