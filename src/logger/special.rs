//! Formatted log lines for watch milestones
//!
//! The plain `logger::info` calls cover routine events; these helpers
//! build the richer multi-part lines the watch workflow emits when a
//! buy confirms or a sell gets valued against the entry.

use chrono::Duration;
use colored::*;

use super::tags::LogTag;
use crate::logger;
use crate::utils::short_id;

/// Percent change of `valuation` against `entry`. Callers must ensure
/// `entry` is non-zero.
pub fn valuation_delta_percent(entry: f64, valuation: f64) -> f64 {
    (valuation - entry) / entry * 100.0
}

/// Buy confirmation line, with stream-to-confirmation latency when the
/// arrival timestamp of the signature is known.
pub fn log_buy_confirmation(mint: &str, signature: &str, latency: Option<Duration>) {
    let mut parts = vec![format!(
        "Buy confirmed for {} ({})",
        short_id(mint).bold(),
        short_id(signature)
    )];

    if let Some(latency) = latency {
        parts.push(
            format!("latency {}ms", latency.num_milliseconds())
                .dimmed()
                .to_string(),
        );
    }

    logger::info(LogTag::Workflow, &parts.join(" "));
}

/// One line per valued sell: the market valuation it implies and, when
/// the entry valuation is known, the percent change against it.
pub fn log_sell_valuation(
    mint: &str,
    sequence: usize,
    valuation_usd: f64,
    entry_valuation_usd: Option<f64>,
) {
    let mut parts = vec![format!(
        "Sell #{} for {}: valuation {}",
        sequence,
        short_id(mint).bold(),
        format!("${:.2}", valuation_usd).white().bold()
    )];

    match entry_valuation_usd.filter(|entry| *entry > 0.0) {
        Some(entry) => {
            let percent = valuation_delta_percent(entry, valuation_usd);
            let change = if percent > 0.0 {
                format!("+{:.2}%", percent).green().bold()
            } else if percent < 0.0 {
                format!("{:.2}%", percent).red().bold()
            } else {
                format!("{:.2}%", percent).white().bold()
            };
            parts.push(format!("( {} vs entry ${:.2} )", change, entry));
        }
        None => {
            parts.push("( entry valuation unknown )".dimmed().to_string());
        }
    }

    logger::info(LogTag::Workflow, &parts.join(" "));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_percent_signs() {
        assert_eq!(valuation_delta_percent(100.0, 150.0), 50.0);
        assert_eq!(valuation_delta_percent(100.0, 75.0), -25.0);
        assert_eq!(valuation_delta_percent(200.0, 200.0), 0.0);
    }
}
