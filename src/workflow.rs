// =============================================================================
// WATCH WORKFLOW
// =============================================================================
//
// Follows one tracked mint from buy to close: waits for the buy to land,
// values the entry, then reports every sell against it once the position
// closes. Valuation inputs (SOL spot price, token supply) are fetched up
// front and treated as optional; a missing input skips valuation rather
// than inventing a number.

use std::sync::Arc;

use chrono::Utc;

use crate::config::Config;
use crate::logger::{self, LogTag};
use crate::monitor::SwapMonitor;
use crate::quotes::QuoteClient;
use crate::rpc::RpcClient;
use crate::transactions::types::SwapEvent;
use crate::utils::short_id;

/// Market inputs captured once per watch. Either can be missing.
struct MarketContext {
    sol_usd: Option<f64>,
    supply: Option<f64>,
}

/// Fully-diluted valuation in USD implied by one swap: the per-token SOL
/// price it executed at, converted to USD and scaled by total supply.
/// Returns None when the swap's pure SOL amount is unknown; an unknown
/// amount is never treated as zero.
pub fn implied_valuation(event: &SwapEvent, sol_usd: Option<f64>, supply: Option<f64>) -> Option<f64> {
    let pure_sol = event.pure_sol?;
    let sol_usd = sol_usd?;
    let supply = supply?;
    if event.token_amount <= 0.0 || pure_sol <= 0.0 {
        return None;
    }
    Some(pure_sol / event.token_amount * sol_usd * supply)
}

pub struct WatchWorkflow {
    monitor: Arc<SwapMonitor>,
    rpc: Arc<RpcClient>,
    quotes: Arc<QuoteClient>,
}

impl WatchWorkflow {
    pub fn new(monitor: Arc<SwapMonitor>, rpc: Arc<RpcClient>, quotes: Arc<QuoteClient>) -> Self {
        Self {
            monitor,
            rpc,
            quotes,
        }
    }

    /// Watch one mint end to end. Returns when the position closes or a
    /// wait times out; tracking for the mint is released either way.
    pub async fn watch(&self, mint: &str, config: &Config) {
        if !self.monitor.is_tracked(mint) {
            self.monitor.start_tracking(mint);
        }
        logger::info(LogTag::Workflow, &format!("Watching {}", short_id(mint)));

        let context = self.market_context(mint).await;
        self.watch_with_context(mint, config, context).await;
    }

    async fn watch_with_context(&self, mint: &str, config: &Config, context: MarketContext) {
        let signature = match self
            .monitor
            .await_buy_signature(mint, config.buy_signature_timeout)
            .await
        {
            Some(signature) => signature,
            None => {
                logger::warning(
                    LogTag::Workflow,
                    &format!(
                        "No buy for {} within {}s, releasing",
                        short_id(mint),
                        config.buy_signature_timeout.as_secs()
                    ),
                );
                self.monitor.stop_tracking(mint);
                return;
            }
        };

        let latency = self
            .monitor
            .signature_time(&signature)
            .map(|seen| Utc::now() - seen);
        logger::log_buy_confirmation(mint, &signature, latency);

        let buy = match self
            .monitor
            .await_buy_event(mint, config.buy_event_timeout)
            .await
        {
            Some(buy) => buy,
            None => {
                logger::warning(
                    LogTag::Workflow,
                    &format!("Buy event never resolved for {}, releasing", short_id(mint)),
                );
                self.monitor.stop_tracking(mint);
                return;
            }
        };

        let entry_valuation = implied_valuation(&buy, context.sol_usd, context.supply);
        match entry_valuation {
            Some(valuation) => {
                self.monitor.set_entry_valuation(mint, valuation);
                logger::info(
                    LogTag::Workflow,
                    &format!("Entry valuation for {}: ${:.2}", short_id(mint), valuation),
                );
            }
            None => {
                logger::warning(
                    LogTag::Workflow,
                    &format!("Entry valuation unavailable for {}", short_id(mint)),
                );
            }
        }

        let sells = self.monitor.await_all_sells(mint, config.sell_timeout).await;
        if sells.is_empty() {
            logger::warning(
                LogTag::Workflow,
                &format!(
                    "{} did not close within {}s, releasing",
                    short_id(mint),
                    config.sell_timeout.as_secs()
                ),
            );
            self.monitor.stop_tracking(mint);
            return;
        }

        for (index, sell) in sells.iter().enumerate() {
            match implied_valuation(sell, context.sol_usd, context.supply) {
                Some(valuation) => {
                    logger::log_sell_valuation(mint, index + 1, valuation, entry_valuation);
                }
                None => {
                    logger::info(
                        LogTag::Workflow,
                        &format!(
                            "Sell #{} for {}: valuation unavailable ({})",
                            index + 1,
                            short_id(mint),
                            short_id(&sell.signature)
                        ),
                    );
                }
            }
        }
        logger::info(
            LogTag::Workflow,
            &format!(
                "Position closed for {} after {} sell(s)",
                short_id(mint),
                sells.len()
            ),
        );
    }

    /// Fetch SOL spot price and token supply concurrently. Each can fail
    /// independently; valuation later skips whatever is missing.
    async fn market_context(&self, mint: &str) -> MarketContext {
        let (price, supply) = tokio::join!(
            self.quotes.sol_usd_price(),
            self.rpc.get_token_supply(mint)
        );

        let sol_usd = match price {
            Ok(price) => Some(price),
            Err(error) => {
                logger::warning(LogTag::Quotes, &format!("SOL price unavailable: {}", error));
                None
            }
        };
        let supply = match supply {
            Ok(supply) => Some(supply),
            Err(error) => {
                logger::warning(
                    LogTag::Quotes,
                    &format!("Supply unavailable for {}: {}", short_id(mint), error),
                );
                None
            }
        };
        MarketContext { sol_usd, supply }
    }
}
