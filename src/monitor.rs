// =============================================================================
// SWAP MONITOR
// =============================================================================
//
// Central orchestrator. Owns the position tracker, the waiter registry and
// the detail fetcher, spawns the websocket stream, and pushes every arrived
// signature through fetch -> classify -> apply. Registered sinks observe
// events that actually landed in the tracker.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::logger::{self, LogTag};
use crate::positions::{ApplyOutcome, PositionTracker};
use crate::rpc::RpcClient;
use crate::shutdown::Shutdown;
use crate::transactions::classifier;
use crate::transactions::fetcher::DetailFetcher;
use crate::transactions::types::{SwapDirection, SwapEvent};
use crate::utils::short_id;
use crate::waiters::WaiterRegistry;
use crate::websocket::{StreamConnector, StreamSignature};

/// Observer notified after an event has been applied to the tracker.
/// Failures are logged and never interrupt monitoring.
#[async_trait]
pub trait SwapEventSink: Send + Sync {
    async fn on_buy_detected(&self, signature: &str, mint: &str) -> anyhow::Result<()>;
    async fn on_sell_detected(&self, signature: &str, mint: &str) -> anyhow::Result<()>;
}

pub struct SwapMonitor {
    tracker: Arc<PositionTracker>,
    waiters: WaiterRegistry,
    fetcher: DetailFetcher,
    wallet: String,
    ws_url: String,
    /// First-seen stream timestamp per signature, for latency reporting.
    arrival_times: Mutex<HashMap<String, DateTime<Utc>>>,
    sinks: Vec<Arc<dyn SwapEventSink>>,
    shutdown: Shutdown,
}

impl SwapMonitor {
    pub fn new(
        config: &Config,
        rpc: Arc<RpcClient>,
        sinks: Vec<Arc<dyn SwapEventSink>>,
        shutdown: Shutdown,
    ) -> Self {
        let tracker = Arc::new(PositionTracker::new());
        Self {
            waiters: WaiterRegistry::new(Arc::clone(&tracker)),
            fetcher: DetailFetcher::new(rpc, config.wallet_address.clone(), shutdown.clone()),
            wallet: config.wallet_address.clone(),
            ws_url: config.ws_url.clone(),
            arrival_times: Mutex::new(HashMap::new()),
            sinks,
            shutdown,
            tracker,
        }
    }

    /// Run the stream and the consumer until shutdown. The stream task only
    /// pushes raw signatures; all resolution happens here, one signature at
    /// a time, so a slow RPC never blocks the websocket read loop.
    pub async fn run(&self) {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let connector = StreamConnector::new(
            self.ws_url.clone(),
            self.wallet.clone(),
            self.shutdown.clone(),
        );
        let stream_task = tokio::spawn(async move { connector.run(sender).await });

        logger::info(
            LogTag::Monitor,
            &format!("Monitoring swaps for wallet {}", short_id(&self.wallet)),
        );

        loop {
            tokio::select! {
                _ = self.shutdown.wait() => break,
                arrival = receiver.recv() => match arrival {
                    Some(arrival) => self.process_arrival(arrival).await,
                    None => break,
                },
            }
        }

        let _ = stream_task.await;
        logger::info(LogTag::Monitor, "Monitor stopped");
    }

    /// One signature through the pipeline: stamp, dedupe, fetch, classify,
    /// then apply every event the transaction produced.
    async fn process_arrival(&self, arrival: StreamSignature) {
        if !self.note_arrival(&arrival.signature, arrival.arrived_at) {
            return;
        }

        let detail = match self.fetcher.fetch(&arrival.signature).await {
            Some(detail) => detail,
            None => return,
        };

        let events = classifier::classify(&detail, &self.wallet);
        if events.is_empty() {
            logger::debug(
                LogTag::Monitor,
                &format!("No swap events in {}", short_id(&arrival.signature)),
            );
            return;
        }

        for event in &events {
            self.dispatch(event).await;
        }
    }

    /// Stamp the arrival and decide whether the signature still needs
    /// resolving. The first arrival wins the timestamp; redeliveries keep
    /// the original so latency numbers stay honest.
    fn note_arrival(&self, signature: &str, arrived_at: DateTime<Utc>) -> bool {
        self.arrival_times
            .lock()
            .entry(signature.to_string())
            .or_insert(arrived_at);

        if self.tracker.is_processed(signature) {
            logger::debug(
                LogTag::Monitor,
                &format!("Already applied {}, skipping", short_id(signature)),
            );
            return false;
        }
        true
    }

    /// Apply one classified event and notify sinks when it lands.
    async fn dispatch(&self, event: &SwapEvent) {
        match self.tracker.apply(event) {
            ApplyOutcome::AppliedBuy => {
                let spent = match event.pure_sol {
                    Some(sol) => format!("{:.9} SOL", sol),
                    None => "unknown SOL".to_string(),
                };
                logger::info(
                    LogTag::Monitor,
                    &format!(
                        "Buy detected for {}: {} tokens for {} ({})",
                        short_id(&event.mint),
                        event.token_amount,
                        spent,
                        short_id(&event.signature)
                    ),
                );
                self.fire_sinks(event).await;
            }
            ApplyOutcome::AppliedSell { remaining } => {
                logger::info(
                    LogTag::Monitor,
                    &format!(
                        "Sell detected for {}: {} tokens out, {} remaining ({})",
                        short_id(&event.mint),
                        event.token_amount,
                        remaining,
                        short_id(&event.signature)
                    ),
                );
                self.fire_sinks(event).await;
            }
            ApplyOutcome::DuplicateSignature => {
                logger::debug(
                    LogTag::Monitor,
                    &format!("Duplicate signature {}, ignoring", short_id(&event.signature)),
                );
            }
            ApplyOutcome::NotTracked => {
                logger::debug(
                    LogTag::Monitor,
                    &format!(
                        "{} event for untracked {}, ignoring",
                        event.direction.as_str(),
                        short_id(&event.mint)
                    ),
                );
            }
            ApplyOutcome::BuyAlreadyRecorded => {
                logger::warning(
                    LogTag::Monitor,
                    &format!(
                        "Second buy for {} ignored ({})",
                        short_id(&event.mint),
                        short_id(&event.signature)
                    ),
                );
            }
            ApplyOutcome::SellBeforeBuy => {
                logger::warning(
                    LogTag::Monitor,
                    &format!(
                        "Sell for {} with no recorded buy, ignoring ({})",
                        short_id(&event.mint),
                        short_id(&event.signature)
                    ),
                );
            }
        }
    }

    /// Sinks must never take the pipeline down: every failure is logged
    /// and swallowed, and the remaining sinks still run.
    async fn fire_sinks(&self, event: &SwapEvent) {
        for sink in &self.sinks {
            let result = match event.direction {
                SwapDirection::Buy => sink.on_buy_detected(&event.signature, &event.mint).await,
                SwapDirection::Sell => sink.on_sell_detected(&event.signature, &event.mint).await,
            };
            if let Err(error) = result {
                logger::warning(
                    LogTag::Monitor,
                    &format!(
                        "Sink failed on {} for {}: {}",
                        event.direction.as_str(),
                        short_id(&event.mint),
                        error
                    ),
                );
            }
        }
    }

    // ------------------------------------------------------------------
    // Tracking facade
    // ------------------------------------------------------------------

    pub fn start_tracking(&self, mint: &str) {
        self.tracker.start_tracking(mint);
    }

    pub fn stop_tracking(&self, mint: &str) -> bool {
        self.tracker.stop_tracking(mint)
    }

    pub fn is_tracked(&self, mint: &str) -> bool {
        self.tracker.is_tracked(mint)
    }

    pub fn set_entry_valuation(&self, mint: &str, valuation: f64) -> bool {
        self.tracker.set_entry_valuation(mint, valuation)
    }

    pub fn entry_valuation(&self, mint: &str) -> Option<f64> {
        self.tracker.entry_valuation(mint)
    }

    /// When the stream first delivered this signature, if it has been seen.
    pub fn signature_time(&self, signature: &str) -> Option<DateTime<Utc>> {
        self.arrival_times.lock().get(signature).copied()
    }

    pub async fn await_buy_signature(&self, mint: &str, timeout: Duration) -> Option<String> {
        self.waiters.await_buy_signature(mint, timeout).await
    }

    pub async fn await_buy_event(&self, mint: &str, timeout: Duration) -> Option<SwapEvent> {
        self.waiters.await_buy_event(mint, timeout).await
    }

    pub async fn await_all_sells(&self, mint: &str, timeout: Duration) -> Vec<SwapEvent> {
        self.waiters.await_all_sells(mint, timeout).await
    }
}

#[cfg(test)]
impl SwapMonitor {
    /// Test hook: push an event through apply + sinks as the pipeline would.
    pub(crate) async fn dispatch_for_tests(&self, event: &SwapEvent) {
        self.dispatch(event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    const WALLET: &str = "WaLLet1111111111111111111111111111111111111";
    const MINT: &str = "MintAAAA111111111111111111111111111111111111";

    struct RecordingSink {
        calls: StdMutex<Vec<(String, String, String)>>,
    }

    impl RecordingSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: StdMutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(String, String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SwapEventSink for RecordingSink {
        async fn on_buy_detected(&self, signature: &str, mint: &str) -> anyhow::Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(("buy".into(), signature.into(), mint.into()));
            Ok(())
        }

        async fn on_sell_detected(&self, signature: &str, mint: &str) -> anyhow::Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(("sell".into(), signature.into(), mint.into()));
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl SwapEventSink for FailingSink {
        async fn on_buy_detected(&self, _signature: &str, _mint: &str) -> anyhow::Result<()> {
            anyhow::bail!("sink exploded")
        }

        async fn on_sell_detected(&self, _signature: &str, _mint: &str) -> anyhow::Result<()> {
            anyhow::bail!("sink exploded")
        }
    }

    fn test_config() -> Config {
        Config {
            rpc_url: "http://localhost:8899".to_string(),
            ws_url: "ws://localhost:8900".to_string(),
            wallet_address: WALLET.to_string(),
            tracked_mints: vec![],
            buy_signature_timeout: Duration::from_secs(1),
            buy_event_timeout: Duration::from_secs(1),
            sell_timeout: Duration::from_secs(1),
        }
    }

    fn monitor_with(sinks: Vec<Arc<dyn SwapEventSink>>) -> SwapMonitor {
        let rpc = Arc::new(RpcClient::new("http://localhost:8899").expect("client"));
        SwapMonitor::new(&test_config(), rpc, sinks, Shutdown::new())
    }

    fn event(signature: &str, direction: SwapDirection, amount: f64) -> SwapEvent {
        SwapEvent {
            signature: signature.to_string(),
            mint: MINT.to_string(),
            direction,
            token_amount: amount,
            wallet_sol_change: -0.5,
            pure_sol: Some(0.45),
        }
    }

    #[tokio::test]
    async fn applied_events_reach_sinks_in_order() {
        let sink = RecordingSink::new();
        let monitor = monitor_with(vec![sink.clone()]);
        monitor.start_tracking(MINT);

        monitor.dispatch(&event("sig-buy", SwapDirection::Buy, 100.0)).await;
        monitor.dispatch(&event("sig-sell", SwapDirection::Sell, 100.0)).await;

        assert_eq!(
            sink.calls(),
            vec![
                ("buy".into(), "sig-buy".into(), MINT.into()),
                ("sell".into(), "sig-sell".into(), MINT.into()),
            ]
        );
    }

    #[tokio::test]
    async fn failing_sink_does_not_stop_others_or_tracking() {
        let recording = RecordingSink::new();
        let monitor = monitor_with(vec![Arc::new(FailingSink), recording.clone()]);
        monitor.start_tracking(MINT);

        monitor.dispatch(&event("sig-buy", SwapDirection::Buy, 100.0)).await;

        assert_eq!(recording.calls().len(), 1);
        assert_eq!(
            monitor.await_buy_signature(MINT, Duration::from_millis(10)).await,
            Some("sig-buy".to_string())
        );
    }

    #[tokio::test]
    async fn untracked_events_never_reach_sinks() {
        let sink = RecordingSink::new();
        let monitor = monitor_with(vec![sink.clone()]);

        monitor.dispatch(&event("sig-buy", SwapDirection::Buy, 100.0)).await;

        assert!(sink.calls().is_empty());
    }

    #[tokio::test]
    async fn redelivered_event_fires_sinks_once() {
        let sink = RecordingSink::new();
        let monitor = monitor_with(vec![sink.clone()]);
        monitor.start_tracking(MINT);

        let buy = event("sig-buy", SwapDirection::Buy, 100.0);
        monitor.dispatch(&buy).await;
        monitor.dispatch(&buy).await;

        assert_eq!(sink.calls().len(), 1);
    }

    #[tokio::test]
    async fn first_arrival_wins_the_timestamp() {
        let monitor = monitor_with(vec![]);
        let first = Utc::now();
        let later = first + chrono::Duration::seconds(5);

        assert!(monitor.note_arrival("sig-a", first));
        assert!(monitor.note_arrival("sig-a", later));
        assert_eq!(monitor.signature_time("sig-a"), Some(first));
    }

    #[tokio::test]
    async fn applied_signature_skips_refetch_but_keeps_timestamp() {
        let monitor = monitor_with(vec![]);
        monitor.start_tracking(MINT);
        monitor.dispatch(&event("sig-buy", SwapDirection::Buy, 100.0)).await;

        let arrived = Utc::now();
        assert!(!monitor.note_arrival("sig-buy", arrived));
        assert_eq!(monitor.signature_time("sig-buy"), Some(arrived));
    }
}
