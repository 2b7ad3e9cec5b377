// =============================================================================
// POSITION WAITERS
// =============================================================================
//
// Bounded-timeout queries over the position tracker. Waiters sleep on the
// tracker's notifier and re-check state on every change instead of polling
// a fixed tick; the notifier is enabled before each check so a state change
// between check and sleep can never be missed.

use std::sync::Arc;
use std::time::Duration;

use crate::logger::{self, LogTag};
use crate::positions::{PositionTracker, SellCollection};
use crate::transactions::types::SwapEvent;
use crate::utils::short_id;

pub struct WaiterRegistry {
    tracker: Arc<PositionTracker>,
}

impl WaiterRegistry {
    pub fn new(tracker: Arc<PositionTracker>) -> Self {
        Self { tracker }
    }

    /// Resolve to the buy signature once one is recorded for the mint, or
    /// None when the timeout elapses first.
    pub async fn await_buy_signature(&self, mint: &str, timeout: Duration) -> Option<String> {
        logger::debug(
            LogTag::Waiter,
            &format!(
                "Waiting up to {}s for buy signature of {}",
                timeout.as_secs(),
                short_id(mint)
            ),
        );
        self.wait_for(timeout, || self.tracker.buy_signature(mint)).await
    }

    /// Resolve to the full buy event once one is recorded for the mint, or
    /// None when the timeout elapses first.
    pub async fn await_buy_event(&self, mint: &str, timeout: Duration) -> Option<SwapEvent> {
        logger::debug(
            LogTag::Waiter,
            &format!(
                "Waiting up to {}s for buy event of {}",
                timeout.as_secs(),
                short_id(mint)
            ),
        );
        self.wait_for(timeout, || self.tracker.buy_event(mint)).await
    }

    /// Block until the mint's position closes (remaining <= 0), then remove
    /// it from tracking and return the accumulated sells in arrival order.
    ///
    /// A mint that is not tracked (or stops being tracked while waiting)
    /// resolves to an empty list immediately: the position was finished
    /// elsewhere. Timing out also returns an empty list but removes nothing.
    pub async fn await_all_sells(&self, mint: &str, timeout: Duration) -> Vec<SwapEvent> {
        logger::debug(
            LogTag::Waiter,
            &format!(
                "Waiting up to {}s for position of {} to close",
                timeout.as_secs(),
                short_id(mint)
            ),
        );
        let collected = self
            .wait_for(timeout, || match self.tracker.collect_sells_if_closed(mint) {
                SellCollection::Closed(sells) => Some(sells),
                SellCollection::NotTracked => Some(Vec::new()),
                SellCollection::StillOpen => None,
            })
            .await;
        collected.unwrap_or_default()
    }

    /// Run `check` now and after every tracker change until it produces a
    /// value or the deadline passes.
    async fn wait_for<T>(&self, timeout: Duration, mut check: impl FnMut() -> Option<T>) -> Option<T> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.tracker.notifier().notified();
            tokio::pin!(notified);
            // Register for wakeups before checking so a change landing
            // between the check and the await still wakes this task.
            notified.as_mut().enable();

            if let Some(value) = check() {
                return Some(value);
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return None;
            }
        }
    }
}
