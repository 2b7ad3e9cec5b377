// =============================================================================
// POSITION TRACKER
// =============================================================================
//
// Per-mint position state driven by classified swap events. All state lives
// behind one mutex so "check processed + apply" and "closed check + remove"
// are each a single atomic step, and every mutation signals the notifier the
// waiters sleep on.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::logger::{self, LogTag};
use crate::transactions::types::{SwapDirection, SwapEvent};
use crate::utils::short_id;

/// State for one tracked mint. Optional fields are "not yet happened":
/// a fresh asset has no buy, no remaining position and no entry valuation.
#[derive(Debug, Clone)]
pub struct TrackedAsset {
    pub mint: String,
    pub buy_event: Option<SwapEvent>,
    pub sell_events: Vec<SwapEvent>,
    /// Set by the accepted buy, decremented by every accepted sell.
    pub remaining_position: Option<f64>,
    pub entry_valuation: Option<f64>,
}

impl TrackedAsset {
    fn new(mint: &str) -> Self {
        Self {
            mint: mint.to_string(),
            buy_event: None,
            sell_events: Vec::new(),
            remaining_position: None,
            entry_valuation: None,
        }
    }
}

/// What `apply` did with an event, so callers can log and fire sinks
/// without re-inspecting tracker state.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    AppliedBuy,
    AppliedSell { remaining: f64 },
    DuplicateSignature,
    NotTracked,
    BuyAlreadyRecorded,
    SellBeforeBuy,
}

/// Result of an atomic "position closed?" check.
#[derive(Debug, Clone, PartialEq)]
pub enum SellCollection {
    NotTracked,
    StillOpen,
    Closed(Vec<SwapEvent>),
}

#[derive(Default)]
struct TrackerState {
    assets: HashMap<String, TrackedAsset>,
    /// Signatures whose events mutated state; append-only for the process
    /// lifetime and deliberately untouched by tracking resets.
    processed: HashSet<String>,
}

pub struct PositionTracker {
    state: Mutex<TrackerState>,
    notify: Notify,
}

impl PositionTracker {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TrackerState::default()),
            notify: Notify::new(),
        }
    }

    /// Begin tracking a mint. Calling this again for a mint that is already
    /// tracked silently resets its state; the processed-signature set is
    /// kept, so events already applied stay applied.
    pub fn start_tracking(&self, mint: &str) {
        {
            let mut state = self.state.lock();
            state.assets.insert(mint.to_string(), TrackedAsset::new(mint));
        }
        self.notify.notify_waiters();
        logger::info(LogTag::Position, &format!("Tracking {}", short_id(mint)));
    }

    /// Remove a mint immediately; concurrent waiters observe "not tracked".
    pub fn stop_tracking(&self, mint: &str) -> bool {
        let removed = self.state.lock().assets.remove(mint).is_some();
        if removed {
            self.notify.notify_waiters();
            logger::info(LogTag::Position, &format!("Stopped tracking {}", short_id(mint)));
        }
        removed
    }

    /// Apply one classified event. The duplicate check, the tracked-mint
    /// gate and the mutation happen under one lock. The signature is
    /// recorded only when the event actually changes state, so an inert
    /// event (untracked mint, rejected direction) cannot consume the
    /// signature for a sibling event from the same transaction.
    pub fn apply(&self, event: &SwapEvent) -> ApplyOutcome {
        let outcome = {
            let mut state = self.state.lock();
            if state.processed.contains(&event.signature) {
                return ApplyOutcome::DuplicateSignature;
            }
            let asset = match state.assets.get_mut(&event.mint) {
                Some(asset) => asset,
                None => return ApplyOutcome::NotTracked,
            };

            let outcome = match event.direction {
                SwapDirection::Buy => {
                    if asset.buy_event.is_some() {
                        return ApplyOutcome::BuyAlreadyRecorded;
                    }
                    asset.buy_event = Some(event.clone());
                    asset.remaining_position = Some(event.token_amount);
                    ApplyOutcome::AppliedBuy
                }
                SwapDirection::Sell => {
                    let remaining = match asset.remaining_position {
                        Some(remaining) => remaining - event.token_amount,
                        None => return ApplyOutcome::SellBeforeBuy,
                    };
                    asset.remaining_position = Some(remaining);
                    asset.sell_events.push(event.clone());
                    ApplyOutcome::AppliedSell { remaining }
                }
            };

            state.processed.insert(event.signature.clone());
            outcome
        };
        self.notify.notify_waiters();
        outcome
    }

    /// If the mint's position has closed (buy recorded and remaining <= 0),
    /// atomically remove it and hand back the accumulated sells in arrival
    /// order.
    pub fn collect_sells_if_closed(&self, mint: &str) -> SellCollection {
        let sells = {
            let mut state = self.state.lock();
            match state.assets.get(mint) {
                None => return SellCollection::NotTracked,
                Some(asset) => match asset.remaining_position {
                    Some(remaining) if remaining <= 0.0 => {}
                    _ => return SellCollection::StillOpen,
                },
            }
            state
                .assets
                .remove(mint)
                .map(|asset| asset.sell_events)
                .unwrap_or_default()
        };
        self.notify.notify_waiters();
        SellCollection::Closed(sells)
    }

    pub fn set_entry_valuation(&self, mint: &str, valuation: f64) -> bool {
        let mut state = self.state.lock();
        match state.assets.get_mut(mint) {
            Some(asset) => {
                asset.entry_valuation = Some(valuation);
                true
            }
            None => false,
        }
    }

    pub fn is_tracked(&self, mint: &str) -> bool {
        self.state.lock().assets.contains_key(mint)
    }

    pub fn is_processed(&self, signature: &str) -> bool {
        self.state.lock().processed.contains(signature)
    }

    pub fn buy_signature(&self, mint: &str) -> Option<String> {
        let state = self.state.lock();
        let asset = state.assets.get(mint)?;
        asset.buy_event.as_ref().map(|event| event.signature.clone())
    }

    pub fn buy_event(&self, mint: &str) -> Option<SwapEvent> {
        let state = self.state.lock();
        state.assets.get(mint)?.buy_event.clone()
    }

    pub fn remaining_position(&self, mint: &str) -> Option<f64> {
        let state = self.state.lock();
        state.assets.get(mint)?.remaining_position
    }

    pub fn entry_valuation(&self, mint: &str) -> Option<f64> {
        let state = self.state.lock();
        state.assets.get(mint)?.entry_valuation
    }

    pub fn tracked_mints(&self) -> Vec<String> {
        self.state.lock().assets.keys().cloned().collect()
    }

    pub(crate) fn notifier(&self) -> &Notify {
        &self.notify
    }
}

impl Default for PositionTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINT_A: &str = "MintA1111111111111111111111111111111111111A";
    const MINT_B: &str = "MintB1111111111111111111111111111111111111B";

    fn buy(signature: &str, mint: &str, amount: f64) -> SwapEvent {
        SwapEvent {
            signature: signature.to_string(),
            mint: mint.to_string(),
            direction: SwapDirection::Buy,
            token_amount: amount,
            wallet_sol_change: -0.5,
            pure_sol: Some(0.45),
        }
    }

    fn sell(signature: &str, mint: &str, amount: f64) -> SwapEvent {
        SwapEvent {
            signature: signature.to_string(),
            mint: mint.to_string(),
            direction: SwapDirection::Sell,
            token_amount: amount,
            wallet_sol_change: 0.3,
            pure_sol: Some(0.29),
        }
    }

    #[test]
    fn buy_then_sells_close_the_position() {
        let tracker = PositionTracker::new();
        tracker.start_tracking(MINT_A);

        assert_eq!(tracker.apply(&buy("t1", MINT_A, 100.0)), ApplyOutcome::AppliedBuy);
        assert_eq!(tracker.remaining_position(MINT_A), Some(100.0));
        assert_eq!(tracker.buy_signature(MINT_A).as_deref(), Some("t1"));

        assert_eq!(
            tracker.apply(&sell("t2", MINT_A, 40.0)),
            ApplyOutcome::AppliedSell { remaining: 60.0 }
        );
        assert_eq!(tracker.collect_sells_if_closed(MINT_A), SellCollection::StillOpen);

        assert_eq!(
            tracker.apply(&sell("t3", MINT_A, 60.0)),
            ApplyOutcome::AppliedSell { remaining: 0.0 }
        );

        match tracker.collect_sells_if_closed(MINT_A) {
            SellCollection::Closed(sells) => {
                let signatures: Vec<&str> =
                    sells.iter().map(|event| event.signature.as_str()).collect();
                assert_eq!(signatures, vec!["t2", "t3"]);
            }
            other => panic!("expected closed position, got {:?}", other),
        }
        assert!(!tracker.is_tracked(MINT_A));
        assert_eq!(tracker.collect_sells_if_closed(MINT_A), SellCollection::NotTracked);
    }

    #[test]
    fn redelivered_signature_is_a_no_op() {
        let tracker = PositionTracker::new();
        tracker.start_tracking(MINT_A);
        tracker.apply(&buy("t1", MINT_A, 100.0));
        tracker.apply(&sell("t2", MINT_A, 40.0));

        assert_eq!(tracker.apply(&sell("t2", MINT_A, 40.0)), ApplyOutcome::DuplicateSignature);
        assert_eq!(tracker.remaining_position(MINT_A), Some(60.0));
    }

    #[test]
    fn second_buy_is_ignored() {
        let tracker = PositionTracker::new();
        tracker.start_tracking(MINT_A);
        tracker.apply(&buy("t1", MINT_A, 100.0));

        assert_eq!(tracker.apply(&buy("t9", MINT_A, 500.0)), ApplyOutcome::BuyAlreadyRecorded);
        assert_eq!(tracker.buy_signature(MINT_A).as_deref(), Some("t1"));
        assert_eq!(tracker.remaining_position(MINT_A), Some(100.0));
    }

    #[test]
    fn sell_before_buy_leaves_state_unchanged() {
        let tracker = PositionTracker::new();
        tracker.start_tracking(MINT_A);

        assert_eq!(tracker.apply(&sell("t5", MINT_A, 10.0)), ApplyOutcome::SellBeforeBuy);
        assert_eq!(tracker.remaining_position(MINT_A), None);

        // The rejected signature was never recorded; once a buy lands the
        // same sell can be applied on redelivery.
        tracker.apply(&buy("t1", MINT_A, 100.0));
        assert_eq!(
            tracker.apply(&sell("t5", MINT_A, 10.0)),
            ApplyOutcome::AppliedSell { remaining: 90.0 }
        );
    }

    #[test]
    fn untracked_event_does_not_consume_the_signature() {
        let tracker = PositionTracker::new();
        tracker.start_tracking(MINT_A);

        // One transaction can classify deltas for several mints. An event
        // for an untracked mint must not mark the signature processed, or
        // it would shadow the tracked mint's event from the same tx.
        assert_eq!(tracker.apply(&sell("t1", MINT_B, 5.0)), ApplyOutcome::NotTracked);
        assert_eq!(tracker.apply(&buy("t1", MINT_A, 100.0)), ApplyOutcome::AppliedBuy);
    }

    #[test]
    fn remaining_position_is_monotonic_and_can_overshoot() {
        let tracker = PositionTracker::new();
        tracker.start_tracking(MINT_A);
        tracker.apply(&buy("t1", MINT_A, 100.0));

        let mut last = 100.0;
        for (signature, amount) in [("t2", 30.0), ("t3", 50.0), ("t4", 40.0)] {
            match tracker.apply(&sell(signature, MINT_A, amount)) {
                ApplyOutcome::AppliedSell { remaining } => {
                    assert!(remaining < last);
                    last = remaining;
                }
                other => panic!("expected applied sell, got {:?}", other),
            }
        }
        // Overshoot below zero still closes the position.
        assert_eq!(last, -20.0);
        assert!(matches!(
            tracker.collect_sells_if_closed(MINT_A),
            SellCollection::Closed(_)
        ));
    }

    #[test]
    fn restart_tracking_resets_asset_but_keeps_processed_set() {
        let tracker = PositionTracker::new();
        tracker.start_tracking(MINT_A);
        tracker.apply(&buy("t1", MINT_A, 100.0));

        tracker.start_tracking(MINT_A);
        assert_eq!(tracker.buy_signature(MINT_A), None);
        assert_eq!(tracker.remaining_position(MINT_A), None);

        // Same signature cannot be applied into the fresh state.
        assert_eq!(tracker.apply(&buy("t1", MINT_A, 100.0)), ApplyOutcome::DuplicateSignature);
    }

    #[test]
    fn stop_tracking_is_observable() {
        let tracker = PositionTracker::new();
        tracker.start_tracking(MINT_A);
        tracker.apply(&buy("t1", MINT_A, 100.0));

        assert!(tracker.stop_tracking(MINT_A));
        assert!(!tracker.is_tracked(MINT_A));
        assert!(!tracker.stop_tracking(MINT_A));
        assert_eq!(tracker.apply(&sell("t2", MINT_A, 40.0)), ApplyOutcome::NotTracked);
    }

    #[test]
    fn entry_valuation_requires_tracking() {
        let tracker = PositionTracker::new();
        assert!(!tracker.set_entry_valuation(MINT_A, 125_000.0));

        tracker.start_tracking(MINT_A);
        assert!(tracker.set_entry_valuation(MINT_A, 125_000.0));
        assert_eq!(tracker.entry_valuation(MINT_A), Some(125_000.0));
    }
}
