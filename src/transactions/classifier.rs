// =============================================================================
// SWAP CLASSIFICATION
// =============================================================================
//
// Turns a normalized transaction detail into zero or more swap events, one
// per wallet-owned mint delta. Tracked-set filtering is not done here: a
// wSOL delta classifies like any other mint and the tracker simply never
// accepts it.

use std::collections::HashMap;

use crate::config::WSOL_MINT;
use crate::transactions::extractor::extract_pure_sol;
use crate::transactions::types::{
    SwapDirection, SwapEvent, TransactionDetail, TransactionMeta,
};

/// Balance changes at or below this are rounding noise, not transfer legs.
const DUST_TOLERANCE: f64 = 1e-9;

/// One side of a reconciled transfer, in UI units (always positive).
#[derive(Debug, Clone, PartialEq)]
pub struct TransferLeg {
    pub mint: String,
    pub amount: f64,
}

/// Sent/received legs reconstructed from every token balance change in the
/// transaction, not just the wallet's own accounts.
#[derive(Debug, Clone, Default)]
pub struct SwapLegs {
    pub sent: Vec<TransferLeg>,
    pub received: Vec<TransferLeg>,
}

/// Classify a transaction's wallet-owned mint deltas into swap events.
///
/// - tokens in while SOL goes out -> buy of that mint
/// - tokens out -> sell of that mint, regardless of SOL direction
///
/// Tokens in without SOL leaving (airdrops, plain transfers) classify as
/// nothing.
pub fn classify(detail: &TransactionDetail, wallet: &str) -> Vec<SwapEvent> {
    let mut events = Vec::new();
    for token_delta in &detail.token_deltas {
        let change = token_delta.delta();
        if change > 0.0 && detail.wallet_sol_change < 0.0 {
            events.push(SwapEvent {
                signature: detail.signature.clone(),
                mint: token_delta.mint.clone(),
                direction: SwapDirection::Buy,
                token_amount: change,
                wallet_sol_change: detail.wallet_sol_change,
                pure_sol: extract_pure_sol(&detail.meta, SwapDirection::Buy, wallet),
            });
        } else if change < 0.0 {
            events.push(SwapEvent {
                signature: detail.signature.clone(),
                mint: token_delta.mint.clone(),
                direction: SwapDirection::Sell,
                token_amount: change.abs(),
                wallet_sol_change: detail.wallet_sol_change,
                pure_sol: sell_pure_sol(&detail.meta, wallet),
            });
        }
    }
    events
}

/// Pure SOL proceeds of a sell. Balance reconciliation is the primary
/// source; the temp-account instruction scan covers sells whose receiving
/// account was created inside the transaction and so has no pre balance.
fn sell_pure_sol(meta: &TransactionMeta, wallet: &str) -> Option<f64> {
    let legs = reconcile_legs(meta, wallet);
    legs.received
        .iter()
        .find(|leg| leg.mint == WSOL_MINT)
        .map(|leg| leg.amount)
        .or_else(|| extract_pure_sol(meta, SwapDirection::Sell, wallet))
}

/// Rebuild transfer legs by diffing pre/post token balances per account.
///
/// A decrease on a wallet-owned account means the wallet sent that asset; a
/// decrease anywhere else means the wallet received it (a pool vault
/// draining is the counterparty paying out, possibly via an intermediate
/// account). Increases carry no extra information and accounts created
/// inside the transaction have no pre balance to diff against, so both are
/// skipped.
pub fn reconcile_legs(meta: &TransactionMeta, wallet: &str) -> SwapLegs {
    let mut pre_amounts: HashMap<usize, f64> = HashMap::new();
    for balance in &meta.pre_token_balances {
        if let Some(amount) = balance.ui_token_amount.parse_ui_amount() {
            pre_amounts.insert(balance.account_index, amount);
        }
    }

    let mut legs = SwapLegs::default();
    for balance in &meta.post_token_balances {
        let pre_amount = match pre_amounts.get(&balance.account_index) {
            Some(amount) => *amount,
            None => continue,
        };
        let post_amount = match balance.ui_token_amount.parse_ui_amount() {
            Some(amount) => amount,
            None => continue,
        };
        let change = post_amount - pre_amount;
        if change.abs() <= DUST_TOLERANCE || change > 0.0 {
            continue;
        }
        let leg = TransferLeg {
            mint: balance.mint.clone(),
            amount: change.abs(),
        };
        if balance.owner.as_deref() == Some(wallet) {
            legs.sent.push(leg);
        } else {
            legs.received.push(leg);
        }
    }
    legs
}
