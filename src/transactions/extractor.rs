// =============================================================================
// PURE SOL EXTRACTION
// =============================================================================
//
// Digs the wSOL leg of a swap out of innerInstructions, separating the swap
// amount itself from the fees, rent and tips that also move the wallet's SOL
// balance. Returns None whenever the leg cannot be identified; callers must
// carry that forward instead of assuming zero.

use std::collections::HashSet;

use serde_json::Value;

use crate::config::WSOL_MINT;
use crate::transactions::types::{SwapDirection, TransactionMeta};

/// Pure swap amount in SOL for the given direction, if it can be isolated.
pub fn extract_pure_sol(meta: &TransactionMeta, direction: SwapDirection, wallet: &str) -> Option<f64> {
    match direction {
        SwapDirection::Buy => wsol_sent_by_wallet(meta, wallet),
        SwapDirection::Sell => wsol_received_via_temp_accounts(meta, wallet),
    }
}

/// Buy leg: the wallet itself authorizes a wSOL transferChecked into the pool.
fn wsol_sent_by_wallet(meta: &TransactionMeta, wallet: &str) -> Option<f64> {
    for set in meta.inner_instruction_sets() {
        for inst in &set.instructions {
            if inst.program.as_deref() != Some("spl-token") {
                continue;
            }
            if inst.parsed_type() != Some("transferChecked") {
                continue;
            }
            let info = match inst.parsed_info() {
                Some(info) => info,
                None => continue,
            };
            if info.get("mint").and_then(Value::as_str) != Some(WSOL_MINT) {
                continue;
            }
            if info.get("authority").and_then(Value::as_str) != Some(wallet) {
                continue;
            }
            return info
                .get("tokenAmount")
                .and_then(|amount| amount.get("uiAmount"))
                .and_then(Value::as_f64);
        }
    }
    None
}

/// Sell leg: sells usually route proceeds through a temporary wSOL account
/// owned by the wallet, initialized and closed within the same transaction.
/// Find those accounts first, then the wSOL transfer landing in one of them.
fn wsol_received_via_temp_accounts(meta: &TransactionMeta, wallet: &str) -> Option<f64> {
    let mut temp_accounts: HashSet<&str> = HashSet::new();
    for set in meta.inner_instruction_sets() {
        for inst in &set.instructions {
            match inst.parsed_type() {
                Some("initializeAccount") | Some("initializeAccount3") => {}
                _ => continue,
            }
            let info = match inst.parsed_info() {
                Some(info) => info,
                None => continue,
            };
            if info.get("mint").and_then(Value::as_str) != Some(WSOL_MINT) {
                continue;
            }
            if info.get("owner").and_then(Value::as_str) != Some(wallet) {
                continue;
            }
            if let Some(account) = info.get("account").and_then(Value::as_str) {
                temp_accounts.insert(account);
            }
        }
    }
    if temp_accounts.is_empty() {
        return None;
    }

    for set in meta.inner_instruction_sets() {
        for inst in &set.instructions {
            if inst.program.as_deref() != Some("spl-token") {
                continue;
            }
            if inst.parsed_type() != Some("transferChecked") {
                continue;
            }
            let info = match inst.parsed_info() {
                Some(info) => info,
                None => continue,
            };
            if info.get("mint").and_then(Value::as_str) != Some(WSOL_MINT) {
                continue;
            }
            let destination = match info.get("destination").and_then(Value::as_str) {
                Some(dest) => dest,
                None => continue,
            };
            if !temp_accounts.contains(destination) {
                continue;
            }
            return info
                .get("tokenAmount")
                .and_then(|amount| amount.get("uiAmount"))
                .and_then(Value::as_f64);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const WALLET: &str = "WaLLet1111111111111111111111111111111111111";
    const POOL: &str = "Poo1Authority111111111111111111111111111111";

    fn meta_from(value: Value) -> TransactionMeta {
        serde_json::from_value(value).expect("fixture meta should parse")
    }

    #[test]
    fn buy_leg_from_wallet_authorized_transfer() {
        let meta = meta_from(json!({
            "err": null,
            "preBalances": [],
            "postBalances": [],
            "innerInstructions": [{
                "index": 2,
                "instructions": [{
                    "program": "spl-token",
                    "parsed": {
                        "type": "transferChecked",
                        "info": {
                            "mint": WSOL_MINT,
                            "authority": WALLET,
                            "destination": "VauLt",
                            "tokenAmount": { "uiAmount": 1.25, "decimals": 9 }
                        }
                    }
                }]
            }]
        }));
        assert_eq!(
            extract_pure_sol(&meta, SwapDirection::Buy, WALLET),
            Some(1.25)
        );
    }

    #[test]
    fn buy_leg_ignores_other_authorities() {
        let meta = meta_from(json!({
            "err": null,
            "preBalances": [],
            "postBalances": [],
            "innerInstructions": [{
                "instructions": [{
                    "program": "spl-token",
                    "parsed": {
                        "type": "transferChecked",
                        "info": {
                            "mint": WSOL_MINT,
                            "authority": POOL,
                            "tokenAmount": { "uiAmount": 9.0 }
                        }
                    }
                }]
            }]
        }));
        assert_eq!(extract_pure_sol(&meta, SwapDirection::Buy, WALLET), None);
    }

    #[test]
    fn buy_leg_requires_token_program_transfer() {
        // Same shape under an undecoded program is not a swap leg.
        let meta = meta_from(json!({
            "err": null,
            "preBalances": [],
            "postBalances": [],
            "innerInstructions": [{
                "instructions": [{
                    "parsed": {
                        "type": "transferChecked",
                        "info": {
                            "mint": WSOL_MINT,
                            "authority": WALLET,
                            "tokenAmount": { "uiAmount": 1.25 }
                        }
                    }
                }]
            }]
        }));
        assert_eq!(extract_pure_sol(&meta, SwapDirection::Buy, WALLET), None);
    }

    #[test]
    fn sell_leg_lands_in_temp_wsol_account() {
        let meta = meta_from(json!({
            "err": null,
            "preBalances": [],
            "postBalances": [],
            "innerInstructions": [{
                "instructions": [
                    {
                        "program": "spl-token",
                        "parsed": {
                            "type": "initializeAccount3",
                            "info": {
                                "account": "TempWso1Acct",
                                "mint": WSOL_MINT,
                                "owner": WALLET
                            }
                        }
                    },
                    {
                        "program": "spl-token",
                        "parsed": {
                            "type": "transferChecked",
                            "info": {
                                "mint": WSOL_MINT,
                                "authority": POOL,
                                "destination": "TempWso1Acct",
                                "tokenAmount": { "uiAmount": 0.75, "decimals": 9 }
                            }
                        }
                    }
                ]
            }]
        }));
        assert_eq!(
            extract_pure_sol(&meta, SwapDirection::Sell, WALLET),
            Some(0.75)
        );
    }

    #[test]
    fn sell_leg_ignores_transfers_to_foreign_accounts() {
        let meta = meta_from(json!({
            "err": null,
            "preBalances": [],
            "postBalances": [],
            "innerInstructions": [{
                "instructions": [
                    {
                        "program": "spl-token",
                        "parsed": {
                            "type": "initializeAccount",
                            "info": {
                                "account": "SomeoneE1ses",
                                "mint": WSOL_MINT,
                                "owner": POOL
                            }
                        }
                    },
                    {
                        "program": "spl-token",
                        "parsed": {
                            "type": "transferChecked",
                            "info": {
                                "mint": WSOL_MINT,
                                "destination": "SomeoneE1ses",
                                "tokenAmount": { "uiAmount": 0.75 }
                            }
                        }
                    }
                ]
            }]
        }));
        assert_eq!(extract_pure_sol(&meta, SwapDirection::Sell, WALLET), None);
    }

    #[test]
    fn sell_leg_absent_when_nothing_matches() {
        let meta = meta_from(json!({
            "err": null,
            "preBalances": [],
            "postBalances": []
        }));
        assert_eq!(extract_pure_sol(&meta, SwapDirection::Sell, WALLET), None);
    }
}
