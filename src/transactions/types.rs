// =============================================================================
// TRANSACTION DATA STRUCTURES
// =============================================================================
//
// Wire types mirror the `getTransaction` jsonParsed response closely enough
// to deserialize directly; domain types are what the classifier and tracker
// exchange. Inner-instruction `parsed` payloads stay raw JSON because their
// shape varies per program (spl-token parses to an object, memo to a bare
// string).

use serde::{Deserialize, Serialize};

// =============================================================================
// WIRE TYPES (getTransaction response)
// =============================================================================

/// `result` of a getTransaction call.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEnvelope {
    pub transaction: TransactionData,
    pub meta: Option<TransactionMeta>,
    #[serde(default)]
    pub slot: Option<u64>,
    #[serde(default)]
    pub block_time: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionData {
    pub message: TransactionMessage,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMessage {
    pub account_keys: Vec<AccountKey>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountKey {
    pub pubkey: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMeta {
    /// Non-null when the transaction failed on-chain.
    #[serde(default)]
    pub err: Option<serde_json::Value>,
    pub pre_balances: Vec<u64>,
    pub post_balances: Vec<u64>,
    #[serde(default)]
    pub pre_token_balances: Vec<TokenBalance>,
    #[serde(default)]
    pub post_token_balances: Vec<TokenBalance>,
    #[serde(default)]
    pub inner_instructions: Option<Vec<InnerInstructionSet>>,
}

impl TransactionMeta {
    pub fn inner_instruction_sets(&self) -> &[InnerInstructionSet] {
        self.inner_instructions.as_deref().unwrap_or(&[])
    }
}

/// One entry of pre/postTokenBalances.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    pub account_index: usize,
    pub mint: String,
    #[serde(default)]
    pub owner: Option<String>,
    pub ui_token_amount: UiTokenAmount,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiTokenAmount {
    pub amount: String,
    pub decimals: u8,
    #[serde(default)]
    pub ui_amount: Option<f64>,
    #[serde(default)]
    pub ui_amount_string: Option<String>,
}

impl UiTokenAmount {
    /// UI amount, treating a missing string as a zero balance.
    pub fn ui_amount_or_zero(&self) -> f64 {
        self.parse_ui_amount().unwrap_or(0.0)
    }

    /// UI amount, None when the string is absent or unparsable.
    pub fn parse_ui_amount(&self) -> Option<f64> {
        self.ui_amount_string.as_deref()?.parse().ok()
    }
}

/// Inner instructions grouped under one top-level instruction index.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InnerInstructionSet {
    #[serde(default)]
    pub index: Option<u64>,
    #[serde(default)]
    pub instructions: Vec<InnerInstruction>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InnerInstruction {
    /// Program name when the RPC node could decode it ("spl-token", ...).
    #[serde(default)]
    pub program: Option<String>,
    #[serde(default)]
    pub parsed: Option<serde_json::Value>,
}

impl InnerInstruction {
    pub fn parsed_type(&self) -> Option<&str> {
        self.parsed.as_ref()?.get("type")?.as_str()
    }

    pub fn parsed_info(&self) -> Option<&serde_json::Value> {
        self.parsed.as_ref()?.get("info")
    }
}

// =============================================================================
// DOMAIN TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapDirection {
    Buy,
    Sell,
}

impl SwapDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwapDirection::Buy => "buy",
            SwapDirection::Sell => "sell",
        }
    }
}

/// Canonical classified swap event as applied to tracked positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapEvent {
    pub signature: String,
    pub mint: String,
    pub direction: SwapDirection,
    /// Token quantity in UI units, always positive.
    pub token_amount: f64,
    /// Signed SOL delta of the wallet account itself, fees included.
    pub wallet_sol_change: f64,
    /// The isolated swap leg in SOL. None means "amount unknown" and must
    /// never be substituted with zero downstream.
    pub pure_sol: Option<f64>,
}

/// One wallet-owned mint balance change within a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenDelta {
    pub mint: String,
    pub pre: f64,
    pub post: f64,
}

impl TokenDelta {
    pub fn delta(&self) -> f64 {
        self.post - self.pre
    }
}

/// Normalized fetch result: the wallet-relative balance picture plus the
/// parsed meta retained for pure-amount extraction.
#[derive(Debug, Clone)]
pub struct TransactionDetail {
    pub signature: String,
    /// Signed SOL delta of the wallet account.
    pub wallet_sol_change: f64,
    /// Wallet-owned token deltas, one entry per mint present after the tx.
    pub token_deltas: Vec<TokenDelta>,
    pub meta: TransactionMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_token_balance_entry() {
        let balance: TokenBalance = serde_json::from_value(serde_json::json!({
            "accountIndex": 4,
            "mint": "So11111111111111111111111111111111111111112",
            "owner": "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin",
            "programId": "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
            "uiTokenAmount": {
                "amount": "1500000000",
                "decimals": 9,
                "uiAmount": 1.5,
                "uiAmountString": "1.5"
            }
        }))
        .expect("token balance should parse");

        assert_eq!(balance.account_index, 4);
        assert_eq!(balance.ui_token_amount.ui_amount_or_zero(), 1.5);
    }

    #[test]
    fn missing_ui_amount_string_defaults_to_zero() {
        let amount = UiTokenAmount {
            amount: "0".to_string(),
            decimals: 6,
            ui_amount: None,
            ui_amount_string: None,
        };
        assert_eq!(amount.ui_amount_or_zero(), 0.0);
        assert_eq!(amount.parse_ui_amount(), None);
    }

    #[test]
    fn parsed_payload_accessors_tolerate_non_object() {
        // Memo program instructions parse to a bare string.
        let inst = InnerInstruction {
            program: Some("spl-memo".to_string()),
            parsed: Some(serde_json::json!("hello")),
        };
        assert_eq!(inst.parsed_type(), None);
        assert!(inst.parsed_info().is_none());
    }

    #[test]
    fn null_inner_instructions_is_empty() {
        let meta: TransactionMeta = serde_json::from_value(serde_json::json!({
            "err": null,
            "preBalances": [0u64],
            "postBalances": [0u64],
            "innerInstructions": null
        }))
        .expect("meta should parse");
        assert!(meta.inner_instruction_sets().is_empty());
    }

    #[test]
    fn token_delta_sign() {
        let delta = TokenDelta {
            mint: "M".to_string(),
            pre: 10.0,
            post: 4.0,
        };
        assert_eq!(delta.delta(), -6.0);
    }
}
