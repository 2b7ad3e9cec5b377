// =============================================================================
// TRANSACTION DETAIL FETCHER
// =============================================================================
//
// Resolves a signature from the stream into a normalized TransactionDetail.
// RPC nodes index confirmed transactions with a short lag, so not-yet-known
// responses are retried on a fixed budget; anything wrong with the
// transaction itself is permanent and gives up immediately.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::FetchError;
use crate::logger::{self, LogTag};
use crate::rpc::RpcClient;
use crate::shutdown::Shutdown;
use crate::transactions::types::{TokenDelta, TransactionDetail, TransactionEnvelope};
use crate::utils::{lamports_delta_to_sol, short_id};

/// Retry budget: 15 attempts 1s apart bounds worst-case latency at ~15s
/// plus request timeouts.
const FETCH_ATTEMPTS: u32 = 15;
const FETCH_RETRY_DELAY: Duration = Duration::from_secs(1);

pub struct DetailFetcher {
    rpc: Arc<RpcClient>,
    wallet: String,
    shutdown: Shutdown,
}

impl DetailFetcher {
    pub fn new(rpc: Arc<RpcClient>, wallet: impl Into<String>, shutdown: Shutdown) -> Self {
        Self {
            rpc,
            wallet: wallet.into(),
            shutdown,
        }
    }

    /// Fetch and normalize one transaction. None means the signature yields
    /// no usable detail, whether because the transaction failed on-chain,
    /// does not involve the wallet, or never became available in time.
    pub async fn fetch(&self, signature: &str) -> Option<TransactionDetail> {
        for attempt in 1..=FETCH_ATTEMPTS {
            match self.attempt(signature).await {
                Ok(detail) => return Some(detail),
                Err(error) if error.is_transient() => {
                    logger::debug(
                        LogTag::Fetch,
                        &format!(
                            "{} attempt {}/{}: {}",
                            short_id(signature),
                            attempt,
                            FETCH_ATTEMPTS,
                            error
                        ),
                    );
                }
                Err(error) => {
                    logger::debug(
                        LogTag::Fetch,
                        &format!("{} unusable: {}", short_id(signature), error),
                    );
                    return None;
                }
            }
            if attempt < FETCH_ATTEMPTS && self.shutdown.delay_or_shutdown(FETCH_RETRY_DELAY).await {
                return None;
            }
        }
        logger::debug(
            LogTag::Fetch,
            &format!(
                "{} still unavailable after {} attempts",
                short_id(signature),
                FETCH_ATTEMPTS
            ),
        );
        None
    }

    async fn attempt(&self, signature: &str) -> Result<TransactionDetail, FetchError> {
        let envelope = self
            .rpc
            .get_transaction(signature)
            .await?
            .ok_or(FetchError::NotIndexed)?;
        self.normalize(signature, envelope)
    }

    /// Reduce a raw envelope to the wallet-relative picture: the wallet's
    /// SOL delta and its per-mint token deltas, with meta kept for the
    /// classifier's extraction passes.
    fn normalize(
        &self,
        signature: &str,
        envelope: TransactionEnvelope,
    ) -> Result<TransactionDetail, FetchError> {
        let meta = match envelope.meta {
            None => return Err(FetchError::Malformed("meta absent".to_string())),
            Some(meta) if meta.err.is_some() => return Err(FetchError::ExecutionFailed),
            Some(meta) => meta,
        };

        let wallet_index = envelope
            .transaction
            .message
            .account_keys
            .iter()
            .position(|key| key.pubkey == self.wallet)
            .ok_or(FetchError::WalletAbsent)?;

        let pre = *meta
            .pre_balances
            .get(wallet_index)
            .ok_or_else(|| FetchError::Malformed("preBalances too short".to_string()))?;
        let post = *meta
            .post_balances
            .get(wallet_index)
            .ok_or_else(|| FetchError::Malformed("postBalances too short".to_string()))?;
        let wallet_sol_change = lamports_delta_to_sol(pre, post);

        let mut pre_tokens: HashMap<&str, f64> = HashMap::new();
        for balance in &meta.pre_token_balances {
            if balance.owner.as_deref() == Some(self.wallet.as_str()) {
                pre_tokens.insert(
                    balance.mint.as_str(),
                    balance.ui_token_amount.ui_amount_or_zero(),
                );
            }
        }
        let token_deltas: Vec<TokenDelta> = meta
            .post_token_balances
            .iter()
            .filter(|balance| balance.owner.as_deref() == Some(self.wallet.as_str()))
            .map(|balance| TokenDelta {
                mint: balance.mint.clone(),
                pre: pre_tokens.get(balance.mint.as_str()).copied().unwrap_or(0.0),
                post: balance.ui_token_amount.ui_amount_or_zero(),
            })
            .collect();

        Ok(TransactionDetail {
            signature: signature.to_string(),
            wallet_sol_change,
            token_deltas,
            meta,
        })
    }
}
