// =============================================================================
// LOG SUBSCRIPTION STREAM
// =============================================================================
//
// Maintains the logsSubscribe websocket feed for the monitored wallet and
// forwards successful signatures over an unbounded channel, stamped at the
// moment of receipt. The channel hop keeps slow downstream fetches from
// stalling the read loop. There is no resume cursor: every reconnect
// subscribes from scratch and anything missed in between stays missed.

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::errors::WsError;
use crate::logger::{self, LogTag};
use crate::shutdown::Shutdown;
use crate::utils::short_id;

/// Fixed backoff between reconnect attempts.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// One signature received from the stream, stamped at receipt so latency
/// can be measured against when the transaction was first seen.
#[derive(Debug, Clone)]
pub struct StreamSignature {
    pub signature: String,
    pub arrived_at: DateTime<Utc>,
}

/// logsSubscribe request frame.
#[derive(Serialize)]
struct LogsSubscribe {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: Vec<Value>,
}

pub struct StreamConnector {
    ws_url: String,
    wallet_address: String,
    shutdown: Shutdown,
}

impl StreamConnector {
    pub fn new(ws_url: impl Into<String>, wallet_address: impl Into<String>, shutdown: Shutdown) -> Self {
        Self {
            ws_url: ws_url.into(),
            wallet_address: wallet_address.into(),
            shutdown,
        }
    }

    /// Run the subscription until shutdown. Every failure tears the
    /// connection down and reconnects from scratch after a fixed delay.
    pub async fn run(&self, sender: mpsc::UnboundedSender<StreamSignature>) {
        while !self.shutdown.is_triggered() {
            match self.connect_and_listen(&sender).await {
                Ok(()) => break,
                Err(WsError::ChannelClosed) => {
                    // Consumer is gone; reconnecting would feed nobody.
                    logger::debug(LogTag::Websocket, "Signature channel closed, stopping stream");
                    break;
                }
                Err(error) => {
                    logger::warning(
                        LogTag::Websocket,
                        &format!(
                            "Stream error: {} - reconnecting in {}s",
                            error,
                            RECONNECT_DELAY.as_secs()
                        ),
                    );
                }
            }
            if self.shutdown.delay_or_shutdown(RECONNECT_DELAY).await {
                break;
            }
        }
        logger::info(LogTag::Websocket, "Stream connector stopped");
    }

    /// One connection lifetime: connect, subscribe, pump frames until the
    /// stream breaks or shutdown is triggered.
    async fn connect_and_listen(
        &self,
        sender: &mpsc::UnboundedSender<StreamSignature>,
    ) -> Result<(), WsError> {
        logger::debug(LogTag::Websocket, &format!("Connecting to {}", self.ws_url));
        let (ws_stream, _) = connect_async(self.ws_url.as_str())
            .await
            .map_err(WsError::Connect)?;
        let (mut ws_sender, mut ws_receiver) = ws_stream.split();

        let subscribe = LogsSubscribe {
            jsonrpc: "2.0",
            id: 1,
            method: "logsSubscribe",
            params: vec![
                serde_json::json!({ "mentions": [self.wallet_address] }),
                serde_json::json!({ "commitment": "confirmed" }),
            ],
        };
        let subscribe_text = serde_json::to_string(&subscribe)?;
        ws_sender
            .send(Message::Text(subscribe_text))
            .await
            .map_err(WsError::Stream)?;
        logger::info(
            LogTag::Websocket,
            &format!("Subscribed to logs mentioning {}", short_id(&self.wallet_address)),
        );

        loop {
            tokio::select! {
                _ = self.shutdown.wait() => {
                    let _ = ws_sender.send(Message::Close(None)).await;
                    return Ok(());
                }
                message = ws_receiver.next() => match message {
                    Some(Ok(Message::Text(text))) => self.handle_frame(&text, sender)?,
                    Some(Ok(Message::Close(_))) | None => return Err(WsError::Closed),
                    Some(Ok(_)) => {} // binary, ping, pong
                    Some(Err(error)) => return Err(WsError::Stream(error)),
                },
            }
        }
    }

    /// Extract a usable signature from one text frame, if it carries one.
    fn handle_frame(
        &self,
        text: &str,
        sender: &mpsc::UnboundedSender<StreamSignature>,
    ) -> Result<(), WsError> {
        let frame: Value = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(_) => {
                logger::debug(LogTag::Websocket, "Ignoring unparsable frame");
                return Ok(());
            }
        };

        if frame.get("method").and_then(Value::as_str) != Some("logsNotification") {
            if let Some(result) = frame.get("result") {
                logger::debug(
                    LogTag::Websocket,
                    &format!("Subscription confirmed: {}", result),
                );
            }
            return Ok(());
        }

        let value = match frame
            .get("params")
            .and_then(|params| params.get("result"))
            .and_then(|result| result.get("value"))
        {
            Some(value) => value,
            None => return Ok(()),
        };

        // Failed transactions never classify into events; drop them here.
        if value.get("err").map_or(false, |err| !err.is_null()) {
            logger::debug(LogTag::Websocket, "Skipping failed transaction");
            return Ok(());
        }

        let signature = match value.get("signature").and_then(Value::as_str) {
            Some(signature) => signature,
            None => return Ok(()),
        };
        logger::debug(
            LogTag::Websocket,
            &format!("New signature {}", short_id(signature)),
        );
        sender
            .send(StreamSignature {
                signature: signature.to_string(),
                arrived_at: Utc::now(),
            })
            .map_err(|_| WsError::ChannelClosed)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALLET: &str = "WaLLet1111111111111111111111111111111111111";

    fn connector() -> StreamConnector {
        StreamConnector::new("wss://localhost:8900", WALLET, Shutdown::new())
    }

    fn notification(signature: &str, err: Value) -> String {
        serde_json::json!({
            "jsonrpc": "2.0",
            "method": "logsNotification",
            "params": {
                "result": {
                    "context": { "slot": 1234 },
                    "value": {
                        "signature": signature,
                        "err": err,
                        "logs": []
                    }
                },
                "subscription": 42
            }
        })
        .to_string()
    }

    #[test]
    fn forwards_successful_signatures() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        connector()
            .handle_frame(&notification("5sigAAAA1111", Value::Null), &sender)
            .expect("frame handled");

        let arrival = receiver.try_recv().expect("signature forwarded");
        assert_eq!(arrival.signature, "5sigAAAA1111");
    }

    #[test]
    fn drops_failed_transactions() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let err = serde_json::json!({ "InstructionError": [2, { "Custom": 6001 }] });
        connector()
            .handle_frame(&notification("5sigAAAA1111", err), &sender)
            .expect("frame handled");

        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn ignores_confirmations_and_noise() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let connector = connector();

        connector
            .handle_frame(r#"{"jsonrpc":"2.0","result":42,"id":1}"#, &sender)
            .expect("confirmation handled");
        connector
            .handle_frame("not json at all", &sender)
            .expect("garbage handled");
        connector
            .handle_frame(r#"{"method":"logsNotification","params":{}}"#, &sender)
            .expect("empty notification handled");

        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn closed_channel_surfaces_as_error() {
        let (sender, receiver) = mpsc::unbounded_channel();
        drop(receiver);

        let result = connector().handle_frame(&notification("5sigAAAA1111", Value::Null), &sender);
        assert!(matches!(result, Err(WsError::ChannelClosed)));
    }
}
