use futures_util::{SinkExt, Stream, StreamExt};
use log::{debug, error, info, warn};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::{self, Message};

use crate::error::{Error, Result};
use crate::models::events::{EventKind, LoggedEvent};
use crate::models::rpc::{RpcRequest, SubscribeParams, WsFrame};

const SUBSCRIBE_ID: u64 = 1;
const NOTIFICATION_METHOD: &str = "contract_subscription";

/// Live ledger subscription. Dropping the handle stops the read loop and closes the
/// connection, same as `close`.
pub struct Subscription {
    shutdown_tx: oneshot::Sender<()>,
}

impl Subscription {
    pub fn new(shutdown_tx: oneshot::Sender<()>) -> Self {
        Self { shutdown_tx }
    }

    pub fn close(self) {
        info!("Closing ledger subscription");
        let _ = self.shutdown_tx.send(());
    }
}

/// Connects to the ledger WebSocket, subscribes to `kinds` on `contract` and forwards
/// every decoded log to `sender` in delivery order.
pub async fn subscribe(
    ws_url: &str,
    contract: &str,
    kinds: &[EventKind],
    sender: mpsc::UnboundedSender<LoggedEvent>,
) -> Result<Subscription> {
    // 1. connect
    let (ws_stream, _) = tokio_tungstenite::connect_async(ws_url).await?;
    info!("Ledger WebSocket connected: {}", ws_url);

    let (mut sink, mut stream) = ws_stream.split();

    // 2. one subscription covering every requested event name
    let request = serde_json::to_string(&RpcRequest::new(
        SUBSCRIBE_ID,
        "contract_subscribe",
        SubscribeParams {
            contract,
            events: kinds.iter().map(EventKind::as_str).collect(),
        },
    ))?;
    debug!("Subscribing: {}", request);
    sink.send(Message::text(request)).await?;

    let subscription_id = await_ack(&mut stream).await?;
    info!("Ledger subscription {} active", subscription_id);

    // 3. read loop on its own task, stopped by the shutdown channel
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        tokio::select! {
            _ = async {
                while let Some(msg) = stream.next().await {
                    match msg {
                        Ok(Message::Text(text)) => {
                            if !forward(text.as_str(), &sender) {
                                break;
                            }
                        }
                        Ok(Message::Close(frame)) => {
                            warn!("Ledger closed the connection: {:?}", frame);
                            break;
                        }
                        Ok(_) => {}
                        Err(e) => {
                            error!("WebSocket error: {}", e);
                            break;
                        }
                    }
                }
            } => {
                warn!("Ledger subscription ended; session data may go stale");
            },

            _ = shutdown_rx => {
                info!("Ledger subscription shutdown requested");
            }
        }

        sink.close().await.ok();
    });

    Ok(Subscription::new(shutdown_tx))
}

async fn await_ack<S>(stream: &mut S) -> Result<String>
where
    S: Stream<Item = std::result::Result<Message, tungstenite::Error>> + Unpin,
{
    while let Some(msg) = stream.next().await {
        let Message::Text(text) = msg? else {
            continue;
        };
        match serde_json::from_str::<WsFrame>(text.as_str()) {
            Ok(WsFrame::Response(resp)) if resp.id == Some(SUBSCRIBE_ID) => {
                if let Some(err) = resp.error {
                    error!("Subscription refused: {}", err.message);
                    return Err(Error::Rpc {
                        code: err.code,
                        message: err.message,
                    });
                }
                return Ok(resp
                    .result
                    .map(|v| v.as_str().map(str::to_owned).unwrap_or_else(|| v.to_string()))
                    .unwrap_or_default());
            }
            _ => warn!("Ignoring frame before subscription ack: {}", text.as_str()),
        }
    }
    Err(Error::MalformedResponse(
        "connection closed before subscription ack".to_owned(),
    ))
}

/// Decodes one text frame. Returns false once nobody is listening any more.
fn forward(text: &str, sender: &mpsc::UnboundedSender<LoggedEvent>) -> bool {
    match decode(text) {
        Some(event) => {
            debug!(
                "Ledger event {} at {:?}",
                event.event.kind().as_str(),
                event.position()
            );
            if sender.send(event).is_err() {
                info!("Event receiver dropped, stopping subscription");
                return false;
            }
        }
        None => warn!("Received invalid message: {}", text),
    }
    true
}

pub fn decode(text: &str) -> Option<LoggedEvent> {
    match serde_json::from_str::<WsFrame>(text).ok()? {
        WsFrame::Notification { method, params } if method == NOTIFICATION_METHOD => {
            Some(params.result)
        }
        _ => None,
    }
}
