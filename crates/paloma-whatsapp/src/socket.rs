// SPDX-FileCopyrightText: 2026 Paloma Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket session against the WhatsApp Web gateway sidecar.
//!
//! `connect` opens the socket, replays the stored credentials with an `init`
//! command, and splits the connection: a reader task maps incoming frames to
//! [`TransportEvent`]s while the returned sender writes `send` commands and
//! waits for the correlated `ack` receipt.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use paloma_core::{
    CloseReason, Credentials, Jid, MessageId, PalomaError, SendReceipt, Transport, TransportEvent,
    TransportSender, TransportSession,
};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use crate::wire::{self, GatewayCommand, GatewayEvent};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// In-flight sends keyed by correlation id; resolved by `ack` frames with
/// either a message id or a gateway-side error string.
type PendingAcks = DashMap<String, oneshot::Sender<Result<Option<String>, String>>>;

/// Capacity of the session event channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// [`Transport`] implementation backed by a gateway sidecar socket.
pub struct WhatsAppTransport {
    gateway_url: String,
    ack_timeout: Duration,
}

impl WhatsAppTransport {
    pub fn new(gateway_url: impl Into<String>, ack_timeout: Duration) -> Self {
        Self {
            gateway_url: gateway_url.into(),
            ack_timeout,
        }
    }
}

#[async_trait]
impl Transport for WhatsAppTransport {
    async fn connect(&self, creds: &Credentials) -> Result<TransportSession, PalomaError> {
        let (socket, _response) = connect_async(self.gateway_url.as_str())
            .await
            .map_err(|e| PalomaError::transport("gateway connect failed", e))?;
        let (mut sink, stream) = socket.split();

        // Replay stored credentials before anything else; an empty set makes
        // the gateway start a fresh pairing and emit a qr event.
        let init = GatewayCommand::Init {
            creds: creds.files.clone(),
        };
        let frame = serde_json::to_string(&init)
            .map_err(|e| PalomaError::Internal(format!("failed to encode init frame: {e}")))?;
        sink.send(Message::text(frame))
            .await
            .map_err(|e| PalomaError::transport("failed to send init frame", e))?;

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let pending: Arc<PendingAcks> = Arc::new(DashMap::new());
        tokio::spawn(read_loop(stream, event_tx, pending.clone()));

        Ok(TransportSession {
            events: event_rx,
            sender: Arc::new(SocketSender {
                sink: Mutex::new(sink),
                pending,
                ack_timeout: self.ack_timeout,
            }),
        })
    }
}

/// Reads gateway frames until the socket ends, resolving acks and forwarding
/// everything else as transport events.
async fn read_loop(
    mut stream: SplitStream<Socket>,
    events: mpsc::Sender<TransportEvent>,
    pending: Arc<PendingAcks>,
) {
    while let Some(frame) = stream.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => {
                let _ = events
                    .send(TransportEvent::Closed {
                        reason: CloseReason::Other("gateway closed the socket".into()),
                    })
                    .await;
                return;
            }
            Ok(_) => continue, // ping/pong/binary
            Err(e) => {
                warn!(error = %e, "gateway socket error");
                let _ = events
                    .send(TransportEvent::Closed {
                        reason: CloseReason::Other(format!("socket error: {e}")),
                    })
                    .await;
                return;
            }
        };

        let event = match serde_json::from_str::<GatewayEvent>(text.as_str()) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "unparseable gateway frame, ignoring");
                continue;
            }
        };

        match event {
            GatewayEvent::Ack { id, msg_id, error } => {
                match pending.remove(&id) {
                    Some((_, tx)) => {
                        let result = match error {
                            Some(gateway_err) => Err(gateway_err),
                            None => Ok(msg_id),
                        };
                        let _ = tx.send(result);
                    }
                    None => debug!(id = %id, "ack for unknown send, ignoring"),
                }
            }
            other => {
                let Some(transport_event) = wire::to_transport_event(other) else {
                    continue;
                };
                if events.send(transport_event).await.is_err() {
                    // Session consumer is gone; stop reading.
                    return;
                }
            }
        }
    }
    debug!("gateway socket stream ended");
}

/// Write half of the session; serializes `send` commands and correlates acks.
struct SocketSender {
    sink: Mutex<SplitSink<Socket, Message>>,
    pending: Arc<PendingAcks>,
    ack_timeout: Duration,
}

#[async_trait]
impl TransportSender for SocketSender {
    async fn send_text(&self, to: &Jid, body: &str) -> Result<SendReceipt, PalomaError> {
        let id = uuid::Uuid::new_v4().to_string();
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id.clone(), tx);

        let command = GatewayCommand::Send {
            id: id.clone(),
            to: to.0.clone(),
            body: body.to_string(),
        };
        let frame = match serde_json::to_string(&command) {
            Ok(frame) => frame,
            Err(e) => {
                self.pending.remove(&id);
                return Err(PalomaError::Internal(format!(
                    "failed to encode send frame: {e}"
                )));
            }
        };

        if let Err(e) = self.sink.lock().await.send(Message::text(frame)).await {
            self.pending.remove(&id);
            return Err(PalomaError::transport("failed to write send frame", e));
        }

        match tokio::time::timeout(self.ack_timeout, rx).await {
            Ok(Ok(Ok(msg_id))) => Ok(SendReceipt {
                message_id: msg_id.map(MessageId),
            }),
            Ok(Ok(Err(gateway_err))) => Err(PalomaError::Transport {
                message: format!("gateway rejected send: {gateway_err}"),
                source: None,
            }),
            Ok(Err(_closed)) => Err(PalomaError::Transport {
                message: "gateway closed before acknowledging send".into(),
                source: None,
            }),
            Err(_elapsed) => {
                self.pending.remove(&id);
                Err(PalomaError::Transport {
                    message: format!(
                        "no delivery receipt within {}s",
                        self.ack_timeout.as_secs()
                    ),
                    source: None,
                })
            }
        }
    }

    async fn close(&self) {
        let _ = self.sink.lock().await.send(Message::Close(None)).await;
    }
}
