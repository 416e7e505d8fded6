// SPDX-FileCopyrightText: 2026 Paloma Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock transport for deterministic connection-manager tests.
//!
//! Each `connect()` call consumes one [`ScriptedSession`]: its events are
//! preloaded into the session's event channel, and the stream either ends
//! after the last event or is held open for live injection via
//! [`MockTransport::inject`].

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use paloma_core::{
    Credentials, Jid, MessageId, PalomaError, SendReceipt, Transport, TransportEvent,
    TransportSender, TransportSession,
};
use tokio::sync::mpsc;

/// Script for one `connect()` call.
#[derive(Debug, Default)]
pub struct ScriptedSession {
    /// Events delivered in order after the session is handed out.
    pub events: Vec<TransportEvent>,
    /// Keep the event stream open after the scripted events are drained.
    pub keep_alive: bool,
    /// Fail the connect attempt instead of producing a session.
    pub fail_connect: bool,
}

/// A record of one message sent through a mock session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub to: Jid,
    pub body: String,
}

/// Mock [`Transport`] with scripted sessions and captured sends.
pub struct MockTransport {
    sessions: Mutex<VecDeque<ScriptedSession>>,
    sent: Arc<Mutex<Vec<SentMessage>>>,
    connects: AtomicUsize,
    live_txs: Mutex<Vec<mpsc::Sender<TransportEvent>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(VecDeque::new()),
            sent: Arc::new(Mutex::new(Vec::new())),
            connects: AtomicUsize::new(0),
            live_txs: Mutex::new(Vec::new()),
        }
    }

    /// Queue the script for the next `connect()` call.
    pub fn push_session(&self, session: ScriptedSession) {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(session);
    }

    /// Number of `connect()` calls observed so far.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// All messages sent through any session of this transport.
    pub fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Inject an event into the most recent kept-alive session.
    pub async fn inject(&self, event: TransportEvent) {
        let tx = self
            .live_txs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned();
        if let Some(tx) = tx {
            let _ = tx.send(event).await;
        }
    }

    /// Drop all held event senders, ending any kept-alive streams.
    pub fn end_live_sessions(&self) {
        self.live_txs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self, _creds: &Credentials) -> Result<TransportSession, PalomaError> {
        self.connects.fetch_add(1, Ordering::SeqCst);

        let script = self
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .ok_or_else(|| PalomaError::Transport {
                message: "no scripted session left".into(),
                source: None,
            })?;

        if script.fail_connect {
            return Err(PalomaError::Transport {
                message: "scripted connect failure".into(),
                source: None,
            });
        }

        let (tx, rx) = mpsc::channel(script.events.len() + 16);
        for event in script.events {
            let _ = tx.send(event).await;
        }
        if script.keep_alive {
            self.live_txs
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(tx);
        }

        Ok(TransportSession {
            events: rx,
            sender: Arc::new(MockSessionSender {
                sent: self.sent.clone(),
                counter: AtomicUsize::new(0),
            }),
        })
    }
}

/// Capturing [`TransportSender`] used by mock sessions.
struct MockSessionSender {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    counter: AtomicUsize,
}

#[async_trait]
impl TransportSender for MockSessionSender {
    async fn send_text(&self, to: &Jid, body: &str) -> Result<SendReceipt, PalomaError> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SentMessage {
                to: to.clone(),
                body: body.to_string(),
            });
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(SendReceipt {
            message_id: Some(MessageId(format!("mock-session-msg-{n}"))),
        })
    }

    async fn close(&self) {}
}
