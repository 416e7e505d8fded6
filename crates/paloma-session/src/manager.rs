// SPDX-FileCopyrightText: 2026 Paloma Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport connection lifecycle: pairing, open, reconnect, terminal logout.
//!
//! [`ConnectionManager`] is an explicit state-machine object owning the live
//! session. Dependents never touch the session directly; they receive a
//! [`SendHandle`] capability plus watch channels for the connection state and
//! the current pairing challenge. Reconnects after non-terminal closes use
//! exponential backoff with a jittered cap; a `logged out` close halts the
//! manager permanently until an operator re-pairs.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use paloma_config::model::ReconnectConfig;
use paloma_core::{
    ConnectionState, Credentials, Jid, MessageBatch, PalomaError, SendCapability, SendReceipt,
    Transport, TransportEvent, TransportSender, TransportSession,
};
use tokio::sync::{mpsc, watch, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::creds::CredentialStore;

/// Capacity of the inbound batch channel between the manager and the archiver.
const INBOUND_CHANNEL_CAPACITY: usize = 64;

/// Exponential backoff policy for transport reconnects.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    initial: Duration,
    max: Duration,
    multiplier: f64,
    jitter: f64,
}

impl ReconnectPolicy {
    pub fn new(initial: Duration, max: Duration, multiplier: f64, jitter: f64) -> Self {
        Self {
            initial,
            max,
            multiplier,
            jitter,
        }
    }

    pub fn from_config(config: &ReconnectConfig) -> Self {
        Self::new(
            Duration::from_millis(config.initial_ms),
            Duration::from_millis(config.max_ms),
            config.multiplier,
            config.jitter,
        )
    }

    /// Delay before reconnect attempt `attempt` (0-based): the initial delay
    /// multiplied per attempt, capped at `max`, with a random jitter fraction
    /// on top.
    pub fn delay(&self, attempt: u32) -> Duration {
        let base = self.initial.as_millis() as f64 * self.multiplier.powi(attempt as i32);
        let capped = base.min(self.max.as_millis() as f64);
        let jittered = capped * (1.0 + self.jitter * rand::random::<f64>());
        Duration::from_millis(jittered as u64)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::from_config(&ReconnectConfig::default())
    }
}

/// Send capability handed to the sync engines.
///
/// Cheap to clone; all clones observe the same live session. Sending while
/// the session is not open fails fast with [`PalomaError::NotConnected`].
#[derive(Clone)]
pub struct SendHandle {
    state_rx: watch::Receiver<ConnectionState>,
    sender: Arc<RwLock<Option<Arc<dyn TransportSender>>>>,
}

#[async_trait]
impl SendCapability for SendHandle {
    fn current_state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    async fn send_text(&self, to: &Jid, body: &str) -> Result<SendReceipt, PalomaError> {
        if *self.state_rx.borrow() != ConnectionState::Open {
            return Err(PalomaError::NotConnected);
        }
        let sender = self.sender.read().await.clone();
        match sender {
            Some(sender) => sender.send_text(to, body).await,
            None => Err(PalomaError::NotConnected),
        }
    }
}

/// Channels and capabilities handed out when the manager is constructed.
pub struct ManagerHandles {
    /// Send capability for the sync engines.
    pub send: SendHandle,
    /// Connection state, updated on every transition.
    pub state: watch::Receiver<ConnectionState>,
    /// Current pairing challenge; `None` once paired or between challenges.
    pub pairing: watch::Receiver<Option<String>>,
    /// Inbound message batches for the archiver.
    pub inbound: mpsc::Receiver<MessageBatch>,
}

/// How one driven session ended.
enum SessionOutcome {
    /// Logout: halt permanently.
    Terminal,
    /// Shutdown requested.
    Cancelled,
    /// Non-terminal close or stream loss: reconnect.
    Lost,
}

/// Owns the transport session state machine.
pub struct ConnectionManager {
    transport: Arc<dyn Transport>,
    creds_store: CredentialStore,
    policy: ReconnectPolicy,
    state_tx: watch::Sender<ConnectionState>,
    pairing_tx: watch::Sender<Option<String>>,
    inbound_tx: mpsc::Sender<MessageBatch>,
    sender_cell: Arc<RwLock<Option<Arc<dyn TransportSender>>>>,
}

impl ConnectionManager {
    /// Creates the manager plus the handles its dependents consume.
    pub fn new(
        transport: Arc<dyn Transport>,
        creds_store: CredentialStore,
        policy: ReconnectPolicy,
    ) -> (Self, ManagerHandles) {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (pairing_tx, pairing_rx) = watch::channel(None);
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CHANNEL_CAPACITY);
        let sender_cell: Arc<RwLock<Option<Arc<dyn TransportSender>>>> =
            Arc::new(RwLock::new(None));

        let handles = ManagerHandles {
            send: SendHandle {
                state_rx: state_rx.clone(),
                sender: sender_cell.clone(),
            },
            state: state_rx,
            pairing: pairing_rx,
            inbound: inbound_rx,
        };

        let manager = Self {
            transport,
            creds_store,
            policy,
            state_tx,
            pairing_tx,
            inbound_tx,
            sender_cell,
        };

        (manager, handles)
    }

    /// Runs the connection lifecycle until logout or shutdown.
    ///
    /// Credentials are loaded once here; rotation events update the in-memory
    /// set and are persisted before the next event is processed, so a
    /// reconnect always replays the freshest material.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), PalomaError> {
        let mut credentials = self.creds_store.load();
        if credentials.is_empty() {
            info!("no stored credentials; a pairing challenge will be issued");
        }

        let mut attempt: u32 = 0;
        loop {
            if cancel.is_cancelled() {
                break;
            }

            self.state_tx.send_replace(ConnectionState::Pairing);
            let connected = tokio::select! {
                res = self.transport.connect(&credentials) => res,
                _ = cancel.cancelled() => break,
            };

            let TransportSession { mut events, sender } = match connected {
                Ok(session) => session,
                Err(e) => {
                    warn!(error = %e, "transport connect failed");
                    self.state_tx.send_replace(ConnectionState::Disconnected);
                    if !self.backoff(&mut attempt, &cancel).await {
                        break;
                    }
                    continue;
                }
            };

            *self.sender_cell.write().await = Some(sender.clone());

            let outcome = self
                .drive_session(&mut events, &mut credentials, &mut attempt, &cancel)
                .await;

            self.sender_cell.write().await.take();
            self.pairing_tx.send_replace(None);

            match outcome {
                SessionOutcome::Terminal => {
                    self.state_tx.send_replace(ConnectionState::Disconnected);
                    return Ok(());
                }
                SessionOutcome::Cancelled => {
                    self.state_tx.send_replace(ConnectionState::Closing);
                    sender.close().await;
                    break;
                }
                SessionOutcome::Lost => {
                    self.state_tx.send_replace(ConnectionState::Disconnected);
                    if !self.backoff(&mut attempt, &cancel).await {
                        break;
                    }
                }
            }
        }

        self.state_tx.send_replace(ConnectionState::Disconnected);
        info!("connection manager stopped");
        Ok(())
    }

    /// Consumes one session's events until it closes or shutdown is requested.
    async fn drive_session(
        &self,
        events: &mut mpsc::Receiver<TransportEvent>,
        credentials: &mut Credentials,
        attempt: &mut u32,
        cancel: &CancellationToken,
    ) -> SessionOutcome {
        loop {
            let event = tokio::select! {
                ev = events.recv() => ev,
                _ = cancel.cancelled() => return SessionOutcome::Cancelled,
            };

            let Some(event) = event else {
                // The transport dropped its event stream without a close
                // event. Treat as an abnormal, non-terminal close.
                warn!("transport event stream ended without close event");
                return SessionOutcome::Lost;
            };

            match event {
                TransportEvent::PairingCode(code) => {
                    info!("pairing challenge received, surfacing to presentation page");
                    self.pairing_tx.send_replace(Some(code));
                }
                TransportEvent::Opened { jid } => {
                    *attempt = 0;
                    self.pairing_tx.send_replace(None);
                    self.state_tx.send_replace(ConnectionState::Open);
                    match jid {
                        Some(jid) => info!(jid = %jid, "session open"),
                        None => info!("session open"),
                    }
                }
                TransportEvent::CredentialsRotated(update) => {
                    credentials.apply(&update);
                    // Persisted before the next event is processed: a crash
                    // after this point never invalidates the stored session.
                    if let Err(e) = self.creds_store.store(&update) {
                        error!(
                            file = %update.file,
                            error = %e,
                            "failed to persist rotated credentials"
                        );
                    }
                }
                TransportEvent::Messages(batch) => {
                    if self.inbound_tx.send(batch).await.is_err() {
                        debug!("inbound consumer gone, discarding batch");
                    }
                }
                TransportEvent::Closed { reason } => {
                    if reason.is_terminal() {
                        warn!("session logged out; reconnection halted until re-pairing");
                        return SessionOutcome::Terminal;
                    }
                    warn!(reason = %reason, "session closed, will reconnect");
                    return SessionOutcome::Lost;
                }
            }
        }
    }

    /// Sleeps out the backoff delay. Returns `false` when shutdown interrupts.
    async fn backoff(&self, attempt: &mut u32, cancel: &CancellationToken) -> bool {
        let delay = self.policy.delay(*attempt);
        *attempt = attempt.saturating_add(1);
        debug!(
            delay_ms = delay.as_millis() as u64,
            attempt = *attempt,
            "reconnect backoff"
        );
        tokio::select! {
            _ = tokio::time::sleep(delay) => true,
            _ = cancel.cancelled() => false,
        }
    }
}
