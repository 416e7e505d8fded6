// SPDX-FileCopyrightText: 2026 Paloma Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock send capability for engine tests.
//!
//! `MockSender` implements `SendCapability` directly, with a settable
//! connection state, captured sends, and failure injection.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use paloma_core::{
    ConnectionState, Jid, MessageId, PalomaError, SendCapability, SendReceipt,
};

use crate::mock_transport::SentMessage;

/// A mock `SendCapability` starting in the `Open` state.
pub struct MockSender {
    state: RwLock<ConnectionState>,
    sent: Mutex<Vec<SentMessage>>,
    fail_all: AtomicBool,
    fail_next: AtomicBool,
    issue_receipts: AtomicBool,
    counter: AtomicU64,
}

impl MockSender {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(ConnectionState::Open),
            sent: Mutex::new(Vec::new()),
            fail_all: AtomicBool::new(false),
            fail_next: AtomicBool::new(false),
            issue_receipts: AtomicBool::new(true),
            counter: AtomicU64::new(0),
        }
    }

    /// Override the reported connection state.
    pub fn set_state(&self, state: ConnectionState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Make every subsequent send fail.
    pub fn set_fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    /// Make exactly the next send fail.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Stop attaching message ids to receipts.
    pub fn set_issue_receipts(&self, issue: bool) {
        self.issue_receipts.store(issue, Ordering::SeqCst);
    }

    /// All captured sends, in order.
    pub fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Bodies of all captured sends, in order.
    pub fn sent_bodies(&self) -> Vec<String> {
        self.sent_messages().into_iter().map(|m| m.body).collect()
    }

    /// Count of captured sends.
    pub fn sent_count(&self) -> usize {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for MockSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SendCapability for MockSender {
    fn current_state(&self) -> ConnectionState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    async fn send_text(&self, to: &Jid, body: &str) -> Result<SendReceipt, PalomaError> {
        if self.current_state() != ConnectionState::Open {
            return Err(PalomaError::NotConnected);
        }
        if self.fail_all.load(Ordering::SeqCst) || self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(PalomaError::Transport {
                message: "injected send failure".into(),
                source: None,
            });
        }

        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SentMessage {
                to: to.clone(),
                body: body.to_string(),
            });

        let message_id = if self.issue_receipts.load(Ordering::SeqCst) {
            let n = self.counter.fetch_add(1, Ordering::SeqCst);
            Some(MessageId(format!("mock-msg-{n}")))
        } else {
            None
        };
        Ok(SendReceipt { message_id })
    }
}
