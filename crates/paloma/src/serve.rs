// SPDX-FileCopyrightText: 2026 Paloma Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `paloma serve` command implementation.
//!
//! Wires the Supabase backend adapters, the WhatsApp gateway transport, the
//! connection manager, both sync engines, the inbox archiver, and the pairing
//! page, then runs the connection manager in the foreground. The manager
//! returning means either a terminal logout or an operator shutdown; both
//! tear down the background tasks through the shared cancellation token.

use std::sync::Arc;
use std::time::Duration;

use paloma_config::PalomaConfig;
use paloma_core::{Jid, ObjectStore, PalomaError, RelayStore, SendCapability};
use paloma_pair::PairServerConfig;
use paloma_session::{ConnectionManager, CredentialStore, ManagerHandles, ReconnectPolicy};
use paloma_supabase::{BucketStore, SupabaseClient, TableStore};
use paloma_sync::{BucketSync, BucketSyncConfig, InboxArchiver, OutboxSync, OutboxSyncConfig, SentLedger};
use paloma_whatsapp::WhatsAppTransport;
use tracing::{error, info};

use crate::shutdown;

/// Runs the `paloma serve` command.
pub async fn run_serve(config: PalomaConfig) -> Result<(), PalomaError> {
    init_tracing(&config.relay.log_level);

    info!(name = config.relay.name.as_str(), "starting paloma relay");

    // Validation guarantees these are present; the ok_or_else keeps the
    // contract visible without unwraps.
    let supabase_url = config
        .supabase
        .url
        .as_deref()
        .ok_or_else(|| PalomaError::Config("supabase.url is required".into()))?;
    let service_key = config
        .supabase
        .service_key
        .as_deref()
        .ok_or_else(|| PalomaError::Config("supabase.service_key is required".into()))?;
    let gateway_url = config
        .whatsapp
        .gateway_url
        .clone()
        .ok_or_else(|| PalomaError::Config("whatsapp.gateway_url is required".into()))?;
    let group = Jid(config
        .whatsapp
        .group_jid
        .clone()
        .ok_or_else(|| PalomaError::Config("whatsapp.group_jid is required".into()))?);

    // Backend adapters share one authenticated HTTP client.
    let client = SupabaseClient::new(supabase_url, service_key)?;
    let bucket_store: Arc<dyn ObjectStore> =
        Arc::new(BucketStore::new(client.clone(), config.supabase.bucket.clone()));
    let relay_store: Arc<dyn RelayStore> = Arc::new(TableStore::new(client));

    // Connection manager owning the gateway transport session.
    let transport = Arc::new(WhatsAppTransport::new(
        gateway_url,
        Duration::from_secs(config.whatsapp.ack_timeout_secs),
    ));
    let creds = CredentialStore::new(&config.whatsapp.credentials_dir);
    let policy = ReconnectPolicy::from_config(&config.reconnect);
    let (manager, handles) = ConnectionManager::new(transport, creds, policy);
    let ManagerHandles {
        send,
        state,
        pairing,
        inbound,
    } = handles;
    let send: Arc<dyn SendCapability> = Arc::new(send);

    let cancel = shutdown::install_signal_handler();

    // Pairing presentation page (pull-based).
    let pair_config = PairServerConfig {
        host: config.pair.host.clone(),
        port: config.pair.port,
    };
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = paloma_pair::serve(&pair_config, pairing, state, cancel).await {
                error!(error = %e, "pairing page failed");
            }
        });
    }

    // Both engines poll on the same period, independently.
    let interval = Duration::from_secs(config.sync.interval_secs);

    let ledger = SentLedger::load(&config.sync.ledger_path);
    let bucket_engine = BucketSync::new(
        bucket_store,
        send.clone(),
        ledger,
        BucketSyncConfig {
            interval,
            prefix: config.supabase.prefix.clone(),
            page_limit: config.sync.page_limit,
            doc_suffix: config.sync.doc_suffix.clone(),
            group: group.clone(),
        },
    );
    tokio::spawn(bucket_engine.run(cancel.clone()));

    let outbox_engine = OutboxSync::new(
        relay_store.clone(),
        send,
        OutboxSyncConfig {
            interval,
            batch: config.sync.outbox_batch,
            default_group: group.clone(),
        },
    );
    tokio::spawn(outbox_engine.run(cancel.clone()));

    let archiver = InboxArchiver::new(relay_store, inbound);
    tokio::spawn(archiver.run(cancel.clone()));

    info!(
        bucket = config.supabase.bucket.as_str(),
        group = %group,
        interval_secs = config.sync.interval_secs,
        pair_port = config.pair.port,
        "relay configured"
    );

    // The manager runs in the foreground until logout or shutdown; either
    // way the token tears down the engines and the pairing page.
    let result = manager.run(cancel.clone()).await;
    cancel.cancel();

    info!("paloma serve shutdown complete");
    result
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("paloma={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
