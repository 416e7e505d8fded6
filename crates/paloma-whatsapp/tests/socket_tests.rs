// SPDX-FileCopyrightText: 2026 Paloma Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Socket-level tests against an in-process mock gateway.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use paloma_core::{
    CloseReason, Credentials, Jid, MessageId, Transport, TransportEvent,
};
use paloma_whatsapp::WhatsAppTransport;
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// Accepts one socket and drives a scripted gateway conversation.
async fn spawn_gateway<F, Fut>(script: F) -> String
where
    F: FnOnce(tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = accept_async(stream).await.unwrap();
        script(ws).await;
    });
    format!("ws://{addr}")
}

fn text_frame(value: serde_json::Value) -> Message {
    Message::text(value.to_string())
}

#[tokio::test]
async fn connect_sends_init_and_surfaces_pairing_then_open() {
    let url = spawn_gateway(|mut ws| async move {
        // First client frame must be the credential replay.
        let init = ws.next().await.unwrap().unwrap();
        let init: serde_json::Value =
            serde_json::from_str(init.into_text().unwrap().as_str()).unwrap();
        assert_eq!(init["action"], "init");
        assert_eq!(init["creds"]["creds.json"]["epoch"], 5);

        ws.send(text_frame(serde_json::json!({"event": "qr", "code": "2@pairing"})))
            .await
            .unwrap();
        ws.send(text_frame(
            serde_json::json!({"event": "open", "jid": "me@s.whatsapp.net"}),
        ))
        .await
        .unwrap();

        // Hold the socket open until the client goes away.
        while ws.next().await.is_some() {}
    })
    .await;

    let mut creds = Credentials::default();
    creds.files.insert(
        "creds.json".to_string(),
        serde_json::json!({"epoch": 5}),
    );

    let transport = WhatsAppTransport::new(url, Duration::from_secs(5));
    let mut session = transport.connect(&creds).await.unwrap();

    assert_eq!(
        session.events.recv().await,
        Some(TransportEvent::PairingCode("2@pairing".into()))
    );
    assert_eq!(
        session.events.recv().await,
        Some(TransportEvent::Opened {
            jid: Some(Jid("me@s.whatsapp.net".into()))
        })
    );
}

#[tokio::test]
async fn send_is_acknowledged_with_a_receipt() {
    let url = spawn_gateway(|mut ws| async move {
        let _init = ws.next().await.unwrap().unwrap();
        ws.send(text_frame(serde_json::json!({"event": "open"})))
            .await
            .unwrap();

        // Echo the correlation id back in the ack.
        let send = ws.next().await.unwrap().unwrap();
        let send: serde_json::Value =
            serde_json::from_str(send.into_text().unwrap().as_str()).unwrap();
        assert_eq!(send["action"], "send");
        assert_eq!(send["to"], "group@g.us");
        assert_eq!(send["body"], "hello group");
        ws.send(text_frame(serde_json::json!({
            "event": "ack",
            "id": send["id"],
            "msg_id": "WAMID.777"
        })))
        .await
        .unwrap();

        while ws.next().await.is_some() {}
    })
    .await;

    let transport = WhatsAppTransport::new(url, Duration::from_secs(5));
    let mut session = transport.connect(&Credentials::default()).await.unwrap();
    assert!(session.events.recv().await.is_some()); // open

    let receipt = session
        .sender
        .send_text(&Jid("group@g.us".into()), "hello group")
        .await
        .unwrap();
    assert_eq!(receipt.message_id, Some(MessageId("WAMID.777".into())));
}

#[tokio::test]
async fn gateway_error_ack_fails_the_send() {
    let url = spawn_gateway(|mut ws| async move {
        let _init = ws.next().await.unwrap().unwrap();
        let send = ws.next().await.unwrap().unwrap();
        let send: serde_json::Value =
            serde_json::from_str(send.into_text().unwrap().as_str()).unwrap();
        ws.send(text_frame(serde_json::json!({
            "event": "ack",
            "id": send["id"],
            "error": "recipient unknown"
        })))
        .await
        .unwrap();
        while ws.next().await.is_some() {}
    })
    .await;

    let transport = WhatsAppTransport::new(url, Duration::from_secs(5));
    let session = transport.connect(&Credentials::default()).await.unwrap();

    let err = session
        .sender
        .send_text(&Jid("nobody@s.whatsapp.net".into()), "hi")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("recipient unknown"));
}

#[tokio::test]
async fn missing_ack_times_out() {
    let url = spawn_gateway(|mut ws| async move {
        let _init = ws.next().await.unwrap().unwrap();
        // Swallow the send command and never ack.
        while ws.next().await.is_some() {}
    })
    .await;

    let transport = WhatsAppTransport::new(url, Duration::from_millis(100));
    let session = transport.connect(&Credentials::default()).await.unwrap();

    let err = session
        .sender
        .send_text(&Jid("group@g.us".into()), "hi")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no delivery receipt"));
}

#[tokio::test]
async fn logout_close_frame_reaches_the_session() {
    let url = spawn_gateway(|mut ws| async move {
        let _init = ws.next().await.unwrap().unwrap();
        ws.send(text_frame(
            serde_json::json!({"event": "close", "reason": "logged_out"}),
        ))
        .await
        .unwrap();
        while ws.next().await.is_some() {}
    })
    .await;

    let transport = WhatsAppTransport::new(url, Duration::from_secs(5));
    let mut session = transport.connect(&Credentials::default()).await.unwrap();

    assert_eq!(
        session.events.recv().await,
        Some(TransportEvent::Closed {
            reason: CloseReason::LoggedOut
        })
    );
}

#[tokio::test]
async fn socket_drop_surfaces_as_non_terminal_close() {
    let url = spawn_gateway(|mut ws| async move {
        let _init = ws.next().await.unwrap().unwrap();
        ws.close(None).await.unwrap();
    })
    .await;

    let transport = WhatsAppTransport::new(url, Duration::from_secs(5));
    let mut session = transport.connect(&Credentials::default()).await.unwrap();

    match session.events.recv().await {
        Some(TransportEvent::Closed { reason }) => assert!(!reason.is_terminal()),
        other => panic!("expected close event, got {other:?}"),
    }
}
