// SPDX-FileCopyrightText: 2026 Paloma Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON frame types spoken with the WhatsApp Web gateway sidecar.
//!
//! The sidecar owns the wire protocol proper (encryption, multi-device
//! sessions); over the socket it exchanges small tagged JSON frames:
//! events flowing in (`qr`, `open`, `close`, `creds`, `messages`, `ack`)
//! and commands flowing out (`init`, `send`).

use std::collections::BTreeMap;

use chrono::DateTime;
use paloma_core::{
    CloseReason, CredentialUpdate, InboundEnvelope, Jid, MessageBatch, MessageContent,
    TransportEvent,
};
use serde::{Deserialize, Serialize};

/// One frame received from the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GatewayEvent {
    /// Fresh pairing challenge.
    Qr { code: String },
    /// Session reached the open state.
    Open {
        #[serde(default)]
        jid: Option<String>,
    },
    /// Session ended. `reason` is a machine code; `detail` is human-readable.
    Close {
        reason: String,
        #[serde(default)]
        detail: Option<String>,
    },
    /// One rotated credential blob.
    Creds {
        file: String,
        data: serde_json::Value,
    },
    /// Inbound message batch; `live` is false for history replays.
    Messages {
        live: bool,
        items: Vec<GatewayMessage>,
    },
    /// Delivery receipt correlated to a `send` command.
    Ack {
        id: String,
        #[serde(default)]
        msg_id: Option<String>,
        #[serde(default)]
        error: Option<String>,
    },
}

/// One frame sent to the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum GatewayCommand {
    /// First frame after connect: replay stored credentials.
    Init {
        creds: BTreeMap<String, serde_json::Value>,
    },
    /// Deliver a text message; answered by an `ack` with the same `id`.
    Send { id: String, to: String, body: String },
}

/// Decoded shape of one inbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayMessage {
    pub from: String,
    pub to: String,
    /// Unix seconds.
    pub timestamp: i64,
    pub kind: MessageKind,
    /// Text body or media caption, depending on `kind`.
    #[serde(default)]
    pub body: Option<String>,
}

/// Message shapes the gateway distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    ExtendedText,
    Image,
    Video,
    #[serde(other)]
    Other,
}

/// The close code the gateway uses for a user-initiated unpairing.
const LOGGED_OUT: &str = "logged_out";

/// Maps a close frame to the session-level close reason.
pub fn close_reason(reason: &str, detail: Option<&str>) -> CloseReason {
    if reason == LOGGED_OUT {
        CloseReason::LoggedOut
    } else {
        CloseReason::Other(detail.unwrap_or(reason).to_string())
    }
}

/// Maps one inbound gateway message to the transport envelope.
pub fn to_envelope(msg: GatewayMessage) -> InboundEnvelope {
    let content = match (msg.kind, msg.body) {
        (MessageKind::Text, Some(body)) => MessageContent::Text(body),
        (MessageKind::ExtendedText, Some(body)) => MessageContent::ExtendedText(body),
        (MessageKind::Image, Some(body)) => MessageContent::ImageCaption(body),
        (MessageKind::Video, Some(body)) => MessageContent::VideoCaption(body),
        _ => MessageContent::Unsupported,
    };
    InboundEnvelope {
        from: Jid(msg.from),
        to: Jid(msg.to),
        timestamp: DateTime::from_timestamp(msg.timestamp, 0).unwrap_or(DateTime::UNIX_EPOCH),
        content,
    }
}

/// Maps a non-ack gateway event to a [`TransportEvent`].
///
/// `Ack` frames are correlated to in-flight sends by the socket layer and
/// never surface as transport events; they return `None` here.
pub fn to_transport_event(event: GatewayEvent) -> Option<TransportEvent> {
    match event {
        GatewayEvent::Qr { code } => Some(TransportEvent::PairingCode(code)),
        GatewayEvent::Open { jid } => Some(TransportEvent::Opened {
            jid: jid.map(Jid),
        }),
        GatewayEvent::Close { reason, detail } => Some(TransportEvent::Closed {
            reason: close_reason(&reason, detail.as_deref()),
        }),
        GatewayEvent::Creds { file, data } => {
            Some(TransportEvent::CredentialsRotated(CredentialUpdate {
                file,
                data,
            }))
        }
        GatewayEvent::Messages { live, items } => Some(TransportEvent::Messages(MessageBatch {
            live,
            items: items.into_iter().map(to_envelope).collect(),
        })),
        GatewayEvent::Ack { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qr_frame_parses() {
        let event: GatewayEvent =
            serde_json::from_str(r#"{"event":"qr","code":"2@abcdef"}"#).unwrap();
        assert_eq!(
            event,
            GatewayEvent::Qr {
                code: "2@abcdef".into()
            }
        );
        assert_eq!(
            to_transport_event(event),
            Some(TransportEvent::PairingCode("2@abcdef".into()))
        );
    }

    #[test]
    fn open_frame_parses_with_and_without_jid() {
        let with: GatewayEvent =
            serde_json::from_str(r#"{"event":"open","jid":"me@s.whatsapp.net"}"#).unwrap();
        assert_eq!(
            to_transport_event(with),
            Some(TransportEvent::Opened {
                jid: Some(Jid("me@s.whatsapp.net".into()))
            })
        );

        let without: GatewayEvent = serde_json::from_str(r#"{"event":"open"}"#).unwrap();
        assert_eq!(
            to_transport_event(without),
            Some(TransportEvent::Opened { jid: None })
        );
    }

    #[test]
    fn close_reason_distinguishes_logout() {
        assert!(close_reason("logged_out", None).is_terminal());
        assert!(!close_reason("connection_lost", None).is_terminal());
        assert_eq!(
            close_reason("stream_error", Some("server reset")),
            CloseReason::Other("server reset".into())
        );
    }

    #[test]
    fn creds_frame_becomes_rotation_event() {
        let event: GatewayEvent = serde_json::from_str(
            r#"{"event":"creds","file":"creds.json","data":{"epoch":3}}"#,
        )
        .unwrap();
        match to_transport_event(event) {
            Some(TransportEvent::CredentialsRotated(update)) => {
                assert_eq!(update.file, "creds.json");
                assert_eq!(update.data["epoch"], 3);
            }
            other => panic!("expected rotation event, got {other:?}"),
        }
    }

    #[test]
    fn messages_frame_maps_kinds_to_content() {
        let event: GatewayEvent = serde_json::from_str(
            r#"{"event":"messages","live":true,"items":[
                {"from":"a@s.whatsapp.net","to":"b@s.whatsapp.net","timestamp":1700000000,"kind":"text","body":"plain"},
                {"from":"a@s.whatsapp.net","to":"b@s.whatsapp.net","timestamp":1700000001,"kind":"image","body":"a caption"},
                {"from":"a@s.whatsapp.net","to":"b@s.whatsapp.net","timestamp":1700000002,"kind":"sticker"}
            ]}"#,
        )
        .unwrap();

        match to_transport_event(event) {
            Some(TransportEvent::Messages(batch)) => {
                assert!(batch.live);
                assert_eq!(
                    batch.items[0].content,
                    MessageContent::Text("plain".into())
                );
                assert_eq!(
                    batch.items[1].content,
                    MessageContent::ImageCaption("a caption".into())
                );
                assert_eq!(batch.items[2].content, MessageContent::Unsupported);
                assert_eq!(batch.items[0].timestamp.timestamp(), 1_700_000_000);
            }
            other => panic!("expected messages event, got {other:?}"),
        }
    }

    #[test]
    fn media_without_caption_is_unsupported() {
        let msg = GatewayMessage {
            from: "a@s.whatsapp.net".into(),
            to: "b@s.whatsapp.net".into(),
            timestamp: 0,
            kind: MessageKind::Image,
            body: None,
        };
        assert_eq!(to_envelope(msg).content, MessageContent::Unsupported);
    }

    #[test]
    fn ack_frames_never_surface_as_transport_events() {
        let event: GatewayEvent = serde_json::from_str(
            r#"{"event":"ack","id":"req-1","msg_id":"WAMID.9"}"#,
        )
        .unwrap();
        assert_eq!(to_transport_event(event), None);
    }

    #[test]
    fn send_command_serializes_with_action_tag() {
        let cmd = GatewayCommand::Send {
            id: "req-1".into(),
            to: "group@g.us".into(),
            body: "hello".into(),
        };
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&cmd).unwrap()).unwrap();
        assert_eq!(json["action"], "send");
        assert_eq!(json["id"], "req-1");
        assert_eq!(json["to"], "group@g.us");
        assert_eq!(json["body"], "hello");
    }

    #[test]
    fn init_command_carries_credential_files() {
        let mut creds = BTreeMap::new();
        creds.insert("creds.json".to_string(), serde_json::json!({"epoch": 1}));
        let cmd = GatewayCommand::Init { creds };
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&cmd).unwrap()).unwrap();
        assert_eq!(json["action"], "init");
        assert_eq!(json["creds"]["creds.json"]["epoch"], 1);
    }
}
