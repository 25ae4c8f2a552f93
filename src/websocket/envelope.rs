use axum::extract::ws::Message as WsMessage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::message::Message;
use crate::models::UserSummary;

/// Client -> server frame.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundFrame {
    pub content: String,
    #[serde(rename = "senderId")]
    pub sender_id: i64,
}

/// Server -> client frame: the full persisted message with the sender's
/// public profile attached, so recipients need no follow-up lookup. `sender`
/// is null when enrichment failed; the durable fields always go out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub id: i64,
    pub conversation_id: i64,
    pub sender_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
    pub sender: Option<UserSummary>,
}

impl OutboundMessage {
    pub fn new(message: Message, sender: Option<UserSummary>) -> Self {
        let sender = sender.or(message.sender);
        Self {
            id: message.id,
            conversation_id: message.conversation_id,
            sender_id: message.sender_id,
            content: message.content,
            created_at: message.created_at,
            is_read: message.is_read,
            sender,
        }
    }

    /// Serialize once; the registry fans the same frame out to everyone.
    pub fn to_frame(&self) -> Result<WsMessage, serde_json::Error> {
        Ok(WsMessage::Text(serde_json::to_string(self)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn message() -> Message {
        Message {
            id: 10,
            conversation_id: 42,
            sender_id: 1,
            content: "hi".into(),
            created_at: Utc::now(),
            is_read: false,
            sender: None,
        }
    }

    #[test]
    fn inbound_frame_uses_camel_case_sender_id() {
        let frame: InboundFrame =
            serde_json::from_str(r#"{"content":"hi","senderId":1}"#).expect("parse");
        assert_eq!(frame.content, "hi");
        assert_eq!(frame.sender_id, 1);
    }

    #[test]
    fn malformed_inbound_frame_is_an_error() {
        assert!(serde_json::from_str::<InboundFrame>("not json").is_err());
        assert!(serde_json::from_str::<InboundFrame>(r#"{"content":"hi"}"#).is_err());
        assert!(serde_json::from_str::<InboundFrame>(r#"{"senderId":"one","content":"hi"}"#).is_err());
    }

    #[test]
    fn outbound_frame_carries_enriched_sender() {
        let outbound = OutboundMessage::new(
            message(),
            Some(UserSummary {
                id: 1,
                username: "alice".into(),
                email: "alice@example.com".into(),
            }),
        );
        let frame = outbound.to_frame().expect("serialize");
        let WsMessage::Text(text) = frame else {
            panic!("expected text frame");
        };
        let value: serde_json::Value = serde_json::from_str(&text).expect("json");
        assert_eq!(value["id"], 10);
        assert_eq!(value["conversation_id"], 42);
        assert_eq!(value["sender_id"], 1);
        assert_eq!(value["content"], "hi");
        assert_eq!(value["is_read"], false);
        assert_eq!(value["sender"]["id"], 1);
        assert_eq!(value["sender"]["username"], "alice");
        assert_eq!(value["sender"]["email"], "alice@example.com");
    }

    #[test]
    fn enrichment_failure_leaves_sender_null() {
        let outbound = OutboundMessage::new(message(), None);
        let frame = outbound.to_frame().expect("serialize");
        let WsMessage::Text(text) = frame else {
            panic!("expected text frame");
        };
        let value: serde_json::Value = serde_json::from_str(&text).expect("json");
        assert!(value["sender"].is_null());
        assert_eq!(value["content"], "hi");
    }

    #[test]
    fn message_sender_survives_when_no_override_given() {
        let mut msg = message();
        msg.sender = Some(UserSummary {
            id: 1,
            username: "alice".into(),
            email: "alice@example.com".into(),
        });
        let outbound = OutboundMessage::new(msg, None);
        assert!(outbound.sender.is_some());
    }
}
