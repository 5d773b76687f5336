//! Webhook event payload types.

use serde::Deserialize;

/// Fallback conversation partition when an event carries no source ids.
pub const ANONYMOUS_CONVERSATION: &str = "anonymous";

/// Top-level webhook delivery payload.
#[derive(Clone, Debug, Deserialize)]
pub struct WebhookPayload {
    /// Events bundled into this delivery.
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

/// One platform event inside a delivery.
#[derive(Clone, Debug, Deserialize)]
pub struct WebhookEvent {
    /// Event kind, e.g. `message`, `follow`, `unfollow`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Opaque token used to send the reply.
    #[serde(rename = "replyToken")]
    pub reply_token: Option<String>,
    /// Where the event originated.
    pub source: Option<EventSource>,
    /// Message body for `message` events.
    pub message: Option<EventMessage>,
}

impl WebhookEvent {
    /// True when the event carries a text message to answer.
    #[must_use]
    pub fn is_text_message(&self) -> bool {
        self.event_type == "message"
            && self
                .message
                .as_ref()
                .is_some_and(|message| message.message_type == "text" && message.text.is_some())
    }

    /// Conversation partition key for this event.
    ///
    /// Group and room chats share one history; direct chats are keyed by
    /// the sender.
    #[must_use]
    pub fn conversation_id(&self) -> String {
        let Some(source) = &self.source else {
            return ANONYMOUS_CONVERSATION.to_string();
        };
        source
            .group_id
            .as_deref()
            .or(source.room_id.as_deref())
            .or(source.user_id.as_deref())
            .unwrap_or(ANONYMOUS_CONVERSATION)
            .to_string()
    }
}

/// Origin of an event.
#[derive(Clone, Debug, Deserialize)]
pub struct EventSource {
    /// Sender user id.
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    /// Group chat id, when sent in a group.
    #[serde(rename = "groupId")]
    pub group_id: Option<String>,
    /// Room chat id, when sent in a multi-person room.
    #[serde(rename = "roomId")]
    pub room_id: Option<String>,
}

/// Message body of a `message` event.
#[derive(Clone, Debug, Deserialize)]
pub struct EventMessage {
    /// Message kind, e.g. `text`, `image`, `sticker`.
    #[serde(rename = "type")]
    pub message_type: String,
    /// Platform message id.
    pub id: Option<String>,
    /// Text content for `text` messages.
    pub text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELIVERY: &str = r#"{
        "destination": "Uabcdef",
        "events": [
            {
                "type": "message",
                "replyToken": "reply-token-1",
                "source": {"type": "user", "userId": "U123"},
                "message": {"type": "text", "id": "100001", "text": "What is 2+2?"}
            },
            {
                "type": "message",
                "replyToken": "reply-token-2",
                "source": {"type": "user", "userId": "U456"},
                "message": {"type": "sticker", "id": "100002"}
            },
            {
                "type": "follow",
                "source": {"type": "user", "userId": "U789"}
            }
        ]
    }"#;

    #[test]
    fn test_payload_deserializes_real_shape() {
        let payload: WebhookPayload = serde_json::from_str(DELIVERY).unwrap();
        assert_eq!(payload.events.len(), 3);
        assert!(payload.events[0].is_text_message());
        assert!(!payload.events[1].is_text_message());
        assert!(!payload.events[2].is_text_message());
    }

    #[test]
    fn test_conversation_id_prefers_group_over_user() {
        let event = WebhookEvent {
            event_type: "message".to_string(),
            reply_token: None,
            source: Some(EventSource {
                user_id: Some("U1".to_string()),
                group_id: Some("G1".to_string()),
                room_id: None,
            }),
            message: None,
        };
        assert_eq!(event.conversation_id(), "G1");
    }

    #[test]
    fn test_conversation_id_falls_back_to_anonymous() {
        let payload: WebhookPayload = serde_json::from_str(r#"{"events":[{"type":"message"}]}"#).unwrap();
        assert_eq!(payload.events[0].conversation_id(), ANONYMOUS_CONVERSATION);
    }

    #[test]
    fn test_empty_payload_has_no_events() {
        let payload: WebhookPayload = serde_json::from_str("{}").unwrap();
        assert!(payload.events.is_empty());
    }
}
