//! Wire-level message definitions for the chat socket.
//!
//! Domain events are transformed into these payloads before being serialized
//! to JSON and sent to connected clients. Field names are snake_case to match
//! existing browser clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ChatEvent, MessageReceived, MessagesRead};

/// Inbound frame sent by the client.
#[derive(Debug, Deserialize)]
pub struct ChatMessageRequest {
    /// Message body; a missing field is treated as empty.
    #[serde(default)]
    pub message: String,
}

/// Broadcast for a newly stored message.
#[derive(Debug, Serialize)]
pub struct ChatMessagePayload {
    pub message: String,
    pub user_id: String,
    pub message_id: i64,
    pub timestamp: DateTime<Utc>,
    /// True when the message was posted with files; clients fetch them over
    /// HTTP.
    pub has_attachment: bool,
}

impl From<MessageReceived> for ChatMessagePayload {
    fn from(value: MessageReceived) -> Self {
        Self {
            message: value.content,
            user_id: value.user_id.to_string(),
            message_id: value.message_id.get(),
            timestamp: value.timestamp,
            has_attachment: value.has_attachment,
        }
    }
}

/// Broadcast for messages another participant has read.
#[derive(Debug, Serialize)]
pub struct MessagesReadPayload {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub message_ids: Vec<i64>,
    pub user_id: String,
}

impl From<MessagesRead> for MessagesReadPayload {
    fn from(value: MessagesRead) -> Self {
        Self {
            kind: "messages_read",
            message_ids: value.message_ids.into_iter().map(|id| id.get()).collect(),
            user_id: value.user_id.to_string(),
        }
    }
}

/// Failure reported to the sending connection only.
#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub error: String,
}

impl ErrorPayload {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Any frame the server sends.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum OutboundFrame {
    Message(ChatMessagePayload),
    Read(MessagesReadPayload),
    Error(ErrorPayload),
}

impl From<ChatEvent> for OutboundFrame {
    fn from(event: ChatEvent) -> Self {
        match event {
            ChatEvent::MessageReceived(received) => Self::Message(received.into()),
            ChatEvent::MessagesRead(read) => Self::Read(read.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MessageId, UserId};
    use chrono::TimeZone;
    use insta::assert_json_snapshot;
    use rstest::rstest;

    const SENDER: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

    fn sender() -> UserId {
        UserId::new(SENDER).expect("static test UUID must be valid")
    }

    fn received(has_attachment: bool) -> ChatEvent {
        ChatEvent::MessageReceived(MessageReceived {
            message_id: MessageId::new(42),
            user_id: sender(),
            content: "hi".to_owned(),
            timestamp: Utc
                .with_ymd_and_hms(2026, 3, 1, 9, 30, 0)
                .single()
                .expect("valid timestamp"),
            has_attachment,
        })
    }

    #[rstest]
    fn serialises_message_received_event() {
        assert_json_snapshot!(OutboundFrame::from(received(false)), @r#"
        {
          "message": "hi",
          "user_id": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
          "message_id": 42,
          "timestamp": "2026-03-01T09:30:00Z",
          "has_attachment": false
        }
        "#);
    }

    #[rstest]
    fn message_with_files_is_flagged() {
        let frame = serde_json::to_value(OutboundFrame::from(received(true))).expect("json frame");
        assert_eq!(frame.get("has_attachment"), Some(&serde_json::Value::Bool(true)));
    }

    #[rstest]
    fn serialises_messages_read_event() {
        let event = ChatEvent::MessagesRead(MessagesRead {
            message_ids: vec![MessageId::new(3), MessageId::new(5)],
            user_id: sender(),
        });
        assert_json_snapshot!(OutboundFrame::from(event), @r#"
        {
          "type": "messages_read",
          "message_ids": [
            3,
            5
          ],
          "user_id": "3fa85f64-5717-4562-b3fc-2c963f66afa6"
        }
        "#);
    }

    #[rstest]
    fn serialises_error_frame() {
        let frame = OutboundFrame::Error(ErrorPayload::new("Message too long"));
        assert_json_snapshot!(frame, @r#"
        {
          "error": "Message too long"
        }
        "#);
    }

    #[rstest]
    #[case(r#"{"message":"hi"}"#, "hi")]
    #[case(r#"{}"#, "")]
    #[case(r#"{"message":"hi","extra":1}"#, "hi")]
    fn parses_inbound_frames(#[case] raw: &str, #[case] expected: &str) {
        let request: ChatMessageRequest = serde_json::from_str(raw).expect("valid frame");
        assert_eq!(request.message, expected);
    }
}
