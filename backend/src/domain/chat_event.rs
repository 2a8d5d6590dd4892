//! Events fanned out to every live connection of a conversation.

use chrono::{DateTime, Utc};

use crate::domain::{Message, MessageId, UserId};

/// Event delivered to a conversation's broadcast group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// A message was persisted.
    MessageReceived(MessageReceived),
    /// A reader acknowledged messages.
    MessagesRead(MessagesRead),
}

/// Payload describing a newly persisted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageReceived {
    pub message_id: MessageId,
    pub user_id: UserId,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub has_attachment: bool,
}

impl From<&Message> for MessageReceived {
    fn from(message: &Message) -> Self {
        Self {
            message_id: message.id,
            user_id: message.sender_id.clone(),
            content: message.content.clone(),
            timestamp: message.created_at,
            has_attachment: message.has_attachment,
        }
    }
}

/// Payload describing messages newly read by one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagesRead {
    pub message_ids: Vec<MessageId>,
    pub user_id: UserId,
}
