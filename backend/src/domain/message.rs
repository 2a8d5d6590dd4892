//! Chat messages, their read state, and message pagination.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::domain::{Attachment, ConversationId, MessageId, StoredAttachment, UserId};

/// Longest accepted message body, counted in characters.
pub const MAX_MESSAGE_CHARS: usize = 1000;

/// Number of messages returned per page.
pub const MESSAGE_PAGE_SIZE: u32 = 20;

/// Reasons a message body is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MessageValidationError {
    #[error("Message too long")]
    TooLong { length: usize, max: usize },
}

/// Message body that satisfies the length limit.
///
/// Empty bodies are accepted; attachments-only messages rely on it.
///
/// # Examples
/// ```
/// use portal::domain::MessageContent;
///
/// assert!(MessageContent::new("hi").is_ok());
/// assert!(MessageContent::new("x".repeat(1001)).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContent(String);

impl MessageContent {
    /// Validate a message body.
    pub fn new(raw: impl Into<String>) -> Result<Self, MessageValidationError> {
        let raw = raw.into();
        let length = raw.chars().count();
        if length > MAX_MESSAGE_CHARS {
            return Err(MessageValidationError::TooLong {
                length,
                max: MAX_MESSAGE_CHARS,
            });
        }
        Ok(Self(raw))
    }
}

impl AsRef<str> for MessageContent {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<MessageContent> for String {
    fn from(value: MessageContent) -> Self {
        value.0
    }
}

/// Persisted chat message.
///
/// `read_by` only ever grows; the sender is always a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub has_attachment: bool,
    pub read_by: HashSet<UserId>,
    pub attachments: Vec<Attachment>,
}

impl Message {
    /// Whether `user` has acknowledged this message.
    pub fn is_read_by(&self, user: &UserId) -> bool {
        self.read_by.contains(user)
    }
}

/// Message waiting to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub content: MessageContent,
    pub attachments: Vec<StoredAttachment>,
}

impl NewMessage {
    /// Text-only message, as sent over the socket.
    pub fn text(conversation_id: ConversationId, sender_id: UserId, content: MessageContent) -> Self {
        Self {
            conversation_id,
            sender_id,
            content,
            attachments: Vec::new(),
        }
    }

    /// Whether the message carries attachments.
    pub fn has_attachment(&self) -> bool {
        !self.attachments.is_empty()
    }
}

/// One-based page selector for message listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessagePageRequest {
    page: u32,
}

/// Raised when a page number is below one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("page must be at least 1")]
pub struct InvalidPage;

impl MessagePageRequest {
    /// Validate a one-based page number.
    pub fn new(page: i64) -> Result<Self, InvalidPage> {
        u32::try_from(page)
            .ok()
            .filter(|value| *value >= 1)
            .map(|page| Self { page })
            .ok_or(InvalidPage)
    }

    /// Page number as requested.
    pub fn page(self) -> u32 {
        self.page
    }

    /// Rows to skip.
    pub fn offset(self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(MESSAGE_PAGE_SIZE)
    }

    /// Rows to fetch, one more than the page size to detect a following page.
    pub fn fetch_limit(self) -> i64 {
        i64::from(MESSAGE_PAGE_SIZE) + 1
    }
}

impl Default for MessagePageRequest {
    fn default() -> Self {
        Self { page: 1 }
    }
}

/// A page of messages in creation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePage {
    pub page: u32,
    pub messages: Vec<Message>,
    pub has_more: bool,
}

impl MessagePage {
    /// Build a page from a probe fetch of `page_size + 1` rows.
    pub fn from_probe(request: MessagePageRequest, mut rows: Vec<Message>) -> Self {
        let page_size = usize::try_from(MESSAGE_PAGE_SIZE).unwrap_or(usize::MAX);
        let has_more = rows.len() > page_size;
        rows.truncate(page_size);
        Self {
            page: request.page(),
            messages: rows,
            has_more,
        }
    }
}
