//! Driving port for chat mutations: sending messages and read receipts.

use async_trait::async_trait;

use crate::domain::{AttachmentUpload, ConversationId, Error, Message, MessageId, UserId};

/// Message submitted through the REST surface, optionally with files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostMessageRequest {
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub content: String,
    pub attachments: Vec<AttachmentUpload>,
}

/// Domain use-case port for chat writes.
///
/// Every successful write is persisted before its event is published to the
/// conversation's group.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatCommand: Send + Sync {
    /// Confirm that a session user may chat: the account must exist and be
    /// active. Anything else fails with `unauthorized`.
    async fn resolve_sender(&self, user_id: &UserId) -> Result<UserId, Error>;

    /// Persist a text message received on a socket bound to
    /// `conversation_id`, then broadcast it.
    ///
    /// Over-long bodies fail with `invalid_request` ("Message too long") and
    /// a vanished conversation with `not_found` ("Invalid conversation ID").
    async fn send_socket_message(
        &self,
        conversation_id: ConversationId,
        sender_id: &UserId,
        content: String,
    ) -> Result<Message, Error>;

    /// Validate, store and broadcast a message with attachments on behalf of
    /// a conversation participant.
    async fn post_message(&self, request: PostMessageRequest) -> Result<Message, Error>;

    /// Mark every unread message as read by `reader`, notify the group when
    /// anything changed, and return the newly read ids.
    async fn mark_conversation_read(
        &self,
        conversation_id: ConversationId,
        reader: &UserId,
    ) -> Result<Vec<MessageId>, Error>;
}
