//! Driving port for chat reads.

use async_trait::async_trait;

use crate::domain::{
    ConversationId, ConversationSummary, Error, MessagePage, MessagePageRequest, UserId,
};

/// Domain use-case port for participant-scoped conversation reads.
///
/// Conversations the caller does not participate in are reported as
/// `not_found`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatQuery: Send + Sync {
    /// Conversations visible to the caller.
    async fn list_conversations(&self, viewer: &UserId) -> Result<Vec<ConversationSummary>, Error>;

    /// One conversation with the caller's unread count.
    async fn get_conversation(
        &self,
        conversation_id: ConversationId,
        viewer: &UserId,
    ) -> Result<ConversationSummary, Error>;

    /// One page of messages in creation order.
    async fn list_messages(
        &self,
        conversation_id: ConversationId,
        viewer: &UserId,
        page: MessagePageRequest,
    ) -> Result<MessagePage, Error>;
}
