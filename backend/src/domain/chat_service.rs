//! Chat domain services.
//!
//! [`ChatService`] implements both chat driving ports. Writes persist first
//! and publish to the conversation's group only after the repository call
//! has returned, so an event always refers to a stored message.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::ports::{
    AttachmentStore, AttachmentStoreError, ChatCommand, ChatGroups, ChatQuery,
    ConversationRepository, MessageRepository, MessageRepositoryError, PostMessageRequest,
    UserRepository,
};
use crate::domain::{
    AttachmentValidationError, ChatEvent, ConversationId, ConversationRecord, ConversationSummary,
    Error, MAX_ATTACHMENTS_PER_MESSAGE, Message, MessageId, MessageContent, MessagePage,
    MessagePageRequest, MessageReceived, MessagesRead, NewMessage, StoredAttachment, UserId,
    ValidatedAttachment, Viewer,
};

/// Error text sent to a socket whose conversation has disappeared.
pub const INVALID_CONVERSATION_MESSAGE: &str = "Invalid conversation ID";

fn map_message_error(error: MessageRepositoryError) -> Error {
    match error {
        MessageRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("message repository unavailable: {message}"))
        }
        MessageRepositoryError::Query { message } => {
            Error::internal(format!("message repository error: {message}"))
        }
        MessageRepositoryError::ConversationMissing { .. } => {
            Error::not_found(INVALID_CONVERSATION_MESSAGE)
        }
    }
}

fn map_attachment_error(error: AttachmentStoreError) -> Error {
    match error {
        AttachmentStoreError::Io { message } => {
            Error::internal(format!("attachment storage error: {message}"))
        }
    }
}

fn conversation_not_found(id: ConversationId) -> Error {
    Error::not_found(format!("conversation {id} not found"))
}

/// Chat service implementing the chat command and query driving ports.
#[derive(Clone)]
pub struct ChatService<C, M, U> {
    conversations: Arc<C>,
    messages: Arc<M>,
    users: Arc<U>,
    attachments: Arc<dyn AttachmentStore>,
    groups: Arc<dyn ChatGroups>,
}

impl<C, M, U> ChatService<C, M, U> {
    /// Create a chat service over its repositories, attachment storage and
    /// broadcast groups.
    pub fn new(
        conversations: Arc<C>,
        messages: Arc<M>,
        users: Arc<U>,
        attachments: Arc<dyn AttachmentStore>,
        groups: Arc<dyn ChatGroups>,
    ) -> Self {
        Self {
            conversations,
            messages,
            users,
            attachments,
            groups,
        }
    }

    fn publish(&self, conversation_id: ConversationId, event: ChatEvent) {
        let report = self.groups.publish(conversation_id, event);
        debug!(
            conversation_id = %conversation_id,
            delivered = report.delivered,
            dropped = report.dropped,
            pruned = report.pruned,
            "chat event published"
        );
    }

    async fn discard_all(&self, stored: &[StoredAttachment]) {
        for attachment in stored {
            if let Err(err) = self.attachments.discard(&attachment.storage_key).await {
                warn!(
                    storage_key = %attachment.storage_key,
                    error = %err,
                    "failed to discard orphaned attachment"
                );
            }
        }
    }

    async fn store_all(
        &self,
        validated: &[ValidatedAttachment],
    ) -> Result<Vec<StoredAttachment>, Error> {
        let mut stored = Vec::with_capacity(validated.len());
        for attachment in validated {
            match self.attachments.store(attachment).await {
                Ok(entry) => stored.push(entry),
                Err(err) => {
                    self.discard_all(&stored).await;
                    return Err(map_attachment_error(err));
                }
            }
        }
        Ok(stored)
    }
}

impl<C, M, U> ChatService<C, M, U>
where
    C: ConversationRepository,
    M: MessageRepository,
    U: UserRepository,
{
    /// Resolve a session user; unknown and deactivated accounts count as
    /// signed out.
    async fn viewer(&self, user_id: &UserId) -> Result<Viewer, Error> {
        let account = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(Error::from)?
            .filter(|account| account.is_active)
            .ok_or_else(|| Error::unauthorized("login required"))?;
        Ok(Viewer {
            user_id: account.id,
            is_staff: account.is_staff,
        })
    }

    async fn authorize(
        &self,
        conversation_id: ConversationId,
        viewer: &Viewer,
    ) -> Result<ConversationRecord, Error> {
        let record = self
            .conversations
            .find_record(conversation_id)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| conversation_not_found(conversation_id))?;
        if viewer.participates_in(&record) {
            Ok(record)
        } else {
            Err(conversation_not_found(conversation_id))
        }
    }

    async fn persist_and_publish(&self, message: NewMessage) -> Result<Message, Error> {
        let persisted = self
            .messages
            .insert(message)
            .await
            .map_err(map_message_error)?;
        self.publish(
            persisted.conversation_id,
            ChatEvent::MessageReceived(MessageReceived::from(&persisted)),
        );
        Ok(persisted)
    }
}

#[async_trait]
impl<C, M, U> ChatCommand for ChatService<C, M, U>
where
    C: ConversationRepository,
    M: MessageRepository,
    U: UserRepository,
{
    async fn resolve_sender(&self, user_id: &UserId) -> Result<UserId, Error> {
        self.viewer(user_id).await.map(|viewer| viewer.user_id)
    }

    async fn send_socket_message(
        &self,
        conversation_id: ConversationId,
        sender_id: &UserId,
        content: String,
    ) -> Result<Message, Error> {
        let content =
            MessageContent::new(content).map_err(|err| Error::invalid_request(err.to_string()))?;
        self.persist_and_publish(NewMessage::text(conversation_id, sender_id.clone(), content))
            .await
    }

    async fn post_message(&self, request: PostMessageRequest) -> Result<Message, Error> {
        let PostMessageRequest {
            conversation_id,
            sender_id,
            content,
            attachments,
        } = request;

        let viewer = self.viewer(&sender_id).await?;
        self.authorize(conversation_id, &viewer).await?;

        let content =
            MessageContent::new(content).map_err(|err| Error::invalid_request(err.to_string()))?;
        if attachments.len() > MAX_ATTACHMENTS_PER_MESSAGE {
            let too_many = AttachmentValidationError::TooMany {
                max: MAX_ATTACHMENTS_PER_MESSAGE,
            };
            return Err(Error::invalid_request(too_many.to_string()));
        }
        let validated = attachments
            .into_iter()
            .map(ValidatedAttachment::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        if content.as_ref().trim().is_empty() && validated.is_empty() {
            return Err(Error::invalid_request(
                "message must have content or at least one attachment",
            ));
        }

        let stored = self.store_all(&validated).await?;
        let message = NewMessage {
            conversation_id,
            sender_id: viewer.user_id,
            content,
            attachments: stored.clone(),
        };
        match self.persist_and_publish(message).await {
            Ok(persisted) => Ok(persisted),
            Err(err) => {
                self.discard_all(&stored).await;
                Err(err)
            }
        }
    }

    async fn mark_conversation_read(
        &self,
        conversation_id: ConversationId,
        reader: &UserId,
    ) -> Result<Vec<MessageId>, Error> {
        let viewer = self.viewer(reader).await?;
        self.authorize(conversation_id, &viewer).await?;

        let newly_read = self
            .messages
            .mark_all_read(conversation_id, &viewer.user_id)
            .await
            .map_err(map_message_error)?;
        if !newly_read.is_empty() {
            self.publish(
                conversation_id,
                ChatEvent::MessagesRead(MessagesRead {
                    message_ids: newly_read.clone(),
                    user_id: viewer.user_id,
                }),
            );
        }
        Ok(newly_read)
    }
}

#[async_trait]
impl<C, M, U> ChatQuery for ChatService<C, M, U>
where
    C: ConversationRepository,
    M: MessageRepository,
    U: UserRepository,
{
    async fn list_conversations(&self, viewer: &UserId) -> Result<Vec<ConversationSummary>, Error> {
        let viewer = self.viewer(viewer).await?;
        self.conversations
            .list_for_viewer(&viewer)
            .await
            .map_err(Error::from)
    }

    async fn get_conversation(
        &self,
        conversation_id: ConversationId,
        viewer: &UserId,
    ) -> Result<ConversationSummary, Error> {
        let viewer = self.viewer(viewer).await?;
        let record = self.authorize(conversation_id, &viewer).await?;
        let unread_count = self
            .conversations
            .unread_count(conversation_id, &viewer)
            .await
            .map_err(Error::from)?;
        Ok(ConversationSummary {
            conversation: record.conversation,
            project_title: record.project_title,
            unread_count,
        })
    }

    async fn list_messages(
        &self,
        conversation_id: ConversationId,
        viewer: &UserId,
        page: MessagePageRequest,
    ) -> Result<MessagePage, Error> {
        let viewer = self.viewer(viewer).await?;
        self.authorize(conversation_id, &viewer).await?;
        let rows = self
            .messages
            .list_page(conversation_id, page)
            .await
            .map_err(map_message_error)?;
        Ok(MessagePage::from_probe(page, rows))
    }
}

#[cfg(test)]
#[path = "chat_service_tests.rs"]
mod tests;
