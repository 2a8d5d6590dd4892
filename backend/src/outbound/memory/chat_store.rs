//! Process-local chat store.
//!
//! Implements the user, project, conversation and message repositories over
//! one mutex-guarded state so the server runs without PostgreSQL. Semantics
//! mirror the Diesel adapters: one conversation per project, idempotent read
//! marks, and creation-ordered message pages.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::{Clock, DefaultClock};

use crate::domain::ports::{
    ConversationRepository, ConversationRepositoryError, MessageRepository,
    MessageRepositoryError, ProjectRepository, ProjectRepositoryError, UserPersistenceError,
    UserRepository,
};
use crate::domain::{
    Attachment, AttachmentId, Conversation, ConversationId, ConversationRecord,
    ConversationSummary, EmailAddress, Message, MessageId, MessagePageRequest, NewMessage, Project,
    ProjectId, ProjectStatus, UserAccount, UserId, Viewer,
};

#[derive(Default)]
struct StoreState {
    users: HashMap<UserId, UserAccount>,
    projects: BTreeMap<ProjectId, Project>,
    conversations: BTreeMap<ConversationId, Conversation>,
    messages: BTreeMap<MessageId, Message>,
    next_project: i64,
    next_conversation: i64,
    next_message: i64,
    next_attachment: i64,
}

impl StoreState {
    fn bump(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }

    fn record(&self, conversation: &Conversation) -> Option<ConversationRecord> {
        let project = self.projects.get(&conversation.project_id)?;
        Some(ConversationRecord {
            conversation: conversation.clone(),
            project_title: project.title.clone(),
            owner_id: project.owner_id.clone(),
        })
    }

    fn conversation_for_project(&mut self, project_id: ProjectId) -> Option<&mut Conversation> {
        self.conversations
            .values_mut()
            .find(|conversation| conversation.project_id == project_id)
    }

    fn unread(&self, id: ConversationId, reader: &UserId) -> u64 {
        let count = self
            .messages
            .values()
            .filter(|message| message.conversation_id == id && !message.is_read_by(reader))
            .count();
        u64::try_from(count).unwrap_or(u64::MAX)
    }
}

/// Shared in-memory implementation of the chat repositories.
#[derive(Clone)]
pub struct InMemoryChatStore {
    state: Arc<Mutex<StoreState>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryChatStore {
    fn default() -> Self {
        Self::new(Arc::new(DefaultClock))
    }
}

impl InMemoryChatStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState::default())),
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    /// Add or replace a user account.
    pub fn seed_user(&self, account: UserAccount) {
        self.lock().users.insert(account.id.clone(), account);
    }

    /// Add a project and return its id.
    pub fn seed_project(
        &self,
        owner_id: UserId,
        title: impl Into<String>,
        status: ProjectStatus,
    ) -> ProjectId {
        let mut state = self.lock();
        let id = ProjectId::new(StoreState::bump(&mut state.next_project));
        state.projects.insert(
            id,
            Project {
                id,
                owner_id,
                title: title.into(),
                status,
            },
        );
        id
    }

    /// Add a conversation with a fixed id for an existing project.
    ///
    /// Later conversations are numbered after the highest seeded id.
    pub fn seed_conversation(&self, id: ConversationId, project_id: ProjectId) -> Conversation {
        let now = self.now();
        let conversation = Conversation {
            id,
            project_id,
            is_archived: false,
            created_at: now,
            updated_at: now,
        };
        let mut state = self.lock();
        state.next_conversation = state.next_conversation.max(id.get());
        state.conversations.insert(id, conversation.clone());
        conversation
    }

    /// Number of messages stored for a conversation.
    pub fn message_count(&self, conversation_id: ConversationId) -> usize {
        self.lock()
            .messages
            .values()
            .filter(|message| message.conversation_id == conversation_id)
            .count()
    }
}

#[async_trait]
impl UserRepository for InMemoryChatStore {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserAccount>, UserPersistenceError> {
        Ok(self.lock().users.get(id).cloned())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<UserAccount>, UserPersistenceError> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|account| &account.email == email)
            .cloned())
    }

    async fn set_active(
        &self,
        email: &EmailAddress,
        is_active: bool,
    ) -> Result<bool, UserPersistenceError> {
        let mut state = self.lock();
        let Some(account) = state
            .users
            .values_mut()
            .find(|account| &account.email == email)
        else {
            return Ok(false);
        };
        account.is_active = is_active;
        Ok(true)
    }
}

#[async_trait]
impl ProjectRepository for InMemoryChatStore {
    async fn find_by_id(&self, id: ProjectId) -> Result<Option<Project>, ProjectRepositoryError> {
        Ok(self.lock().projects.get(&id).cloned())
    }

    async fn update_status(
        &self,
        id: ProjectId,
        status: ProjectStatus,
    ) -> Result<Option<Project>, ProjectRepositoryError> {
        let mut state = self.lock();
        Ok(state.projects.get_mut(&id).map(|project| {
            project.status = status;
            project.clone()
        }))
    }
}

#[async_trait]
impl ConversationRepository for InMemoryChatStore {
    async fn find_record(
        &self,
        id: ConversationId,
    ) -> Result<Option<ConversationRecord>, ConversationRepositoryError> {
        let state = self.lock();
        Ok(state
            .conversations
            .get(&id)
            .and_then(|conversation| state.record(conversation)))
    }

    async fn find_by_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Option<Conversation>, ConversationRepositoryError> {
        Ok(self.lock().conversation_for_project(project_id).cloned())
    }

    async fn list_for_viewer(
        &self,
        viewer: &Viewer,
    ) -> Result<Vec<ConversationSummary>, ConversationRepositoryError> {
        let state = self.lock();
        let mut summaries: Vec<ConversationSummary> = state
            .conversations
            .values()
            .filter_map(|conversation| state.record(conversation))
            .filter(|record| viewer.participates_in(record))
            .map(|record| ConversationSummary {
                unread_count: state.unread(record.conversation.id, &viewer.user_id),
                conversation: record.conversation,
                project_title: record.project_title,
            })
            .collect();
        summaries.sort_by(|a, b| {
            b.conversation
                .updated_at
                .cmp(&a.conversation.updated_at)
                .then(b.conversation.id.cmp(&a.conversation.id))
        });
        Ok(summaries)
    }

    async fn unread_count(
        &self,
        id: ConversationId,
        viewer: &Viewer,
    ) -> Result<u64, ConversationRepositoryError> {
        Ok(self.lock().unread(id, &viewer.user_id))
    }

    async fn ensure_for_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Conversation, ConversationRepositoryError> {
        let now = self.now();
        let mut state = self.lock();
        if !state.projects.contains_key(&project_id) {
            return Err(ConversationRepositoryError::project_missing(
                project_id.get(),
            ));
        }
        if let Some(existing) = state.conversation_for_project(project_id) {
            existing.is_archived = false;
            return Ok(existing.clone());
        }
        let id = ConversationId::new(StoreState::bump(&mut state.next_conversation));
        let conversation = Conversation {
            id,
            project_id,
            is_archived: false,
            created_at: now,
            updated_at: now,
        };
        state.conversations.insert(id, conversation.clone());
        Ok(conversation)
    }

    async fn archive_for_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Option<Conversation>, ConversationRepositoryError> {
        let now = self.now();
        let mut state = self.lock();
        Ok(state
            .conversation_for_project(project_id)
            .map(|conversation| {
                conversation.is_archived = true;
                conversation.updated_at = now;
                conversation.clone()
            }))
    }
}

#[async_trait]
impl MessageRepository for InMemoryChatStore {
    async fn insert(&self, message: NewMessage) -> Result<Message, MessageRepositoryError> {
        let now = self.now();
        let mut state = self.lock();
        let Some(conversation) = state.conversations.get_mut(&message.conversation_id) else {
            return Err(MessageRepositoryError::conversation_missing(
                message.conversation_id.get(),
            ));
        };
        conversation.updated_at = now;

        let id = MessageId::new(StoreState::bump(&mut state.next_message));
        let has_attachment = message.has_attachment();
        let mut attachments = Vec::with_capacity(message.attachments.len());
        for stored in message.attachments {
            attachments.push(Attachment {
                id: AttachmentId::new(StoreState::bump(&mut state.next_attachment)),
                message_id: id,
                file_name: stored.file_name,
                file_type: stored.file_type,
                size_bytes: stored.size_bytes,
                storage_key: stored.storage_key,
                uploaded_at: now,
            });
        }
        let persisted = Message {
            id,
            conversation_id: message.conversation_id,
            read_by: HashSet::from([message.sender_id.clone()]),
            sender_id: message.sender_id,
            content: message.content.into(),
            created_at: now,
            has_attachment,
            attachments,
        };
        state.messages.insert(id, persisted.clone());
        Ok(persisted)
    }

    async fn list_page(
        &self,
        conversation_id: ConversationId,
        page: MessagePageRequest,
    ) -> Result<Vec<Message>, MessageRepositoryError> {
        let skip = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(page.fetch_limit()).unwrap_or(usize::MAX);
        let state = self.lock();
        let mut rows: Vec<&Message> = state
            .messages
            .values()
            .filter(|message| message.conversation_id == conversation_id)
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(rows.into_iter().skip(skip).take(take).cloned().collect())
    }

    async fn mark_all_read(
        &self,
        conversation_id: ConversationId,
        reader: &UserId,
    ) -> Result<Vec<MessageId>, MessageRepositoryError> {
        let mut state = self.lock();
        let marked = state
            .messages
            .values_mut()
            .filter(|message| message.conversation_id == conversation_id)
            .filter_map(|message| message.read_by.insert(reader.clone()).then_some(message.id))
            .collect();
        Ok(marked)
    }
}
