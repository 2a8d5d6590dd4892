//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod attachment_store;
mod chat_command;
mod chat_groups;
mod chat_metrics;
mod chat_query;
mod chatbot_cache;
mod chatbot_query;
mod conversation_lifecycle;
mod conversation_repository;
mod language_model;
mod login_attempt_store;
mod login_service;
mod message_repository;
mod project_repository;
mod project_status_command;
mod user_repository;

#[cfg(test)]
pub use attachment_store::MockAttachmentStore;
pub use attachment_store::{AttachmentStore, AttachmentStoreError};
#[cfg(test)]
pub use chat_command::MockChatCommand;
pub use chat_command::{ChatCommand, PostMessageRequest};
#[cfg(test)]
pub use chat_groups::MockChatGroups;
pub use chat_groups::{ChatGroups, ConnectionId, FanOutReport, GroupMembership};
#[cfg(test)]
pub use chat_metrics::MockChatMetrics;
pub use chat_metrics::{ChatMetrics, NoOpChatMetrics};
#[cfg(test)]
pub use chat_query::MockChatQuery;
pub use chat_query::ChatQuery;
#[cfg(test)]
pub use chatbot_cache::MockChatbotCache;
pub use chatbot_cache::{ChatbotCache, ChatbotCacheError};
#[cfg(test)]
pub use chatbot_query::MockChatbotQuery;
pub use chatbot_query::ChatbotQuery;
#[cfg(test)]
pub use conversation_lifecycle::MockConversationLifecycle;
pub use conversation_lifecycle::ConversationLifecycle;
#[cfg(test)]
pub use conversation_repository::MockConversationRepository;
pub use conversation_repository::{ConversationRepository, ConversationRepositoryError};
#[cfg(test)]
pub use language_model::MockLanguageModel;
pub use language_model::{
    CompletionRequest, DisabledLanguageModel, LanguageModel, LanguageModelError,
};
#[cfg(test)]
pub use login_attempt_store::MockLoginAttemptStore;
pub use login_attempt_store::{LoginAttemptStore, LoginAttemptStoreError, login_attempts_key};
#[cfg(test)]
pub use login_service::MockLoginService;
pub use login_service::LoginService;
#[cfg(test)]
pub use message_repository::MockMessageRepository;
pub use message_repository::{MessageRepository, MessageRepositoryError};
#[cfg(test)]
pub use project_repository::MockProjectRepository;
pub use project_repository::{ProjectRepository, ProjectRepositoryError};
#[cfg(test)]
pub use project_status_command::MockProjectStatusCommand;
pub use project_status_command::{ProjectStatusCommand, ProjectTransitionOutcome};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};
