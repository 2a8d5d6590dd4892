//! Port for conversation persistence.

use async_trait::async_trait;

use crate::domain::{
    Conversation, ConversationId, ConversationRecord, ConversationSummary, Error, ProjectId,
    Viewer,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by conversation repository adapters.
    pub enum ConversationRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "conversation repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "conversation repository query failed: {message}",
        /// The referenced project does not exist.
        ProjectMissing { project_id: i64 } =>
            "project {project_id} does not exist",
    }
}

impl From<ConversationRepositoryError> for Error {
    fn from(error: ConversationRepositoryError) -> Self {
        match error {
            ConversationRepositoryError::Connection { message } => Self::service_unavailable(
                format!("conversation repository unavailable: {message}"),
            ),
            ConversationRepositoryError::Query { message } => {
                Self::internal(format!("conversation repository error: {message}"))
            }
            ConversationRepositoryError::ProjectMissing { project_id } => {
                Self::not_found(format!("project {project_id} not found"))
            }
        }
    }
}

/// Port for reading and maintaining project conversations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Fetch a conversation with its project owner and title.
    async fn find_record(
        &self,
        id: ConversationId,
    ) -> Result<Option<ConversationRecord>, ConversationRepositoryError>;

    /// Fetch the conversation belonging to a project, archived or not.
    async fn find_by_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Option<Conversation>, ConversationRepositoryError>;

    /// List conversations visible to `viewer`, newest activity first, with
    /// the viewer's unread counts.
    async fn list_for_viewer(
        &self,
        viewer: &Viewer,
    ) -> Result<Vec<ConversationSummary>, ConversationRepositoryError>;

    /// Unread message count for one viewer in one conversation.
    async fn unread_count(
        &self,
        id: ConversationId,
        viewer: &Viewer,
    ) -> Result<u64, ConversationRepositoryError>;

    /// Create the project's conversation, or reopen it when archived.
    async fn ensure_for_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Conversation, ConversationRepositoryError>;

    /// Archive the project's conversation if one exists.
    async fn archive_for_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Option<Conversation>, ConversationRepositoryError>;
}
