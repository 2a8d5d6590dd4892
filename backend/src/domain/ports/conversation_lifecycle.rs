//! Driving port consumed by the project component.
//!
//! The chat core only learns about projects through these calls; it never
//! observes project changes on its own.

use async_trait::async_trait;

use crate::domain::{Conversation, Error, ProjectId};

/// Conversation lifecycle operations keyed by project.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConversationLifecycle: Send + Sync {
    /// Create the project's conversation, or reopen it when archived.
    async fn ensure_conversation(&self, project_id: ProjectId) -> Result<Conversation, Error>;

    /// Archive the project's conversation; `None` when there was none.
    async fn archive_conversation(
        &self,
        project_id: ProjectId,
    ) -> Result<Option<Conversation>, Error>;

    /// Whether the project has a conversation that is not archived.
    async fn has_active_conversation(&self, project_id: ProjectId) -> Result<bool, Error>;
}
