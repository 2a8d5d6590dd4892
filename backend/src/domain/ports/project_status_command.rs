//! Driving port for project status transitions.

use async_trait::async_trait;

use crate::domain::{Conversation, Error, Project, ProjectId, ProjectStatus, UserId};

/// Result of a status transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectTransitionOutcome {
    pub project: Project,
    /// Conversation touched by the transition, if any.
    pub conversation: Option<Conversation>,
}

/// Staff-only project status changes that drive the conversation lifecycle.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectStatusCommand: Send + Sync {
    /// Move `project_id` into `status` on behalf of `actor`.
    async fn change_status(
        &self,
        actor: &UserId,
        project_id: ProjectId,
        status: ProjectStatus,
    ) -> Result<ProjectTransitionOutcome, Error>;
}
