//! Conversation lifecycle and project status services.
//!
//! The project component owns status changes; these services translate a
//! status into the matching conversation effect.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::ports::{
    ConversationLifecycle, ConversationRepository, ProjectRepository, ProjectStatusCommand,
    ProjectTransitionOutcome, UserRepository,
};
use crate::domain::{Conversation, ConversationTransition, Error, ProjectId, ProjectStatus, UserId};

/// Service implementing [`ConversationLifecycle`] over a repository.
#[derive(Clone)]
pub struct ConversationLifecycleService<C> {
    conversations: Arc<C>,
}

impl<C> ConversationLifecycleService<C> {
    pub fn new(conversations: Arc<C>) -> Self {
        Self { conversations }
    }
}

#[async_trait]
impl<C> ConversationLifecycle for ConversationLifecycleService<C>
where
    C: ConversationRepository,
{
    async fn ensure_conversation(&self, project_id: ProjectId) -> Result<Conversation, Error> {
        let conversation = self
            .conversations
            .ensure_for_project(project_id)
            .await
            .map_err(Error::from)?;
        info!(
            project_id = %project_id,
            conversation_id = %conversation.id,
            "conversation ensured"
        );
        Ok(conversation)
    }

    async fn archive_conversation(
        &self,
        project_id: ProjectId,
    ) -> Result<Option<Conversation>, Error> {
        let archived = self
            .conversations
            .archive_for_project(project_id)
            .await
            .map_err(Error::from)?;
        if let Some(conversation) = &archived {
            info!(
                project_id = %project_id,
                conversation_id = %conversation.id,
                "conversation archived"
            );
        }
        Ok(archived)
    }

    async fn has_active_conversation(&self, project_id: ProjectId) -> Result<bool, Error> {
        let conversation = self
            .conversations
            .find_by_project(project_id)
            .await
            .map_err(Error::from)?;
        Ok(conversation.is_some_and(|conversation| !conversation.is_archived))
    }
}

/// Staff-facing project status service.
#[derive(Clone)]
pub struct ProjectStatusService<P, U> {
    projects: Arc<P>,
    users: Arc<U>,
    lifecycle: Arc<dyn ConversationLifecycle>,
}

impl<P, U> ProjectStatusService<P, U> {
    pub fn new(projects: Arc<P>, users: Arc<U>, lifecycle: Arc<dyn ConversationLifecycle>) -> Self {
        Self {
            projects,
            users,
            lifecycle,
        }
    }
}

#[async_trait]
impl<P, U> ProjectStatusCommand for ProjectStatusService<P, U>
where
    P: ProjectRepository,
    U: UserRepository,
{
    async fn change_status(
        &self,
        actor: &UserId,
        project_id: ProjectId,
        status: ProjectStatus,
    ) -> Result<ProjectTransitionOutcome, Error> {
        let account = self
            .users
            .find_by_id(actor)
            .await
            .map_err(Error::from)?
            .filter(|account| account.is_active)
            .ok_or_else(|| Error::unauthorized("login required"))?;
        if !account.is_staff {
            return Err(Error::forbidden("only staff may change project status"));
        }

        let project = self
            .projects
            .update_status(project_id, status)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::not_found(format!("project {project_id} not found")))?;

        let conversation = match ConversationTransition::for_status(status) {
            ConversationTransition::Ensure => {
                Some(self.lifecycle.ensure_conversation(project_id).await?)
            }
            ConversationTransition::Archive => {
                self.lifecycle.archive_conversation(project_id).await?
            }
            ConversationTransition::Keep => None,
        };

        Ok(ProjectTransitionOutcome {
            project,
            conversation,
        })
    }
}
