//! Port for the minimal project records the chat core depends on.

use async_trait::async_trait;

use crate::domain::{Error, Project, ProjectId, ProjectStatus};

use super::define_port_error;

define_port_error! {
    /// Errors raised by project repository adapters.
    pub enum ProjectRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "project repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "project repository query failed: {message}",
    }
}

impl From<ProjectRepositoryError> for Error {
    fn from(error: ProjectRepositoryError) -> Self {
        match error {
            ProjectRepositoryError::Connection { message } => {
                Self::service_unavailable(format!("project repository unavailable: {message}"))
            }
            ProjectRepositoryError::Query { message } => {
                Self::internal(format!("project repository error: {message}"))
            }
        }
    }
}

/// Port for reading projects and recording status changes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Fetch a project by id.
    async fn find_by_id(&self, id: ProjectId) -> Result<Option<Project>, ProjectRepositoryError>;

    /// Store a new status and return the updated project, or `None` when the
    /// project does not exist.
    async fn update_status(
        &self,
        id: ProjectId,
        status: ProjectStatus,
    ) -> Result<Option<Project>, ProjectRepositoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;

    #[test]
    fn connection_failures_are_unavailable() {
        let err = Error::from(ProjectRepositoryError::connection("refused"));
        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
        assert!(err.message().contains("refused"));
    }
}
