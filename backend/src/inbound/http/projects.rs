//! Project status hook and conversation availability.
//!
//! ```text
//! PATCH /api/v1/projects/{id}/status {"status":"development"}
//! GET   /api/v1/projects/{id}/conversation
//! ```

use actix_web::{get, patch, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::ports::ProjectTransitionOutcome;
use crate::domain::{Conversation, Error, ProjectId, ProjectStatus};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Request body for a status change.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ProjectStatusRequest {
    #[schema(example = "development")]
    pub status: String,
}

/// Conversation state after a transition.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConversationBody {
    pub id: i64,
    pub is_archived: bool,
}

impl From<Conversation> for ProjectConversationBody {
    fn from(conversation: Conversation) -> Self {
        Self {
            id: conversation.id.get(),
            is_archived: conversation.is_archived,
        }
    }
}

/// Project after a status change.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStatusResponse {
    pub id: i64,
    pub title: String,
    pub status: String,
    pub conversation: Option<ProjectConversationBody>,
}

impl From<ProjectTransitionOutcome> for ProjectStatusResponse {
    fn from(outcome: ProjectTransitionOutcome) -> Self {
        let ProjectTransitionOutcome {
            project,
            conversation,
        } = outcome;
        Self {
            id: project.id.get(),
            title: project.title,
            status: project.status.to_string(),
            conversation: conversation.map(ProjectConversationBody::from),
        }
    }
}

/// Whether the project currently has an open conversation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ActiveConversationResponse {
    pub active: bool,
}

fn parse_status(raw: &str) -> Result<ProjectStatus, Error> {
    raw.parse::<ProjectStatus>().map_err(|err| {
        let allowed: Vec<&str> = ProjectStatus::ALL.iter().map(|s| s.as_str()).collect();
        Error::invalid_request(err.to_string())
            .with_details(json!({ "field": "status", "allowed": allowed }))
    })
}

/// Move a project to a new status; staff only.
///
/// Entering development or review opens the conversation; completing or
/// cancelling archives it.
#[utoipa::path(
    patch,
    path = "/api/v1/projects/{project_id}/status",
    params(("project_id" = i64, Path, description = "Project id")),
    request_body = ProjectStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ProjectStatusResponse),
        (status = 400, description = "Unknown status", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Caller is not staff", body = ErrorSchema),
        (status = 404, description = "Project not found", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["projects"],
    operation_id = "changeProjectStatus",
    security(("SessionCookie" = []))
)]
#[patch("/projects/{project_id}/status")]
pub async fn change_status(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<ProjectId>,
    payload: web::Json<ProjectStatusRequest>,
) -> ApiResult<web::Json<ProjectStatusResponse>> {
    let actor = session.require_user_id()?;
    let status = parse_status(&payload.status)?;
    let outcome = state
        .project_status
        .change_status(&actor, path.into_inner(), status)
        .await?;
    Ok(web::Json(outcome.into()))
}

/// Report whether the project has an active conversation.
#[utoipa::path(
    get,
    path = "/api/v1/projects/{project_id}/conversation",
    params(("project_id" = i64, Path, description = "Project id")),
    responses(
        (status = 200, description = "Conversation availability", body = ActiveConversationResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["projects"],
    operation_id = "projectConversation",
    security(("SessionCookie" = []))
)]
#[get("/projects/{project_id}/conversation")]
pub async fn active_conversation(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<ProjectId>,
) -> ApiResult<web::Json<ActiveConversationResponse>> {
    session.require_user_id()?;
    let active = state
        .lifecycle
        .has_active_conversation(path.into_inner())
        .await?;
    Ok(web::Json(ActiveConversationResponse { active }))
}
