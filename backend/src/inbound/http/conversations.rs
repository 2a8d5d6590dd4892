//! Conversation and message HTTP handlers.
//!
//! ```text
//! GET  /api/v1/conversations
//! GET  /api/v1/conversations/{id}
//! GET  /api/v1/conversations/{id}/messages?page=2
//! POST /api/v1/conversations/{id}/messages   (multipart: content, files*)
//! POST /api/v1/conversations/{id}/mark-read
//! ```
//!
//! Every route requires a session. Conversations the caller does not take
//! part in answer 404.

mod form;

use actix_multipart::Multipart;
use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::PostMessageRequest;
use crate::domain::{
    Attachment, ConversationId, ConversationSummary, Error, Message, MessagePage,
    MessagePageRequest, UserId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

pub use form::MessageForm;

/// Conversation as listed to a participant.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub id: i64,
    pub project_id: i64,
    pub project_title: String,
    pub is_archived: bool,
    pub unread_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ConversationSummary> for ConversationResponse {
    fn from(summary: ConversationSummary) -> Self {
        let ConversationSummary {
            conversation,
            project_title,
            unread_count,
        } = summary;
        Self {
            id: conversation.id.get(),
            project_id: conversation.project_id.get(),
            project_title,
            is_archived: conversation.is_archived,
            unread_count,
            created_at: conversation.created_at,
            updated_at: conversation.updated_at,
        }
    }
}

/// Attachment metadata attached to a message.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentResponse {
    pub id: i64,
    pub file_name: String,
    pub file_type: String,
    pub size_bytes: i64,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Attachment> for AttachmentResponse {
    fn from(attachment: Attachment) -> Self {
        Self {
            id: attachment.id.get(),
            file_name: attachment.file_name,
            file_type: attachment.file_type,
            size_bytes: attachment.size_bytes,
            uploaded_at: attachment.uploaded_at,
        }
    }
}

/// Message as seen by one viewer.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: i64,
    pub conversation_id: i64,
    #[schema(format = "uuid")]
    pub sender_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
    pub has_attachment: bool,
    pub attachments: Vec<AttachmentResponse>,
}

impl MessageResponse {
    /// Render `message` for `viewer`; `isRead` is viewer specific.
    pub fn for_viewer(message: Message, viewer: &UserId) -> Self {
        let is_read = message.is_read_by(viewer);
        Self {
            id: message.id.get(),
            conversation_id: message.conversation_id.get(),
            sender_id: message.sender_id.to_string(),
            content: message.content,
            created_at: message.created_at,
            is_read,
            has_attachment: message.has_attachment,
            attachments: message
                .attachments
                .into_iter()
                .map(AttachmentResponse::from)
                .collect(),
        }
    }
}

/// One page of messages.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessagePageResponse {
    pub page: u32,
    pub messages: Vec<MessageResponse>,
    pub has_more: bool,
}

impl MessagePageResponse {
    fn for_viewer(page: MessagePage, viewer: &UserId) -> Self {
        Self {
            page: page.page,
            messages: page
                .messages
                .into_iter()
                .map(|message| MessageResponse::for_viewer(message, viewer))
                .collect(),
            has_more: page.has_more,
        }
    }
}

/// Ids newly marked as read.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadResponse {
    pub message_ids: Vec<i64>,
}

/// Query string of the message listing.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MessagePageQuery {
    /// One-based page number; defaults to 1.
    pub page: Option<i64>,
}

fn parse_page(query: &MessagePageQuery) -> Result<MessagePageRequest, Error> {
    match query.page {
        None => Ok(MessagePageRequest::default()),
        Some(raw) => MessagePageRequest::new(raw).map_err(|err| {
            Error::invalid_request(err.to_string())
                .with_details(serde_json::json!({ "field": "page", "value": raw }))
        }),
    }
}

/// Conversations visible to the caller.
#[utoipa::path(
    get,
    path = "/api/v1/conversations",
    responses(
        (status = 200, description = "Conversations", body = [ConversationResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["conversations"],
    operation_id = "listConversations",
    security(("SessionCookie" = []))
)]
#[get("/conversations")]
pub async fn list_conversations(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<ConversationResponse>>> {
    let user_id = session.require_user_id()?;
    let summaries = state.chat_query.list_conversations(&user_id).await?;
    Ok(web::Json(
        summaries.into_iter().map(ConversationResponse::from).collect(),
    ))
}

/// One conversation with the caller's unread count.
#[utoipa::path(
    get,
    path = "/api/v1/conversations/{conversation_id}",
    params(("conversation_id" = i64, Path, description = "Conversation id")),
    responses(
        (status = 200, description = "Conversation", body = ConversationResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["conversations"],
    operation_id = "getConversation",
    security(("SessionCookie" = []))
)]
#[get("/conversations/{conversation_id}")]
pub async fn get_conversation(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<ConversationId>,
) -> ApiResult<web::Json<ConversationResponse>> {
    let user_id = session.require_user_id()?;
    let summary = state
        .chat_query
        .get_conversation(path.into_inner(), &user_id)
        .await?;
    Ok(web::Json(summary.into()))
}

/// Messages in creation order, twenty per page.
#[utoipa::path(
    get,
    path = "/api/v1/conversations/{conversation_id}/messages",
    params(
        ("conversation_id" = i64, Path, description = "Conversation id"),
        MessagePageQuery
    ),
    responses(
        (status = 200, description = "Message page", body = MessagePageResponse),
        (status = 400, description = "Invalid page", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["conversations"],
    operation_id = "listMessages",
    security(("SessionCookie" = []))
)]
#[get("/conversations/{conversation_id}/messages")]
pub async fn list_messages(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<ConversationId>,
    query: web::Query<MessagePageQuery>,
) -> ApiResult<web::Json<MessagePageResponse>> {
    let user_id = session.require_user_id()?;
    let page = parse_page(&query)?;
    let messages = state
        .chat_query
        .list_messages(path.into_inner(), &user_id, page)
        .await?;
    Ok(web::Json(MessagePageResponse::for_viewer(messages, &user_id)))
}

/// Post a message with optional attachments; it is broadcast to the
/// conversation's live sockets once stored.
#[utoipa::path(
    post,
    path = "/api/v1/conversations/{conversation_id}/messages",
    params(("conversation_id" = i64, Path, description = "Conversation id")),
    request_body(content = MessageForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Message stored", body = MessageResponse),
        (status = 400, description = "Invalid message or attachment", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["conversations"],
    operation_id = "postMessage",
    security(("SessionCookie" = []))
)]
#[post("/conversations/{conversation_id}/messages")]
pub async fn post_message(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<ConversationId>,
    payload: Multipart,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let conversation_id = path.into_inner();
    // Participation is settled before any part of the body is buffered.
    state
        .chat_query
        .get_conversation(conversation_id, &user_id)
        .await?;
    let form = form::read_message_form(payload).await?;
    let message = state
        .chat
        .post_message(PostMessageRequest {
            conversation_id,
            sender_id: user_id.clone(),
            content: form.content,
            attachments: form.files,
        })
        .await?;
    Ok(HttpResponse::Created().json(MessageResponse::for_viewer(message, &user_id)))
}

/// Mark every message in the conversation as read by the caller.
#[utoipa::path(
    post,
    path = "/api/v1/conversations/{conversation_id}/mark-read",
    params(("conversation_id" = i64, Path, description = "Conversation id")),
    responses(
        (status = 200, description = "Newly read message ids", body = MarkReadResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["conversations"],
    operation_id = "markConversationRead",
    security(("SessionCookie" = []))
)]
#[post("/conversations/{conversation_id}/mark-read")]
pub async fn mark_read(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<ConversationId>,
) -> ApiResult<web::Json<MarkReadResponse>> {
    let user_id = session.require_user_id()?;
    let ids = state
        .chat
        .mark_conversation_read(path.into_inner(), &user_id)
        .await?;
    Ok(web::Json(MarkReadResponse {
        message_ids: ids.into_iter().map(|id| id.get()).collect(),
    }))
}

#[cfg(test)]
#[path = "conversations_tests.rs"]
mod tests;
