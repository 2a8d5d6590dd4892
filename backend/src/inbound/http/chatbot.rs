//! Support chatbot endpoint.
//!
//! ```text
//! POST /api/v1/chatbot {"message":"Hej!"}
//! ```

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ChatbotReply;
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Visitor question.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ChatbotRequest {
    #[serde(default)]
    #[schema(example = "What does a website cost?")]
    pub message: String,
}

/// Assistant answer.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChatbotResponse {
    pub response: String,
    /// `en` or `sv`.
    #[schema(example = "en")]
    pub language: String,
    /// Whether the answer came from the response cache.
    pub cached: bool,
}

impl From<ChatbotReply> for ChatbotResponse {
    fn from(reply: ChatbotReply) -> Self {
        Self {
            response: reply.response,
            language: reply.language.code().to_owned(),
            cached: reply.cached,
        }
    }
}

/// Ask the support assistant a question. No session is needed.
#[utoipa::path(
    post,
    path = "/api/v1/chatbot",
    request_body = ChatbotRequest,
    responses(
        (status = 200, description = "Answer", body = ChatbotResponse),
        (status = 400, description = "Blank message", body = ErrorSchema),
        (status = 502, description = "Language model failed", body = ErrorSchema),
        (status = 503, description = "Language model unavailable", body = ErrorSchema),
        (status = 504, description = "Language model timed out", body = ErrorSchema)
    ),
    tags = ["chatbot"],
    operation_id = "askChatbot",
    security([])
)]
#[post("/chatbot")]
pub async fn ask(
    state: web::Data<HttpState>,
    payload: web::Json<ChatbotRequest>,
) -> ApiResult<web::Json<ChatbotResponse>> {
    let reply = state.chatbot.ask(&payload.message).await?;
    Ok(web::Json(reply.into()))
}
