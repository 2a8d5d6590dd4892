//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! specification for the REST API. It registers:
//!
//! - **Paths**: every HTTP endpoint from the inbound layer (session,
//!   conversations, projects, chatbot, health)
//! - **Schemas**: request and response bodies plus the domain error wrappers
//!   ([`ErrorSchema`], [`ErrorCodeSchema`])
//! - **Security**: Session cookie authentication scheme
//!
//! The chat socket at `/ws/chat/{conversation_id}/` is not an OpenAPI
//! operation and is documented on [`crate::inbound::ws`].
//!
//! The generated specification is used by Swagger UI (debug builds) and
//! exported via `cargo run --bin openapi-dump` for external tooling.

use crate::inbound::http::chatbot::{ChatbotRequest, ChatbotResponse};
use crate::inbound::http::conversations::{
    AttachmentResponse, ConversationResponse, MarkReadResponse, MessageForm, MessagePageResponse,
    MessageResponse,
};
use crate::inbound::http::projects::{
    ActiveConversationResponse, ProjectConversationBody, ProjectStatusRequest,
    ProjectStatusResponse,
};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::users::LoginRequest;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Client portal API",
        description = "Project chat, project status and support chatbot endpoints.",
        license(
            name = "Apache-2.0",
            url = "https://www.apache.org/licenses/LICENSE-2.0.html"
        )
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::login,
        crate::inbound::http::users::logout,
        crate::inbound::http::conversations::list_conversations,
        crate::inbound::http::conversations::get_conversation,
        crate::inbound::http::conversations::list_messages,
        crate::inbound::http::conversations::post_message,
        crate::inbound::http::conversations::mark_read,
        crate::inbound::http::projects::change_status,
        crate::inbound::http::projects::active_conversation,
        crate::inbound::http::chatbot::ask,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        LoginRequest,
        ConversationResponse,
        AttachmentResponse,
        MessageResponse,
        MessagePageResponse,
        MarkReadResponse,
        MessageForm,
        ProjectStatusRequest,
        ProjectStatusResponse,
        ProjectConversationBody,
        ActiveConversationResponse,
        ChatbotRequest,
        ChatbotResponse,
    )),
    tags(
        (name = "users", description = "Sign-in and sign-out"),
        (name = "conversations", description = "Project conversations and messages"),
        (name = "projects", description = "Project status transitions"),
        (name = "chatbot", description = "Support chatbot"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
