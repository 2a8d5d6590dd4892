//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    ChatCommand, ChatQuery, ChatbotQuery, ConversationLifecycle, LoginService,
    ProjectStatusCommand,
};

/// Dependency bundle for HTTP handlers.
///
/// # Examples
/// ```no_run
/// # use std::sync::Arc;
/// # use portal::domain::ports::{
/// #     ChatCommand, ChatQuery, ChatbotQuery, ConversationLifecycle, LoginService,
/// #     ProjectStatusCommand,
/// # };
/// use portal::inbound::http::state::HttpState;
///
/// # fn wire(
/// #     login: Arc<dyn LoginService>,
/// #     chat: Arc<dyn ChatCommand>,
/// #     chat_query: Arc<dyn ChatQuery>,
/// #     project_status: Arc<dyn ProjectStatusCommand>,
/// #     lifecycle: Arc<dyn ConversationLifecycle>,
/// #     chatbot: Arc<dyn ChatbotQuery>,
/// # ) {
/// let state = HttpState {
///     login,
///     chat,
///     chat_query,
///     project_status,
///     lifecycle,
///     chatbot,
/// };
/// let _chat = state.chat.clone();
/// # }
/// ```
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub chat: Arc<dyn ChatCommand>,
    pub chat_query: Arc<dyn ChatQuery>,
    pub project_status: Arc<dyn ProjectStatusCommand>,
    pub lifecycle: Arc<dyn ConversationLifecycle>,
    pub chatbot: Arc<dyn ChatbotQuery>,
}
