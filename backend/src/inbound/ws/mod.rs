//! WebSocket inbound adapter for live conversation chat.
//!
//! Responsibilities:
//! - validate upgrade requests (origin allow-list)
//! - bind each socket to one conversation and spawn its session task
//! - keep WebSocket-specific concerns at the edge of the system

use actix_web::web::{self, Payload};
use actix_web::{
    HttpRequest, HttpResponse, get,
    http::header::{HeaderValue, ORIGIN},
};
use tracing::{error, warn};
use url::Url;

use crate::domain::{ConversationId, TraceId};
use crate::inbound::http::session::SessionContext;

mod session;

pub mod messages;
pub mod state;

pub use session::{CLIENT_TIMEOUT, HEARTBEAT_INTERVAL, UNAUTHORIZED_CLOSE_CODE};

/// Upgrade `/ws/chat/{conversation_id}/` to a chat socket.
///
/// Anonymous callers, and sessions whose account is unknown or deactivated,
/// still complete the handshake; their socket is closed straight away with
/// [`UNAUTHORIZED_CLOSE_CODE`] and never joins a group.
#[get("/ws/chat/{conversation_id}/")]
pub async fn chat_entry(
    state: web::Data<state::WsState>,
    session: SessionContext,
    path: web::Path<ConversationId>,
    req: HttpRequest,
    stream: Payload,
) -> actix_web::Result<HttpResponse> {
    let mut origin_iter = req.headers().get_all(ORIGIN);
    let origin_header = origin_iter.next().ok_or_else(|| {
        error!("Missing Origin header on WebSocket upgrade");
        actix_web::error::ErrorForbidden("Origin not allowed")
    })?;
    if origin_iter.next().is_some() {
        error!("Multiple Origin headers on WebSocket upgrade");
        return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
    }

    validate_origin(origin_header)?;

    let user_id = session.user_id().unwrap_or_else(|error| {
        warn!(error = %error, "unreadable session on WebSocket upgrade");
        None
    });
    let conversation_id = path.into_inner();

    let (response, ws_session, msg_stream) = actix_ws::handle(&req, stream).map_err(|error| {
        error!(error = %error, "WebSocket upgrade failed");
        actix_web::error::ErrorInternalServerError("WebSocket upgrade failed")
    })?;

    let state = state.get_ref().clone();
    actix_web::rt::spawn(TraceId::scope(
        TraceId::current_or_generate(),
        session::open_chat_session(state, conversation_id, user_id, ws_session, msg_stream),
    ));

    Ok(response)
}

fn validate_origin(origin_header: &HeaderValue) -> actix_web::Result<()> {
    let origin_value = match origin_header.to_str() {
        Ok(value) => value,
        Err(error) => {
            error!(error = %error, "Failed to parse Origin header as string");
            return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
        }
    };

    let origin = Url::parse(origin_value).map_err(|error| {
        error!(error = %error, "Failed to parse Origin header as URL");
        actix_web::error::ErrorBadRequest("Invalid Origin header")
    })?;

    if is_allowed_origin(&origin) {
        Ok(())
    } else {
        warn!(
            origin = origin_value,
            "Rejected WS upgrade due to disallowed Origin"
        );
        Err(actix_web::error::ErrorForbidden("Origin not allowed"))
    }
}

const PRIMARY_HOST: &str = "nordiccodeworks.example";
const LOCALHOST: &str = "localhost";
const ALLOWED_SUBDOMAIN_SUFFIX: &str = ".nordiccodeworks.example";

/// Returns true when a parsed Origin belongs to the static allow-list.
///
/// Accepts HTTPS from the production root domain and its subdomains, and HTTP
/// from localhost with a non-zero explicit port.
fn is_allowed_origin(origin: &Url) -> bool {
    let Some(host) = origin.host_str() else {
        return false;
    };

    match origin.scheme() {
        "http" if host == LOCALHOST => matches!(origin.port(), Some(port) if port != 0),
        "https" if host == PRIMARY_HOST => true,
        "https" if host.strip_suffix(ALLOWED_SUBDOMAIN_SUFFIX).is_some() => true,
        _ => false,
    }
}
