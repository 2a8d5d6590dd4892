//! Test helpers for inbound HTTP components.

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{HttpResponse, test, web};
use std::sync::Arc;

use crate::domain::UserId;
use crate::domain::ports::{
    MockChatCommand, MockChatQuery, MockChatbotQuery, MockConversationLifecycle,
    MockLoginService, MockProjectStatusCommand,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Route used by [`session_cookie`] to sign a user in without a password.
pub const TEST_LOGIN_PATH: &str = "/test-login/{user_id}";

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Handler mounted at [`TEST_LOGIN_PATH`].
pub async fn test_login(
    session: SessionContext,
    user_id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user_id = UserId::new(user_id.into_inner())
        .map_err(|err| crate::domain::Error::invalid_request(err.to_string()))?;
    session.sign_in(&user_id)?;
    Ok(HttpResponse::Ok().finish())
}

/// Sign `user` in through [`test_login`] and return the session cookie.
pub async fn session_cookie<S>(app: &S, user: &UserId) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let res = test::call_service(
        app,
        test::TestRequest::post()
            .uri(&format!("/test-login/{user}"))
            .to_request(),
    )
    .await;
    assert!(res.status().is_success(), "test login failed");
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie")
        .into_owned()
}

/// Mock ports for handler tests; unconfigured mocks panic when called.
#[derive(Default)]
pub struct MockPorts {
    pub login: MockLoginService,
    pub chat: MockChatCommand,
    pub chat_query: MockChatQuery,
    pub project_status: MockProjectStatusCommand,
    pub lifecycle: MockConversationLifecycle,
    pub chatbot: MockChatbotQuery,
}

impl MockPorts {
    pub fn into_state(self) -> HttpState {
        HttpState {
            login: Arc::new(self.login),
            chat: Arc::new(self.chat),
            chat_query: Arc::new(self.chat_query),
            project_status: Arc::new(self.project_status),
            lifecycle: Arc::new(self.lifecycle),
            chatbot: Arc::new(self.chatbot),
        }
    }
}
