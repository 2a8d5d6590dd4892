//! Server construction and middleware wiring.

mod config;
#[cfg(feature = "metrics")]
mod metrics;
mod state_builders;

pub use config::{PortalSettings, ServerConfig};

#[cfg(feature = "metrics")]
use metrics::HttpMetrics;
use state_builders::{AdapterStates, build_adapter_states};

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use portal::Trace;
#[cfg(debug_assertions)]
use portal::doc::ApiDoc;
use portal::inbound::http::chatbot::ask;
use portal::inbound::http::conversations::{
    get_conversation, list_conversations, list_messages, mark_read, post_message,
};
use portal::inbound::http::health::{HealthState, live, ready};
use portal::inbound::http::projects::{active_conversation, change_status};
use portal::inbound::http::state::HttpState;
use portal::inbound::http::users::{login, logout};
use portal::inbound::ws;
use portal::inbound::ws::state::WsState;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    ws_state: web::Data<WsState>,
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
}

fn session_middleware(
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(same_site)
        .session_lifecycle(
            PersistentSession::default().session_ttl(actix_web::cookie::time::Duration::hours(2)),
        )
        .build()
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        ws_state,
        key,
        cookie_secure,
        same_site,
    } = deps;

    let api = web::scope("/api/v1")
        .service(login)
        .service(logout)
        .service(list_conversations)
        .service(get_conversation)
        .service(list_messages)
        .service(post_message)
        .service(mark_read)
        .service(change_status)
        .service(active_conversation)
        .service(ask);

    // The chat socket reads the same session cookie as the REST API.
    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(ws_state)
        .wrap(session_middleware(key, cookie_secure, same_site))
        .wrap(Trace)
        .service(api)
        .service(ws::chat_entry)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// # Parameters
/// - `health_state`: shared readiness state updated once the server is initialised.
/// - `config`: pre-built [`ServerConfig`] with session, binding, pools and
///   optional metrics.
///
/// # Returns
/// A spawned [`Server`] that must be awaited to drive the listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when adapter state cannot be built, or when
/// binding the socket or starting the server fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let AdapterStates { http, ws } = build_adapter_states(&config)?;
    let http_state = web::Data::new(http);
    let ws_state = web::Data::new(ws);
    let ServerConfig {
        key,
        cookie_secure,
        same_site,
        bind_addr,
        #[cfg(feature = "metrics")]
        prometheus,
        ..
    } = config;

    #[cfg(feature = "metrics")]
    let metrics_layer = HttpMetrics::from(prometheus);

    let server = HttpServer::new(move || {
        let app = build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            ws_state: ws_state.clone(),
            key: key.clone(),
            cookie_secure,
            same_site,
        });

        #[cfg(feature = "metrics")]
        let app = app.wrap(metrics_layer.clone());

        app
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use rstest::rstest;
    use serde_json::Value;

    fn dependencies(dir: &tempfile::TempDir) -> AppDependencies {
        let settings = PortalSettings {
            bind_addr: None,
            database_url: None,
            redis_url: None,
            attachment_dir: Some(dir.path().to_path_buf()),
            llm_base_url: None,
            llm_api_key: None,
            llm_model: None,
            llm_timeout_secs: None,
            chatbot_pepper: Some("pepper".to_owned()),
            mailbox_capacity: None,
            demo_seed: false,
            demo_password: None,
        };
        let config = ServerConfig::new(Key::generate(), false, SameSite::Lax, settings);
        let AdapterStates { http, ws } = build_adapter_states(&config).expect("states build");
        AppDependencies {
            health_state: web::Data::new(HealthState::new()),
            http_state: web::Data::new(http),
            ws_state: web::Data::new(ws),
            key: config.key,
            cookie_secure: false,
            same_site: SameSite::Lax,
        }
    }

    #[rstest]
    #[actix_web::test]
    async fn conversation_routes_require_a_session() {
        let dir = tempfile::tempdir().expect("temp dir");
        let app = test::init_service(build_app(dependencies(&dir))).await;

        let response = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/conversations")
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key("trace-id"));
    }

    #[rstest]
    #[actix_web::test]
    async fn wrong_password_is_unauthorised() {
        let dir = tempfile::tempdir().expect("temp dir");
        let app = test::init_service(build_app(dependencies(&dir))).await;

        let response = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/login")
                .set_json(serde_json::json!({
                    "email": "nobody@nordiccodeworks.example",
                    "password": "guess"
                }))
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(body["code"], "unauthorized");
    }

    #[rstest]
    #[actix_web::test]
    async fn liveness_probe_is_mounted() {
        let dir = tempfile::tempdir().expect("temp dir");
        let app = test::init_service(build_app(dependencies(&dir))).await;

        let response =
            test::call_service(&app, test::TestRequest::get().uri("/health/live").to_request())
                .await;

        assert_eq!(response.status(), StatusCode::OK);
    }
}
