//! Chat socket session tests against a live server.

use super::*;
use std::collections::BTreeSet;

use crate::domain::ports::{ChatGroups, MockAttachmentStore};
use crate::domain::{ChatService, EmailAddress, MAX_MESSAGE_CHARS, ProjectStatus, UserAccount};
use crate::inbound::http::test_utils::{TEST_LOGIN_PATH, test_login, test_session_middleware};
use crate::inbound::ws;
use crate::outbound::memory::InMemoryChatStore;
use crate::outbound::realtime::GroupRegistry;
use actix_web::cookie::Cookie;
use actix_web::{App, HttpServer, dev::ServerHandle, http::header, web};
use awc::{BoxedSocket, ws::Codec, ws::Frame, ws::Message as ClientMessage};
use futures_util::{SinkExt, StreamExt};
use rstest::{fixture, rstest};
use serde_json::Value;

type ClientSocket = actix_codec::Framed<BoxedSocket, Codec>;

const CONVERSATION: ConversationId = ConversationId::new(7);

struct Harness {
    url: String,
    store: Arc<InMemoryChatStore>,
    groups: Arc<GroupRegistry>,
    owner: UserId,
    staff: UserId,
    _server: ServerHandle,
}

fn account(id: &UserId, email: &str, is_staff: bool) -> UserAccount {
    UserAccount {
        id: id.clone(),
        email: EmailAddress::parse(email).expect("valid email"),
        password_hash: String::new(),
        is_active: true,
        is_staff,
    }
}

#[fixture]
async fn harness() -> Harness {
    let store = Arc::new(InMemoryChatStore::default());
    let groups = Arc::new(GroupRegistry::new());
    let owner = UserId::random();
    let staff = UserId::random();
    store.seed_user(account(&owner, "client@example.com", false));
    store.seed_user(account(&staff, "staff@example.com", true));
    let project = store.seed_project(owner.clone(), "Storefront", ProjectStatus::Development);
    store.seed_conversation(CONVERSATION, project);

    let chat = Arc::new(ChatService::new(
        Arc::clone(&store),
        Arc::clone(&store),
        Arc::clone(&store),
        Arc::new(MockAttachmentStore::new()),
        Arc::clone(&groups) as Arc<dyn ChatGroups>,
    ));
    let ws_state = WsState::new(chat, Arc::clone(&groups) as Arc<dyn ChatGroups>);

    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(ws_state.clone()))
            .wrap(test_session_middleware())
            .route(TEST_LOGIN_PATH, web::post().to(test_login))
            .service(ws::chat_entry)
    })
    .listen(listener)
    .expect("bind test server")
    .disable_signals()
    .run();
    let handle = server.handle();
    actix_web::rt::spawn(server);

    Harness {
        url: format!("http://{addr}"),
        store,
        groups,
        owner,
        staff,
        _server: handle,
    }
}

impl Harness {
    async fn cookie_for(&self, user: &UserId) -> Cookie<'static> {
        let response = awc::Client::default()
            .post(format!("{}/test-login/{user}", self.url))
            .send()
            .await
            .expect("test login");
        response.cookie("session").expect("session cookie")
    }

    async fn connect(&self, user: Option<&UserId>) -> ClientSocket {
        let mut request = awc::Client::default()
            .ws(format!("{}/ws/chat/{}/", self.url, CONVERSATION))
            .set_header(header::ORIGIN, "http://localhost:3000");
        if let Some(user) = user {
            request = request.cookie(self.cookie_for(user).await);
        }
        let (_resp, socket) = request.connect().await.expect("websocket connect");
        socket
    }

    async fn wait_for_members(&self, expected: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while self.groups.member_count(CONVERSATION) != expected {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("group membership settles");
    }
}

async fn send_text(socket: &mut ClientSocket, body: String) {
    socket
        .send(ClientMessage::Text(body.into()))
        .await
        .expect("send text");
}

async fn next_text_frame(socket: &mut ClientSocket) -> Value {
    loop {
        let frame = socket.next().await.expect("response frame").expect("frame");
        match frame {
            Frame::Text(bytes) => return serde_json::from_slice(&bytes).expect("json frame"),
            Frame::Ping(payload) => socket
                .send(ClientMessage::Pong(payload))
                .await
                .expect("send pong"),
            Frame::Pong(_) => continue,
            other => panic!("expected text frame, got {other:?}"),
        }
    }
}

async fn next_close_reason(socket: &mut ClientSocket) -> Option<CloseReason> {
    tokio::time::timeout(Duration::from_secs(2), async {
        while let Some(frame) = socket.next().await {
            match frame.expect("frame") {
                Frame::Close(reason) => return reason,
                Frame::Ping(_) | Frame::Pong(_) => continue,
                other => panic!("unexpected frame before close: {other:?}"),
            }
        }
        None
    })
    .await
    .expect("close frame within timeout")
}

/// Fail if a text frame arrives within `window`.
async fn assert_silent(socket: &mut ClientSocket, window: Duration) {
    let _ = tokio::time::timeout(window, async {
        while let Some(frame) = socket.next().await {
            match frame.expect("frame") {
                Frame::Text(bytes) => panic!("unexpected frame: {bytes:?}"),
                Frame::Ping(payload) => socket
                    .send(ClientMessage::Pong(payload))
                    .await
                    .expect("send pong"),
                _ => {}
            }
        }
    })
    .await;
}

#[rstest]
#[actix_rt::test]
async fn both_members_receive_a_valid_message(#[future] harness: Harness) {
    let harness = harness.await;
    let mut owner = harness.connect(Some(&harness.owner)).await;
    let mut staff = harness.connect(Some(&harness.staff)).await;
    harness.wait_for_members(2).await;

    send_text(&mut owner, serde_json::json!({ "message": "hi" }).to_string()).await;

    let to_owner = next_text_frame(&mut owner).await;
    let to_staff = next_text_frame(&mut staff).await;
    for frame in [&to_owner, &to_staff] {
        assert_eq!(frame.get("message").and_then(Value::as_str), Some("hi"));
        assert_eq!(
            frame.get("user_id").and_then(Value::as_str),
            Some(harness.owner.as_ref())
        );
        assert!(frame.get("timestamp").and_then(Value::as_str).is_some());
    }
    assert_eq!(to_owner.get("message_id"), to_staff.get("message_id"));
    assert_eq!(harness.store.message_count(CONVERSATION), 1);
}

#[rstest]
#[actix_rt::test]
async fn concurrent_senders_reach_every_member(#[future] harness: Harness) {
    const PER_SENDER: usize = 5;
    let harness = harness.await;
    let mut owner = harness.connect(Some(&harness.owner)).await;
    let mut staff = harness.connect(Some(&harness.staff)).await;
    harness.wait_for_members(2).await;

    for n in 0..PER_SENDER {
        send_text(&mut owner, serde_json::json!({ "message": format!("owner {n}") }).to_string())
            .await;
        send_text(&mut staff, serde_json::json!({ "message": format!("staff {n}") }).to_string())
            .await;
    }

    let mut seen = Vec::new();
    for socket in [&mut owner, &mut staff] {
        let mut ids = BTreeSet::new();
        for _ in 0..PER_SENDER * 2 {
            let frame = next_text_frame(socket).await;
            ids.insert(frame.get("message_id").and_then(Value::as_i64).expect("message id"));
        }
        seen.push(ids);
    }
    assert_eq!(seen.first().map(BTreeSet::len), Some(PER_SENDER * 2));
    assert_eq!(seen.first(), seen.last());
    assert_eq!(harness.store.message_count(CONVERSATION), PER_SENDER * 2);
}

#[rstest]
#[actix_rt::test]
async fn over_long_message_is_answered_only_to_the_sender(#[future] harness: Harness) {
    let harness = harness.await;
    let mut owner = harness.connect(Some(&harness.owner)).await;
    let mut staff = harness.connect(Some(&harness.staff)).await;
    harness.wait_for_members(2).await;

    let body = "x".repeat(MAX_MESSAGE_CHARS + 1);
    send_text(&mut owner, serde_json::json!({ "message": body }).to_string()).await;

    let reply = next_text_frame(&mut owner).await;
    assert_eq!(reply, serde_json::json!({ "error": "Message too long" }));
    assert_silent(&mut staff, HEARTBEAT_INTERVAL).await;
    assert_eq!(harness.store.message_count(CONVERSATION), 0);
}

#[rstest]
#[actix_rt::test]
async fn unknown_conversation_reports_an_error_frame(#[future] harness: Harness) {
    let harness = harness.await;
    let cookie = harness.cookie_for(&harness.owner).await;
    let (_resp, mut socket) = awc::Client::default()
        .ws(format!("{}/ws/chat/999/", harness.url))
        .set_header(header::ORIGIN, "http://localhost:3000")
        .cookie(cookie)
        .connect()
        .await
        .expect("websocket connect");

    send_text(&mut socket, serde_json::json!({ "message": "hello?" }).to_string()).await;

    let reply = next_text_frame(&mut socket).await;
    assert_eq!(
        reply,
        serde_json::json!({ "error": crate::domain::INVALID_CONVERSATION_MESSAGE })
    );
}

#[rstest]
#[actix_rt::test]
async fn unauthenticated_socket_is_closed_without_joining(#[future] harness: Harness) {
    let harness = harness.await;
    let mut socket = harness.connect(None).await;

    let reason = next_close_reason(&mut socket).await.expect("close reason");

    assert_eq!(reason.code, CloseCode::Other(UNAUTHORIZED_CLOSE_CODE));
    assert_eq!(reason.description.as_deref(), Some("unauthorized"));
    assert_eq!(harness.groups.member_count(CONVERSATION), 0);
}

#[rstest]
#[case::unknown(None)]
#[case::deactivated(Some("locked@example.com"))]
#[actix_rt::test]
async fn signed_in_but_inactive_socket_is_closed_without_joining(
    #[future] harness: Harness,
    #[case] seeded_email: Option<&str>,
) {
    let harness = harness.await;
    let user = UserId::random();
    if let Some(email) = seeded_email {
        let mut locked = account(&user, email, false);
        locked.is_active = false;
        harness.store.seed_user(locked);
    }
    let mut socket = harness.connect(Some(&user)).await;

    let reason = next_close_reason(&mut socket).await.expect("close reason");

    assert_eq!(reason.code, CloseCode::Other(UNAUTHORIZED_CLOSE_CODE));
    assert_eq!(harness.groups.member_count(CONVERSATION), 0);
}

#[rstest]
#[actix_rt::test]
async fn closes_on_malformed_json(#[future] harness: Harness) {
    let harness = harness.await;
    let mut socket = harness.connect(Some(&harness.owner)).await;

    send_text(&mut socket, "not-json".to_owned()).await;

    let reason = next_close_reason(&mut socket).await.expect("close reason");
    assert_eq!(reason.code, CloseCode::Policy);
    harness.wait_for_members(0).await;
}

#[rstest]
#[actix_rt::test]
async fn client_close_leaves_the_group(#[future] harness: Harness) {
    let harness = harness.await;
    let mut socket = harness.connect(Some(&harness.owner)).await;
    harness.wait_for_members(1).await;

    socket
        .send(ClientMessage::Close(None))
        .await
        .expect("send close");

    harness.wait_for_members(0).await;
}

#[rstest]
#[actix_rt::test]
async fn closes_after_timeout_without_client_messages(#[future] harness: Harness) {
    let harness = harness.await;
    let mut socket = harness.connect(Some(&harness.owner)).await;
    tokio::time::sleep(CLIENT_TIMEOUT + HEARTBEAT_INTERVAL * 3).await;

    let reason = next_close_reason(&mut socket)
        .await
        .expect("close frame after timeout");
    assert_eq!(reason.code, CloseCode::Normal);
    assert_eq!(reason.description.as_deref(), Some("heartbeat timeout"));
}
