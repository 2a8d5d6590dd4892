//! Tests for conversation and message handlers.

use std::collections::HashSet;

use super::*;
use crate::domain::{
    AttachmentId, Conversation, MAX_ATTACHMENT_BYTES, MAX_ATTACHMENTS_PER_MESSAGE, MessageId,
    ProjectId, UserId,
};
use crate::inbound::http::test_utils::{
    MockPorts, TEST_LOGIN_PATH, session_cookie, test_login, test_session_middleware,
};
use actix_web::http::StatusCode;
use actix_web::http::header::ContentType;
use actix_web::{App, test as actix_test, web};
use chrono::TimeZone;
use rstest::rstest;
use serde_json::Value;

const BOUNDARY: &str = "portal-test-boundary";

fn test_app(
    ports: MockPorts,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(ports.into_state()))
        .wrap(test_session_middleware())
        .route(TEST_LOGIN_PATH, web::post().to(test_login))
        .service(
            web::scope("/api/v1")
                .service(list_conversations)
                .service(get_conversation)
                .service(list_messages)
                .service(post_message)
                .service(mark_read),
        )
}

fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, minute, 0)
        .single()
        .expect("valid timestamp")
}

fn summary(id: i64, unread: u64) -> ConversationSummary {
    ConversationSummary {
        conversation: Conversation {
            id: ConversationId::new(id),
            project_id: ProjectId::new(3),
            is_archived: false,
            created_at: at(0),
            updated_at: at(5),
        },
        project_title: "Storefront".to_owned(),
        unread_count: unread,
    }
}

fn message(id: i64, sender: &UserId, readers: &[&UserId]) -> Message {
    Message {
        id: MessageId::new(id),
        conversation_id: ConversationId::new(7),
        sender_id: sender.clone(),
        content: format!("message {id}"),
        created_at: at(1),
        has_attachment: false,
        read_by: readers.iter().map(|user| (*user).clone()).collect::<HashSet<_>>(),
        attachments: Vec::new(),
    }
}

fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, file_name, bytes) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match file_name {
            Some(file) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file}\"\r\n\
                     Content-Type: application/pdf\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(uri: &str, body: Vec<u8>) -> actix_test::TestRequest {
    actix_test::TestRequest::post()
        .uri(uri)
        .insert_header((
            actix_web::http::header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .set_payload(body)
}

/// Let the pre-upload participation check pass for conversation 7.
fn participant(mut ports: MockPorts) -> MockPorts {
    ports
        .chat_query
        .expect_get_conversation()
        .withf(|conversation_id, _| *conversation_id == ConversationId::new(7))
        .returning(|_, _| Ok(summary(7, 0)));
    ports
}

async fn json_body(response: actix_web::dev::ServiceResponse) -> Value {
    let body = actix_test::read_body(response).await;
    serde_json::from_slice(&body).expect("JSON body")
}

#[rstest]
#[case("/api/v1/conversations")]
#[case("/api/v1/conversations/7")]
#[case("/api/v1/conversations/7/messages")]
#[actix_web::test]
async fn reads_require_a_session(#[case] uri: &str) {
    let app = actix_test::init_service(test_app(MockPorts::default())).await;
    let response =
        actix_test::call_service(&app, actix_test::TestRequest::get().uri(uri).to_request()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn lists_conversations_as_camel_case() {
    let user = UserId::random();
    let mut ports = MockPorts::default();
    let expected_user = user.clone();
    ports
        .chat_query
        .expect_list_conversations()
        .withf(move |viewer| viewer == &expected_user)
        .return_once(|_| Ok(vec![summary(7, 2)]));
    let app = actix_test::init_service(test_app(ports)).await;
    let cookie = session_cookie(&app, &user).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/conversations")
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let value = json_body(response).await;
    let first = value.get(0).expect("one conversation");
    assert_eq!(first.get("id").and_then(Value::as_i64), Some(7));
    assert_eq!(first.get("projectTitle").and_then(Value::as_str), Some("Storefront"));
    assert_eq!(first.get("unreadCount").and_then(Value::as_u64), Some(2));
    assert!(first.get("updatedAt").is_some());
}

#[actix_web::test]
async fn hidden_conversation_is_not_found() {
    let user = UserId::random();
    let mut ports = MockPorts::default();
    ports
        .chat_query
        .expect_get_conversation()
        .withf(|id, _| *id == ConversationId::new(9))
        .return_once(|_, _| Err(Error::not_found("conversation 9 not found")));
    let app = actix_test::init_service(test_app(ports)).await;
    let cookie = session_cookie(&app, &user).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/conversations/9")
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[rstest]
#[case(0)]
#[case(-2)]
#[actix_web::test]
async fn non_positive_pages_are_rejected(#[case] page: i64) {
    let user = UserId::random();
    let app = actix_test::init_service(test_app(MockPorts::default())).await;
    let cookie = session_cookie(&app, &user).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(&format!("/api/v1/conversations/7/messages?page={page}"))
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let value = json_body(response).await;
    assert_eq!(
        value.get("message").and_then(Value::as_str),
        Some("page must be at least 1")
    );
}

#[actix_web::test]
async fn message_page_reports_read_state_for_the_caller() {
    let viewer = UserId::random();
    let other = UserId::random();
    let page_messages = vec![
        message(1, &other, &[&other, &viewer]),
        message(2, &other, &[&other]),
    ];
    let mut ports = MockPorts::default();
    ports
        .chat_query
        .expect_list_messages()
        .withf(|id, _, page| *id == ConversationId::new(7) && page.page() == 2)
        .return_once(move |_, _, _| {
            Ok(MessagePage {
                page: 2,
                messages: page_messages,
                has_more: false,
            })
        });
    let app = actix_test::init_service(test_app(ports)).await;
    let cookie = session_cookie(&app, &viewer).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/conversations/7/messages?page=2")
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let value = json_body(response).await;
    assert_eq!(value.get("hasMore").and_then(Value::as_bool), Some(false));
    let read_flags: Vec<_> = value
        .get("messages")
        .and_then(Value::as_array)
        .expect("messages array")
        .iter()
        .map(|m| m.get("isRead").and_then(Value::as_bool))
        .collect();
    assert_eq!(read_flags, vec![Some(true), Some(false)]);
}

#[actix_web::test]
async fn posts_multipart_message_with_attachment() {
    let sender = UserId::random();
    let mut ports = MockPorts::default();
    let stored_sender = sender.clone();
    ports
        .chat
        .expect_post_message()
        .withf(|request| {
            request.conversation_id == ConversationId::new(7)
                && request.content == "see attached"
                && request.attachments.len() == 1
                && request
                    .attachments
                    .first()
                    .is_some_and(|file| file.file_name == "brief.pdf" && file.bytes == b"%PDF")
        })
        .times(1)
        .return_once(move |request| {
            let mut stored = message(11, &stored_sender, &[&stored_sender]);
            stored.content = request.content;
            stored.has_attachment = true;
            stored.attachments = vec![Attachment {
                id: AttachmentId::new(4),
                message_id: MessageId::new(11),
                file_name: "brief.pdf".to_owned(),
                file_type: "application/pdf".to_owned(),
                size_bytes: 4,
                storage_key: "attachments/x/brief.pdf".to_owned(),
                uploaded_at: at(2),
            }];
            Ok(stored)
        });
    let app = actix_test::init_service(test_app(participant(ports))).await;
    let cookie = session_cookie(&app, &sender).await;
    let body = multipart_body(&[
        ("content", None, &b"see attached"[..]),
        ("files", Some("brief.pdf"), &b"%PDF"[..]),
    ]);

    let response = actix_test::call_service(
        &app,
        multipart_request("/api/v1/conversations/7/messages", body)
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let value = json_body(response).await;
    assert_eq!(value.get("hasAttachment").and_then(Value::as_bool), Some(true));
    assert_eq!(value.get("isRead").and_then(Value::as_bool), Some(true));
    let attachment = value
        .get("attachments")
        .and_then(|list| list.get(0))
        .expect("attachment");
    assert_eq!(attachment.get("fileName").and_then(Value::as_str), Some("brief.pdf"));
    assert!(attachment.get("storageKey").is_none());
}

#[actix_web::test]
async fn oversized_attachment_never_reaches_the_service() {
    let sender = UserId::random();
    let app = actix_test::init_service(test_app(participant(MockPorts::default()))).await;
    let cookie = session_cookie(&app, &sender).await;
    let oversized = vec![b'x'; MAX_ATTACHMENT_BYTES + 1];
    let body = multipart_body(&[
        ("content", None, &b"too big"[..]),
        ("files", Some("big.pdf"), oversized.as_slice()),
    ]);

    let response = actix_test::call_service(
        &app,
        multipart_request("/api/v1/conversations/7/messages", body)
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let value = json_body(response).await;
    let message = value.get("message").and_then(Value::as_str).unwrap_or_default();
    assert!(message.contains("big.pdf"), "unexpected message {message}");
}

#[rstest]
#[case::too_many_files(MAX_ATTACHMENTS_PER_MESSAGE + 1, 16)]
#[case::too_many_bytes(5, MAX_ATTACHMENT_BYTES)]
#[actix_web::test]
async fn form_caps_reject_before_the_service(#[case] files: usize, #[case] size: usize) {
    let sender = UserId::random();
    let mut ports = participant(MockPorts::default());
    ports.chat.expect_post_message().times(0);
    let app = actix_test::init_service(test_app(ports)).await;
    let cookie = session_cookie(&app, &sender).await;
    let names: Vec<String> = (0..files).map(|n| format!("page{n}.pdf")).collect();
    let bytes = vec![b'x'; size];
    let mut parts = vec![("content", None, &b"scans"[..])];
    parts.extend(names.iter().map(|name| ("files", Some(name.as_str()), bytes.as_slice())));

    let response = actix_test::call_service(
        &app,
        multipart_request("/api/v1/conversations/7/messages", multipart_body(&parts))
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn outsider_post_is_refused_before_the_body_is_read() {
    let sender = UserId::random();
    let mut ports = MockPorts::default();
    ports
        .chat_query
        .expect_get_conversation()
        .times(1)
        .returning(|_, _| Err(Error::not_found("conversation not found")));
    ports.chat.expect_post_message().times(0);
    let app = actix_test::init_service(test_app(ports)).await;
    let cookie = session_cookie(&app, &sender).await;
    let body = multipart_body(&[
        ("content", None, &b"let me in"[..]),
        ("files", Some("brief.pdf"), &b"%PDF"[..]),
    ]);

    let response = actix_test::call_service(
        &app,
        multipart_request("/api/v1/conversations/7/messages", body)
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn non_multipart_post_is_rejected() {
    let sender = UserId::random();
    let app = actix_test::init_service(test_app(participant(MockPorts::default()))).await;
    let cookie = session_cookie(&app, &sender).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/conversations/7/messages")
            .insert_header(ContentType::json())
            .set_payload(r#"{"content":"hi"}"#)
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert!(response.status().is_client_error());
}

#[actix_web::test]
async fn mark_read_returns_newly_read_ids() {
    let reader = UserId::random();
    let mut ports = MockPorts::default();
    ports
        .chat
        .expect_mark_conversation_read()
        .withf(|id, _| *id == ConversationId::new(7))
        .return_once(|_, _| Ok(vec![MessageId::new(3), MessageId::new(5)]));
    let app = actix_test::init_service(test_app(ports)).await;
    let cookie = session_cookie(&app, &reader).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/conversations/7/mark-read")
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let value = json_body(response).await;
    assert_eq!(value, serde_json::json!({ "messageIds": [3, 5] }));
}
