//! Per-connection chat socket task.
//!
//! Keeps WebSocket framing and heartbeats at the edge while deferring
//! persistence to the injected [`ChatCommand`] port. The public contract
//! pings every 5s and considers a connection idle after 10s without client
//! traffic. Tests shorten these intervals to speed up feedback.
//!
//! Each socket joins its conversation's group for the lifetime of the task;
//! every event the group publishes, including the sender's own messages, is
//! relayed to the client.

use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use tokio::time;
use tracing::{debug, warn};

use crate::domain::ports::{ChatCommand, GroupMembership};
use crate::domain::{ChatEvent, ConversationId, ErrorCode, UserId};
use crate::inbound::http::error::redact_if_internal;
use crate::inbound::ws::messages::{ChatMessageRequest, ErrorPayload, OutboundFrame};
use crate::inbound::ws::state::WsState;

/// Time between heartbeats to the client (5s in production, shorter in tests).
#[cfg(not(test))]
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

/// Max idle time before disconnecting the client (10s in production, shorter in tests).
#[cfg(not(test))]
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
pub const CLIENT_TIMEOUT: Duration = Duration::from_millis(100);

/// Application close code sent to sockets without an authenticated session.
pub const UNAUTHORIZED_CLOSE_CODE: u16 = 4001;

/// Start a socket task for `user_id`, or close the socket with
/// [`UNAUTHORIZED_CLOSE_CODE`] when nobody active is signed in.
pub(super) async fn open_chat_session(
    state: WsState,
    conversation_id: ConversationId,
    user_id: Option<UserId>,
    session: Session,
    stream: MessageStream,
) {
    let Some(user_id) = user_id else {
        reject_unauthenticated(session).await;
        return;
    };
    match state.chat.resolve_sender(&user_id).await {
        Ok(sender) => {
            handle_chat_session(state, conversation_id, sender, session, stream).await;
        }
        Err(error) => {
            if error.code() != ErrorCode::Unauthorized {
                warn!(user_id = %user_id, error = %error, "chat sender lookup failed");
            }
            reject_unauthenticated(session).await;
        }
    }
}

/// Close a socket before it registers anywhere.
async fn reject_unauthenticated(session: Session) {
    debug!("closing unauthenticated chat socket");
    let reason = CloseReason {
        code: CloseCode::Other(UNAUTHORIZED_CLOSE_CODE),
        description: Some("unauthorized".to_owned()),
    };
    if let Err(error) = session.close(Some(reason)).await {
        warn!(error = %error, "Failed to close WebSocket session");
    }
}

async fn handle_chat_session(
    state: WsState,
    conversation_id: ConversationId,
    user_id: UserId,
    session: Session,
    stream: MessageStream,
) {
    let membership = state.groups.join(conversation_id);
    debug!(
        conversation_id = %conversation_id,
        connection_id = %membership.connection_id(),
        user_id = %user_id,
        "chat socket opened"
    );
    ChatSession {
        chat: state.chat,
        conversation_id,
        user_id,
    }
    .run(session, stream, membership)
    .await;
}

enum SessionError {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    InvalidPayload,
    GroupClosed,
    Network(Closed),
}

enum CloseAction {
    None,
    Close(Option<CloseReason>),
}

struct ChatSession {
    chat: Arc<dyn ChatCommand>,
    conversation_id: ConversationId,
    user_id: UserId,
}

impl ChatSession {
    async fn run(
        &self,
        mut session: Session,
        mut stream: MessageStream,
        mut membership: GroupMembership,
    ) {
        let mut last_heartbeat = Instant::now();
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);

        loop {
            let result = tokio::select! {
                _ = heartbeat.tick() => {
                    self.handle_heartbeat_tick(&mut session, &last_heartbeat).await
                }
                message = stream.recv() => {
                    self.handle_stream_message(&mut session, &mut last_heartbeat, message)
                        .await
                }
                event = membership.recv() => {
                    self.handle_group_event(&mut session, event).await
                }
            };

            if let Err(error) = result {
                membership.leave();
                self.log_shutdown_reason(&error);
                let close_action = self.close_action_for(&error);
                self.close_session_if_needed(session, close_action).await;
                return;
            }
        }
    }

    async fn handle_heartbeat_tick(
        &self,
        session: &mut Session,
        last_heartbeat: &Instant,
    ) -> Result<(), SessionError> {
        if Instant::now().duration_since(*last_heartbeat) > CLIENT_TIMEOUT {
            return Err(SessionError::HeartbeatTimeout);
        }

        session.ping(b"").await.map_err(SessionError::Network)
    }

    async fn handle_stream_message(
        &self,
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Option<Result<Message, ProtocolError>>,
    ) -> Result<(), SessionError> {
        let Some(message) = message else {
            return Err(SessionError::StreamClosed);
        };

        match message {
            Ok(message) => self.handle_message(session, last_heartbeat, message).await,
            Err(error) => Err(SessionError::Protocol(error)),
        }
    }

    async fn handle_message(
        &self,
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Message,
    ) -> Result<(), SessionError> {
        match message {
            Message::Ping(payload) => {
                *last_heartbeat = Instant::now();
                session
                    .pong(&payload)
                    .await
                    .map_err(SessionError::Network)?;
                Ok(())
            }
            Message::Text(text) => {
                *last_heartbeat = Instant::now();
                self.handle_text_message(session, text.as_ref()).await
            }
            Message::Pong(_) | Message::Binary(_) | Message::Continuation(_) | Message::Nop => {
                *last_heartbeat = Instant::now();
                Ok(())
            }
            Message::Close(reason) => Err(SessionError::ClientClosed(reason)),
        }
    }

    /// Persist one inbound message. Success is echoed through the group, so
    /// only failures are answered directly, and only to this socket.
    async fn handle_text_message(
        &self,
        session: &mut Session,
        text: &str,
    ) -> Result<(), SessionError> {
        let request = match serde_json::from_str::<ChatMessageRequest>(text) {
            Ok(request) => request,
            Err(error) => {
                warn!(error = %error, "Rejected malformed WebSocket payload");
                return Err(SessionError::InvalidPayload);
            }
        };

        match self
            .chat
            .send_socket_message(self.conversation_id, &self.user_id, request.message)
            .await
        {
            Ok(message) => {
                debug!(message_id = %message.id, "chat message stored");
                Ok(())
            }
            Err(error) => {
                debug!(code = ?error.code(), error = %error, "chat message rejected");
                let visible = redact_if_internal(&error);
                let frame = OutboundFrame::Error(ErrorPayload::new(visible.message()));
                self.send_json(session, &frame)
                    .await
                    .map_err(SessionError::Network)
            }
        }
    }

    async fn handle_group_event(
        &self,
        session: &mut Session,
        event: Option<ChatEvent>,
    ) -> Result<(), SessionError> {
        let Some(event) = event else {
            return Err(SessionError::GroupClosed);
        };
        self.send_json(session, &OutboundFrame::from(event))
            .await
            .map_err(SessionError::Network)
    }

    async fn send_json(
        &self,
        session: &mut Session,
        payload: &OutboundFrame,
    ) -> Result<(), Closed> {
        match serde_json::to_string(payload) {
            Ok(body) => session.text(body).await,
            Err(error) => {
                warn!(error = %error, "Failed to serialize WebSocket payload");
                Ok(())
            }
        }
    }

    fn log_shutdown_reason(&self, error: &SessionError) {
        match error {
            SessionError::HeartbeatTimeout => {
                warn!("WebSocket heartbeat timeout; closing connection");
            }
            SessionError::Protocol(error) => {
                warn!(error = %error, "WebSocket protocol error");
            }
            SessionError::Network(error) => {
                warn!(error = %error, "WebSocket send failed; closing connection");
            }
            SessionError::GroupClosed => {
                warn!(
                    conversation_id = %self.conversation_id,
                    "conversation group dropped this socket"
                );
            }
            SessionError::InvalidPayload
            | SessionError::ClientClosed(_)
            | SessionError::StreamClosed => {
                debug!(conversation_id = %self.conversation_id, "chat socket closed");
            }
        }
    }

    fn close_action_for(&self, error: &SessionError) -> CloseAction {
        match error {
            SessionError::HeartbeatTimeout => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Normal,
                description: Some("heartbeat timeout".to_owned()),
            })),
            SessionError::Protocol(_) => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Protocol,
                description: Some("protocol error".to_owned()),
            })),
            SessionError::InvalidPayload => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Policy,
                description: Some("invalid payload".to_owned()),
            })),
            SessionError::GroupClosed => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Away,
                description: Some("conversation closed".to_owned()),
            })),
            SessionError::ClientClosed(reason) => CloseAction::Close(reason.clone()),
            SessionError::StreamClosed | SessionError::Network(_) => CloseAction::None,
        }
    }

    async fn close_session_if_needed(&self, session: Session, close_action: CloseAction) {
        if let CloseAction::Close(reason) = close_action {
            if let Err(error) = session.close(reason).await {
                warn!(error = %error, "Failed to close WebSocket session");
            }
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
