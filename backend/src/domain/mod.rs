//! Domain primitives, aggregates and services.
//!
//! Purpose: define the strongly typed chat, project and account model used by
//! the inbound adapters, and the services that implement the driving ports in
//! [`ports`]. Nothing in here knows about HTTP, WebSockets, Diesel or Redis.
//!
//! Public surface:
//! - Error / ErrorCode: API error payload and its stable identifier.
//! - TraceId: request or connection correlation identifier.
//! - Conversation, Message, Attachment: the chat model.
//! - ChatService and friends: implementations of the driving ports.

pub mod attachment;
pub mod auth;
pub mod chat_event;
pub mod chat_service;
pub mod chatbot;
pub mod conversation;
pub mod conversation_lifecycle_service;
pub mod error;
pub mod message;
pub mod password_login_service;
pub mod ports;
pub mod project;
pub mod trace_id;
pub mod user;

pub use self::attachment::{
    ALLOWED_ATTACHMENT_EXTENSIONS, Attachment, AttachmentUpload, AttachmentValidationError,
    DEFAULT_ATTACHMENT_TYPE, MAX_ATTACHMENT_BYTES, MAX_ATTACHMENTS_PER_MESSAGE, StoredAttachment,
    ValidatedAttachment,
};
pub use self::auth::{LockoutPolicy, LoginCredentials, LoginValidationError};
pub use self::chat_event::{ChatEvent, MessageReceived, MessagesRead};
pub use self::chat_service::{ChatService, INVALID_CONVERSATION_MESSAGE};
pub use self::chatbot::{
    ChatbotLanguage, ChatbotReply, ChatbotService, EMPTY_QUESTION_MESSAGE,
    UPSTREAM_FAILURE_MESSAGE, detect_language, escape_html, response_cache_key,
};
pub use self::conversation::{
    AttachmentId, Conversation, ConversationId, ConversationRecord, ConversationSummary,
    MessageId, ProjectId, Viewer,
};
pub use self::conversation_lifecycle_service::{
    ConversationLifecycleService, ProjectStatusService,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::message::{
    InvalidPage, MAX_MESSAGE_CHARS, MESSAGE_PAGE_SIZE, Message, MessageContent, MessagePage,
    MessagePageRequest, MessageValidationError, NewMessage,
};
pub use self::password_login_service::{PasswordLoginService, hash_password, verify_password};
pub use self::project::{ConversationTransition, Project, ProjectStatus, UnknownProjectStatus};
pub use self::trace_id::TraceId;
pub use self::user::{EmailAddress, UserAccount, UserId, UserValidationError};
