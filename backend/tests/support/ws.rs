//! Chat wiring shared by the socket integration tests.
//!
//! Integration tests under `backend/tests/` compile as separate crates, so
//! the in-memory world used by each of them lives here to avoid drift.

#![allow(dead_code, reason = "each test crate uses a different subset")]

use std::sync::Arc;

use portal::domain::ports::{ChatGroups, ConversationLifecycle, DisabledLanguageModel};
use portal::domain::{
    ChatService, ChatbotService, ConversationId, ConversationLifecycleService, EmailAddress,
    PasswordLoginService, ProjectId, ProjectStatus, ProjectStatusService, UserAccount, UserId,
    hash_password,
};
use portal::inbound::http::state::HttpState;
use portal::inbound::ws::state::WsState;
use portal::outbound::cache::{InMemoryChatbotCache, InMemoryLoginAttemptStore};
use portal::outbound::memory::InMemoryChatStore;
use portal::outbound::realtime::GroupRegistry;
use portal::outbound::storage::CapStdAttachmentStore;
use zeroize::Zeroizing;

pub const CONVERSATION: ConversationId = ConversationId::new(7);
pub const OWNER_EMAIL: &str = "client@nordiccodeworks.example";
pub const STAFF_EMAIL: &str = "staff@nordiccodeworks.example";
pub const OUTSIDER_EMAIL: &str = "outsider@nordiccodeworks.example";
pub const PASSWORD: &str = "correct horse battery";
pub const ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// In-memory chat deployment: one project in development with
/// conversation 7, its owner, one staff member and an unrelated client.
pub struct ChatWorld {
    pub store: Arc<InMemoryChatStore>,
    pub groups: Arc<GroupRegistry>,
    pub http: HttpState,
    pub ws: WsState,
    pub project: ProjectId,
    pub owner: UserId,
    pub staff: UserId,
    pub outsider: UserId,
    _attachments: tempfile::TempDir,
}

fn account(email: &str, password_hash: &str, is_staff: bool) -> UserAccount {
    UserAccount {
        id: UserId::random(),
        email: EmailAddress::parse(email).expect("valid email"),
        password_hash: password_hash.to_owned(),
        is_active: true,
        is_staff,
    }
}

/// Build the world with real domain services over in-memory adapters.
pub fn chat_world() -> ChatWorld {
    let store = Arc::new(InMemoryChatStore::default());
    let groups = Arc::new(GroupRegistry::new());
    let password_hash = hash_password(PASSWORD).expect("hash password");

    let owner = account(OWNER_EMAIL, &password_hash, false);
    let staff = account(STAFF_EMAIL, &password_hash, true);
    let outsider = account(OUTSIDER_EMAIL, &password_hash, false);
    let ids = (owner.id.clone(), staff.id.clone(), outsider.id.clone());
    let project = store.seed_project(
        ids.0.clone(),
        "Storefront rebuild",
        ProjectStatus::Development,
    );
    store.seed_user(owner);
    store.seed_user(staff);
    store.seed_user(outsider);
    store.seed_conversation(CONVERSATION, project);

    let dir = tempfile::tempdir().expect("attachment dir");
    let attachments = CapStdAttachmentStore::open(dir.path()).expect("open attachment store");
    let clock = Arc::new(mockable::DefaultClock);

    let chat = Arc::new(ChatService::new(
        Arc::clone(&store),
        Arc::clone(&store),
        Arc::clone(&store),
        Arc::new(attachments),
        Arc::clone(&groups) as Arc<dyn ChatGroups>,
    ));
    let lifecycle: Arc<dyn ConversationLifecycle> =
        Arc::new(ConversationLifecycleService::new(Arc::clone(&store)));
    let http = HttpState {
        login: Arc::new(PasswordLoginService::new(
            Arc::clone(&store),
            Arc::new(InMemoryLoginAttemptStore::new(clock.clone())),
        )),
        chat: chat.clone(),
        chat_query: chat.clone(),
        project_status: Arc::new(ProjectStatusService::new(
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::clone(&lifecycle),
        )),
        lifecycle,
        chatbot: Arc::new(ChatbotService::new(
            Arc::new(InMemoryChatbotCache::new(clock)),
            Arc::new(DisabledLanguageModel),
            Zeroizing::new(b"integration-pepper".to_vec()),
        )),
    };
    let ws = WsState::new(chat, Arc::clone(&groups) as Arc<dyn ChatGroups>);

    ChatWorld {
        store,
        groups,
        http,
        ws,
        project,
        owner: ids.0,
        staff: ids.1,
        outsider: ids.2,
        _attachments: dir,
    }
}
