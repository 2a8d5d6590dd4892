//! Builders for the HTTP and WebSocket adapter state.
//!
//! Diesel repositories are used when a pool is configured, otherwise one
//! shared in-memory store backs every repository port. Redis backs login
//! counters and chatbot answers when a pool is configured.

use std::io;
use std::sync::Arc;

use mockable::DefaultClock;
use rand::RngCore;
use reqwest::Url;
use tracing::{info, warn};
use zeroize::Zeroizing;

use portal::domain::ports::{
    AttachmentStore, ChatGroups, ChatMetrics, ChatbotCache, ChatbotQuery, ConversationLifecycle,
    ConversationRepository, DisabledLanguageModel, LanguageModel, LoginAttemptStore, LoginService,
    MessageRepository, ProjectRepository, UserRepository,
};
use portal::domain::{
    ChatService, ChatbotService, ConversationId, ConversationLifecycleService, EmailAddress,
    PasswordLoginService, ProjectStatus, ProjectStatusService, UserAccount, UserId,
    UserValidationError, hash_password,
};
use portal::inbound::http::state::HttpState;
use portal::inbound::ws::state::WsState;
use portal::outbound::cache::{
    InMemoryChatbotCache, InMemoryLoginAttemptStore, RedisChatbotCache, RedisLoginAttemptStore,
};
use portal::outbound::llm::{OpenAiChatClient, OpenAiSettings};
use portal::outbound::memory::InMemoryChatStore;
use portal::outbound::persistence::{
    DieselConversationRepository, DieselMessageRepository, DieselProjectRepository,
    DieselUserRepository,
};
use portal::outbound::realtime::GroupRegistry;
use portal::outbound::storage::CapStdAttachmentStore;

use super::ServerConfig;
use super::config::PortalSettings;

const DEMO_CONVERSATION_ID: i64 = 7;
const DEMO_OWNER_ID: &str = "5d2c4a1e-8f3b-4c6d-9e7a-1b2c3d4e5f60";
const DEMO_STAFF_ID: &str = "9a8b7c6d-5e4f-4a3b-8c2d-1e0f9a8b7c6d";
const DEMO_OWNER_EMAIL: &str = "client@nordiccodeworks.example";
const DEMO_STAFF_EMAIL: &str = "staff@nordiccodeworks.example";
const PEPPER_LEN: usize = 32;

/// Adapter state handed to the Actix application factory.
pub(super) struct AdapterStates {
    pub(super) http: HttpState,
    pub(super) ws: WsState,
}

/// Repository ports shared by the chat, lifecycle and login services.
struct Repositories<C, M, P, U> {
    conversations: Arc<C>,
    messages: Arc<M>,
    projects: Arc<P>,
    users: Arc<U>,
}

/// Infrastructure that does not depend on the repository backend.
struct Infrastructure {
    attachments: Arc<dyn AttachmentStore>,
    groups: Arc<dyn ChatGroups>,
    attempts: AttemptStore,
    chatbot: Arc<dyn ChatbotQuery>,
}

enum AttemptStore {
    Redis(Arc<RedisLoginAttemptStore>),
    Memory(Arc<InMemoryLoginAttemptStore>),
}

enum Model {
    OpenAi(Arc<OpenAiChatClient>),
    Disabled(Arc<DisabledLanguageModel>),
}

fn login_service<U, A>(users: Arc<U>, attempts: Arc<A>) -> Arc<dyn LoginService>
where
    U: UserRepository + 'static,
    A: LoginAttemptStore + 'static,
{
    Arc::new(PasswordLoginService::new(users, attempts))
}

fn build_states<C, M, P, U>(
    repos: Repositories<C, M, P, U>,
    infra: Infrastructure,
) -> AdapterStates
where
    C: ConversationRepository + 'static,
    M: MessageRepository + 'static,
    P: ProjectRepository + 'static,
    U: UserRepository + 'static,
{
    let Repositories {
        conversations,
        messages,
        projects,
        users,
    } = repos;

    let chat = Arc::new(ChatService::new(
        Arc::clone(&conversations),
        messages,
        Arc::clone(&users),
        infra.attachments,
        Arc::clone(&infra.groups),
    ));
    let lifecycle: Arc<dyn ConversationLifecycle> =
        Arc::new(ConversationLifecycleService::new(conversations));
    let project_status = Arc::new(ProjectStatusService::new(
        projects,
        Arc::clone(&users),
        Arc::clone(&lifecycle),
    ));
    let login = match infra.attempts {
        AttemptStore::Redis(attempts) => login_service(users, attempts),
        AttemptStore::Memory(attempts) => login_service(users, attempts),
    };

    AdapterStates {
        http: HttpState {
            login,
            chat: chat.clone(),
            chat_query: chat.clone(),
            project_status,
            lifecycle,
            chatbot: infra.chatbot,
        },
        ws: WsState::new(chat, infra.groups),
    }
}

fn chatbot_with_cache<C>(
    cache: Arc<C>,
    model: Model,
    pepper: Zeroizing<Vec<u8>>,
) -> Arc<dyn ChatbotQuery>
where
    C: ChatbotCache + 'static,
{
    fn service<C, L>(
        cache: Arc<C>,
        model: Arc<L>,
        pepper: Zeroizing<Vec<u8>>,
    ) -> Arc<dyn ChatbotQuery>
    where
        C: ChatbotCache + 'static,
        L: LanguageModel + 'static,
    {
        Arc::new(ChatbotService::new(cache, model, pepper))
    }

    match model {
        Model::OpenAi(model) => service(cache, model, pepper),
        Model::Disabled(model) => service(cache, model, pepper),
    }
}

fn build_model(settings: &PortalSettings) -> io::Result<Model> {
    let Some(api_key) = settings.llm_api_key.clone() else {
        warn!("no language model API key configured; chatbot disabled");
        return Ok(Model::Disabled(Arc::new(DisabledLanguageModel)));
    };
    let base_url = Url::parse(settings.llm_base_url())
        .map_err(|err| io::Error::other(format!("invalid language model base URL: {err}")))?;
    let client = OpenAiChatClient::new(OpenAiSettings {
        base_url,
        api_key: Zeroizing::new(api_key),
        model: settings.llm_model().to_owned(),
        timeout: settings.llm_timeout(),
    })
    .map_err(|err| io::Error::other(format!("language model client: {err}")))?;
    Ok(Model::OpenAi(Arc::new(client)))
}

fn chatbot_pepper(settings: &PortalSettings) -> Zeroizing<Vec<u8>> {
    match &settings.chatbot_pepper {
        Some(pepper) => Zeroizing::new(pepper.as_bytes().to_vec()),
        None => {
            warn!("no chatbot pepper configured; using a per-process random pepper");
            let mut bytes = Zeroizing::new(vec![0_u8; PEPPER_LEN]);
            rand::thread_rng().fill_bytes(bytes.as_mut_slice());
            bytes
        }
    }
}

#[cfg(feature = "metrics")]
fn chat_metrics(config: &ServerConfig) -> io::Result<Arc<dyn ChatMetrics>> {
    super::metrics::chat_metrics(config.prometheus.as_ref())
}

#[cfg(not(feature = "metrics"))]
fn chat_metrics(_config: &ServerConfig) -> io::Result<Arc<dyn ChatMetrics>> {
    Ok(Arc::new(portal::domain::ports::NoOpChatMetrics))
}

fn build_infrastructure(config: &ServerConfig) -> io::Result<Infrastructure> {
    let settings = &config.settings;
    let attachments = CapStdAttachmentStore::open(&settings.attachment_dir())?;
    let groups = GroupRegistry::with_metrics(settings.mailbox_capacity(), chat_metrics(config)?);
    let model = build_model(settings)?;
    let pepper = chatbot_pepper(settings);

    let (attempts, chatbot) = match &config.redis_pool {
        Some(pool) => (
            AttemptStore::Redis(Arc::new(RedisLoginAttemptStore::new(pool.clone()))),
            chatbot_with_cache(Arc::new(RedisChatbotCache::new(pool.clone())), model, pepper),
        ),
        None => {
            let clock = Arc::new(DefaultClock);
            (
                AttemptStore::Memory(Arc::new(InMemoryLoginAttemptStore::new(clock.clone()))),
                chatbot_with_cache(Arc::new(InMemoryChatbotCache::new(clock)), model, pepper),
            )
        }
    };

    Ok(Infrastructure {
        attachments: Arc::new(attachments),
        groups: Arc::new(groups),
        attempts,
        chatbot,
    })
}

fn demo_account(
    id: &str,
    email: &str,
    password_hash: &str,
    is_staff: bool,
) -> io::Result<UserAccount> {
    let invalid = |err: UserValidationError| io::Error::other(err.to_string());
    Ok(UserAccount {
        id: UserId::new(id).map_err(invalid)?,
        email: EmailAddress::parse(email).map_err(invalid)?,
        password_hash: password_hash.to_owned(),
        is_active: true,
        is_staff,
    })
}

/// Seed a client, a staff member and conversation 7 into `store`.
fn seed_demo(store: &InMemoryChatStore, settings: &PortalSettings) -> io::Result<()> {
    let password_hash =
        hash_password(settings.demo_password()).map_err(|err| io::Error::other(err.to_string()))?;
    let owner = demo_account(DEMO_OWNER_ID, DEMO_OWNER_EMAIL, &password_hash, false)?;
    let staff = demo_account(DEMO_STAFF_ID, DEMO_STAFF_EMAIL, &password_hash, true)?;
    let project = store.seed_project(
        owner.id.clone(),
        "Storefront rebuild",
        ProjectStatus::Development,
    );
    store.seed_user(owner);
    store.seed_user(staff);
    store.seed_conversation(ConversationId::new(DEMO_CONVERSATION_ID), project);
    info!(
        conversation_id = DEMO_CONVERSATION_ID,
        owner = DEMO_OWNER_EMAIL,
        staff = DEMO_STAFF_EMAIL,
        "seeded demo chat data"
    );
    Ok(())
}

/// Build the shared adapter state from configured pools and settings.
///
/// # Errors
///
/// Returns an I/O error when the attachment directory cannot be opened,
/// the language model client is misconfigured, metrics registration fails,
/// or demo seeding fails.
pub(super) fn build_adapter_states(config: &ServerConfig) -> io::Result<AdapterStates> {
    let infra = build_infrastructure(config)?;
    match &config.db_pool {
        Some(pool) => Ok(build_states(
            Repositories {
                conversations: Arc::new(DieselConversationRepository::new(pool.clone())),
                messages: Arc::new(DieselMessageRepository::new(pool.clone())),
                projects: Arc::new(DieselProjectRepository::new(pool.clone())),
                users: Arc::new(DieselUserRepository::new(pool.clone())),
            },
            infra,
        )),
        None => {
            warn!("no database configured; chat data is kept in memory");
            let store = Arc::new(InMemoryChatStore::default());
            if config.settings.demo_seed {
                seed_demo(&store, &config.settings)?;
            }
            Ok(build_states(
                Repositories {
                    conversations: Arc::clone(&store),
                    messages: Arc::clone(&store),
                    projects: Arc::clone(&store),
                    users: store,
                },
                infra,
            ))
        }
    }
}
