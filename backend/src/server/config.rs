//! Runtime settings and the HTTP server configuration object.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use actix_web::cookie::{Key, SameSite};
use ortho_config::OrthoConfig;
use portal::outbound::cache::RedisPool;
use portal::outbound::llm::{DEFAULT_MODEL, DEFAULT_TIMEOUT};
use portal::outbound::persistence::DbPool;
use portal::outbound::realtime::DEFAULT_MAILBOX_CAPACITY;
use serde::Deserialize;

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_ATTACHMENT_DIR: &str = "media/chat_attachments";
const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1/";
const DEFAULT_DEMO_PASSWORD: &str = "portal-demo";

/// Deployment settings loaded via OrthoConfig from `PORTAL_*` variables,
/// configuration files and command-line flags.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PORTAL")]
pub struct PortalSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<SocketAddr>,
    /// PostgreSQL URL; in-memory repositories are used when absent.
    pub database_url: Option<String>,
    /// Redis URL for login counters and chatbot answers.
    pub redis_url: Option<String>,
    /// Directory attachment files are written under.
    pub attachment_dir: Option<PathBuf>,
    /// Base URL of the OpenAI-compatible completion API.
    pub llm_base_url: Option<String>,
    /// API key; the chatbot answers 503 when absent.
    pub llm_api_key: Option<String>,
    pub llm_model: Option<String>,
    pub llm_timeout_secs: Option<u64>,
    /// Secret mixed into chatbot cache keys.
    pub chatbot_pepper: Option<String>,
    /// Buffered events per socket before slow consumers are dropped.
    pub mailbox_capacity: Option<usize>,
    /// Seed demo accounts and conversation 7 into the in-memory store.
    #[ortho_config(default = false)]
    pub demo_seed: bool,
    pub demo_password: Option<String>,
}

impl PortalSettings {
    /// Return the configured bind address, falling back to `0.0.0.0:8080`.
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)))
    }

    /// Return the attachment directory, falling back to the default.
    pub fn attachment_dir(&self) -> PathBuf {
        self.attachment_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ATTACHMENT_DIR))
    }

    pub fn llm_base_url(&self) -> &str {
        self.llm_base_url.as_deref().unwrap_or(DEFAULT_LLM_BASE_URL)
    }

    pub fn llm_model(&self) -> &str {
        self.llm_model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn llm_timeout(&self) -> Duration {
        self.llm_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn mailbox_capacity(&self) -> usize {
        self.mailbox_capacity
            .filter(|capacity| *capacity > 0)
            .unwrap_or(DEFAULT_MAILBOX_CAPACITY)
    }

    pub fn demo_password(&self) -> &str {
        self.demo_password.as_deref().unwrap_or(DEFAULT_DEMO_PASSWORD)
    }
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) settings: PortalSettings,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) redis_pool: Option<RedisPool>,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: Option<PrometheusMetrics>,
}

impl ServerConfig {
    /// Construct a server configuration from session toggles and settings.
    #[must_use]
    pub fn new(key: Key, cookie_secure: bool, same_site: SameSite, settings: PortalSettings) -> Self {
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr: settings.bind_addr(),
            settings,
            db_pool: None,
            redis_pool: None,
            #[cfg(feature = "metrics")]
            prometheus: None,
        }
    }

    /// Attach a database connection pool for the Diesel repositories.
    ///
    /// Without one the server runs on the in-memory chat store.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Attach a Redis pool for login counters and chatbot answers.
    #[must_use]
    pub fn with_redis_pool(mut self, pool: RedisPool) -> Self {
        self.redis_pool = Some(pool);
        self
    }

    #[cfg(feature = "metrics")]
    /// Attach Prometheus middleware to the configuration.
    #[must_use]
    pub fn with_metrics(mut self, prometheus: Option<PrometheusMetrics>) -> Self {
        self.prometheus = prometheus;
        self
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 8] = [
        "PORTAL_BIND_ADDR",
        "PORTAL_DATABASE_URL",
        "PORTAL_REDIS_URL",
        "PORTAL_ATTACHMENT_DIR",
        "PORTAL_LLM_MODEL",
        "PORTAL_LLM_TIMEOUT_SECS",
        "PORTAL_MAILBOX_CAPACITY",
        "PORTAL_DEMO_SEED",
    ];

    fn load_from_empty_args() -> PortalSettings {
        PortalSettings::load_from_iter([OsString::from("portal")]).expect("config should load")
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();
        assert_eq!(settings.bind_addr(), SocketAddr::from(([0, 0, 0, 0], 8080)));
        assert_eq!(settings.attachment_dir(), PathBuf::from(DEFAULT_ATTACHMENT_DIR));
        assert_eq!(settings.llm_model(), DEFAULT_MODEL);
        assert_eq!(settings.llm_timeout(), DEFAULT_TIMEOUT);
        assert_eq!(settings.mailbox_capacity(), DEFAULT_MAILBOX_CAPACITY);
        assert!(settings.database_url.is_none());
        assert!(settings.redis_url.is_none());
        assert!(!settings.demo_seed);
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("PORTAL_BIND_ADDR", Some("127.0.0.1:9000".to_owned())),
            ("PORTAL_DATABASE_URL", Some("postgres://db/portal".to_owned())),
            ("PORTAL_REDIS_URL", Some("redis://cache:6379".to_owned())),
            ("PORTAL_ATTACHMENT_DIR", Some("/srv/uploads".to_owned())),
            ("PORTAL_LLM_MODEL", Some("gpt-4o-mini".to_owned())),
            ("PORTAL_LLM_TIMEOUT_SECS", Some("5".to_owned())),
            ("PORTAL_MAILBOX_CAPACITY", Some("8".to_owned())),
            ("PORTAL_DEMO_SEED", Some("true".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(settings.bind_addr(), SocketAddr::from(([127, 0, 0, 1], 9000)));
        assert_eq!(settings.database_url.as_deref(), Some("postgres://db/portal"));
        assert_eq!(settings.redis_url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(settings.attachment_dir(), PathBuf::from("/srv/uploads"));
        assert_eq!(settings.llm_model(), "gpt-4o-mini");
        assert_eq!(settings.llm_timeout(), Duration::from_secs(5));
        assert_eq!(settings.mailbox_capacity(), 8);
        assert!(settings.demo_seed);
    }

    #[rstest]
    fn zero_mailbox_capacity_falls_back() {
        let _guard = lock_env([("PORTAL_MAILBOX_CAPACITY", Some("0".to_owned()))]);

        assert_eq!(load_from_empty_args().mailbox_capacity(), DEFAULT_MAILBOX_CAPACITY);
    }
}
