//! Portal entry-point: wires REST endpoints, the chat socket, and OpenAPI docs.

mod server;

use actix_web::web;
#[cfg(feature = "metrics")]
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use color_eyre::eyre::{Context, Result, eyre};
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use portal::inbound::http::health::HealthState;
use portal::inbound::http::session_config::fingerprint::key_fingerprint;
use portal::inbound::http::session_config::{BuildMode, session_settings_from_env};
use portal::outbound::cache::connect_redis;
use portal::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use server::{PortalSettings, ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .wrap_err("invalid session configuration")?;
    info!(
        fingerprint = %key_fingerprint(&session.key),
        "session signing key loaded"
    );

    let settings = PortalSettings::load_from_iter(std::env::args_os())
        .map_err(|err| eyre!("invalid settings: {err}"))?;
    let mut config = ServerConfig::new(
        session.key,
        session.cookie_secure,
        session.same_site,
        settings.clone(),
    );

    if let Some(url) = settings.database_url.as_deref() {
        let applied = run_pending_migrations(url.to_owned())
            .await
            .wrap_err("database migrations failed")?;
        info!(applied, "database migrations applied");
        let pool = DbPool::new(PoolConfig::new(url))
            .await
            .wrap_err("database pool unavailable")?;
        config = config.with_db_pool(pool);
    }

    if let Some(url) = settings.redis_url.as_deref() {
        let pool = connect_redis(url).await.wrap_err("redis unavailable")?;
        config = config.with_redis_pool(pool);
    }

    #[cfg(feature = "metrics")]
    {
        config = config.with_metrics(Some(make_metrics()?));
    }

    let health_state = web::Data::new(HealthState::new());
    info!(bind_addr = %settings.bind_addr(), "starting portal server");
    create_server(health_state, config)?
        .await
        .wrap_err("server terminated")
}

#[cfg(feature = "metrics")]
fn make_metrics() -> Result<PrometheusMetrics> {
    PrometheusMetricsBuilder::new("portal")
        .endpoint("/metrics")
        .build()
        .map_err(|err| eyre!("configure Prometheus metrics: {err}"))
}
