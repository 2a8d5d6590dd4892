//! Redis adapters built on a `bb8-redis` connection pool.

use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::RedisConnectionManager;
use bb8_redis::bb8::Pool;
use bb8_redis::redis::{self, AsyncCommands};
use tracing::debug;

use crate::domain::EmailAddress;
use crate::domain::ports::{
    ChatbotCache, ChatbotCacheError, LoginAttemptStore, LoginAttemptStoreError,
    login_attempts_key,
};

/// Shared Redis pool.
pub type RedisPool = Pool<RedisConnectionManager>;

/// Errors raised while building the Redis pool.
#[derive(Debug, thiserror::Error)]
pub enum RedisPoolError {
    #[error("invalid redis url: {0}")]
    Url(#[source] redis::RedisError),
    #[error("failed to build redis pool: {0}")]
    Build(#[source] redis::RedisError),
}

/// Build a pool for `url` and open its first connection.
pub async fn connect_redis(url: &str) -> Result<RedisPool, RedisPoolError> {
    let manager = RedisConnectionManager::new(url).map_err(RedisPoolError::Url)?;
    Pool::builder()
        .max_size(16)
        .connection_timeout(Duration::from_secs(5))
        .build(manager)
        .await
        .map_err(RedisPoolError::Build)
}

fn window_seconds(window: Duration) -> i64 {
    i64::try_from(window.as_secs().max(1)).unwrap_or(i64::MAX)
}

/// Failed-login counter stored in Redis.
#[derive(Clone)]
pub struct RedisLoginAttemptStore {
    pool: RedisPool,
}

impl RedisLoginAttemptStore {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoginAttemptStore for RedisLoginAttemptStore {
    async fn record_failure(
        &self,
        email: &EmailAddress,
        window: Duration,
    ) -> Result<u32, LoginAttemptStoreError> {
        let key = login_attempts_key(email);
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| LoginAttemptStoreError::backend(err.to_string()))?;

        let count: i64 = conn
            .incr(&key, 1_i64)
            .await
            .map_err(|err| LoginAttemptStoreError::backend(err.to_string()))?;
        if count == 1 {
            let (): () = conn
                .expire(&key, window_seconds(window))
                .await
                .map_err(|err| LoginAttemptStoreError::backend(err.to_string()))?;
        }
        debug!(count, "login failure recorded");
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn reset(&self, email: &EmailAddress) -> Result<(), LoginAttemptStoreError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| LoginAttemptStoreError::backend(err.to_string()))?;
        let (): () = conn
            .del(login_attempts_key(email))
            .await
            .map_err(|err| LoginAttemptStoreError::backend(err.to_string()))?;
        Ok(())
    }
}

/// Chatbot answer cache stored in Redis.
#[derive(Clone)]
pub struct RedisChatbotCache {
    pool: RedisPool,
}

impl RedisChatbotCache {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatbotCache for RedisChatbotCache {
    async fn get(&self, key: &str) -> Result<Option<String>, ChatbotCacheError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| ChatbotCacheError::backend(err.to_string()))?;
        conn.get(key)
            .await
            .map_err(|err| ChatbotCacheError::backend(err.to_string()))
    }

    async fn put(&self, key: &str, answer: &str, ttl: Duration) -> Result<(), ChatbotCacheError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| ChatbotCacheError::backend(err.to_string()))?;
        conn.set_ex(key, answer, ttl.as_secs().max(1))
            .await
            .map_err(|err| ChatbotCacheError::backend(err.to_string()))
    }
}
