//! In-memory counters and caches with clock-driven expiry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;

use crate::domain::EmailAddress;
use crate::domain::ports::{
    ChatbotCache, ChatbotCacheError, LoginAttemptStore, LoginAttemptStoreError,
    login_attempts_key,
};

fn expiry(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(ttl)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Process-local failed-login counter.
pub struct InMemoryLoginAttemptStore {
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, (u32, DateTime<Utc>)>>,
}

impl InMemoryLoginAttemptStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl LoginAttemptStore for InMemoryLoginAttemptStore {
    async fn record_failure(
        &self,
        email: &EmailAddress,
        window: Duration,
    ) -> Result<u32, LoginAttemptStoreError> {
        let now = self.clock.utc();
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| LoginAttemptStoreError::backend("attempt map poisoned"))?;
        let entry = entries
            .entry(login_attempts_key(email))
            .or_insert((0, expiry(now, window)));
        if entry.1 <= now {
            *entry = (0, expiry(now, window));
        }
        entry.0 = entry.0.saturating_add(1);
        Ok(entry.0)
    }

    async fn reset(&self, email: &EmailAddress) -> Result<(), LoginAttemptStoreError> {
        self.entries
            .lock()
            .map_err(|_| LoginAttemptStoreError::backend("attempt map poisoned"))?
            .remove(&login_attempts_key(email));
        Ok(())
    }
}

/// Process-local chatbot answer cache.
pub struct InMemoryChatbotCache {
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, (String, DateTime<Utc>)>>,
}

impl InMemoryChatbotCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ChatbotCache for InMemoryChatbotCache {
    async fn get(&self, key: &str) -> Result<Option<String>, ChatbotCacheError> {
        let now = self.clock.utc();
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| ChatbotCacheError::backend("cache map poisoned"))?;
        match entries.get(key) {
            Some((answer, expires_at)) if *expires_at > now => Ok(Some(answer.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, answer: &str, ttl: Duration) -> Result<(), ChatbotCacheError> {
        let expires_at = expiry(self.clock.utc(), ttl);
        self.entries
            .lock()
            .map_err(|_| ChatbotCacheError::backend("cache map poisoned"))?
            .insert(key.to_owned(), (answer.to_owned(), expires_at));
        Ok(())
    }
}
