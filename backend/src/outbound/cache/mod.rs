//! Redis-backed counters and caches, plus in-memory stand-ins.
//!
//! - [`RedisLoginAttemptStore`] counts failed logins per email with a TTL
//!   equal to the lockout window.
//! - [`RedisChatbotCache`] stores chatbot answers under keyed-hash keys.
//! - The `InMemory*` variants back the server when no Redis URL is
//!   configured, and the tests.

mod memory;
mod redis_store;

pub use memory::{InMemoryChatbotCache, InMemoryLoginAttemptStore};
pub use redis_store::{
    RedisChatbotCache, RedisLoginAttemptStore, RedisPool, RedisPoolError, connect_redis,
};
