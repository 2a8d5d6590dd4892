//! In-memory repositories used when no database is configured.

mod chat_store;

pub use chat_store::InMemoryChatStore;
