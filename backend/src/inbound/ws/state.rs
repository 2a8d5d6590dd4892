//! Shared WebSocket adapter state.
//!
//! The socket depends on the chat command port for persistence and on the
//! group registry for fan-out, so tests can swap either.

use std::sync::Arc;

use crate::domain::ports::{ChatCommand, ChatGroups};

/// Dependency bundle for chat socket tasks.
#[derive(Clone)]
pub struct WsState {
    pub chat: Arc<dyn ChatCommand>,
    pub groups: Arc<dyn ChatGroups>,
}

impl WsState {
    /// Construct state from explicit port implementations.
    pub fn new(chat: Arc<dyn ChatCommand>, groups: Arc<dyn ChatGroups>) -> Self {
        Self { chat, groups }
    }
}
