//! Port for per-conversation broadcast groups.
//!
//! Every open socket joins exactly one group and receives events through a
//! bounded mailbox. Leaving happens when the [`GroupMembership`] is dropped,
//! so every exit path of a socket task deregisters it.

use std::fmt;

use tokio::sync::mpsc;

use crate::domain::{ChatEvent, ConversationId};

/// Identifier assigned to a connection when it joins a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Outcome of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOutReport {
    /// Mailboxes that accepted the event.
    pub delivered: usize,
    /// Mailboxes that were full; the member stays registered.
    pub dropped: usize,
    /// Mailboxes whose receiver was gone; the member was removed.
    pub pruned: usize,
}

type LeaveFn = Box<dyn FnOnce() + Send>;

/// Live membership of one connection in one conversation group.
pub struct GroupMembership {
    conversation_id: ConversationId,
    connection_id: ConnectionId,
    events: mpsc::Receiver<ChatEvent>,
    leave: Option<LeaveFn>,
}

impl GroupMembership {
    /// Assemble a membership; `leave` runs at most once.
    pub fn new(
        conversation_id: ConversationId,
        connection_id: ConnectionId,
        events: mpsc::Receiver<ChatEvent>,
        leave: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            conversation_id,
            connection_id,
            events,
            leave: Some(Box::new(leave)),
        }
    }

    pub fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Wait for the next event addressed to the group.
    ///
    /// Returns `None` once the registry has dropped this member.
    pub async fn recv(&mut self) -> Option<ChatEvent> {
        self.events.recv().await
    }

    /// Deregister now. Calling it again, or dropping afterwards, is a no-op.
    pub fn leave(&mut self) {
        if let Some(leave) = self.leave.take() {
            leave();
        }
    }
}

impl Drop for GroupMembership {
    fn drop(&mut self) {
        self.leave();
    }
}

impl fmt::Debug for GroupMembership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupMembership")
            .field("conversation_id", &self.conversation_id)
            .field("connection_id", &self.connection_id)
            .field("joined", &self.leave.is_some())
            .finish()
    }
}

/// Registry of conversation groups.
#[cfg_attr(test, mockall::automock)]
pub trait ChatGroups: Send + Sync {
    /// Register a new connection in the conversation's group.
    fn join(&self, conversation_id: ConversationId) -> GroupMembership;

    /// Offer `event` to every member without blocking on any of them.
    fn publish(&self, conversation_id: ConversationId, event: ChatEvent) -> FanOutReport;

    /// Number of connections currently registered for the conversation.
    fn member_count(&self, conversation_id: ConversationId) -> usize;
}
