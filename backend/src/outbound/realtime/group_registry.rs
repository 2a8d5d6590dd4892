//! Registry of per-conversation broadcast groups.
//!
//! Each member gets a bounded `mpsc` mailbox. Publishing never awaits: a full
//! mailbox drops the event for that member only, a closed one prunes the
//! member. The map is guarded by a plain mutex; no lock is held across an
//! await point.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::domain::ports::{
    ChatGroups, ChatMetrics, ConnectionId, FanOutReport, GroupMembership, NoOpChatMetrics,
};
use crate::domain::{ChatEvent, ConversationId};

/// Mailbox depth per connection.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 64;

type Groups = HashMap<ConversationId, HashMap<ConnectionId, mpsc::Sender<ChatEvent>>>;

struct RegistryInner {
    groups: Mutex<Groups>,
    next_connection: AtomicU64,
    capacity: usize,
    metrics: Arc<dyn ChatMetrics>,
}

impl RegistryInner {
    fn lock(&self) -> MutexGuard<'_, Groups> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.groups
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn remove(&self, conversation_id: ConversationId, connection_id: ConnectionId) -> bool {
        let mut groups = self.lock();
        let Some(members) = groups.get_mut(&conversation_id) else {
            return false;
        };
        let removed = members.remove(&connection_id).is_some();
        if members.is_empty() {
            groups.remove(&conversation_id);
        }
        removed
    }
}

/// Mutex-guarded [`ChatGroups`] implementation.
#[derive(Clone)]
pub struct GroupRegistry {
    inner: Arc<RegistryInner>,
}

impl GroupRegistry {
    /// Registry with the default mailbox depth and no metrics.
    pub fn new() -> Self {
        Self::with_metrics(DEFAULT_MAILBOX_CAPACITY, Arc::new(NoOpChatMetrics))
    }

    /// Registry with an explicit mailbox depth and metrics sink.
    pub fn with_metrics(capacity: usize, metrics: Arc<dyn ChatMetrics>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                groups: Mutex::new(HashMap::new()),
                next_connection: AtomicU64::new(1),
                capacity: capacity.max(1),
                metrics,
            }),
        }
    }

    /// Number of conversations with at least one live member.
    pub fn group_count(&self) -> usize {
        self.inner.lock().len()
    }
}

impl Default for GroupRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatGroups for GroupRegistry {
    fn join(&self, conversation_id: ConversationId) -> GroupMembership {
        let connection_id =
            ConnectionId::new(self.inner.next_connection.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.inner.capacity);
        self.inner
            .lock()
            .entry(conversation_id)
            .or_default()
            .insert(connection_id, tx);
        self.inner.metrics.socket_opened();
        debug!(%conversation_id, %connection_id, "joined chat group");

        let registry: Weak<RegistryInner> = Arc::downgrade(&self.inner);
        GroupMembership::new(conversation_id, connection_id, rx, move || {
            let Some(inner) = registry.upgrade() else {
                return;
            };
            inner.remove(conversation_id, connection_id);
            inner.metrics.socket_closed();
            debug!(%conversation_id, %connection_id, "left chat group");
        })
    }

    fn publish(&self, conversation_id: ConversationId, event: ChatEvent) -> FanOutReport {
        let mut report = FanOutReport::default();
        {
            let mut groups = self.inner.lock();
            let Some(members) = groups.get_mut(&conversation_id) else {
                return report;
            };
            members.retain(|connection_id, sender| match sender.try_send(event.clone()) {
                Ok(()) => {
                    report.delivered += 1;
                    true
                }
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(%conversation_id, %connection_id, "mailbox full; event dropped");
                    report.dropped += 1;
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    report.pruned += 1;
                    false
                }
            });
            if members.is_empty() {
                groups.remove(&conversation_id);
            }
        }
        self.inner.metrics.fan_out(&report);
        report
    }

    fn member_count(&self, conversation_id: ConversationId) -> usize {
        self.inner
            .lock()
            .get(&conversation_id)
            .map_or(0, HashMap::len)
    }
}
