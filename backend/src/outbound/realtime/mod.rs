//! In-process real-time delivery for chat sockets.

mod group_registry;

pub use group_registry::{DEFAULT_MAILBOX_CAPACITY, GroupRegistry};
