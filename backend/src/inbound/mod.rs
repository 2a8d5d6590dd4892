//! Inbound adapters: REST handlers under [`http`] and the per-conversation
//! chat socket under [`ws`]. Both authenticate through the same cookie
//! session and call into the domain services held in their app state.

pub mod http;
pub mod ws;
