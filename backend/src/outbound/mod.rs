//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel
//! - **memory**: in-process repositories for development without a database
//! - **cache**: Redis-backed login attempt counters and chatbot answers
//! - **storage**: capability-scoped attachment files
//! - **llm**: OpenAI-compatible chat completion client
//! - **realtime**: per-conversation broadcast groups
//! - **metrics**: Prometheus exporters (feature-gated)
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no business logic.

pub mod cache;
pub mod llm;
pub mod memory;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod persistence;
pub mod realtime;
pub mod storage;
