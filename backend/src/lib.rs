//! Client portal backend library.
//!
//! Hexagonal layout: [`domain`] holds the chat, project and account model
//! with its ports, [`inbound`] adapts HTTP and WebSocket traffic onto the
//! driving ports, and [`outbound`] implements the driven ports over
//! PostgreSQL, Redis, the filesystem and the language model API.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
