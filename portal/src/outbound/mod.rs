//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **http**: reqwest-backed client for the portal's remote API
//!
//! Adapters are thin translators that convert between domain types and
//! transport representations. They contain no business logic.

pub mod http;
