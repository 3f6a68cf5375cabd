//! # Connector Layer
//!
//! External integrations implementing application interfaces:
//! - Upstream provider client (OpenAI-compatible HTTP)
//! - Completion gateways (in-process provider, HTTP chat endpoint, canned offline replies)
//! - The `POST /api/chat` server
//! - CLI wiring (container, router, controllers)

pub mod adapter;
pub mod api;
pub mod server;

pub use adapter::*;
pub use server::*;
