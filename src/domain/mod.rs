//! # Domain Layer
//!
//! Conversation records, gateway outcomes and reply normalization.
//! This layer is independent of the runtime, the transport and any renderer.

pub mod error;
pub mod models;
pub mod services;

pub use error::*;
pub use models::*;
pub use services::*;
