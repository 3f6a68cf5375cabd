//! # Application Layer
//!
//! Gateway interfaces and the conversation use cases that drive them.

pub mod interfaces;
pub mod use_cases;

pub use interfaces::*;
pub use use_cases::*;
