//! HTTP surface: `POST /api/chat` in front of a completion gateway.

mod chat_route;

pub use chat_route::*;
