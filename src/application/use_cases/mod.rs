mod chat_session;
mod conversation;
mod typewriter;

pub use chat_session::*;
pub use conversation::*;
pub use typewriter::*;
