mod chat_client;
mod completion_gateway;

pub use chat_client::*;
pub use completion_gateway::*;
