mod canned_gateway;
mod http_gateway;
mod openai_compat_client;
mod provider_gateway;

pub use canned_gateway::*;
pub use http_gateway::*;
pub use openai_compat_client::*;
pub use provider_gateway::*;
