pub mod application;
pub mod cli;
pub mod connector;
pub mod domain;

pub use application::{
    ChatClient, ChatSession, ChatSessionHandle, CompletionGateway, Conversation, IgnoreReason,
    RevealEvent, SessionOptions, SubmitOutcome, Typewriter, TypewriterEngine,
};

pub use cli::Commands;

pub use connector::{
    chat_router, CannedGateway, HttpGateway, OpenAiCompatClient, ProviderGateway,
};

pub use domain::{
    format_reply, DomainError, ExchangeId, FailureKind, GatewayError, GatewayResult, Phase,
    RenderState, Speaker, Turn,
};
