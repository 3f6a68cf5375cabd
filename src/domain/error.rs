use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Session closed: {0}")]
    SessionClosed(String),
}

impl DomainError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn session_closed(msg: impl Into<String>) -> Self {
        Self::SessionClosed(msg.into())
    }

    pub fn is_session_closed(&self) -> bool {
        matches!(self, Self::SessionClosed(_))
    }
}

/// Why a completion call did not produce a reply.
///
/// The kinds only feed logging. The conversation treats every kind the
/// same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Connection refused, timeout, DNS.
    NetworkError,
    /// The other side answered but the completion itself failed.
    UpstreamError,
    /// Success status with a body we could not read.
    MalformedResponse,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::NetworkError => "network_error",
            FailureKind::UpstreamError => "upstream_error",
            FailureKind::MalformedResponse => "malformed_response",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct GatewayError {
    kind: FailureKind,
    message: String,
}

impl GatewayError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::new(FailureKind::NetworkError, msg)
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::new(FailureKind::UpstreamError, msg)
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::new(FailureKind::MalformedResponse, msg)
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_network(&self) -> bool {
        self.kind == FailureKind::NetworkError
    }

    pub fn is_upstream(&self) -> bool {
        self.kind == FailureKind::UpstreamError
    }

    pub fn is_malformed(&self) -> bool {
        self.kind == FailureKind::MalformedResponse
    }
}

/// Outcome of one completion call: the raw reply text or a typed failure.
pub type GatewayResult = Result<String, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_error_display_includes_kind() {
        let err = GatewayError::network("connection refused");
        assert_eq!(err.to_string(), "network_error: connection refused");
        assert!(err.is_network());
        assert!(!err.is_upstream());
    }

    #[test]
    fn session_closed_is_detectable() {
        let err = DomainError::session_closed("session task has stopped");
        assert!(err.is_session_closed());
        assert!(!DomainError::invalid_input("empty").is_session_closed());
    }

    #[test]
    fn constructors_set_kind() {
        assert_eq!(
            GatewayError::upstream("quota").kind(),
            FailureKind::UpstreamError
        );
        assert_eq!(
            GatewayError::malformed("bad json").kind(),
            FailureKind::MalformedResponse
        );
    }
}
