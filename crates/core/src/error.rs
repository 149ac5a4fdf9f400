use std::error::Error as StdError;
use std::fmt::{self, Display};

use trade_assistant_model::{ErrorKind, ModelProviderError};

/// Why a conversation turn produced no reply.
///
/// Every variant is terminal for its turn and is shown to the visitor as
/// the persona's fallback message. The detail is for operators only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnError {
    /// No model provider (and therefore no credential) is configured.
    MissingCredential,
    /// The request failed on its way to or from the provider.
    Transport(String),
    /// The provider answered, but without any usable text.
    MalformedResponse(String),
}

impl TurnError {
    /// Classifies a provider error.
    pub(crate) fn from_provider(err: &dyn ModelProviderError) -> Self {
        let detail = format!("{err}");
        match err.kind() {
            ErrorKind::MalformedResponse => TurnError::MalformedResponse(detail),
            ErrorKind::Transport
            | ErrorKind::Unauthenticated
            | ErrorKind::RateLimitExceeded
            | ErrorKind::Moderated
            | ErrorKind::Other => TurnError::Transport(detail),
        }
    }
}

impl Display for TurnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnError::MissingCredential => {
                write!(f, "missing credential for the model provider")
            }
            TurnError::Transport(detail) => {
                write!(f, "transport failure: {detail}")
            }
            TurnError::MalformedResponse(detail) => {
                write!(f, "malformed response: {detail}")
            }
        }
    }
}

impl StdError for TurnError {}
