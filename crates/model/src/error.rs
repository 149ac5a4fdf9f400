use std::fmt::{self, Display, Formatter};

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request never got a successful response: connection errors,
    /// timeouts, non-2xx statuses and broken streams.
    Transport,
    /// The provider answered successfully, but the payload carried no
    /// usable text.
    MalformedResponse,
    /// The credential was rejected by the provider.
    Unauthenticated,
    /// The model provider is rate limited.
    RateLimitExceeded,
    /// The content is moderated.
    Moderated,
    /// Any other errors.
    Other,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Transport => "transport failure",
            ErrorKind::MalformedResponse => "malformed response",
            ErrorKind::Unauthenticated => "unauthenticated",
            ErrorKind::RateLimitExceeded => "rate limit exceeded",
            ErrorKind::Moderated => "moderated",
            ErrorKind::Other => "other error",
        };
        f.write_str(s)
    }
}
