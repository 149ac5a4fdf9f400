use std::pin::Pin;
use std::task::{self, Poll};

use serde::{Deserialize, Serialize};

use crate::provider::ModelProviderError;

/// A streamed reply from a model provider.
pub trait ModelResponse: Sized + Send + 'static {
    /// The error reported when the stream breaks.
    type Error: ModelProviderError;

    /// Polls for the next streamed event.
    ///
    /// - `Poll::Pending`: no event yet, the task is woken once one may be
    ///   available.
    /// - `Poll::Ready(Ok(Some(event)))`: an event, more may follow.
    /// - `Poll::Ready(Ok(None))`: the stream is over. Every later call
    ///   returns this again.
    /// - `Poll::Ready(Err(error))`: the stream broke. The reply so far
    ///   must be treated as incomplete.
    ///
    /// A well-formed stream ends with [`ModelResponseEvent::Completed`]
    /// before it returns `None`.
    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>>;
}

/// The reason why a model response has finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelFinishReason {
    /// The model has finished generating text.
    Stop,
    /// The output was cut at the token limit.
    MaxTokens,
    /// The output (or the prompt) was blocked by the provider.
    Moderated,
    /// Any reason this protocol doesn't model.
    Other,
}

/// One event of a streamed reply.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelResponseEvent {
    /// The reply is complete.
    Completed(ModelFinishReason),
    /// The next piece of reply text.
    MessageDelta(String),
}
