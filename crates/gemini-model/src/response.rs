use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use pin_project_lite::pin_project;
use trade_assistant_model::{
    ErrorKind, ModelFinishReason, ModelResponse, ModelResponseEvent,
};

use crate::Error;
use crate::io::{Sse, SseError};
use crate::proto::{self, ApiError, GenerateContentChunk};

struct PartialState {
    sse: Sse,
    received_text: bool,
    // Gemini may put several text parts and the finish reason into a single
    // chunk, so events are parsed ahead and drained one at a time.
    pending_deltas: VecDeque<String>,
    pending_finish_reason: Option<ModelFinishReason>,
    finished: bool,
}

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextEvent = Result<(Option<ModelResponseEvent>, PartialState), Error>;

pin_project! {
    pub struct GeminiResponse {
        next_event_fut: Option<PinnedFuture<NextEvent>>,
    }
}

impl GeminiResponse {
    #[inline]
    pub fn from_sse(sse: Sse) -> Self {
        let partial_state = PartialState {
            sse,
            received_text: false,
            pending_deltas: VecDeque::new(),
            pending_finish_reason: None,
            finished: false,
        };
        let next_event_fut = async move { next_event(partial_state).await };
        Self {
            next_event_fut: Some(Box::pin(next_event_fut)),
        }
    }
}

impl ModelResponse for GeminiResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.project();
        let Some(next_event_fut) = this.next_event_fut else {
            return Poll::Ready(Ok(None));
        };
        let (event, partial_state) =
            match ready!(next_event_fut.as_mut().poll(cx)) {
                Ok((Some(event), partial_state)) => (event, partial_state),
                Ok((None, _)) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Ok(None));
                }
                Err(err) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Err(err));
                }
            };

        // The stream may still have more data to pull, create a new future for
        // the next event.
        let next_event_fut = async move { next_event(partial_state).await };
        *this.next_event_fut = Some(Box::pin(next_event_fut));

        Poll::Ready(Ok(Some(event)))
    }
}

async fn next_event(
    mut partial_state: PartialState,
) -> Result<(Option<ModelResponseEvent>, PartialState), Error> {
    loop {
        // Always emit message deltas first, then the finish reason.
        if let Some(delta) = partial_state.pending_deltas.pop_front() {
            return Ok((
                Some(ModelResponseEvent::MessageDelta(delta)),
                partial_state,
            ));
        }
        if let Some(reason) = partial_state.pending_finish_reason.take() {
            partial_state.finished = true;
            return Ok((
                Some(ModelResponseEvent::Completed(reason)),
                partial_state,
            ));
        }
        if partial_state.finished {
            return Ok((None, partial_state));
        }

        let sse_event = match partial_state.sse.next_event().await {
            Ok(Some(event)) => event,
            Ok(None) => {
                // Some proxies drop the last chunk's finish reason. A stream
                // that produced text is still usable.
                if !partial_state.received_text {
                    return Err(Error::new(
                        "stream ended without any candidate text",
                        ErrorKind::MalformedResponse,
                    ));
                }
                partial_state.pending_finish_reason =
                    Some(ModelFinishReason::Stop);
                continue;
            }
            Err(SseError::ChunksError(err)) => {
                return Err(Error::new(
                    format!("stream interrupted: {}", err.0),
                    ErrorKind::Transport,
                ));
            }
            Err(SseError::InvalidPayload) => {
                return Err(Error::new(
                    "invalid server-sent event payload",
                    ErrorKind::MalformedResponse,
                ));
            }
        };
        trace!("got sse event: {sse_event}");

        let chunk = serde_json::from_str::<GenerateContentChunk>(&sse_event)
            .map_err(|err| {
                Error::new(format!("{err}"), ErrorKind::MalformedResponse)
            })?;
        apply_chunk(&mut partial_state, chunk)?;
    }
}

fn apply_chunk(
    partial_state: &mut PartialState,
    chunk: GenerateContentChunk,
) -> Result<(), Error> {
    if let Some(err) = chunk.error {
        return Err(api_error(err));
    }

    if let Some(reason) =
        chunk.prompt_feedback.and_then(|feedback| feedback.block_reason)
    {
        debug!("prompt blocked: {reason}");
        partial_state.pending_finish_reason = Some(ModelFinishReason::Moderated);
        return Ok(());
    }

    let Some(candidate) = chunk.candidates.into_iter().next() else {
        return Ok(());
    };
    let texts = candidate
        .content
        .into_iter()
        .flat_map(|content| content.parts)
        .filter_map(|part| part.text)
        .filter(|text| !text.is_empty());
    for text in texts {
        partial_state.received_text = true;
        partial_state.pending_deltas.push_back(text);
    }
    if let Some(reason) = candidate.finish_reason {
        partial_state.pending_finish_reason = Some(proto::finish_reason(&reason));
    }
    Ok(())
}

fn api_error(err: ApiError) -> Error {
    let kind = match err.code {
        Some(401 | 403) => ErrorKind::Unauthenticated,
        Some(429) => ErrorKind::RateLimitExceeded,
        _ => ErrorKind::Transport,
    };
    let message = match err.status {
        Some(status) => format!("{} ({status})", err.message),
        None => err.message,
    };
    Error::new(message, kind)
}
