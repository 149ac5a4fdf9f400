use std::future::poll_fn;
use std::pin::{Pin, pin};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::Instrument;
use trade_assistant_model::{
    ModelFinishReason, ModelProvider, ModelRequest, ModelResponse,
    ModelResponseEvent,
};

use crate::error::TurnError;

type SendRequestResult = Result<String, TurnError>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
type HandlerFn =
    Arc<dyn Fn(ModelRequest) -> BoxedSendRequestFuture + Send + Sync>;

/// A wrapper around a model provider that drains streamed responses into
/// complete replies, enforces a deadline and provides a type-erased
/// interface for the widget.
#[derive(Clone)]
pub struct ModelClient {
    handler_fn: HandlerFn,
    timeout: Duration,
}

impl ModelClient {
    #[inline]
    pub fn new<P: ModelProvider + 'static>(
        provider: P,
        timeout: Duration,
    ) -> Self {
        // We have to erase the type `P`, since the widget state doesn't have
        // a generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(move |req| {
            let fut = provider.send_request(&req);
            Box::pin(
                async move {
                    trace!("sending a request with {} turns", req.messages.len());
                    let resp_or_err = fut.await;
                    handle_response::<P>(resp_or_err).await
                }
                .instrument(trace_span!("model client req")),
            )
        });
        Self {
            handler_fn,
            timeout,
        }
    }

    /// Sends a request and returns the complete reply text.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. The response stops streaming further
    /// events when this operation is cancelled.
    pub async fn send_request(&self, req: ModelRequest) -> SendRequestResult {
        match timeout(self.timeout, (self.handler_fn)(req)).await {
            Ok(result) => result,
            Err(_) => Err(TurnError::Transport(format!(
                "no reply within {:?}",
                self.timeout
            ))),
        }
    }
}

async fn handle_response<P: ModelProvider + 'static>(
    resp_or_err: Result<P::Response, P::Error>,
) -> SendRequestResult {
    let resp = match resp_or_err {
        Ok(resp) => resp,
        Err(err) => {
            debug!("request failed: {err:?}");
            return Err(TurnError::from_provider(&err));
        }
    };

    let mut text = String::new();
    let mut finish_reason = None;

    let mut pinned_resp = pin!(resp);
    loop {
        let event_or_err =
            poll_fn(|cx| pinned_resp.as_mut().poll_next_event(cx)).await;
        let event = match event_or_err {
            Ok(Some(event)) => event,
            Ok(None) => break,
            Err(err) => {
                debug!("stream failed: {err:?}");
                return Err(TurnError::from_provider(&err));
            }
        };

        match event {
            ModelResponseEvent::MessageDelta(delta) => text.push_str(&delta),
            ModelResponseEvent::Completed(reason) => {
                finish_reason = Some(reason);
                break;
            }
        }
    }

    if finish_reason != Some(ModelFinishReason::Stop) {
        debug!("reply finished with {finish_reason:?}");
    }
    if text.trim().is_empty() {
        return Err(TurnError::MalformedResponse(format!(
            "reply has no text (finish reason: {finish_reason:?})"
        )));
    }

    trace!("finished a request");
    Ok(text)
}
