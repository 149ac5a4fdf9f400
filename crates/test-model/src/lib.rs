//! A local fake model for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use tokio::time::{Sleep, sleep};
use trade_assistant_model::{
    ErrorKind, ModelFinishReason, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent,
};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

type ScriptedEvent = Result<ModelResponseEvent, Error>;

pub struct TestModelResponse {
    events: VecDeque<ScriptedEvent>,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl TestModelResponse {
    fn from_preset(preset: &PresetResponse) -> Self {
        let mut events = VecDeque::new();
        let mut finished = false;
        for event in &preset.events {
            match event {
                PresetEvent::MessageDelta(delta) => events
                    .push_back(Ok(ModelResponseEvent::MessageDelta(
                        delta.clone(),
                    ))),
                PresetEvent::Finish(reason) => {
                    events.push_back(Ok(ModelResponseEvent::Completed(
                        *reason,
                    )));
                    finished = true;
                    break;
                }
                PresetEvent::StreamError(failure) => {
                    events.push_back(Err(Error {
                        message: "scripted stream error",
                        kind: failure.kind(),
                    }));
                    finished = true;
                    break;
                }
            }
        }
        if !finished {
            events.push_back(Ok(ModelResponseEvent::Completed(
                ModelFinishReason::Stop,
            )));
        }
        Self {
            events,
            sleep: None,
        }
    }
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        // SAFETY: This type does not require to be pinned.
        let this = unsafe { self.get_unchecked_mut() };

        if this.events.is_empty() {
            // In case this method is called after completion.
            return Poll::Ready(Ok(None));
        }

        let sleep = this
            .sleep
            .get_or_insert_with(|| Box::pin(sleep(Duration::from_millis(1))));
        ready!(sleep.as_mut().poll(cx));
        this.sleep = None;

        match this.events.pop_front() {
            Some(Ok(event)) => Poll::Ready(Ok(Some(event))),
            Some(Err(err)) => {
                this.events.clear();
                Poll::Ready(Err(err))
            }
            None => Poll::Ready(Ok(None)),
        }
    }
}

#[derive(Default)]
struct Recorder {
    calls: AtomicUsize,
    requests: Mutex<Vec<ModelRequest>>,
}

/// A local fake model for testing purpose.
///
/// Responses are scripted in call order: the n-th request receives the
/// n-th preset. If there are no enough presets in the script, the request
/// fails with [`ErrorKind::Other`].
///
/// Clones share the request recorder, so a test can keep a clone to
/// inspect what the widget sent after moving the original into it.
/// Finish the script before cloning, since the script itself is copied.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    script: Vec<PresetResponse>,
    delay: Option<Duration>,
    recorder: Arc<Recorder>,
}

impl TestModelProvider {
    #[inline]
    pub fn add_response(&mut self, preset: PresetResponse) {
        self.script.push(preset);
    }

    /// Delays every response by `duration` before the first event.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns how many requests have been sent to this provider.
    #[inline]
    pub fn call_count(&self) -> usize {
        self.recorder.calls.load(Ordering::SeqCst)
    }

    /// Returns a copy of every request received so far.
    pub fn recorded_requests(&self) -> Vec<ModelRequest> {
        self.recorder
            .requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl Debug for TestModelProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestModelProvider")
            .field("script_len", &self.script.len())
            .field("delay", &self.delay)
            .field("calls", &self.call_count())
            .finish()
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let call_idx = self.recorder.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.recorder.requests.lock() {
            requests.push(req.clone());
        }

        let result = match self.script.get(call_idx) {
            None => Err(Error {
                message: "no enough presets",
                kind: ErrorKind::Other,
            }),
            Some(PresetResponse {
                failure: Some(failure),
                ..
            }) => Err(Error {
                message: "scripted request failure",
                kind: failure.kind(),
            }),
            Some(preset) => Ok(TestModelResponse::from_preset(preset)),
        };
        let delay = self.delay;
        async move {
            if let Some(delay) = delay {
                sleep(delay).await;
            }
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use trade_assistant_model::ModelMessage;

    use super::*;

    async fn collect_response(
        resp: TestModelResponse,
    ) -> Result<(String, ModelFinishReason), Error> {
        let mut resp = pin!(resp);
        let mut msg = String::new();
        loop {
            let event = poll_fn(|cx| resp.as_mut().poll_next_event(cx))
                .await?
                .expect("stream ended without a completed event");
            match event {
                ModelResponseEvent::Completed(reason) => {
                    return Ok((msg, reason));
                }
                ModelResponseEvent::MessageDelta(delta) => {
                    msg.push_str(&delta);
                }
            }
        }
    }

    fn hello_request() -> ModelRequest {
        ModelRequest {
            messages: vec![ModelMessage::User("Hi".to_owned())],
        }
    }

    #[tokio::test]
    async fn test_send_request_in_order() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_events([
            PresetEvent::MessageDelta("Hello, ".to_owned()),
            PresetEvent::MessageDelta("world!".to_owned()),
        ]));
        provider.add_response(PresetResponse::with_events([
            PresetEvent::MessageDelta("Cut".to_owned()),
            PresetEvent::Finish(ModelFinishReason::MaxTokens),
            PresetEvent::MessageDelta("never sent".to_owned()),
        ]));

        let resp = provider.send_request(&hello_request()).await.unwrap();
        let (msg, reason) = collect_response(resp).await.unwrap();
        assert_eq!(msg, "Hello, world!");
        assert_eq!(reason, ModelFinishReason::Stop);

        let resp = provider.send_request(&hello_request()).await.unwrap();
        let (msg, reason) = collect_response(resp).await.unwrap();
        assert_eq!(msg, "Cut");
        assert_eq!(reason, ModelFinishReason::MaxTokens);

        let err = provider.send_request(&hello_request()).await.err();
        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::Other));
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_scripted_failures() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::failing(PresetFailure::Transport));
        provider.add_response(PresetResponse::with_events([
            PresetEvent::MessageDelta("Half a".to_owned()),
            PresetEvent::StreamError(PresetFailure::MalformedResponse),
        ]));

        let err = provider.send_request(&hello_request()).await.err();
        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::Transport));

        let resp = provider.send_request(&hello_request()).await.unwrap();
        let err = collect_response(resp).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }

    #[tokio::test]
    async fn test_clones_share_recorder() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::text("ok"));
        let observer = provider.clone();

        provider.send_request(&hello_request()).await.unwrap();
        assert_eq!(observer.call_count(), 1);
        assert_eq!(observer.recorded_requests(), vec![hello_request()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::text("slow"));
        provider.set_delay(Duration::from_secs(5));

        let started = tokio::time::Instant::now();
        provider.send_request(&hello_request()).await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(5));
    }
}
