use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::task::{self, Poll, ready};
use std::time::Duration;

use tokio::time::{Sleep, sleep};
use trade_assistant_model::{
    ErrorKind, ModelFinishReason, ModelMessage, ModelProvider,
    ModelProviderError, ModelRequest, ModelResponse, ModelResponseEvent,
};

#[derive(Debug)]
struct EchoError(ErrorKind);

impl Display for EchoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "echo failed: {}", self.0)
    }
}

impl Error for EchoError {}

impl ModelProviderError for EchoError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// Replies with "You said <last user turn>", one word per event.
#[derive(Debug)]
struct EchoResponse {
    words: VecDeque<String>,
    sleep: Option<Pin<Box<Sleep>>>,
    completed: bool,
}

impl EchoResponse {
    fn new(input: &str) -> Self {
        let words = format!("You said {input}")
            .split(' ')
            .map(ToString::to_string)
            .collect();
        Self {
            words,
            sleep: None,
            completed: false,
        }
    }
}

impl ModelResponse for EchoResponse {
    type Error = EchoError;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        // SAFETY: This type does not require to be pinned.
        let this = unsafe { self.get_unchecked_mut() };
        if this.completed {
            return Poll::Ready(Ok(None));
        }
        let sleep = this
            .sleep
            .get_or_insert_with(|| Box::pin(sleep(Duration::from_millis(1))));
        ready!(sleep.as_mut().poll(cx));
        this.sleep = None;

        let Some(mut word) = this.words.pop_front() else {
            this.completed = true;
            return Poll::Ready(Ok(Some(ModelResponseEvent::Completed(
                ModelFinishReason::Stop,
            ))));
        };
        if !this.words.is_empty() {
            word.push(' ');
        }
        Poll::Ready(Ok(Some(ModelResponseEvent::MessageDelta(word))))
    }
}

struct EchoProvider;

impl ModelProvider for EchoProvider {
    type Error = EchoError;
    type Response = EchoResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let result = match req.last_user_text() {
            Some(text) => Ok(EchoResponse::new(text)),
            None => Err(EchoError(ErrorKind::MalformedResponse)),
        };
        ready(result)
    }
}

mod tests {
    use std::future::poll_fn;

    use super::*;

    async fn collect(mut resp: EchoResponse) -> (String, ModelFinishReason) {
        let mut text = String::new();
        loop {
            let event = poll_fn(|cx| Pin::new(&mut resp).poll_next_event(cx))
                .await
                .unwrap();
            match event {
                Some(ModelResponseEvent::MessageDelta(delta)) => {
                    text.push_str(&delta);
                }
                Some(ModelResponseEvent::Completed(reason)) => {
                    return (text, reason);
                }
                None => unreachable!("completed event is missing"),
            }
        }
    }

    #[tokio::test]
    async fn test_echo_answers_newest_user_turn() {
        let req = ModelRequest {
            messages: vec![
                ModelMessage::User("Act as a plumber's receptionist".into()),
                ModelMessage::Model("Understood.".into()),
                ModelMessage::User("Good morning".into()),
            ],
        };
        let resp = EchoProvider.send_request(&req).await.unwrap();
        let (text, reason) = collect(resp).await;
        assert_eq!(text, "You said Good morning");
        assert_eq!(reason, ModelFinishReason::Stop);
    }

    #[tokio::test]
    async fn test_error_kind() {
        let req = ModelRequest {
            messages: vec![ModelMessage::Model("Hello?".into())],
        };
        let err = EchoProvider.send_request(&req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
        assert_eq!(err.to_string(), "echo failed: malformed response");
    }

    #[test]
    fn test_message_serde_shape() {
        let json = serde_json::to_string(&ModelMessage::Model("Hi".into()))
            .unwrap();
        assert_eq!(json, r#"{"role":"model","text":"Hi"}"#);
    }
}
