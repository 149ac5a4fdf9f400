//! A model provider for the Google Gemini `streamGenerateContent` API.

#[macro_use]
extern crate tracing;

mod config;
mod io;
mod proto;
mod response;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use mime::Mime;
use reqwest::{Client, StatusCode, header};
use trade_assistant_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelRequest,
};

pub use config::{DEFAULT_BASE_URL, DEFAULT_MODEL, GeminiConfig, GeminiConfigBuilder};
use io::{Chunks, Sse};
pub use response::GeminiResponse;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Error type for [`GeminiProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Gemini model provider.
#[derive(Clone, Debug)]
pub struct GeminiProvider {
    client: Client,
    config: Arc<GeminiConfig>,
}

impl GeminiProvider {
    /// Creates a new `GeminiProvider` with the given configuration.
    pub fn new(config: GeminiConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .unwrap_or_else(|err| {
                warn!("failed to build a tuned HTTP client: {err}");
                Client::new()
            });
        Self {
            client,
            config: Arc::new(config),
        }
    }
}

impl ModelProvider for GeminiProvider {
    type Error = Error;
    type Response = GeminiResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let has_api_key = !self.config.api_key.trim().is_empty();
        let body = proto::create_request(req, &self.config);
        let resp_fut = self
            .client
            .post(self.config.stream_url())
            .header(API_KEY_HEADER, &self.config.api_key)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "text/event-stream")
            .json(&body)
            .send();

        async move {
            if !has_api_key {
                return Err(Error::new(
                    "the API key is empty",
                    ErrorKind::Unauthenticated,
                ));
            }

            let resp = resp_fut.await.map_err(|err| {
                Error::new(format!("{err}"), ErrorKind::Transport)
            })?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(Error::new(
                    format!("HTTP {status}: {}", proto::error_message(&body)),
                    status_error_kind(status),
                ));
            }

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            let is_event_stream = content_type
                .and_then(|v| v.parse().ok())
                .map(|m: Mime| m.subtype().as_str() == "event-stream")
                .unwrap_or(false);
            if !is_event_stream {
                return Err(Error::new(
                    format!("Unexpected content type: {content_type:?}"),
                    ErrorKind::MalformedResponse,
                ));
            }

            // Here we got a successful response.
            let sse = Sse::new(Chunks::from_response(resp));
            Ok(GeminiResponse::from_sse(sse))
        }
    }
}

#[inline]
fn status_error_kind(status: StatusCode) -> ErrorKind {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ErrorKind::Unauthenticated
        }
        StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimitExceeded,
        _ => ErrorKind::Transport,
    }
}

#[cfg(test)]
mod tests {
    use trade_assistant_model::ModelMessage;

    use super::*;

    #[test]
    fn test_status_error_kind() {
        assert_eq!(
            status_error_kind(StatusCode::FORBIDDEN),
            ErrorKind::Unauthenticated
        );
        assert_eq!(
            status_error_kind(StatusCode::TOO_MANY_REQUESTS),
            ErrorKind::RateLimitExceeded
        );
        assert_eq!(
            status_error_kind(StatusCode::BAD_GATEWAY),
            ErrorKind::Transport
        );
    }

    #[tokio::test]
    async fn test_empty_api_key_skips_network() {
        // The base URL is unroutable; an attempted call would surface as a
        // transport error instead.
        let config = GeminiConfigBuilder::with_api_key("  ")
            .with_base_url("http://127.0.0.1:9")
            .build();
        let provider = GeminiProvider::new(config);
        let req = ModelRequest {
            messages: vec![ModelMessage::User("hello".to_owned())],
        };
        let err = provider.send_request(&req).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Unauthenticated);
    }
}
