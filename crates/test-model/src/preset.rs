use serde::{Deserialize, Serialize};
use trade_assistant_model::{ErrorKind, ModelFinishReason};

/// A failure that a preset can inject.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetFailure {
    Transport,
    MalformedResponse,
    Unauthenticated,
    RateLimited,
}

impl PresetFailure {
    #[inline]
    pub fn kind(self) -> ErrorKind {
        match self {
            PresetFailure::Transport => ErrorKind::Transport,
            PresetFailure::MalformedResponse => ErrorKind::MalformedResponse,
            PresetFailure::Unauthenticated => ErrorKind::Unauthenticated,
            PresetFailure::RateLimited => ErrorKind::RateLimitExceeded,
        }
    }
}

/// The events in a preset response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetEvent {
    #[serde(rename = "message_delta")]
    MessageDelta(String),
    /// Ends the stream with the given reason. When a preset has no
    /// `Finish` event, the stream ends with [`ModelFinishReason::Stop`].
    #[serde(rename = "finish")]
    Finish(ModelFinishReason),
    /// Breaks the stream at this point.
    #[serde(rename = "stream_error")]
    StreamError(PresetFailure),
}

/// The preset response for one request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Events in this response.
    pub events: Vec<PresetEvent>,
    /// If set, the request itself fails before any event is produced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<PresetFailure>,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            failure: None,
        }
    }

    /// Creates a `PresetResponse` that streams `text` as a single delta.
    #[inline]
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self::with_events([PresetEvent::MessageDelta(text.into())])
    }

    /// Creates a `PresetResponse` whose request fails outright.
    #[inline]
    pub fn failing(failure: PresetFailure) -> Self {
        Self {
            events: vec![],
            failure: Some(failure),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_serialize_deserialize() {
        let response = PresetResponse::with_events([
            PresetEvent::MessageDelta("Packages start from $1,900. ".into()),
            PresetEvent::MessageDelta("[BOOK_ACTION]".into()),
            PresetEvent::Finish(ModelFinishReason::Stop),
        ]);

        let serialized = serde_json::to_string(&response).unwrap();
        let deserialized: PresetResponse =
            serde_json::from_str(&serialized).unwrap();
        assert_eq!(response, deserialized);
    }

    #[test]
    fn test_deserialize_failure() {
        let preset: PresetResponse = serde_json::from_value(json!({
            "events": [],
            "failure": "rate_limited"
        }))
        .unwrap();
        assert_eq!(preset, PresetResponse::failing(PresetFailure::RateLimited));
        assert_eq!(
            preset.failure.unwrap().kind(),
            ErrorKind::RateLimitExceeded
        );
    }
}
