//! Transcript-related types.

use serde::{Deserialize, Serialize};

/// Who wrote a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The site visitor.
    User,
    /// The assistant persona, including fallback messages.
    Assistant,
}

/// One turn in the conversation, as the visitor sees it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    content: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    show_booking: bool,
}

impl Message {
    /// Creates a user message.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            show_booking: false,
        }
    }

    /// Creates an assistant message.
    ///
    /// `content` must already have any action marker stripped.
    #[inline]
    pub fn assistant<S: Into<String>>(content: S, show_booking: bool) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            show_booking,
        }
    }

    /// Returns the author of this message.
    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the display text of this message.
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns `true` if a booking affordance should be rendered beneath
    /// this message.
    #[inline]
    pub fn show_booking(&self) -> bool {
        self.show_booking
    }
}

/// The ordered, append-only list of messages in one widget session.
#[derive(Clone, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Creates a transcript that starts with a greeting, if any.
    #[inline]
    pub fn seeded(greeting: Option<&str>) -> Self {
        Self {
            messages: greeting
                .map(|greeting| vec![Message::assistant(greeting, false)])
                .unwrap_or_default(),
        }
    }

    #[inline]
    pub(crate) fn push(&mut self, message: Message) -> &Message {
        self.messages.push(message);
        let last = self.messages.len() - 1;
        &self.messages[last]
    }

    /// Returns all messages, oldest first.
    #[inline]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the number of messages.
    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if there are no messages.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns the last `window` messages, or all of them.
    #[inline]
    pub(crate) fn tail(&self, window: Option<usize>) -> &[Message] {
        let start = window
            .map(|window| self.messages.len().saturating_sub(window))
            .unwrap_or(0);
        &self.messages[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_transcript() {
        let mut transcript = Transcript::seeded(Some("G'day!"));
        transcript.push(Message::user("How much?"));
        transcript.push(Message::assistant("From $1,900.", true));

        let json = serde_json::to_value(&transcript).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                { "role": "assistant", "content": "G'day!" },
                { "role": "user", "content": "How much?" },
                { "role": "assistant", "content": "From $1,900.", "show_booking": true }
            ])
        );
        let back: Transcript = serde_json::from_value(json).unwrap();
        assert_eq!(back, transcript);
    }

    #[test]
    fn test_tail() {
        let mut transcript = Transcript::seeded(None);
        assert!(transcript.is_empty());
        for i in 0..5 {
            transcript.push(Message::user(format!("{i}")));
        }
        assert_eq!(transcript.tail(None).len(), 5);
        assert_eq!(transcript.tail(Some(2))[0].content(), "3");
        assert_eq!(transcript.tail(Some(10)).len(), 5);
    }
}
