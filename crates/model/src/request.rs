use serde::{Deserialize, Serialize};

/// A request to be sent to the model provider.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelRequest {
    /// The input turns, oldest first. The last turn is the one the model
    /// should answer.
    pub messages: Vec<ModelMessage>,
}

impl ModelRequest {
    /// Returns the text of the newest user turn, if any.
    #[inline]
    pub fn last_user_text(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|msg| match msg {
            ModelMessage::User(text) => Some(text.as_str()),
            ModelMessage::Model(_) => None,
        })
    }
}

/// A complete turn in the request.
///
/// The role vocabulary is the collaborator's: what the widget calls an
/// assistant message is a `Model` turn here.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "role", content = "text", rename_all = "lowercase")]
pub enum ModelMessage {
    /// A turn written by (or on behalf of) the user.
    User(String),
    /// A turn written by (or on behalf of) the model.
    Model(String),
}

impl ModelMessage {
    /// Returns the text of this turn.
    #[inline]
    pub fn text(&self) -> &str {
        match self {
            ModelMessage::User(text) | ModelMessage::Model(text) => text,
        }
    }

    /// Returns `true` if this is a user turn.
    #[inline]
    pub fn is_user(&self) -> bool {
        matches!(self, ModelMessage::User(_))
    }
}
