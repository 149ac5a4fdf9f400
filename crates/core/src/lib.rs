//! Core logic of the trade assistant: the chat widget, its transcript,
//! persona framing, booking action detection and fire-and-forget
//! notifications.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod action;
mod error;
mod framing;
mod model_client;
pub mod notify;
mod page_context;
mod persona;
mod transcript;
mod widget;

pub use action::{ActionDetector, MarkerOrPhraseDetector};
pub use error::TurnError;
pub use page_context::{DEFAULT_MAX_PAGE_CHARS, PageContext, StaticPage};
pub use persona::{DEFAULT_MARKER, PersonaConfig, PersonaConfigBuilder};
pub use trade_assistant_actor::ActorStoppedError;
pub use transcript::{Message, Role, Transcript};
pub use widget::{
    DEFAULT_REQUEST_TIMEOUT, SubmitOutcome, Visibility, Widget, WidgetBuilder,
    WidgetSnapshot,
};
