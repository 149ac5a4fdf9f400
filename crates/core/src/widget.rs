mod builder;
mod state;

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use trade_assistant_actor::{Actor, ActorStoppedError};

use crate::action::ActionDetector;
use crate::model_client::ModelClient;
use crate::notify::AnalyticsSink;
use crate::page_context::PageContext;
use crate::persona::PersonaConfig;
use crate::transcript::{Message, Transcript};
pub use builder::{DEFAULT_REQUEST_TIMEOUT, WidgetBuilder};
use state::{ArmAutoOpen, Snapshot, Submit, ToggleVisibility};

/// Whether the chat window is shown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Only the launcher is shown.
    #[default]
    Closed,
    /// The chat window is shown.
    Open,
}

/// What happened to a submitted text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The text was empty after trimming. Nothing changed.
    Ignored,
    /// A turn is still loading. The text was rejected, not queued.
    Busy,
    /// The text was appended and a turn has started.
    Accepted,
}

/// A point-in-time copy of everything a host renders.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WidgetSnapshot {
    /// All messages, oldest first.
    pub transcript: Transcript,
    /// `true` while a reply is pending.
    pub loading: bool,
    /// The current visibility.
    pub visibility: Visibility,
}

/// The chat widget: a transcript, a model collaborator and the state a
/// host needs to render them.
///
/// The state is owned by an actor, so every operation is applied in the
/// order it was issued. Handles are cheap to clone. The widget stops once
/// the last handle is dropped, abandoning any pending turn.
#[derive(Clone)]
pub struct Widget {
    handle: Actor<WidgetState>,
}

impl Widget {
    /// Submits the visitor's text.
    ///
    /// Returns once the user message is appended (or rejected). The reply
    /// arrives later, through [`WidgetBuilder::on_message`] or a
    /// [`snapshot`](Self::snapshot).
    pub async fn submit<S: Into<String>>(
        &self,
        text: S,
    ) -> Result<SubmitOutcome, ActorStoppedError> {
        self.handle.ask(Submit(text.into())).await
    }

    /// Opens a closed widget or closes an open one, returning the new
    /// visibility.
    ///
    /// A manual toggle cancels the pending auto-open.
    pub async fn toggle_visibility(
        &self,
    ) -> Result<Visibility, ActorStoppedError> {
        self.handle.ask(ToggleVisibility).await
    }

    /// Returns a copy of the current state.
    pub async fn snapshot(&self) -> Result<WidgetSnapshot, ActorStoppedError> {
        self.handle.ask(Snapshot).await
    }
}

type MessageCallback = Box<dyn Fn(&Message) + Send + Sync>;
type LoadingCallback = Box<dyn Fn(bool) + Send + Sync>;
type VisibilityCallback = Box<dyn Fn(Visibility) + Send + Sync>;

struct PendingTurn {
    id: u64,
    task: JoinHandle<()>,
}

pub(crate) struct WidgetState {
    persona: PersonaConfig,
    model_client: Option<ModelClient>,
    page_context: Option<Arc<dyn PageContext>>,
    max_page_chars: usize,
    detector: Arc<dyn ActionDetector>,
    analytics: Option<Arc<dyn AnalyticsSink>>,
    history_window: Option<usize>,
    abort_on_close: bool,

    transcript: Transcript,
    visibility: Visibility,
    pending_turn: Option<PendingTurn>,
    next_turn_id: u64,
    auto_open_timer: Option<JoinHandle<()>>,

    on_message: Option<MessageCallback>,
    on_loading: Option<LoadingCallback>,
    on_visibility: Option<VisibilityCallback>,
}

impl Widget {
    fn spawn_from_builder(builder: WidgetBuilder) -> Self {
        let WidgetBuilder {
            persona,
            model_client_factory,
            page_context,
            max_page_chars,
            detector,
            analytics,
            request_timeout,
            history_window,
            auto_open_after,
            abort_on_close,
            on_message,
            on_loading,
            on_visibility,
        } = builder;

        let transcript = Transcript::seeded(persona.greeting());
        let state = WidgetState {
            model_client: model_client_factory
                .map(|factory| factory(request_timeout)),
            page_context,
            max_page_chars,
            detector,
            analytics,
            history_window,
            abort_on_close,
            transcript,
            visibility: Visibility::Closed,
            pending_turn: None,
            next_turn_id: 1,
            auto_open_timer: None,
            on_message,
            on_loading,
            on_visibility,
            persona,
        };
        let handle = Actor::spawn(state, Some("widget"));
        if let Some(delay) = auto_open_after {
            // The actor was just spawned and is held by `handle`.
            handle.send(ArmAutoOpen(delay)).ok();
        }
        Self { handle }
    }
}
