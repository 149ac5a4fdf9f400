use std::sync::Arc;
use std::time::Duration;

use trade_assistant_model::ModelProvider;

use super::{
    LoadingCallback, MessageCallback, Visibility, VisibilityCallback, Widget,
};
use crate::action::{ActionDetector, MarkerOrPhraseDetector};
use crate::model_client::ModelClient;
use crate::notify::AnalyticsSink;
use crate::page_context::{DEFAULT_MAX_PAGE_CHARS, PageContext};
use crate::persona::PersonaConfig;
use crate::transcript::Message;

/// The default deadline for one reply.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

type ModelClientFactory = Box<dyn FnOnce(Duration) -> ModelClient + Send>;

/// [`Widget`] builder.
///
/// Everything is resolved once in [`build`](Self::build) and immutable
/// afterwards.
pub struct WidgetBuilder {
    pub(crate) persona: PersonaConfig,
    pub(crate) model_client_factory: Option<ModelClientFactory>,
    pub(crate) page_context: Option<Arc<dyn PageContext>>,
    pub(crate) max_page_chars: usize,
    pub(crate) detector: Arc<dyn ActionDetector>,
    pub(crate) analytics: Option<Arc<dyn AnalyticsSink>>,
    pub(crate) request_timeout: Duration,
    pub(crate) history_window: Option<usize>,
    pub(crate) auto_open_after: Option<Duration>,
    pub(crate) abort_on_close: bool,
    pub(crate) on_message: Option<MessageCallback>,
    pub(crate) on_loading: Option<LoadingCallback>,
    pub(crate) on_visibility: Option<VisibilityCallback>,
}

impl WidgetBuilder {
    /// Creates a new builder for the persona.
    ///
    /// Without a model provider, every turn ends with the persona's
    /// fallback message and no network call is made.
    pub fn new(persona: PersonaConfig) -> Self {
        let detector = Arc::new(MarkerOrPhraseDetector::for_persona(&persona));
        Self {
            persona,
            model_client_factory: None,
            page_context: None,
            max_page_chars: DEFAULT_MAX_PAGE_CHARS,
            detector,
            analytics: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            history_window: None,
            auto_open_after: None,
            abort_on_close: true,
            on_message: None,
            on_loading: None,
            on_visibility: None,
        }
    }

    /// Sets the model provider, which carries the credential.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        mut self,
        provider: P,
    ) -> Self {
        self.model_client_factory = Some(Box::new(move |timeout| {
            ModelClient::new(provider, timeout)
        }));
        self
    }

    /// Sets the source of the page snapshot sent with each request.
    #[inline]
    pub fn with_page_context<C: PageContext>(
        mut self,
        page_context: C,
    ) -> Self {
        self.page_context = Some(Arc::new(page_context));
        self
    }

    /// Caps the page snapshot at `max_chars` characters.
    #[inline]
    pub fn with_max_page_chars(mut self, max_chars: usize) -> Self {
        self.max_page_chars = max_chars;
        self
    }

    /// Replaces the booking action heuristic.
    #[inline]
    pub fn with_action_detector<D: ActionDetector>(
        mut self,
        detector: D,
    ) -> Self {
        self.detector = Arc::new(detector);
        self
    }

    /// Sets the analytics sink.
    #[inline]
    pub fn with_analytics<A: AnalyticsSink>(mut self, analytics: A) -> Self {
        self.analytics = Some(Arc::new(analytics));
        self
    }

    /// Sets the deadline for one reply. Defaults to 30 seconds.
    #[inline]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sends only the last `messages` transcript messages with each
    /// request. The whole transcript is sent by default.
    #[inline]
    pub fn with_history_window(mut self, messages: usize) -> Self {
        // The newest user message must always be sent.
        self.history_window = Some(messages.max(1));
        self
    }

    /// Opens the widget once, `delay` after it is built, unless the
    /// visitor toggles it first.
    #[inline]
    pub fn with_auto_open_after(mut self, delay: Duration) -> Self {
        self.auto_open_after = Some(delay);
        self
    }

    /// Whether closing the widget abandons a pending turn. Defaults to
    /// `true`.
    #[inline]
    pub fn abort_on_close(mut self, abort: bool) -> Self {
        self.abort_on_close = abort;
        self
    }

    /// Attaches a callback invoked for every appended message.
    #[inline]
    pub fn on_message(
        mut self,
        on_message: impl Fn(&Message) + Send + Sync + 'static,
    ) -> Self {
        self.on_message = Some(Box::new(on_message));
        self
    }

    /// Attaches a callback invoked when the loading flag changes.
    #[inline]
    pub fn on_loading(
        mut self,
        on_loading: impl Fn(bool) + Send + Sync + 'static,
    ) -> Self {
        self.on_loading = Some(Box::new(on_loading));
        self
    }

    /// Attaches a callback invoked when the visibility changes.
    #[inline]
    pub fn on_visibility(
        mut self,
        on_visibility: impl Fn(Visibility) + Send + Sync + 'static,
    ) -> Self {
        self.on_visibility = Some(Box::new(on_visibility));
        self
    }

    /// Builds the widget.
    ///
    /// This must be called within a tokio runtime. Callbacks run on the
    /// widget's task and must not block.
    #[inline]
    pub fn build(self) -> Widget {
        Widget::spawn_from_builder(self)
    }
}
