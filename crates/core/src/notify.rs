//! Fire-and-forget notifications.
//!
//! Analytics events and lead submissions are dispatched without awaiting
//! their outcome. A failing sink is logged and otherwise ignored, it never
//! touches the widget state.

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt::{self, Display};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::Instrument;

/// An analytics event emitted by the widget or the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnalyticsEvent {
    /// The visitor opened the chat window.
    ChatOpened,
    /// The visitor sent a message.
    MessageSent,
    /// A reply offered the booking affordance.
    BookingOffered,
    /// A lead form was submitted.
    LeadSubmitted {
        /// Which form collected the lead.
        form: String,
    },
}

impl AnalyticsEvent {
    /// Returns the stable event name.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            AnalyticsEvent::ChatOpened => "chat_opened",
            AnalyticsEvent::MessageSent => "message_sent",
            AnalyticsEvent::BookingOffered => "booking_offered",
            AnalyticsEvent::LeadSubmitted { .. } => "lead_submitted",
        }
    }
}

/// Error reported by a notification sink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotifyError {
    message: String,
}

impl NotifyError {
    /// Creates an error with the given message.
    #[inline]
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "notification failed: {}", self.message)
    }
}

impl StdError for NotifyError {}

/// Receives analytics events.
#[async_trait]
pub trait AnalyticsSink: Send + Sync + 'static {
    /// Records one event.
    async fn record(&self, event: AnalyticsEvent) -> Result<(), NotifyError>;
}

/// Receives lead submissions.
#[async_trait]
pub trait LeadSink: Send + Sync + 'static {
    /// Submits one lead.
    async fn submit(&self, lead: LeadRecord) -> Result<(), NotifyError>;
}

/// A lead as a flat map of string fields.
///
/// The field names follow the spreadsheet the leads end up in, so they are
/// kept verbatim (`sheetName`, `Email`, `phone`, `timestamp`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeadRecord {
    fields: BTreeMap<String, String>,
}

impl LeadRecord {
    /// Creates a record stamped with the current UTC time.
    pub fn new<S, E>(sheet_name: S, email: E, phone: Option<&str>) -> Self
    where
        S: Into<String>,
        E: Into<String>,
    {
        let timestamp = chrono::Utc::now().to_rfc3339();
        Self::default()
            .with_field("sheetName", sheet_name)
            .with_field("Email", email)
            .with_field("phone", phone.unwrap_or_default())
            .with_field("timestamp", timestamp)
    }

    /// Sets a field, replacing any previous value.
    #[inline]
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Returns the value of a field.
    #[inline]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

/// Spawns `fut` without waiting for it.
///
/// A failure is logged with `label` and swallowed. This must be called
/// within a tokio runtime.
pub fn fire_and_forget<F>(label: &'static str, fut: F)
where
    F: Future<Output = Result<(), NotifyError>> + Send + 'static,
{
    tokio::spawn(
        async move {
            if let Err(err) = fut.await {
                warn!("{label}: {err}");
            }
        }
        .instrument(trace_span!("notify", label = label)),
    );
}
