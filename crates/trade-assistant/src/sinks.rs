//! Notification sinks used by the terminal host.

use async_trait::async_trait;
use reqwest::{Client, header};
use trade_assistant_core::notify::{
    AnalyticsEvent, AnalyticsSink, LeadRecord, LeadSink, NotifyError,
};

/// Posts leads to a spreadsheet webhook.
///
/// The record is sent as a JSON body labelled `text/plain`, which the
/// webhook accepts without a CORS preflight. The response body is ignored.
#[derive(Clone, Debug)]
pub struct WebhookLeadSink {
    client: Client,
    url: String,
}

impl WebhookLeadSink {
    /// Creates a sink posting to `url`.
    #[inline]
    pub fn new<S: Into<String>>(url: S) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl LeadSink for WebhookLeadSink {
    async fn submit(&self, lead: LeadRecord) -> Result<(), NotifyError> {
        let body = serde_json::to_string(&lead)
            .map_err(|err| NotifyError::new(format!("{err}")))?;
        let resp = self
            .client
            .post(&self.url)
            .header(header::CONTENT_TYPE, "text/plain;charset=utf-8")
            .body(body)
            .send()
            .await
            .map_err(|err| NotifyError::new(format!("{err}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(NotifyError::new(format!("webhook answered {status}")));
        }
        debug!("lead delivered");
        Ok(())
    }
}

/// Writes analytics events to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAnalytics;

#[async_trait]
impl AnalyticsSink for TracingAnalytics {
    async fn record(&self, event: AnalyticsEvent) -> Result<(), NotifyError> {
        match &event {
            AnalyticsEvent::LeadSubmitted { form } => {
                info!(event = event.name(), form = %form, "analytics");
            }
            _ => info!(event = event.name(), "analytics"),
        }
        Ok(())
    }
}
