//! A terminal host for the trade assistant widget.
//!
//! The host wires the widget to Gemini, a static page snapshot, a lead
//! webhook and log-based analytics, all resolved once from [`HostConfig`].

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod config;
pub mod sinks;

use std::sync::Arc;

pub use config::{ConfigError, HostConfig};
use sinks::TracingAnalytics;
use trade_assistant_core::notify::{
    AnalyticsEvent, AnalyticsSink, LeadRecord, LeadSink, fire_and_forget,
};
use trade_assistant_core::{PersonaConfig, StaticPage, WidgetBuilder};
use trade_assistant_gemini_model::{GeminiConfigBuilder, GeminiProvider};

/// The sheet leads from the chat end up in.
pub const CHAT_LEAD_SHEET: &str = "Leads from Chat";

/// Creates a widget builder for the default persona.
///
/// Without an API key the builder gets no model provider, so every turn
/// ends with the fallback message and no request leaves the host.
pub fn widget_builder(
    config: &HostConfig,
    page_text: Option<String>,
) -> WidgetBuilder {
    let mut builder = WidgetBuilder::new(PersonaConfig::trade_partner())
        .with_analytics(TracingAnalytics)
        .with_request_timeout(config.request_timeout);

    match &config.api_key {
        Some(api_key) => {
            let mut gemini_config = GeminiConfigBuilder::with_api_key(api_key);
            if let Some(model) = &config.model {
                gemini_config = gemini_config.with_model(model);
            }
            if let Some(base_url) = &config.base_url {
                gemini_config = gemini_config.with_base_url(base_url);
            }
            let gemini_config = gemini_config.build();
            debug!("using {gemini_config:?}");
            builder =
                builder.with_model_provider(GeminiProvider::new(gemini_config));
        }
        None => warn!("no API key is set, replies will be the fallback"),
    }
    if let Some(page_text) = page_text {
        builder = builder.with_page_context(StaticPage::new(page_text));
    }
    if let Some(delay) = config.auto_open_after {
        builder = builder.with_auto_open_after(delay);
    }
    builder
}

/// Submits a lead collected in the chat without waiting for delivery.
///
/// A missing sink only drops the lead with a warning. This must be called
/// within a tokio runtime.
pub fn submit_lead(
    sink: Option<Arc<dyn LeadSink>>,
    email: &str,
    phone: Option<&str>,
) {
    let lead = LeadRecord::new(CHAT_LEAD_SHEET, email, phone);
    match sink {
        Some(sink) => {
            fire_and_forget("lead webhook", async move { sink.submit(lead).await });
        }
        None => warn!("no lead webhook is set, dropping the lead"),
    }
    fire_and_forget("analytics", async move {
        TracingAnalytics
            .record(AnalyticsEvent::LeadSubmitted {
                form: "chat".to_owned(),
            })
            .await
    });
}
