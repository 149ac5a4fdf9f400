//! Host configuration read from environment variables.

use std::env;
use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::path::PathBuf;
use std::time::Duration;

use trade_assistant_core::DEFAULT_REQUEST_TIMEOUT;

/// Holds the Gemini API key. Unset means every turn ends with the fallback.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
/// Overrides the Gemini model.
pub const MODEL_VAR: &str = "GEMINI_MODEL";
/// Overrides the Gemini API base URL.
pub const BASE_URL_VAR: &str = "GEMINI_BASE_URL";
/// A text file used as the host page.
pub const PAGE_FILE_VAR: &str = "TRADE_ASSISTANT_PAGE_FILE";
/// The URL leads are posted to.
pub const LEAD_WEBHOOK_VAR: &str = "TRADE_ASSISTANT_LEAD_WEBHOOK";
/// The reply deadline in seconds.
pub const TIMEOUT_SECS_VAR: &str = "TRADE_ASSISTANT_TIMEOUT_SECS";
/// Seconds until the widget opens by itself.
pub const AUTO_OPEN_SECS_VAR: &str = "TRADE_ASSISTANT_AUTO_OPEN_SECS";

/// A variable that is set but can't be used.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigError {
    var: &'static str,
    value: String,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} must be a whole number of seconds, got {:?}",
            self.var, self.value
        )
    }
}

impl StdError for ConfigError {}

/// Everything the terminal host needs, resolved once at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct HostConfig {
    /// The Gemini API key.
    pub api_key: Option<String>,
    /// The Gemini model, or the provider default.
    pub model: Option<String>,
    /// The Gemini API base URL, or the provider default.
    pub base_url: Option<String>,
    /// The file holding the host page text.
    pub page_file: Option<PathBuf>,
    /// The lead webhook URL.
    pub lead_webhook: Option<String>,
    /// The reply deadline.
    pub request_timeout: Duration,
    /// The auto-open delay. Disabled when unset.
    pub auto_open_after: Option<Duration>,
}

impl HostConfig {
    /// Reads the configuration from the process environment.
    #[inline]
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let request_timeout =
            parse_secs(TIMEOUT_SECS_VAR, get(TIMEOUT_SECS_VAR))?
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        let auto_open_after =
            parse_secs(AUTO_OPEN_SECS_VAR, get(AUTO_OPEN_SECS_VAR))?;

        Ok(Self {
            api_key: get(API_KEY_VAR),
            model: get(MODEL_VAR),
            base_url: get(BASE_URL_VAR),
            page_file: get(PAGE_FILE_VAR).map(PathBuf::from),
            lead_webhook: get(LEAD_WEBHOOK_VAR),
            request_timeout,
            auto_open_after,
        })
    }
}

impl fmt::Debug for HostConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("page_file", &self.page_file)
            .field("lead_webhook", &self.lead_webhook)
            .field("request_timeout", &self.request_timeout)
            .field("auto_open_after", &self.auto_open_after)
            .finish()
    }
}

fn parse_secs(
    var: &'static str,
    value: Option<String>,
) -> Result<Option<Duration>, ConfigError> {
    let Some(value) = value else {
        return Ok(None);
    };
    match value.parse::<u64>() {
        Ok(secs) => Ok(Some(Duration::from_secs(secs))),
        Err(_) => Err(ConfigError { var, value }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_vars(vars: &[(&str, &str)]) -> Result<HostConfig, ConfigError> {
        let vars: HashMap<&str, &str> = vars.iter().copied().collect();
        HostConfig::from_lookup(|key| vars.get(key).map(|v| (*v).to_owned()))
    }

    #[test]
    fn test_defaults() {
        let config = from_vars(&[]).unwrap();
        assert_eq!(config.api_key, None);
        assert_eq!(config.page_file, None);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.auto_open_after, None);
    }

    #[test]
    fn test_full_config() {
        let config = from_vars(&[
            (API_KEY_VAR, "secret-key"),
            (MODEL_VAR, "gemini-2.5-flash"),
            (PAGE_FILE_VAR, "site/home.txt"),
            (LEAD_WEBHOOK_VAR, "https://example.com/hook"),
            (TIMEOUT_SECS_VAR, " 12 "),
            (AUTO_OPEN_SECS_VAR, "5"),
        ])
        .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("secret-key"));
        assert_eq!(config.model.as_deref(), Some("gemini-2.5-flash"));
        assert_eq!(config.base_url, None);
        assert_eq!(config.page_file, Some(PathBuf::from("site/home.txt")));
        assert_eq!(config.request_timeout, Duration::from_secs(12));
        assert_eq!(config.auto_open_after, Some(Duration::from_secs(5)));
        assert!(!format!("{config:?}").contains("secret-key"));
    }

    #[test]
    fn test_blank_key_is_unset() {
        let config = from_vars(&[(API_KEY_VAR, "   ")]).unwrap();
        assert_eq!(config.api_key, None);
    }

    #[test]
    fn test_invalid_number() {
        let err = from_vars(&[(TIMEOUT_SECS_VAR, "soon")]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "TRADE_ASSISTANT_TIMEOUT_SECS must be a whole number of seconds, \
             got \"soon\""
        );
    }
}
