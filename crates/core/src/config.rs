//! Deep-link runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the
//! dispatcher. Link handling never reads environment variables, so every link
//! delivered during a session is handled with the same settings.

use crate::constants::{
    DEFAULT_APP_SCHEME, DEFAULT_ERROR_MESSAGE, DEFAULT_ERROR_TITLE, DEFAULT_LAUNCH_DELAY,
    MAX_LAUNCH_DELAY,
};
use crate::validation::validate_app_scheme;
use crate::{DeeplinkError, DeeplinkResult};
use std::time::Duration;

/// Dispatcher configuration resolved at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeeplinkConfig {
    app_scheme: String,
    launch_delay: Duration,
    error_title: String,
    error_message: String,
}

impl DeeplinkConfig {
    /// Create a new `DeeplinkConfig`.
    ///
    /// The scheme is lowercased, matching how URL parsers report schemes.
    pub fn new(app_scheme: &str, launch_delay: Duration) -> DeeplinkResult<Self> {
        validate_app_scheme(app_scheme)?;

        if launch_delay > MAX_LAUNCH_DELAY {
            return Err(DeeplinkError::InvalidConfig(format!(
                "launch delay must not exceed {} ms",
                MAX_LAUNCH_DELAY.as_millis()
            )));
        }

        Ok(Self {
            app_scheme: app_scheme.to_ascii_lowercase(),
            launch_delay,
            error_title: DEFAULT_ERROR_TITLE.into(),
            error_message: DEFAULT_ERROR_MESSAGE.into(),
        })
    }

    /// Build a configuration from optional raw values, typically read from the
    /// environment by a binary. Missing or blank values fall back to defaults.
    pub fn from_env_values(
        app_scheme: Option<String>,
        launch_delay_ms: Option<String>,
    ) -> DeeplinkResult<Self> {
        let app_scheme = non_blank(app_scheme).unwrap_or_else(|| DEFAULT_APP_SCHEME.into());
        let launch_delay = launch_delay_from_env_value(launch_delay_ms)?;
        Self::new(&app_scheme, launch_delay)
    }

    /// Override the title and body shown when a link cannot be opened.
    pub fn with_error_text(
        mut self,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> DeeplinkResult<Self> {
        let title = title.into();
        let message = message.into();
        if title.trim().is_empty() || message.trim().is_empty() {
            return Err(DeeplinkError::InvalidConfig(
                "error title and message cannot be empty".into(),
            ));
        }
        self.error_title = title;
        self.error_message = message;
        Ok(self)
    }

    pub fn app_scheme(&self) -> &str {
        &self.app_scheme
    }

    pub fn launch_delay(&self) -> Duration {
        self.launch_delay
    }

    pub fn error_title(&self) -> &str {
        &self.error_title
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }
}

impl Default for DeeplinkConfig {
    fn default() -> Self {
        Self {
            app_scheme: DEFAULT_APP_SCHEME.into(),
            launch_delay: DEFAULT_LAUNCH_DELAY,
            error_title: DEFAULT_ERROR_TITLE.into(),
            error_message: DEFAULT_ERROR_MESSAGE.into(),
        }
    }
}

/// Parse the launch delay in milliseconds from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default delay.
pub fn launch_delay_from_env_value(value: Option<String>) -> DeeplinkResult<Duration> {
    let parsed = non_blank(value)
        .map(|v| {
            v.parse::<u64>().map_err(|_| {
                DeeplinkError::InvalidConfig(format!(
                    "launch delay must be a whole number of milliseconds, got '{}'",
                    v
                ))
            })
        })
        .transpose()?;

    Ok(parsed
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_LAUNCH_DELAY))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_values_missing() {
        let config = DeeplinkConfig::from_env_values(None, Some("  ".into())).expect("config");
        assert_eq!(config, DeeplinkConfig::default());
        assert_eq!(config.app_scheme(), "schoolmedical");
        assert_eq!(config.launch_delay(), Duration::from_millis(1000));
    }

    #[test]
    fn scheme_is_lowercased() {
        let config =
            DeeplinkConfig::from_env_values(Some("SchoolMedical".into()), Some("250".into()))
                .expect("config");
        assert_eq!(config.app_scheme(), "schoolmedical");
        assert_eq!(config.launch_delay(), Duration::from_millis(250));
    }

    #[test]
    fn rejects_non_numeric_delay() {
        let err = launch_delay_from_env_value(Some("soon".into())).expect_err("bad delay");
        match err {
            DeeplinkError::InvalidConfig(msg) => assert!(msg.contains("soon")),
            other => panic!("expected InvalidConfig error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_excessive_delay() {
        let err = DeeplinkConfig::new("schoolmedical", Duration::from_secs(60))
            .expect_err("delay above cap");
        assert!(matches!(err, DeeplinkError::InvalidConfig(_)));
    }

    #[test]
    fn error_text_must_not_be_blank() {
        let err = DeeplinkConfig::default()
            .with_error_text(" ", "body")
            .expect_err("blank title");
        assert!(matches!(err, DeeplinkError::InvalidConfig(_)));

        let config = DeeplinkConfig::default()
            .with_error_text("Oops", "Try again")
            .expect("valid text");
        assert_eq!(config.error_title(), "Oops");
        assert_eq!(config.error_message(), "Try again");
    }
}
