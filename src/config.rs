//! Driver configuration

use crate::error::{Error, Result};
use std::env;
use std::time::Duration;

const DEFAULT_SMTP_TIMEOUT_SECS: u64 = 30;

/// How the driver prints folders and messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Tab-separated lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Settings for one run of the driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Process at most this many accounts (`None` = all of them).
    pub account_limit: Option<usize>,
    /// Enumerate folders and stream messages after connecting.
    pub fetch_messages: bool,
    pub output: OutputFormat,
    pub smtp_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            account_limit: None,
            fetch_messages: true,
            output: OutputFormat::Text,
            smtp_timeout: Duration::from_secs(DEFAULT_SMTP_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Load the configuration from environment variables
    ///
    /// Reads from `.env` file if present. All variables are optional:
    /// - `MAILCHECK_ACCOUNT_LIMIT` (default: all accounts)
    /// - `MAILCHECK_FETCH_MESSAGES` (default: `true`)
    /// - `MAILCHECK_OUTPUT`, `text` or `json` (default: `text`)
    /// - `MAILCHECK_SMTP_TIMEOUT_SECS` (default: `30`)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a variable is set to an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("MAILCHECK_ACCOUNT_LIMIT") {
            let limit: usize = raw
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("Invalid MAILCHECK_ACCOUNT_LIMIT: {e}")))?;
            if limit == 0 {
                return Err(Error::Config(
                    "MAILCHECK_ACCOUNT_LIMIT must be at least 1".into(),
                ));
            }
            config.account_limit = Some(limit);
        }

        if let Some(raw) = lookup("MAILCHECK_FETCH_MESSAGES") {
            config.fetch_messages = parse_bool("MAILCHECK_FETCH_MESSAGES", &raw)?;
        }

        if let Some(raw) = lookup("MAILCHECK_OUTPUT") {
            config.output = match raw.trim().to_ascii_lowercase().as_str() {
                "text" => OutputFormat::Text,
                "json" => OutputFormat::Json,
                other => {
                    return Err(Error::Config(format!(
                        "Invalid MAILCHECK_OUTPUT: {other} (expected text or json)"
                    )));
                }
            };
        }

        if let Some(raw) = lookup("MAILCHECK_SMTP_TIMEOUT_SECS") {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("Invalid MAILCHECK_SMTP_TIMEOUT_SECS: {e}")))?;
            config.smtp_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!("Invalid {key}: {other}"))),
    }
}
