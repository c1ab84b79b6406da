//! Submitter configuration, populated from environment variables.

use std::time::Duration;

/// A configuration variable held a value that could not be parsed.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("{var}: invalid value {value:?} ({reason})")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: &'static str,
}

/// Runtime configuration for an [`EditSubmitter`](crate::EditSubmitter).
///
/// Every field has a default, so a submitter against a local store can be
/// built with zero configuration.
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `KBSYNC_API` | `http://127.0.0.1:8080/w/api.php` | Action API endpoint |
/// | `KBSYNC_CSRF_TOKEN` | `+\` | CSRF token sent with every write |
/// | `KBSYNC_ACCESS_TOKEN` | (absent) | Bearer token for the `Authorization` header |
/// | `KBSYNC_MAXLAG` | `5` | `maxlag` parameter, in seconds |
/// | `KBSYNC_MAX_RETRIES` | `5` | Retries on `maxlag`, `ratelimited`, 429 and 503 |
/// | `KBSYNC_RETRY_BASE_MS` | `1000` | First backoff delay; doubles on each retry |
/// | `KBSYNC_MAX_EDITS` | (absent = unlimited) | Edit budget for this process |
/// | `KBSYNC_BOT` | `false` | Flag edits as bot edits |
/// | `KBSYNC_SIMULATE` | `false` | Log payloads instead of sending them |
/// | `KBSYNC_TIMEOUT_SECS` | `30` | HTTP request timeout |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Action API endpoint. Example: `"https://kb.example.org/w/api.php"`.
    pub api: String,

    pub csrf_token: String,

    /// OAuth 2 bearer token. `None` sends no `Authorization` header.
    pub access_token: Option<String>,

    pub maxlag: u32,

    pub max_retries: u32,

    pub retry_base: Duration,

    /// Maximum number of edits this submitter performs. `None` is unlimited.
    pub max_edits: Option<u32>,

    pub bot: bool,

    pub simulate: bool,

    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api: "http://127.0.0.1:8080/w/api.php".into(),
            csrf_token: "+\\".into(),
            access_token: None,
            maxlag: 5,
            max_retries: 5,
            retry_base: Duration::from_millis(1000),
            max_edits: None,
            bot: false,
            simulate: false,
            timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    /// Default configuration pointed at `api`.
    pub fn new(api: impl Into<String>) -> Self {
        Self {
            api: api.into(),
            ..Self::default()
        }
    }

    /// Populate config from environment variables, applying defaults where absent.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Populate config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let number = |var: &'static str| -> Result<Option<u64>, ConfigError> {
            match lookup(var) {
                None => Ok(None),
                Some(raw) => raw.trim().parse::<u64>().map(Some).map_err(|_| ConfigError {
                    var,
                    value: raw,
                    reason: "expected a non-negative integer",
                }),
            }
        };
        let small = |var: &'static str, default: u32| -> Result<u32, ConfigError> {
            match number(var)? {
                None => Ok(default),
                Some(n) => u32::try_from(n).map_err(|_| ConfigError {
                    var,
                    value: n.to_string(),
                    reason: "out of range",
                }),
            }
        };
        let flag = |var: &'static str, default: bool| -> Result<bool, ConfigError> {
            match lookup(var) {
                None => Ok(default),
                Some(raw) => parse_flag(&raw).ok_or(ConfigError {
                    var,
                    value: raw,
                    reason: "expected true or false",
                }),
            }
        };

        let max_edits = match number("KBSYNC_MAX_EDITS")? {
            None => None,
            Some(n) => Some(u32::try_from(n).map_err(|_| ConfigError {
                var: "KBSYNC_MAX_EDITS",
                value: n.to_string(),
                reason: "out of range",
            })?),
        };

        Ok(Self {
            api: lookup("KBSYNC_API").unwrap_or(defaults.api),
            csrf_token: lookup("KBSYNC_CSRF_TOKEN").unwrap_or(defaults.csrf_token),
            access_token: lookup("KBSYNC_ACCESS_TOKEN").filter(|t| !t.is_empty()),
            maxlag: small("KBSYNC_MAXLAG", defaults.maxlag)?,
            max_retries: small("KBSYNC_MAX_RETRIES", defaults.max_retries)?,
            retry_base: number("KBSYNC_RETRY_BASE_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_base),
            max_edits,
            bot: flag("KBSYNC_BOT", defaults.bot)?,
            simulate: flag("KBSYNC_SIMULATE", defaults.simulate)?,
            timeout: number("KBSYNC_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
