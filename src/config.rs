use std::env;
use std::fmt;
use std::time::Duration;

use tracing::info;

use crate::model::ViewerId;
use crate::projection::ProjectionRule;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "environment variable {} is required", key),
            ConfigError::Invalid { key, reason } => write!(f, "invalid {}: {}", key, reason),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Settings for one viewer's feed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    /// Backend origin; API paths are appended to it.
    pub base_url: String,
    pub viewer_id: ViewerId,
    /// Per-request timeout applied by the HTTP gateway.
    pub request_timeout: Duration,
    /// Projection rule active after `init`.
    pub initial_rule: ProjectionRule,
}

impl FeedConfig {
    pub fn new(viewer_id: ViewerId) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            viewer_id,
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            initial_rule: ProjectionRule::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_initial_rule(mut self, rule: ProjectionRule) -> Self {
        self.initial_rule = rule;
        self
    }

    /// Read `VOTEFEED_VIEWER_ID` (required), `VOTEFEED_BASE_URL`,
    /// `VOTEFEED_TIMEOUT_MS` and `VOTEFEED_SORT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like `from_env`, reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let viewer_id = lookup("VOTEFEED_VIEWER_ID")
            .ok_or(ConfigError::Missing("VOTEFEED_VIEWER_ID"))?
            .trim()
            .parse()
            .map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                key: "VOTEFEED_VIEWER_ID",
                reason: e.to_string(),
            })?;

        let mut config = Self::new(viewer_id);

        match lookup("VOTEFEED_BASE_URL") {
            Some(url) if !url.trim().is_empty() => config = config.with_base_url(url.trim()),
            _ => info!("VOTEFEED_BASE_URL not set, using default: {DEFAULT_BASE_URL}"),
        }

        match lookup("VOTEFEED_TIMEOUT_MS") {
            Some(ms) => {
                let ms: u64 = ms.trim().parse().map_err(|e: std::num::ParseIntError| {
                    ConfigError::Invalid {
                        key: "VOTEFEED_TIMEOUT_MS",
                        reason: e.to_string(),
                    }
                })?;
                if ms == 0 {
                    return Err(ConfigError::Invalid {
                        key: "VOTEFEED_TIMEOUT_MS",
                        reason: "must be greater than zero".into(),
                    });
                }
                config.request_timeout = Duration::from_millis(ms);
            }
            None => info!("VOTEFEED_TIMEOUT_MS not set, using default: {DEFAULT_TIMEOUT_MS}"),
        }

        if let Some(rule) = lookup("VOTEFEED_SORT") {
            config.initial_rule = rule.parse().map_err(|e: crate::projection::ParseRuleError| {
                ConfigError::Invalid {
                    key: "VOTEFEED_SORT",
                    reason: e.to_string(),
                }
            })?;
        }

        Ok(config)
    }

    #[cfg_attr(not(feature = "http"), allow(dead_code))]
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
