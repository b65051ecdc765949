//! Provider configuration
//!
//! Built from the provider block's attributes, falling back to `ARM_*`
//! environment variables.

use std::collections::HashMap;
use std::time::Duration;

use stratus_core::provider::{ErrorKind, ProviderError};
use stratus_core::resource::Value;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
/// Upper bound for `timeout_minutes`: one week
pub const MAX_TIMEOUT_MINUTES: i64 = 7 * 24 * 60;

/// Errors in the provider block
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("`{attribute}` must be set, either in the provider block or through {env}")]
    Missing {
        attribute: &'static str,
        env: &'static str,
    },

    #[error("`{attribute}` is invalid: {message}")]
    Invalid {
        attribute: &'static str,
        message: String,
    },
}

impl From<ConfigError> for ProviderError {
    fn from(e: ConfigError) -> Self {
        ProviderError::new(ErrorKind::Configuration, e.to_string()).with_cause(e)
    }
}

/// Settings shared by every handler
#[derive(Clone)]
pub struct ProviderConfig {
    pub subscription_id: String,
    pub access_token: String,
    pub endpoint: Url,
    pub poll_interval: Duration,
    /// Overrides the create, update and delete limits of every resource
    pub timeout: Option<Duration>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("subscription_id", &self.subscription_id)
            .field("access_token", &"<sensitive>")
            .field("endpoint", &self.endpoint.as_str())
            .field("poll_interval", &self.poll_interval)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Provider block attributes
struct Attributes<'a>(&'a HashMap<String, Value>);

impl Attributes<'_> {
    /// Get a string attribute value
    fn get_string(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    /// Get an integer attribute value
    fn get_int(&self, key: &str) -> Option<i64> {
        match self.0.get(key) {
            Some(Value::Int(i)) => Some(*i),
            _ => None,
        }
    }
}

impl ProviderConfig {
    /// Build from attributes, consulting the process environment for gaps
    pub fn from_attributes(attributes: &HashMap<String, Value>) -> Result<Self, ConfigError> {
        Self::from_sources(attributes, |key| std::env::var(key).ok())
    }

    /// Build from attributes, consulting `env` for gaps
    pub fn from_sources<F>(attributes: &HashMap<String, Value>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let attrs = Attributes(attributes);
        let string = |attribute: &'static str, var: &'static str| {
            attrs
                .get_string(attribute)
                .map(str::to_string)
                .or_else(|| env(var).filter(|v| !v.is_empty()))
        };

        let subscription_id =
            string("subscription_id", "ARM_SUBSCRIPTION_ID").ok_or(ConfigError::Missing {
                attribute: "subscription_id",
                env: "ARM_SUBSCRIPTION_ID",
            })?;
        stratus_core::schema::validate_uuid(&subscription_id).map_err(|message| {
            ConfigError::Invalid {
                attribute: "subscription_id",
                message,
            }
        })?;

        let access_token =
            string("access_token", "ARM_ACCESS_TOKEN").ok_or(ConfigError::Missing {
                attribute: "access_token",
                env: "ARM_ACCESS_TOKEN",
            })?;

        let endpoint_str =
            string("endpoint", "ARM_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let endpoint = Url::parse(&endpoint_str).map_err(|e| ConfigError::Invalid {
            attribute: "endpoint",
            message: e.to_string(),
        })?;

        let poll_interval = match attrs.get_int("poll_interval_seconds") {
            Some(secs) => Some(secs),
            None => match env("ARM_POLL_INTERVAL") {
                Some(raw) => Some(raw.trim().parse::<i64>().map_err(|e| ConfigError::Invalid {
                    attribute: "poll_interval_seconds",
                    message: format!("ARM_POLL_INTERVAL={raw:?}: {e}"),
                })?),
                None => None,
            },
        };
        let poll_interval = match poll_interval {
            Some(secs) if secs > 0 => Duration::from_secs(secs as u64),
            Some(secs) => {
                return Err(ConfigError::Invalid {
                    attribute: "poll_interval_seconds",
                    message: format!("must be positive, got {secs}"),
                });
            }
            None => DEFAULT_POLL_INTERVAL,
        };

        let timeout = match attrs.get_int("timeout_minutes") {
            Some(minutes) if (1..=MAX_TIMEOUT_MINUTES).contains(&minutes) => {
                Some(Duration::from_secs(minutes as u64 * 60))
            }
            Some(minutes) => {
                return Err(ConfigError::Invalid {
                    attribute: "timeout_minutes",
                    message: format!("must be between 1 and {MAX_TIMEOUT_MINUTES}, got {minutes}"),
                });
            }
            None => None,
        };

        Ok(Self {
            subscription_id,
            access_token,
            endpoint,
            poll_interval,
            timeout,
        })
    }
}
