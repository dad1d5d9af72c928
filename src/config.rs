use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::message::LimitPolicy;
use crate::participant::ReaperConfig;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// Behaviour switches shared by the request handlers
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChatConfig {
    /// Which end of the visible log a `limit` keeps
    pub limit_policy: LimitPolicy,
    /// Whether posting a message refreshes the sender's activity stamp
    pub touch_on_message: bool,
}

/// Process-level configuration, loaded once at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: Option<String>,
    pub reaper: ReaperConfig,
    pub chat: ChatConfig,
}

impl Config {
    /// Reads configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ReaperConfig::default();

        let port = parse_or(&lookup, "PORT", 5000)?;
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        let sweep_interval_secs = parse_or(
            &lookup,
            "REAPER_INTERVAL_SECS",
            defaults.sweep_interval.as_secs(),
        )?;
        let inactivity_threshold_secs = parse_or(
            &lookup,
            "INACTIVITY_THRESHOLD_SECS",
            defaults.inactivity_threshold.as_secs(),
        )?;
        let limit_policy = parse_or(&lookup, "MESSAGE_LIMIT_POLICY", LimitPolicy::default())?;
        let touch_on_message = parse_or(&lookup, "TOUCH_ON_MESSAGE", false)?;

        // tokio's interval panics on a zero period
        if sweep_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "REAPER_INTERVAL_SECS",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            port,
            database_url,
            reaper: ReaperConfig {
                sweep_interval: Duration::from_secs(sweep_interval_secs),
                inactivity_threshold: Duration::from_secs(inactivity_threshold_secs),
            },
            chat: ChatConfig {
                limit_policy,
                touch_on_message,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
    }
}
