use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::time::Duration;
use thiserror::Error;

use crate::client::CallTimeouts;
use crate::subjects::DEFAULT_NAMESPACE;
use crate::transport::ConnectionParams;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Config error: {0}")]
    Load(#[from] ConfigError),
    #[error("bot.instance_id is not set (HBOTRC__BOT__INSTANCE_ID)")]
    MissingInstanceId,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BrokerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: String::new(),
            password: String::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BotConfig {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    // Support both snake_case and the camelCase used by dashboard configs
    #[serde(default, alias = "instanceId", alias = "bot_id")]
    pub instance_id: Option<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            instance_id: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TimeoutConfig {
    #[serde(default = "default_timeout_secs", alias = "defaultSecs")]
    pub default_secs: u64,
    #[serde(default = "default_trade_timeout_secs", alias = "tradeSecs")]
    pub trade_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            default_secs: default_timeout_secs(),
            trade_secs: default_trade_timeout_secs(),
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    4222
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_trade_timeout_secs() -> u64 {
    20
}

impl Settings {
    pub fn new() -> Result<Self, SettingsError> {
        let home = env::var("HOME").unwrap_or_else(|_| ".".into());

        let s = Config::builder()
            // 1. Global config from ~/.hbotrc/config.{toml,json,ini}
            .add_source(File::with_name(&format!("{}/.hbotrc/config", home)).required(false))
            // 2. Project config
            .add_source(File::with_name("config/config").required(false))
            // 3. Local overrides (not checked in)
            .add_source(File::with_name("config/local").required(false))
            // 4. Environment, e.g. HBOTRC__BOT__INSTANCE_ID
            .add_source(Environment::with_prefix("HBOTRC").separator("__"))
            .build()?;

        Ok(s.try_deserialize()?)
    }

    pub fn connection_params(&self) -> ConnectionParams {
        ConnectionParams {
            host: self.broker.host.clone(),
            port: self.broker.port,
            username: self.broker.username.clone(),
            password: self.broker.password.clone(),
        }
    }

    pub fn instance_id(&self) -> Result<&str, SettingsError> {
        match self.bot.instance_id.as_deref() {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(SettingsError::MissingInstanceId),
        }
    }

    pub fn call_timeouts(&self) -> CallTimeouts {
        CallTimeouts {
            standard: Duration::from_secs(self.timeouts.default_secs),
            trade: Duration::from_secs(self.timeouts.trade_secs),
        }
    }
}
