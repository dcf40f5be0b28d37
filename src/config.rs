//! Process configuration
//!
//! Everything is read from the environment once at startup. `main` loads a
//! `.env` file first, so local runs can keep their settings there.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::gate::MaintenanceMode;

const DEFAULT_WEBHOOK_PREFIX: &str = "/webhook";
const DEFAULT_PORT: u16 = 7000;
const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_API_TIMEOUT_SECS: u64 = 15;
const DEFAULT_FLAGS_DB: &str = "bot_flags.db";
const DEFAULT_BLOCK_CACHE_TTL_SECS: u64 = 300;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    /// Host the webhook is registered under; registration is skipped when unset
    pub public_domain: Option<String>,
    pub webhook_prefix: String,
    pub port: u16,
    pub admin_ids: Vec<i64>,
    pub admin_channel: Option<i64>,
    pub api_base_url: String,
    pub api_timeout: Duration,
    pub flags_db: PathBuf,
    /// Written to the flag store before serving, when present
    pub startup_maintenance: Option<MaintenanceMode>,
    pub block_cache_ttl: Duration,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any name → value lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let token = get("TELEGRAM_BOT_TOKEN").ok_or(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))?;

        Ok(Self {
            token,
            public_domain: get("PUBLIC_DOMAIN"),
            webhook_prefix: get("WEBHOOK_URL_PATH_PREFIX")
                .unwrap_or_else(|| DEFAULT_WEBHOOK_PREFIX.to_string()),
            port: parse_or("BOT_WEBHOOK_PORT", get("BOT_WEBHOOK_PORT"), DEFAULT_PORT)?,
            admin_ids: get("TELEGRAM_ADMIN_IDS")
                .map(|raw| parse_admin_ids(&raw))
                .unwrap_or_default(),
            admin_channel: get("TELEGRAM_ADMIN_CHANNEL_ID")
                .map(|raw| parse("TELEGRAM_ADMIN_CHANNEL_ID", &raw))
                .transpose()?,
            api_base_url: get("API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            api_timeout: Duration::from_secs(parse_or(
                "API_TIMEOUT_SECS",
                get("API_TIMEOUT_SECS"),
                DEFAULT_API_TIMEOUT_SECS,
            )?),
            flags_db: get("BOT_FLAGS_DB")
                .map_or_else(|| PathBuf::from(DEFAULT_FLAGS_DB), PathBuf::from),
            startup_maintenance: get("BOT_STARTUP_MAINTENANCE_MODE")
                .map(|raw| startup_mode(&raw)),
            block_cache_ttl: Duration::from_secs(parse_or(
                "BLOCK_CACHE_TTL_SECS",
                get("BLOCK_CACHE_TTL_SECS"),
                DEFAULT_BLOCK_CACHE_TTL_SECS,
            )?),
        })
    }

    /// Webhook prefix with one leading slash and no trailing slash
    pub fn route_prefix(&self) -> String {
        let prefix = self.webhook_prefix.trim_matches('/');
        if prefix.is_empty() {
            String::new()
        } else {
            format!("/{prefix}")
        }
    }

    /// Route the webhook is served on: `{prefix}/{token}`
    pub fn webhook_path(&self) -> String {
        format!("{}/{}", self.route_prefix(), self.token)
    }

    /// Public URL handed to Telegram, if a domain is configured
    pub fn webhook_url(&self) -> Option<String> {
        self.public_domain.as_deref().map(|domain| {
            let host = domain
                .trim_start_matches("https://")
                .trim_start_matches("http://")
                .trim_end_matches('/');
            format!("https://{host}{}", self.webhook_path())
        })
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Invalid {
        name,
        value: raw.to_string(),
    })
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    raw.map_or(Ok(default), |raw| parse(name, &raw))
}

/// Flag keywords match case-insensitively; any other text is a message.
fn startup_mode(raw: &str) -> MaintenanceMode {
    let keyword = raw.to_ascii_lowercase();
    match keyword.as_str() {
        "true" | "false" | "off" | "stealth" => MaintenanceMode::from_flag_value(Some(&keyword)),
        _ => MaintenanceMode::from_flag_value(Some(raw)),
    }
}

/// Comma-separated ids; entries that are not integers are skipped.
fn parse_admin_ids(raw: &str) -> Vec<i64> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match entry.parse() {
            Ok(id) => Some(id),
            Err(_) => {
                tracing::warn!(entry, "Skipping invalid admin id");
                None
            }
        })
        .collect()
}
