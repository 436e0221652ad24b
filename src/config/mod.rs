use crate::utils::error::{Result, SyncError};
use crate::utils::validation::{validate_non_empty_string, validate_url, Validate};
use std::env;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Runtime configuration, built once from the environment at startup and
/// passed by reference from there on.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// Personal access token, sent as `Authorization: token <value>`.
    pub token: String,
    /// Account whose followers/following sets get reconciled.
    pub username: String,
    /// API base URL. Overridable so tests can point at a mock server.
    pub api_base: String,
    /// Optional Discord webhook for the end-of-run report.
    pub webhook_url: Option<String>,
}

impl EnvConfig {
    /// Reads `TOKEN`, `USERNAME`, and optionally `GITHUB_API_URL` and
    /// `DISCORD_WEBHOOK_URL`. Fails before any network activity when a
    /// required value is missing.
    pub fn from_env() -> Result<Self> {
        let token = require_var("TOKEN")?;
        let username = require_var("USERNAME")?;
        let api_base = env::var("GITHUB_API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let webhook_url = env::var("DISCORD_WEBHOOK_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let config = Self {
            token,
            username,
            api_base,
            webhook_url,
        };
        config.validate()?;
        Ok(config)
    }
}

fn require_var(name: &str) -> Result<String> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| SyncError::ConfigError {
            message: format!("environment variable {} is required but not set", name),
        })
}

impl Validate for EnvConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("token", &self.token)?;
        validate_non_empty_string("username", &self.username)?;
        validate_url("api_base", &self.api_base)?;
        if let Some(webhook_url) = &self.webhook_url {
            validate_url("webhook_url", webhook_url)?;
        }
        Ok(())
    }
}
