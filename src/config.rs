//! Configuration management for the Vimeo client.
//!
//! Handles loading configuration from JSONC files and resolving consumer
//! credentials from an injected source when they are not given directly.

use crate::decode::ResponseFormat;
use crate::oauth::{Consumer, Token};
use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "https://vimeo.com";

/// Client configuration.
///
/// Contains API credentials and request defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application consumer key
    pub consumer_key: Option<String>,
    /// Application consumer secret
    pub consumer_secret: Option<String>,
    /// Access token granted to the application by a user
    pub access_token: Option<String>,
    /// Secret belonging to the access token
    pub access_token_secret: Option<String>,
    /// Default response format (`json`, `xml`, or a raw format name)
    pub format: ResponseFormat,
    /// Scheme and host of the service
    pub base_url: String,
    /// OAuth callback URL; out-of-band (`oob`) when unset
    pub callback_url: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            consumer_key: None,
            consumer_secret: None,
            access_token: None,
            access_token_secret: None,
            format: ResponseFormat::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            callback_url: None,
            timeout_secs: 30,
            user_agent: concat!("vimeo-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file.
    ///
    /// # Arguments
    /// * `path` - Optional path to config file. If None, uses default location.
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    ///
    /// # Details
    /// Searches for config file in:
    /// 1. Provided path (if given)
    /// 2. `$XDG_CONFIG_HOME/vimeo/config.jsonc`
    ///
    /// If no config file exists, returns default configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            p.to_path_buf()
        } else {
            Self::default_config_path()?
        };

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = serde_json::from_str(&strip_line_comments(&content))
            .with_context(|| format!("Failed to deserialize config: {}", config_path.display()))?;

        Ok(config)
    }

    /// Get default configuration file path.
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir =
            config_dir().ok_or_else(|| anyhow::anyhow!("Failed to determine config directory"))?;
        Ok(config_dir.join("vimeo").join("config.jsonc"))
    }

    /// Fill a missing consumer key/secret from `source`.
    ///
    /// Values already present are never overridden.
    pub fn with_credential_source(mut self, source: &dyn CredentialSource) -> Self {
        if self.consumer().is_none()
            && let Some(consumer) = source.consumer_credentials()
        {
            self.consumer_key = Some(consumer.key);
            self.consumer_secret = Some(consumer.secret);
        }
        self
    }

    /// Consumer credentials, if both halves are set and non-empty.
    pub fn consumer(&self) -> Option<Consumer> {
        match (&self.consumer_key, &self.consumer_secret) {
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => {
                Some(Consumer::new(key.clone(), secret.clone()))
            }
            _ => None,
        }
    }

    /// Access token, if both token and secret are set and non-empty.
    pub fn access_token(&self) -> Option<Token> {
        match (&self.access_token, &self.access_token_secret) {
            (Some(token), Some(secret)) if !token.is_empty() && !secret.is_empty() => {
                Some(Token::new(token.clone(), secret.clone()))
            }
            _ => None,
        }
    }
}

// Strip `//` comments, keeping `//` that sits inside a string.
fn strip_line_comments(content: &str) -> String {
    content
        .lines()
        .map(|line| {
            if let Some(comment_pos) = line.find("//") {
                let before_comment = &line[..comment_pos];
                let quote_count = before_comment.matches('"').count();
                if quote_count % 2 == 0 {
                    line[..comment_pos].trim_end()
                } else {
                    line
                }
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// An ambient place to look up consumer credentials.
pub trait CredentialSource {
    fn consumer_credentials(&self) -> Option<Consumer>;
}

impl CredentialSource for Config {
    fn consumer_credentials(&self) -> Option<Consumer> {
        self.consumer()
    }
}

/// Reads `VIMEO_KEY` and `VIMEO_SECRET` from the process environment.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    key_var: String,
    secret_var: String,
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::new("VIMEO_KEY", "VIMEO_SECRET")
    }
}

impl EnvCredentials {
    pub fn new(key_var: impl Into<String>, secret_var: impl Into<String>) -> Self {
        Self {
            key_var: key_var.into(),
            secret_var: secret_var.into(),
        }
    }

    /// Resolve through an arbitrary variable lookup.
    pub fn resolve_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<Consumer> {
        let key = lookup(&self.key_var).filter(|k| !k.is_empty())?;
        let secret = lookup(&self.secret_var).filter(|s| !s.is_empty())?;
        Some(Consumer::new(key, secret))
    }
}

impl CredentialSource for EnvCredentials {
    fn consumer_credentials(&self) -> Option<Consumer> {
        self.resolve_with(|name| std::env::var(name).ok())
    }
}
