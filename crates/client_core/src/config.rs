//! Client settings: built-in defaults, then an optional TOML file, then
//! `APP__*` environment variables.

use std::{path::Path, time::Duration};

use anyhow::Context;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";
pub const DEFAULT_CONFIG_FILE: &str = "reservation.toml";
const DEFAULT_ENV_PREFIX: &str = "APP";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_UNSUPPORTED_DOMAINS: [&str; 2] = ["yahoo.com", "yahoo.fr"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub server_url: String,
    pub request_timeout_secs: u64,
    /// Email domains that cannot receive the verification mail.
    pub unsupported_verification_domains: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.into(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            unsupported_verification_domains: DEFAULT_UNSUPPORTED_DOMAINS
                .iter()
                .map(|d| d.to_string())
                .collect(),
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn with_server_url_override(mut self, server_url: Option<String>) -> Self {
        if let Some(url) = server_url.filter(|u| !u.trim().is_empty()) {
            self.server_url = url.trim().to_string();
        }
        self
    }
}

/// Loads settings from `path` (required when given) or from
/// `reservation.toml` in the working directory (optional).
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    load_settings_with_env_prefix(path, DEFAULT_ENV_PREFIX)
}

pub fn load_settings_with_env_prefix(
    path: Option<&Path>,
    env_prefix: &str,
) -> anyhow::Result<Settings> {
    let defaults = Settings::default();
    let mut builder = Config::builder()
        .set_default("server_url", defaults.server_url.clone())?
        .set_default("request_timeout_secs", defaults.request_timeout_secs)?
        .set_default(
            "unsupported_verification_domains",
            defaults.unsupported_verification_domains.clone(),
        )?;

    builder = match path {
        Some(path) => builder.add_source(File::from(path).required(true)),
        None => builder.add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Toml).required(false)),
    };

    let config = builder
        .add_source(
            Environment::with_prefix(env_prefix)
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("unsupported_verification_domains"),
        )
        .build()
        .with_context(|| match path {
            Some(path) => format!("failed to read settings from '{}'", path.display()),
            None => "failed to assemble settings".to_string(),
        })?;

    let settings: Settings = config
        .try_deserialize()
        .context("settings have an unexpected shape")?;
    tracing::debug!(server_url = %settings.server_url, "settings loaded");
    Ok(settings)
}
